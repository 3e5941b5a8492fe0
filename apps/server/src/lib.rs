pub mod api;
pub mod config;
pub mod error;
pub mod events;
mod main_lib;

pub use main_lib::{
    build_prediction_source, build_state, build_store, build_watcher, init_tracing, serve,
    shutdown_signal, AppState,
};
