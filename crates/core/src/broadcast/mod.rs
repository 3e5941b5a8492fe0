//! Broadcast module.
//!
//! Provides the transport trait the publisher emits into. Runtime adapters
//! (the web server's event bus) implement the trait.

mod channel;
mod publisher;

pub use channel::*;
pub use publisher::BroadcastPublisher;
