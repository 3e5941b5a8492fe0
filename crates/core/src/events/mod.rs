//! Change events module.
//!
//! Provides the normalized change-event shape produced by store adapters and
//! the identifier types the rest of the pipeline keys on.

mod change_event;
mod identifiers;

pub use change_event::*;
pub use identifiers::*;
