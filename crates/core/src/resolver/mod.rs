//! Election resolution.
//!
//! Maps a changed document to the election it belongs to through an ordered
//! chain of extraction strategies, with a single parent lookup as fallback.

mod chain;
mod strategies;
mod traits;

pub use chain::ElectionResolver;
pub use strategies::{
    default_election_strategies, default_reference_strategies, ElectionField, ReferenceField,
    ELECTION_FIELDS, REFERENCE_FIELDS,
};
pub use traits::{ElectionStrategy, ReferenceStrategy, ResolutionSource, ResolvedElection};
