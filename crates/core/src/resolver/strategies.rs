//! Field-based extraction strategies.
//!
//! Producers have drifted on field naming over time, so each accepted
//! spelling is its own strategy and the chain tries them in priority order.

use super::traits::{ElectionStrategy, ReferenceStrategy};
use crate::events::{Document, DocumentId, ElectionId};

/// Direct election fields, highest priority first.
pub const ELECTION_FIELDS: [&str; 3] = ["election_id", "electionId", "election"];

/// Parent reference fields, highest priority first.
pub const REFERENCE_FIELDS: [&str; 3] = ["postId", "post_id", "post"];

/// Reads the election from a single named field.
#[derive(Clone, Copy, Debug)]
pub struct ElectionField(pub &'static str);

impl ElectionStrategy for ElectionField {
    fn name(&self) -> &'static str {
        self.0
    }

    fn extract(&self, document: &Document) -> Option<ElectionId> {
        document.get(self.0).and_then(ElectionId::from_value)
    }
}

/// Reads a parent reference from a single named field.
#[derive(Clone, Copy, Debug)]
pub struct ReferenceField(pub &'static str);

impl ReferenceStrategy for ReferenceField {
    fn name(&self) -> &'static str {
        self.0
    }

    fn extract(&self, document: &Document) -> Option<DocumentId> {
        document.get(self.0).and_then(DocumentId::from_value)
    }
}

pub fn default_election_strategies() -> Vec<Box<dyn ElectionStrategy>> {
    ELECTION_FIELDS
        .into_iter()
        .map(|field| Box::new(ElectionField(field)) as Box<dyn ElectionStrategy>)
        .collect()
}

pub fn default_reference_strategies() -> Vec<Box<dyn ReferenceStrategy>> {
    REFERENCE_FIELDS
        .into_iter()
        .map(|field| Box::new(ReferenceField(field)) as Box<dyn ReferenceStrategy>)
        .collect()
}
