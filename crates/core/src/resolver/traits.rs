//! Resolution traits.
//!
//! Defines the extraction strategies the resolver chain evaluates in order.

use crate::events::{Document, DocumentId, ElectionId};

/// Resolution result containing the election and how it was found.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ResolvedElection {
    pub election_id: ElectionId,
    pub source: ResolutionSource,
}

/// Indicates how an election was resolved.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResolutionSource {
    /// Read from a field of the changed document itself.
    Direct { field: &'static str },
    /// Read from the parent document the changed document references.
    Parent {
        reference: &'static str,
        field: &'static str,
    },
}

/// Strategy that reads an election identifier straight off a document.
///
/// Returning `None` means this strategy does not apply and the next one in
/// the chain should be tried.
pub trait ElectionStrategy: Send + Sync {
    /// Field or rule name, used in logs and in [`ResolutionSource`].
    fn name(&self) -> &'static str;

    fn extract(&self, document: &Document) -> Option<ElectionId>;
}

/// Strategy that finds a reference to a parent document.
pub trait ReferenceStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    fn extract(&self, document: &Document) -> Option<DocumentId>;
}
