//! Election resolver - maps a changed document to the election it affects.
//!
//! Resolution order:
//! 1. Direct election fields on the document, in strategy order
//! 2. The first parent reference found; the parent is fetched once and the
//!    direct strategies are applied to it
//!
//! Resolution never fails loudly. A document that cannot be tied to an
//! election, or whose parent lookup errors, resolves to `None`.

use std::sync::Arc;

use log::debug;

use super::strategies::{default_election_strategies, default_reference_strategies};
use super::traits::{ElectionStrategy, ReferenceStrategy, ResolutionSource, ResolvedElection};
use crate::constants::DEFAULT_PARENT_COLLECTION;
use crate::events::{Document, ElectionId};
use crate::store::DocumentStore;

pub struct ElectionResolver {
    election_strategies: Vec<Box<dyn ElectionStrategy>>,
    reference_strategies: Vec<Box<dyn ReferenceStrategy>>,
    store: Arc<dyn DocumentStore>,
    parent_collection: String,
}

impl ElectionResolver {
    /// Create a resolver with the default field spellings, looking parents
    /// up in the default parent collection.
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self::with_parent_collection(store, DEFAULT_PARENT_COLLECTION)
    }

    pub fn with_parent_collection(
        store: Arc<dyn DocumentStore>,
        parent_collection: impl Into<String>,
    ) -> Self {
        Self {
            election_strategies: default_election_strategies(),
            reference_strategies: default_reference_strategies(),
            store,
            parent_collection: parent_collection.into(),
        }
    }

    /// Append a direct strategy after the default ones.
    pub fn add_election_strategy(&mut self, strategy: Box<dyn ElectionStrategy>) {
        self.election_strategies.push(strategy);
    }

    /// Append a reference strategy after the default ones.
    pub fn add_reference_strategy(&mut self, strategy: Box<dyn ReferenceStrategy>) {
        self.reference_strategies.push(strategy);
    }

    pub fn parent_collection(&self) -> &str {
        &self.parent_collection
    }

    /// Resolve using only the document's own fields.
    pub fn resolve_direct(&self, document: &Document) -> Option<ResolvedElection> {
        self.extract_direct(document)
            .map(|(field, election_id)| ResolvedElection {
                election_id,
                source: ResolutionSource::Direct { field },
            })
    }

    fn extract_direct(&self, document: &Document) -> Option<(&'static str, ElectionId)> {
        self.election_strategies
            .iter()
            .find_map(|strategy| strategy.extract(document).map(|id| (strategy.name(), id)))
    }

    /// Resolve a document, falling back to its parent when needed.
    pub async fn resolve(&self, document: &Document) -> Option<ResolvedElection> {
        if let Some(resolved) = self.resolve_direct(document) {
            return Some(resolved);
        }

        let (reference, parent_id) = self
            .reference_strategies
            .iter()
            .find_map(|strategy| strategy.extract(document).map(|id| (strategy.name(), id)))?;

        let parent = match self
            .store
            .find_by_id(&self.parent_collection, &parent_id)
            .await
        {
            Ok(Some(parent)) => parent,
            Ok(None) => {
                debug!(
                    "Parent '{}' referenced by '{}' not found in '{}'",
                    parent_id, reference, self.parent_collection
                );
                return None;
            }
            Err(err) => {
                debug!("Could not resolve parent '{}': {}", parent_id, err);
                return None;
            }
        };

        self.extract_direct(&parent)
            .map(|(field, election_id)| ResolvedElection {
                election_id,
                source: ResolutionSource::Parent { reference, field },
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::strategies::ReferenceField;
    use crate::resolver::traits::ElectionStrategy;
    use crate::store::MemoryDocumentStore;
    use crate::test_utils::doc;
    use serde_json::json;

    fn resolver_with(store: Arc<MemoryDocumentStore>) -> ElectionResolver {
        ElectionResolver::new(store)
    }

    #[tokio::test]
    async fn test_direct_field_priority() {
        let store = Arc::new(MemoryDocumentStore::new());
        let resolver = resolver_with(store);

        let document = doc(json!({
            "election": "E3",
            "electionId": "E2",
            "election_id": "E1"
        }));
        let resolved = resolver.resolve(&document).await.unwrap();
        assert_eq!(resolved.election_id, ElectionId::from("E1"));
        assert_eq!(
            resolved.source,
            ResolutionSource::Direct {
                field: "election_id"
            }
        );

        let document = doc(json!({ "election": "E3", "electionId": "E2" }));
        let resolved = resolver.resolve(&document).await.unwrap();
        assert_eq!(resolved.election_id, ElectionId::from("E2"));
    }

    #[tokio::test]
    async fn test_direct_field_wins_without_parent_lookup() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.seed("posts", "P1", doc(json!({ "election_id": "FROM_PARENT" })));
        let resolver = resolver_with(store.clone());

        let document = doc(json!({ "electionId": "E1", "postId": "P1" }));
        let resolved = resolver.resolve(&document).await.unwrap();

        assert_eq!(resolved.election_id, ElectionId::from("E1"));
        assert_eq!(store.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_falls_back_to_parent() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.seed("posts", "P1", doc(json!({ "election_id": "E1" })));
        let resolver = resolver_with(store.clone());

        let resolved = resolver
            .resolve(&doc(json!({ "postId": "P1" })))
            .await
            .unwrap();

        assert_eq!(resolved.election_id, ElectionId::from("E1"));
        assert_eq!(
            resolved.source,
            ResolutionSource::Parent {
                reference: "postId",
                field: "election_id"
            }
        );
        assert_eq!(store.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_parent_reference_as_object_id() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.seed(
            "posts",
            "65f0c0ffee00000000000001",
            doc(json!({ "election": { "$oid": "65f0c0ffee0000000000000e" } })),
        );
        let resolver = resolver_with(store);

        let reaction = doc(json!({
            "user": { "$oid": "65f0c0ffee00000000000077" },
            "post": { "$oid": "65f0c0ffee00000000000001" }
        }));
        let resolved = resolver.resolve(&reaction).await.unwrap();
        assert_eq!(
            resolved.election_id,
            ElectionId::from("65f0c0ffee0000000000000e")
        );
    }

    #[tokio::test]
    async fn test_missing_parent_resolves_to_none() {
        let store = Arc::new(MemoryDocumentStore::new());
        let resolver = resolver_with(store.clone());

        assert_eq!(resolver.resolve(&doc(json!({ "postId": "nope" }))).await, None);
        assert_eq!(store.lookup_count(), 1);
    }

    #[tokio::test]
    async fn test_lookup_error_is_swallowed() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.seed("posts", "P1", doc(json!({ "election_id": "E1" })));
        store.fail_lookups();
        let resolver = resolver_with(store);

        assert_eq!(resolver.resolve(&doc(json!({ "post_id": "P1" }))).await, None);
    }

    #[tokio::test]
    async fn test_parent_without_election_resolves_to_none() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.seed("posts", "P1", doc(json!({ "text": "hello" })));
        let resolver = resolver_with(store);

        assert_eq!(resolver.resolve(&doc(json!({ "postId": "P1" }))).await, None);
    }

    #[tokio::test]
    async fn test_document_without_fields_skips_lookup() {
        let store = Arc::new(MemoryDocumentStore::new());
        let resolver = resolver_with(store.clone());

        assert_eq!(resolver.resolve(&doc(json!({ "text": "hi" }))).await, None);
        assert_eq!(store.lookup_count(), 0);
    }

    #[tokio::test]
    async fn test_custom_parent_collection() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.seed("threads", "T1", doc(json!({ "electionId": "E7" })));
        let resolver = ElectionResolver::with_parent_collection(store, "threads");

        let resolved = resolver.resolve(&doc(json!({ "postId": "T1" }))).await.unwrap();
        assert_eq!(resolved.election_id, ElectionId::from("E7"));
        assert_eq!(resolver.parent_collection(), "threads");
    }

    #[tokio::test]
    async fn test_added_strategy_runs_after_defaults() {
        struct Ballot;
        impl ElectionStrategy for Ballot {
            fn name(&self) -> &'static str {
                "ballot.election"
            }
            fn extract(&self, document: &Document) -> Option<ElectionId> {
                document
                    .get("ballot")
                    .and_then(|b| b.get("election"))
                    .and_then(ElectionId::from_value)
            }
        }

        let store = Arc::new(MemoryDocumentStore::new());
        let mut resolver = resolver_with(store);
        resolver.add_election_strategy(Box::new(Ballot));

        let resolved = resolver
            .resolve(&doc(json!({ "ballot": { "election": "E9" } })))
            .await
            .unwrap();
        assert_eq!(resolved.election_id, ElectionId::from("E9"));

        let resolved = resolver
            .resolve(&doc(json!({ "electionId": "E1", "ballot": { "election": "E9" } })))
            .await
            .unwrap();
        assert_eq!(resolved.election_id, ElectionId::from("E1"));
    }

    #[tokio::test]
    async fn test_added_reference_strategy_follows_new_field() {
        let store = Arc::new(MemoryDocumentStore::new());
        store.seed("posts", "P5", doc(json!({ "election_id": "E5" })));
        let mut resolver = resolver_with(store);

        let reply = doc(json!({ "threadId": "P5" }));
        assert_eq!(resolver.resolve(&reply).await, None);

        resolver.add_reference_strategy(Box::new(ReferenceField("threadId")));
        let resolved = resolver.resolve(&reply).await.unwrap();
        assert_eq!(resolved.election_id, ElectionId::from("E5"));
        assert_eq!(
            resolved.source,
            ResolutionSource::Parent {
                reference: "threadId",
                field: "election_id"
            }
        );
    }
}
