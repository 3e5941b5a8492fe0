//! BSON to core type conversions.

use ballotwatch_core::events::{ChangeEvent, Document, DocumentId, OperationType};
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{doc, Bson, Document as BsonDocument};
use mongodb::change_stream::event::{ChangeStreamEvent, OperationType as MongoOperationType};
use serde_json::Value;

/// Converts a BSON document to relaxed extended JSON.
///
/// Object ids come out as `{"$oid": "<hex>"}`, which the resolver accepts as
/// identifiers.
pub fn document_to_json(document: BsonDocument) -> Document {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => map,
        _ => Document::new(),
    }
}

pub fn operation_type(operation: &MongoOperationType) -> OperationType {
    match operation {
        MongoOperationType::Insert => OperationType::Insert,
        MongoOperationType::Update => OperationType::Update,
        MongoOperationType::Replace => OperationType::Replace,
        MongoOperationType::Delete => OperationType::Delete,
        _ => OperationType::Other,
    }
}

/// Normalizes one change stream record.
///
/// Deletes carry no document. Updates carry the post-image looked up by the
/// server, or nothing if the document was deleted in the meantime.
pub fn change_event(collection: &str, event: ChangeStreamEvent<BsonDocument>) -> ChangeEvent {
    ChangeEvent::new(
        collection,
        operation_type(&event.operation_type),
        event.full_document.map(document_to_json),
    )
}

/// Filter matching a document by `_id`.
///
/// Object id references are queried as object ids. Raw identifiers that parse
/// as object ids match either form, since some writers store the hex string
/// itself. Anything else is matched as a plain string.
pub fn id_filter(id: &DocumentId) -> BsonDocument {
    match (id, ObjectId::parse_str(id.as_str())) {
        (DocumentId::ObjectId(_), Ok(oid)) => doc! { "_id": oid },
        (DocumentId::Raw(raw), Ok(oid)) => doc! { "_id": { "$in": [oid, raw.as_str()] } },
        (_, Err(_)) => doc! { "_id": id.as_str() },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ballotwatch_core::events::ElectionId;
    use serde_json::json;

    const HEX: &str = "652f1c2b9d3e4a0012345678";

    #[test]
    fn test_document_to_json_keeps_object_ids_resolvable() {
        let oid = ObjectId::parse_str(HEX).unwrap();
        let document = document_to_json(doc! {
            "_id": ObjectId::new(),
            "election": oid,
            "text": "hello",
            "likes": 3,
        });

        assert_eq!(document["election"], json!({ "$oid": HEX }));
        assert_eq!(document["text"], json!("hello"));
        assert_eq!(document["likes"], json!(3));
        assert_eq!(
            ElectionId::from_value(&document["election"]),
            Some(ElectionId::from(HEX))
        );
    }

    #[test]
    fn test_operation_type_mapping() {
        assert_eq!(operation_type(&MongoOperationType::Insert), OperationType::Insert);
        assert_eq!(operation_type(&MongoOperationType::Update), OperationType::Update);
        assert_eq!(operation_type(&MongoOperationType::Replace), OperationType::Replace);
        assert_eq!(operation_type(&MongoOperationType::Delete), OperationType::Delete);
        assert_eq!(operation_type(&MongoOperationType::Invalidate), OperationType::Other);
    }

    #[test]
    fn test_id_filter() {
        let oid = ObjectId::parse_str(HEX).unwrap();
        assert_eq!(
            id_filter(&DocumentId::ObjectId(HEX.to_string())),
            doc! { "_id": oid }
        );
        assert_eq!(
            id_filter(&DocumentId::Raw(HEX.to_string())),
            doc! { "_id": { "$in": [oid, HEX] } }
        );
        assert_eq!(
            id_filter(&DocumentId::Raw("post-42".to_string())),
            doc! { "_id": "post-42" }
        );
    }

    fn stream_event(
        operation: &str,
        full_document: Option<BsonDocument>,
    ) -> ChangeStreamEvent<BsonDocument> {
        let mut raw = doc! {
            "_id": { "_data": "8265F0C0FE000000012B022C0100296E5A1004" },
            "operationType": operation,
            "ns": { "db": "digitalvoting", "coll": "comments" },
            "documentKey": { "_id": 1 },
        };
        if let Some(document) = full_document {
            raw.insert("fullDocument", document);
        }
        mongodb::bson::from_document(raw).unwrap()
    }

    #[test]
    fn test_change_event_update_carries_full_document() {
        let event = change_event(
            "comments",
            stream_event("update", Some(doc! { "_id": 1, "postId": "P1" })),
        );

        assert_eq!(event.source_collection, "comments");
        assert_eq!(event.operation_type, OperationType::Update);
        assert_eq!(
            event.document.map(Value::Object),
            Some(json!({ "_id": 1, "postId": "P1" }))
        );
    }

    #[test]
    fn test_change_event_delete_has_no_document() {
        let event = change_event("comments", stream_event("delete", None));

        assert_eq!(event.operation_type, OperationType::Delete);
        assert_eq!(event.document, None);
    }

    #[test]
    fn test_change_event_invalidate_is_other() {
        let raw = doc! {
            "_id": { "_data": "8265F0C0FE000000012B022C0100296E5A1004" },
            "operationType": "invalidate",
        };
        let event = change_event("reactions", mongodb::bson::from_document(raw).unwrap());

        assert_eq!(event.source_collection, "reactions");
        assert_eq!(event.operation_type, OperationType::Other);
        assert_eq!(event.document, None);
    }
}
