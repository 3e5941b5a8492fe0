use async_trait::async_trait;
use ballotwatch_core::errors::StoreError;
use ballotwatch_core::events::{Document, DocumentId};
use ballotwatch_core::store::{ChangeFeed, DocumentStore};
use log::{debug, info};
use mongodb::bson::{doc, Document as BsonDocument};
use mongodb::options::FullDocumentType;
use mongodb::{Client, Database};

use crate::convert::{document_to_json, id_filter};
use crate::errors::{MongoErrorExt, StorageError};
use crate::feed::MongoChangeFeed;

/// Database used when neither the configuration nor the URI names one.
pub const DEFAULT_DATABASE: &str = "digitalvoting";

/// Document store backed by a MongoDB deployment.
pub struct MongoDocumentStore {
    database: Database,
}

impl MongoDocumentStore {
    /// Builds a client for `uri`.
    ///
    /// The database is `database` if given, else the one in the URI path,
    /// else [`DEFAULT_DATABASE`]. No connection is made until [`DocumentStore::ensure_connected`].
    pub async fn connect(uri: &str, database: Option<&str>) -> Result<Self, StorageError> {
        let client = Client::with_uri_str(uri)
            .await
            .map_err(StorageError::InvalidUri)?;
        let database = match database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };
        debug!("Using MongoDB database {}", database.name());
        Ok(Self { database })
    }

    pub fn database_name(&self) -> &str {
        self.database.name()
    }
}

#[async_trait]
impl DocumentStore for MongoDocumentStore {
    async fn ensure_connected(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| e.into_connection_error())?;
        info!("Connected to MongoDB database {}", self.database.name());
        Ok(())
    }

    async fn watch(&self, collection: &str) -> Result<Box<dyn ChangeFeed>, StoreError> {
        let stream = self
            .database
            .collection::<BsonDocument>(collection)
            .watch()
            .full_document(FullDocumentType::UpdateLookup)
            .await
            .map_err(|e| e.into_feed_open_error(collection))?;
        Ok(Box::new(MongoChangeFeed::new(collection.to_string(), stream)))
    }

    async fn find_by_id(
        &self,
        collection: &str,
        id: &DocumentId,
    ) -> Result<Option<Document>, StoreError> {
        let found = self
            .database
            .collection::<BsonDocument>(collection)
            .find_one(id_filter(id))
            .await
            .map_err(|e| e.into_lookup_error(collection))?;
        Ok(found.map(document_to_json))
    }
}
