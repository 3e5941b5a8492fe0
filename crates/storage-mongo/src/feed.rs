use async_trait::async_trait;
use ballotwatch_core::errors::StoreError;
use ballotwatch_core::events::ChangeEvent;
use ballotwatch_core::store::ChangeFeed;
use futures::StreamExt;
use log::debug;
use mongodb::bson::Document as BsonDocument;
use mongodb::change_stream::event::ChangeStreamEvent;
use mongodb::change_stream::ChangeStream;

use crate::convert::change_event;
use crate::errors::MongoErrorExt;

/// Change stream over one collection.
pub struct MongoChangeFeed {
    collection: String,
    stream: ChangeStream<ChangeStreamEvent<BsonDocument>>,
}

impl MongoChangeFeed {
    pub(crate) fn new(
        collection: String,
        stream: ChangeStream<ChangeStreamEvent<BsonDocument>>,
    ) -> Self {
        Self { collection, stream }
    }
}

#[async_trait]
impl ChangeFeed for MongoChangeFeed {
    fn collection(&self) -> &str {
        &self.collection
    }

    async fn next_event(&mut self) -> Option<Result<ChangeEvent, StoreError>> {
        let next = self.stream.next().await?;
        Some(
            next.map(|event| change_event(&self.collection, event))
                .map_err(|e| e.into_feed_error(&self.collection)),
        )
    }

    async fn close(self: Box<Self>) -> Result<(), StoreError> {
        // Dropping the stream kills the server-side cursor.
        debug!("Closing change stream on {}", self.collection);
        drop(self.stream);
        Ok(())
    }
}
