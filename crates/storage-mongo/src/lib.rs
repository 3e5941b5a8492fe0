//! MongoDB storage adapter for Ballotwatch.
//!
//! Implements the store traits from `ballotwatch-core` on top of the official
//! MongoDB driver. Change feeds are MongoDB change streams opened with
//! `fullDocument: updateLookup`, which requires a replica set or sharded
//! cluster.
//!
//! ```text
//!        ballotwatch-core (traits)
//!                  │
//!                  ▼
//!      storage-mongo (this crate)
//!                  │
//!                  ▼
//!               MongoDB
//! ```
//!
//! This crate is the only place in the workspace where driver types appear.

pub mod convert;
pub mod errors;
pub mod feed;
pub mod store;

pub use errors::{MongoErrorExt, StorageError};
pub use feed::MongoChangeFeed;
pub use store::{MongoDocumentStore, DEFAULT_DATABASE};
