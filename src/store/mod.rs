//! Document persistence.
//!
//! [`FallbackStore`] is the adapter the HTTP layer talks to: it tries a durable primary
//! ([`MongoStore`] in production) and quietly keeps the document in a process-local
//! [`MemoryStore`] whenever the primary fails. Callers never see a storage error from it.

pub mod fallback;
pub mod memory;
pub mod mongo;

pub use fallback::{FallbackStore, StoreMode, StoredDocument};
pub use memory::MemoryStore;
pub use mongo::MongoStore;

use async_trait::async_trait;
use thiserror::Error;

/// Errors raised by durable document stores.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The MongoDB driver reported a failure (connectivity, auth, timeout, ...).
    #[error("MongoDB request failed: {0}")]
    Mongo(#[from] mongodb::error::Error),
    /// A stored record did not have the expected shape.
    #[error("Stored document {id} is malformed: {reason}")]
    Malformed {
        /// Identifier of the offending record.
        id: String,
        /// What was wrong with it.
        reason: String,
    },
}

/// Key-value storage for uploaded document text.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Persist `text` and return the identifier assigned to it.
    async fn put(&self, text: &str) -> Result<String, StoreError>;

    /// Fetch the text stored under `id`, or `None` when this store does not hold it.
    async fn get(&self, id: &str) -> Result<Option<String>, StoreError>;
}
