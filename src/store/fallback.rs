//! Composite store: durable primary first, in-memory mapping second.

use super::{DocumentStore, MemoryStore};
use serde::Serialize;
use std::sync::Arc;

/// Which backends a [`FallbackStore`] was built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreMode {
    /// A durable primary is configured; memory is only used when it fails.
    Durable,
    /// No primary is configured; every document lives in memory.
    MemoryOnly,
}

/// Result of a [`FallbackStore::store`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredDocument {
    /// Identifier to hand back to the client.
    pub id: String,
    /// False when the document was kept in the in-memory fallback.
    pub durable: bool,
}

/// Store adapter that never fails a write.
///
/// Writes go to the primary when one is configured. Any primary error is logged as a warning
/// and the document is kept in memory under a generated UUID instead. Reads consult the primary
/// first and then the in-memory mapping, so documents written during an outage stay reachable
/// for the lifetime of the process.
pub struct FallbackStore {
    primary: Option<Arc<dyn DocumentStore>>,
    fallback: MemoryStore,
}

impl FallbackStore {
    /// Wrap a durable primary with an in-memory fallback.
    pub fn new(primary: Arc<dyn DocumentStore>) -> Self {
        Self {
            primary: Some(primary),
            fallback: MemoryStore::new(),
        }
    }

    /// Build a store that keeps everything in memory.
    pub fn memory_only() -> Self {
        Self {
            primary: None,
            fallback: MemoryStore::new(),
        }
    }

    /// Report whether a durable primary is configured.
    pub fn mode(&self) -> StoreMode {
        if self.primary.is_some() {
            StoreMode::Durable
        } else {
            StoreMode::MemoryOnly
        }
    }

    /// Number of documents held in the in-memory mapping.
    pub async fn in_memory_documents(&self) -> usize {
        self.fallback.document_count().await
    }

    /// Persist `text`, reporting where it ended up.
    pub async fn store(&self, text: &str) -> StoredDocument {
        if let Some(primary) = &self.primary {
            match primary.put(text).await {
                Ok(id) => {
                    tracing::debug!(doc_id = %id, "Document stored in primary store");
                    return StoredDocument { id, durable: true };
                }
                Err(error) => {
                    tracing::warn!(error = %error, "Primary store unavailable, using in-memory storage");
                }
            }
        }

        let id = self.fallback.insert(text).await;
        tracing::debug!(doc_id = %id, "Document stored in memory");
        StoredDocument { id, durable: false }
    }

    /// Resolve `id` from the primary, then from memory.
    pub async fn load(&self, id: &str) -> Option<String> {
        if let Some(primary) = &self.primary {
            match primary.get(id).await {
                Ok(Some(text)) => return Some(text),
                Ok(None) => {}
                Err(error) => {
                    tracing::warn!(doc_id = id, error = %error, "Primary store query failed, checking in-memory storage");
                }
            }
        }
        self.fallback.lookup(id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn refused() -> StoreError {
        StoreError::Mongo(mongodb::error::Error::custom("connection refused"))
    }

    struct UnreachableStore {
        attempts: AtomicUsize,
    }

    impl UnreachableStore {
        fn new() -> Self {
            Self {
                attempts: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl DocumentStore for UnreachableStore {
        async fn put(&self, _text: &str) -> Result<String, StoreError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(refused())
        }

        async fn get(&self, _id: &str) -> Result<Option<String>, StoreError> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(refused())
        }
    }

    #[tokio::test]
    async fn failed_primary_write_lands_in_memory() {
        let primary = Arc::new(UnreachableStore::new());
        let store = FallbackStore::new(primary.clone());

        let stored = store.store("kept anyway").await;
        assert!(!stored.durable);
        assert!(!stored.id.is_empty());
        assert_eq!(store.load(&stored.id).await.as_deref(), Some("kept anyway"));
        assert_eq!(primary.attempts.load(Ordering::SeqCst), 2);
        assert_eq!(store.mode(), StoreMode::Durable);
    }

    #[tokio::test]
    async fn healthy_primary_is_preferred() {
        let primary = Arc::new(MemoryStore::new());
        let store = FallbackStore::new(primary.clone());

        let stored = store.store("durable text").await;
        assert!(stored.durable);
        assert_eq!(primary.lookup(&stored.id).await.as_deref(), Some("durable text"));
        assert_eq!(store.in_memory_documents().await, 0);
        assert_eq!(store.load(&stored.id).await.as_deref(), Some("durable text"));
    }

    #[tokio::test]
    async fn primary_miss_checks_memory_before_not_found() {
        let store = FallbackStore::new(Arc::new(MemoryStore::new()));
        let id = store.fallback.insert("outage upload").await;

        assert_eq!(store.load(&id).await.as_deref(), Some("outage upload"));
        assert_eq!(store.load("unknown").await, None);
    }

    #[tokio::test]
    async fn memory_only_store_never_touches_a_primary() {
        let store = FallbackStore::memory_only();
        let stored = store.store("volatile").await;

        assert!(!stored.durable);
        assert_eq!(store.mode(), StoreMode::MemoryOnly);
        assert_eq!(store.load(&stored.id).await.as_deref(), Some("volatile"));
        assert_eq!(store.in_memory_documents().await, 1);
    }
}
