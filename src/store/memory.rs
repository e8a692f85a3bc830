//! Process-local document mapping used when the durable store is unavailable.

use super::{DocumentStore, StoreError};
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory document mapping keyed by generated UUIDs. Contents are lost on restart.
#[derive(Default)]
pub struct MemoryStore {
    documents: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty mapping.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `text` under a fresh UUID v4 and return that identifier.
    pub async fn insert(&self, text: &str) -> String {
        let id = Uuid::new_v4().to_string();
        self.documents
            .write()
            .await
            .insert(id.clone(), text.to_string());
        id
    }

    /// Look up a previously inserted document.
    pub async fn lookup(&self, id: &str) -> Option<String> {
        self.documents.read().await.get(id).cloned()
    }

    /// Number of documents currently held.
    pub async fn document_count(&self) -> usize {
        self.documents.read().await.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn put(&self, text: &str) -> Result<String, StoreError> {
        Ok(self.insert(text).await)
    }

    async fn get(&self, id: &str) -> Result<Option<String>, StoreError> {
        Ok(self.lookup(id).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn stores_and_returns_text() {
        let store = MemoryStore::new();
        let id = store.insert("hello").await;

        assert!(Uuid::parse_str(&id).is_ok());
        assert_eq!(store.lookup(&id).await.as_deref(), Some("hello"));
        assert_eq!(store.lookup("missing").await, None);
    }

    #[tokio::test]
    async fn concurrent_inserts_get_distinct_ids() {
        let store = Arc::new(MemoryStore::new());
        let mut handles = Vec::new();
        for index in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                store.insert(&format!("document {index}")).await
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.expect("insert task"));
        }
        ids.sort();
        ids.dedup();

        assert_eq!(ids.len(), 32);
        assert_eq!(store.document_count().await, 32);
    }
}
