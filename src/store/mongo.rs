//! MongoDB-backed primary store.

use super::{DocumentStore, StoreError};
use crate::config::DatabaseSettings;
use async_trait::async_trait;
use mongodb::{
    Client, Collection,
    bson::{Document, doc, oid::ObjectId},
    options::ClientOptions,
};

const TEXT_FIELD: &str = "text";

/// Durable store writing `{ text }` records to a MongoDB collection.
///
/// Identifiers are the hex form of the record's `ObjectId`.
pub struct MongoStore {
    collection: Collection<Document>,
}

impl MongoStore {
    /// Parse the connection settings and build a driver handle.
    ///
    /// The driver connects lazily, so this only fails on malformed settings or SRV lookup
    /// errors. Unreachable servers surface later as per-operation errors.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(settings.connection_uri()).await?;
        options.server_selection_timeout = Some(settings.timeout);
        options.app_name = Some("docqa".to_string());
        let client = Client::with_options(options)?;
        let collection = client
            .database(&settings.database)
            .collection::<Document>(&settings.collection);

        tracing::debug!(
            host = %settings.host,
            database = %settings.database,
            collection = %settings.collection,
            "Initialized MongoDB client"
        );

        Ok(Self { collection })
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn put(&self, text: &str) -> Result<String, StoreError> {
        let result = self.collection.insert_one(doc! { TEXT_FIELD: text }).await?;
        result
            .inserted_id
            .as_object_id()
            .map(|id| id.to_hex())
            .ok_or_else(|| StoreError::Malformed {
                id: result.inserted_id.to_string(),
                reason: "inserted id is not an ObjectId".into(),
            })
    }

    async fn get(&self, id: &str) -> Result<Option<String>, StoreError> {
        // Fallback ids are UUIDs and can never match a record here.
        let Ok(object_id) = ObjectId::parse_str(id) else {
            return Ok(None);
        };

        let Some(record) = self.collection.find_one(doc! { "_id": object_id }).await? else {
            return Ok(None);
        };

        record
            .get_str(TEXT_FIELD)
            .map(|text| Some(text.to_string()))
            .map_err(|error| StoreError::Malformed {
                id: id.to_string(),
                reason: error.to_string(),
            })
    }
}
