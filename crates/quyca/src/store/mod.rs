//! Document store access.
//!
//! Services talk to a [`Store`] rather than to the driver directly, so the
//! statistics layer can be exercised against canned aggregation results.

mod ext;

pub use ext::DocExt;

use bson::{Bson, Document, doc, oid::ObjectId};
use futures::TryStreamExt;
use mongodb::{Client, Database};
use serde::de::DeserializeOwned;

use crate::config::Config;
use crate::error::{StoreError, StoreResult};

/// Read access to the KAHI collections.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    /// Fetch a single document.
    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>>;

    /// Run an aggregation pipeline and collect every result.
    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> StoreResult<Vec<Document>>;

    /// Check connectivity.
    async fn ping(&self) -> StoreResult<()>;
}

/// Identifier value as stored: an ObjectId when the string is 24 hex digits.
#[must_use]
pub fn id_value(id: &str) -> Bson {
    ObjectId::parse_str(id).map_or_else(|_| Bson::String(id.to_string()), Bson::ObjectId)
}

/// Identifier list as stored.
#[must_use]
pub fn id_values<I, S>(ids: I) -> Vec<Bson>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    ids.into_iter().map(|id| id_value(id.as_ref())).collect()
}

/// Fetch a document by `_id` and decode it.
pub async fn get_by_id<T: DeserializeOwned>(
    store: &dyn Store,
    collection: &str,
    id: &str,
) -> StoreResult<T> {
    if id.trim().is_empty() {
        return Err(StoreError::InvalidId(id.to_string()));
    }
    let document = store
        .find_one(collection, doc! { "_id": id_value(id) })
        .await?
        .ok_or_else(|| StoreError::not_found(collection, id))?;
    Ok(bson::from_document(document)?)
}

/// MongoDB-backed store.
#[derive(Clone)]
pub struct MongoStore {
    db: Database,
}

impl MongoStore {
    /// Connect using the configured URI and database.
    ///
    /// # Errors
    ///
    /// Returns error if the URI is invalid or the client cannot be created.
    pub async fn connect(config: &Config) -> StoreResult<Self> {
        let client = Client::with_uri_str(&config.mongo_uri).await?;
        tracing::info!(database = %config.database, "Connected MongoDB client");
        Ok(Self { db: client.database(&config.database) })
    }
}

#[async_trait::async_trait]
impl Store for MongoStore {
    async fn find_one(&self, collection: &str, filter: Document) -> StoreResult<Option<Document>> {
        Ok(self.db.collection::<Document>(collection).find_one(filter).await?)
    }

    async fn aggregate(&self, collection: &str, pipeline: Vec<Document>) -> StoreResult<Vec<Document>> {
        tracing::debug!(collection, stages = pipeline.len(), "Running aggregation");
        let cursor = self.db.collection::<Document>(collection).aggregate(pipeline).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn ping(&self) -> StoreResult<()> {
        self.db.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }
}

impl std::fmt::Debug for MongoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoStore").field("database", &self.db.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_value() {
        let hex = "65a1b2c3d4e5f60718293a4b";
        assert!(matches!(id_value(hex), Bson::ObjectId(_)));
        assert_eq!(id_value("W12345"), Bson::String("W12345".into()));
        assert_eq!(id_values(["a", "b"]).len(), 2);
    }
}
