use async_trait::async_trait;
use futures::TryStreamExt;
use bson::{Document as BsonDocument, Bson, doc};
use mongodb::{
    Client, Collection as MongoCollection,
    options::ClientOptions,
};
use tracing::debug;
use tracker_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::DocumentKey,
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Query, QueryVisitor},
};

use crate::{sanitizer::KeySanitizer, query::MongoQueryTranslator};

const KEY_FIELD: &str = "_id";

fn backend_error(err: mongodb::error::Error) -> DocumentStoreError {
    DocumentStoreError::Backend(err.to_string())
}


#[derive(Debug)]
pub struct MongoDbStore {
    client: Client,
    database: String,
}

impl MongoDbStore {
    pub fn new(client: Client, database: String) -> Self {
        Self { client, database }
    }

    pub fn builder(dsn: &str, database: &str) -> MongoDbStoreBuilder {
        MongoDbStoreBuilder::new(dsn, database)
    }

    fn get_collection(&self, collection_name: &str) -> MongoCollection<BsonDocument> {
        self.client
            .database(&self.database)
            .collection(&KeySanitizer::sanitize_string(collection_name))
    }

    /// Filter selecting one collection by name in `listCollections`.
    fn collection_filter(collection_name: &str) -> BsonDocument {
        doc! { "name": KeySanitizer::sanitize_string(collection_name) }
    }

    /// Escapes field names and stores the key in `_id`.
    fn prepare_document(&self, key: &DocumentKey, document: &Bson) -> DocumentStoreResult<BsonDocument> {
        let fields = document
            .as_document()
            .ok_or_else(|| DocumentStoreError::InvalidDocument("Expected document".into()))?;

        let mut prepared = doc! { KEY_FIELD: key.as_str() };
        for (field, value) in KeySanitizer::sanitize_document(fields) {
            prepared.insert(field, value);
        }

        Ok(prepared)
    }

    /// Splits `_id` back out of a stored document and restores its field names.
    fn restore_document(&self, mut document: BsonDocument) -> DocumentStoreResult<(DocumentKey, Bson)> {
        let key = match document.remove(KEY_FIELD) {
            Some(Bson::String(key)) => DocumentKey::from(key),
            Some(Bson::ObjectId(oid)) => DocumentKey::from(oid.to_hex()),
            Some(other) => DocumentKey::from(other.to_string()),
            None => return Err(DocumentStoreError::InvalidDocument("Stored document has no _id".into())),
        };

        Ok((key, Bson::Document(KeySanitizer::restore_document(&document))))
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.client.shutdown().await;

        Ok(())
    }
}

#[async_trait]
impl StoreBackend for MongoDbStore {
    async fn add_document(&self, document: Bson, collection: &str) -> DocumentStoreResult<DocumentKey> {
        let key = DocumentKey::generate();

        self.get_collection(collection)
            .insert_one(self.prepare_document(&key, &document)?)
            .await
            .map_err(backend_error)?;
        debug!(%key, collection, "added document");

        Ok(key)
    }

    async fn set_document(&self, key: &DocumentKey, document: Bson, collection: &str) -> DocumentStoreResult<()> {
        self.get_collection(collection)
            .replace_one(
                doc! { KEY_FIELD: key.as_str() },
                self.prepare_document(key, &document)?,
            )
            .upsert(true)
            .await
            .map_err(backend_error)?;
        debug!(%key, collection, "set document");

        Ok(())
    }

    async fn update_fields(&self, key: &DocumentKey, fields: BsonDocument, collection: &str) -> DocumentStoreResult<()> {
        let result = self.get_collection(collection)
            .update_one(
                doc! { KEY_FIELD: key.as_str() },
                doc! { "$set": KeySanitizer::sanitize_document(&fields) },
            )
            .await
            .map_err(backend_error)?;

        if result.matched_count == 0 {
            return Err(DocumentStoreError::DocumentNotFound(key.to_string(), collection.to_string()));
        }
        debug!(%key, collection, "updated document");

        Ok(())
    }

    async fn delete_document(&self, key: &DocumentKey, collection: &str) -> DocumentStoreResult<()> {
        let result = self.get_collection(collection)
            .delete_one(doc! { KEY_FIELD: key.as_str() })
            .await
            .map_err(backend_error)?;
        debug!(%key, collection, removed = result.deleted_count > 0, "deleted document");

        Ok(())
    }

    async fn get_document(&self, key: &DocumentKey, collection: &str) -> DocumentStoreResult<Option<Bson>> {
        self.get_collection(collection)
            .find_one(doc! { KEY_FIELD: key.as_str() })
            .await
            .map_err(backend_error)?
            .map(|document| self.restore_document(document).map(|(_, document)| document))
            .transpose()
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<(DocumentKey, Bson)>> {
        let filter = match &query.filter {
            Some(expr) => MongoQueryTranslator.visit_expr(expr)?,
            None => doc! {},
        };

        self.get_collection(collection)
            .find(filter)
            .await
            .map_err(backend_error)?
            .try_collect::<Vec<BsonDocument>>()
            .await
            .map_err(backend_error)?
            .into_iter()
            .map(|document| self.restore_document(document))
            .collect()
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.client
                .database(&self.database)
                .list_collection_names()
                .await
                .map_err(backend_error)?
                .iter()
                .map(|name| KeySanitizer::restore_string(name))
                .collect()
        )
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        // The driver treats dropping a missing collection as success.
        let existing = self.client
            .database(&self.database)
            .list_collection_names()
            .filter(Self::collection_filter(name))
            .await
            .map_err(backend_error)?;

        if existing.is_empty() {
            return Err(DocumentStoreError::CollectionNotFound(name.to_string()));
        }

        self.get_collection(name)
            .drop()
            .await
            .map_err(backend_error)?;
        debug!(collection = name, "dropped collection");

        Ok(())
    }

    async fn shutdown(self) -> DocumentStoreResult<()> {
        self.shutdown().await
    }
}

pub struct MongoDbStoreBuilder {
    dsn: String,
    database: String,
}

impl MongoDbStoreBuilder {
    pub fn new(dsn: &str, database: &str) -> Self {
        Self {
            dsn: dsn.to_string(),
            database: database.to_string(),
        }
    }
}

#[async_trait]
impl StoreBackendBuilder for MongoDbStoreBuilder {
    type Backend = MongoDbStore;

    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(MongoDbStore::new(
            Client::with_options(
                ClientOptions::parse(&self.dsn)
                    .await
                    .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            )
            .map_err(|e| DocumentStoreError::Initialization(e.to_string()))?,
            self.database,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::oid::ObjectId;

    // Building a client does not connect, so these run without a server.
    async fn store() -> MongoDbStore {
        let client = Client::with_uri_str("mongodb://localhost:27017").await.unwrap();

        MongoDbStore::new(client, "patient-tracker".to_string())
    }

    #[tokio::test]
    async fn test_key_is_stored_in_id_and_stripped_on_read() {
        let store = store().await;
        let key = DocumentKey::from("patient-1");
        let patient = Bson::Document(doc! {
            "ID": 1_i64,
            "name": "Grace",
            "illnesses": ["Influenza", "Migraine"],
            "dr.notes": "rest",
        });

        let prepared = store.prepare_document(&key, &patient).unwrap();
        assert_eq!(prepared.get_str("_id").unwrap(), "patient-1");
        assert_eq!(prepared.get_str("dr__dot__notes").unwrap(), "rest");
        assert!(!prepared.contains_key("dr.notes"));

        let (restored_key, restored) = store.restore_document(prepared).unwrap();
        assert_eq!(restored_key, key);
        assert_eq!(restored, patient);
    }

    #[tokio::test]
    async fn test_object_id_keys_read_back_as_hex() {
        let store = store().await;
        let oid = ObjectId::new();

        let (key, document) = store
            .restore_document(doc! { "_id": oid, "ID": 0_i64, "name": "Alan" })
            .unwrap();

        assert_eq!(key.as_str(), oid.to_hex());
        assert_eq!(document, Bson::Document(doc! { "ID": 0_i64, "name": "Alan" }));
    }

    #[tokio::test]
    async fn test_rejects_non_documents_and_missing_ids() {
        let store = store().await;

        assert!(matches!(
            store.prepare_document(&DocumentKey::from("patient-0"), &Bson::String("Ada".into())),
            Err(DocumentStoreError::InvalidDocument(_))
        ));
        assert!(matches!(
            store.restore_document(doc! { "name": "Ada" }),
            Err(DocumentStoreError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_collection_filter_uses_stored_name() {
        assert_eq!(MongoDbStore::collection_filter("patient-data"), doc! { "name": "patient-data" });
        assert_eq!(MongoDbStore::collection_filter("ward.north"), doc! { "name": "ward__dot__north" });
    }
}
