//! In-memory storage implementation for document stores.
//!
//! Documents are held as BSON values in nested HashMaps behind an async-aware
//! read-write lock.

use std::{collections::HashMap, sync::Arc};
use async_trait::async_trait;
use mea::rwlock::RwLock;
use bson::{Bson, Document as BsonDocument};
use tracing::debug;

use tracker_core::{
    backend::{StoreBackend, StoreBackendBuilder},
    document::DocumentKey,
    error::{DocumentStoreError, DocumentStoreResult},
    query::Query,
};

use crate::evaluator::DocumentEvaluator;

type CollectionMap = HashMap<String, Bson>;
type StoreMap = HashMap<String, CollectionMap>;


/// Thread-safe in-memory document storage backend.
///
/// `InMemoryStore` is cloneable and uses an `Arc`-wrapped internal state, so clones share
/// the same underlying data. Collections spring into existence on their first write.
///
/// Queries scan every document in the collection; there is no indexing.
///
/// # Example
///
/// ```ignore
/// use tracker_memory::InMemoryStore;
/// use tracker_core::backend::StoreBackend;
/// use bson::{Bson, doc};
///
/// let store = InMemoryStore::new();
/// let key = store.add_document(Bson::Document(doc! { "name": "Ada" }), "patient-data").await?;
/// assert!(store.get_document(&key, "patient-data").await?.is_some());
/// ```
#[derive(Default, Clone, Debug)]
pub struct InMemoryStore {
    /// collection_name -> (document_key -> document)
    store: Arc<RwLock<StoreMap>>,
}

impl InMemoryStore {
    /// Creates a new empty in-memory document store.
    pub fn new() -> Self {
        Self {
            store: Arc::new(RwLock::new(StoreMap::new())),
        }
    }

    /// Creates a builder for constructing an `InMemoryStore`.
    pub fn builder() -> InMemoryStoreBuilder {
        InMemoryStoreBuilder::default()
    }

    fn ensure_document(document: Bson) -> DocumentStoreResult<Bson> {
        match document {
            Bson::Document(_) => Ok(document),
            other => Err(DocumentStoreError::InvalidDocument(
                format!("expected a document, got {:?}", other.element_type()),
            )),
        }
    }
}


#[async_trait]
impl StoreBackend for InMemoryStore {
    async fn add_document(&self, document: Bson, collection: &str) -> DocumentStoreResult<DocumentKey> {
        let document = Self::ensure_document(document)?;
        let mut store = self.store.write().await;
        let collection_map = store
            .entry(collection.to_string())
            .or_default();

        let mut key = DocumentKey::generate();
        while collection_map.contains_key(key.as_str()) {
            key = DocumentKey::generate();
        }

        collection_map.insert(key.to_string(), document);
        debug!(%key, collection, "added document");

        Ok(key)
    }

    async fn set_document(&self, key: &DocumentKey, document: Bson, collection: &str) -> DocumentStoreResult<()> {
        let document = Self::ensure_document(document)?;

        self.store
            .write()
            .await
            .entry(collection.to_string())
            .or_default()
            .insert(key.to_string(), document);
        debug!(%key, collection, "set document");

        Ok(())
    }

    async fn update_fields(&self, key: &DocumentKey, fields: BsonDocument, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;
        let document = store
            .get_mut(collection)
            .and_then(|collection_map| collection_map.get_mut(key.as_str()))
            .and_then(Bson::as_document_mut)
            .ok_or_else(|| DocumentStoreError::DocumentNotFound(key.to_string(), collection.to_string()))?;

        for (field, value) in fields {
            document.insert(field, value);
        }
        debug!(%key, collection, "updated document");

        Ok(())
    }

    async fn delete_document(&self, key: &DocumentKey, collection: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;

        let removed = store
            .get_mut(collection)
            .and_then(|collection_map| collection_map.remove(key.as_str()))
            .is_some();
        debug!(%key, collection, removed, "deleted document");

        Ok(())
    }

    async fn get_document(&self, key: &DocumentKey, collection: &str) -> DocumentStoreResult<Option<Bson>> {
        Ok(
            self.store
                .read()
                .await
                .get(collection)
                .and_then(|collection_map| collection_map.get(key.as_str()))
                .cloned()
        )
    }

    async fn query_documents(&self, query: Query, collection: &str) -> DocumentStoreResult<Vec<(DocumentKey, Bson)>> {
        let store = self.store.read().await;
        let collection_map = match store.get(collection) {
            Some(col) => col,
            None => return Ok(vec![]),
        };

        let keys = match &query.filter {
            Some(filter) => DocumentEvaluator::matching_keys(collection_map.iter(), filter)?,
            None => collection_map
                .keys()
                .cloned()
                .collect::<Vec<_>>(),
        };

        Ok(
            keys
                .into_iter()
                .filter_map(|key| {
                    collection_map
                        .get(&key)
                        .cloned()
                        .map(|document| (DocumentKey::from(key), document))
                })
                .collect()
        )
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        Ok(
            self.store
                .read()
                .await
                .keys()
                .cloned()
                .collect()
        )
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        let mut store = self.store.write().await;

        if store.remove(name).is_none() {
            return Err(DocumentStoreError::CollectionNotFound(name.to_string()));
        }

        Ok(())
    }
}


/// Builder for constructing [`InMemoryStore`] instances.
#[derive(Default)]
pub struct InMemoryStoreBuilder;

#[async_trait]
impl StoreBackendBuilder for InMemoryStoreBuilder {
    type Backend = InMemoryStore;

    /// Builds and returns a new, empty [`InMemoryStore`].
    async fn build(self) -> DocumentStoreResult<Self::Backend> {
        Ok(InMemoryStore::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use serde::{Deserialize, Serialize};
    use tracker_core::{
        document::Document,
        query::Filter,
        store::{DocumentStore, IntoDynDocumentStore},
    };

    const COLLECTION: &str = "patient-data";

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Record {
        #[serde(rename = "ID")]
        id: i64,
        name: String,
    }

    impl Document for Record {
        fn collection_name() -> &'static str {
            COLLECTION
        }
    }

    fn record(id: i64, name: &str) -> Record {
        Record { id, name: name.to_string() }
    }

    #[tokio::test]
    async fn test_add_assigns_distinct_keys() {
        let store = DocumentStore::new(InMemoryStore::new());
        let records = store.typed_collection::<Record>();

        let first = records.add(&record(1, "Ada")).await.unwrap();
        let second = records.add(&record(1, "Ada")).await.unwrap();

        assert_ne!(first, second);
        assert_eq!(records.get(&first).await.unwrap(), Some(record(1, "Ada")));
        assert_eq!(records.query(Query::new()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_get_missing_key_is_none() {
        let store = DocumentStore::new(InMemoryStore::new());
        let records = store.typed_collection::<Record>();

        assert_eq!(records.get(&DocumentKey::from("patient-0")).await.unwrap(), None);

        records.set(&DocumentKey::from("patient-1"), &record(1, "Ada")).await.unwrap();
        assert_eq!(records.get(&DocumentKey::from("patient-0")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_field_merges_into_existing_document() {
        let store = DocumentStore::new(InMemoryStore::new());
        let records = store.typed_collection::<Record>();
        let key = DocumentKey::from("patient-1");

        records.set(&key, &record(1, "Ada")).await.unwrap();
        records.update_field(&key, "ID", 10_i64).await.unwrap();

        assert_eq!(records.get(&key).await.unwrap(), Some(record(10, "Ada")));
    }

    #[tokio::test]
    async fn test_update_missing_document_fails() {
        let backend = InMemoryStore::new();
        let key = DocumentKey::from("patient-1");

        // No collection yet
        let result = backend.update_fields(&key, doc! { "ID": 10 }, COLLECTION).await;
        assert!(matches!(result, Err(DocumentStoreError::DocumentNotFound(..))));

        // Collection exists, key does not
        backend
            .set_document(&DocumentKey::from("patient-0"), Bson::Document(doc! { "ID": 0 }), COLLECTION)
            .await
            .unwrap();
        let result = backend.update_fields(&key, doc! { "ID": 10 }, COLLECTION).await;
        assert!(matches!(result, Err(DocumentStoreError::DocumentNotFound(k, c)) if k == "patient-1" && c == COLLECTION));
    }

    #[tokio::test]
    async fn test_delete_twice_succeeds() {
        let store = DocumentStore::new(InMemoryStore::new());
        let records = store.typed_collection::<Record>();
        let key = DocumentKey::from("patient-2");

        records.set(&key, &record(2, "Grace")).await.unwrap();

        records.delete(&key).await.unwrap();
        records.delete(&key).await.unwrap();
        assert_eq!(records.get(&key).await.unwrap(), None);

        // Never-created collection
        store
            .typed_collection_named::<Record>("elsewhere")
            .delete(&key)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_query_filters_by_numeric_id() {
        let store = DocumentStore::new(InMemoryStore::new());
        let records = store.typed_collection::<Record>();

        records.set(&DocumentKey::from("patient-0"), &record(0, "Alan")).await.unwrap();
        records.set(&DocumentKey::from("patient-1"), &record(1, "Ada")).await.unwrap();
        records.add(&record(1, "Ada Again")).await.unwrap();

        let matched = records.query(Query::filtered(Filter::eq("ID", 1))).await.unwrap();
        assert_eq!(matched.len(), 2);
        assert!(matched.iter().all(|snapshot| snapshot.data.id == 1));

        let by_text = records.query(Query::filtered(Filter::eq("ID", "1"))).await.unwrap();
        assert!(by_text.is_empty(), "text filter must not match numeric IDs");
    }

    #[tokio::test]
    async fn test_query_missing_collection_is_empty() {
        let backend = InMemoryStore::new();

        let documents = backend
            .query_documents(Query::filtered(Filter::eq("ID", 1)), COLLECTION)
            .await
            .unwrap();

        assert!(documents.is_empty());
    }

    #[tokio::test]
    async fn test_rejects_non_document_values() {
        let backend = InMemoryStore::new();

        let result = backend.add_document(Bson::String("Ada".into()), COLLECTION).await;
        assert!(matches!(result, Err(DocumentStoreError::InvalidDocument(_))));
    }

    #[tokio::test]
    async fn test_collections_and_dyn_store() {
        let store = DocumentStore::new(InMemoryStore::builder().build().await.unwrap()).into_dyn();
        let records = store.typed_collection::<Record>();

        records.add(&record(3, "Edsger")).await.unwrap();
        assert_eq!(store.list_collections().await.unwrap(), vec![COLLECTION.to_string()]);

        store.drop_collection(COLLECTION).await.unwrap();
        assert!(store.list_collections().await.unwrap().is_empty());
        assert!(matches!(
            store.drop_collection(COLLECTION).await,
            Err(DocumentStoreError::CollectionNotFound(_))
        ));

        store.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let backend = InMemoryStore::new();
        let clone = backend.clone();

        let key = backend
            .add_document(Bson::Document(doc! { "ID": 4 }), COLLECTION)
            .await
            .unwrap();

        assert!(clone.get_document(&key, COLLECTION).await.unwrap().is_some());
    }
}
