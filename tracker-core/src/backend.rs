//! Storage backend abstraction for the document store.
//!
//! # Overview
//!
//! The [`StoreBackend`] trait provides a unified async interface for the single-document
//! operations the tracker performs (add, set, update, delete, point read) plus filtered
//! queries and collection administration. Implementations are required to be thread-safe
//! (`Send + Sync`); every request is independent of every other.
//!
//! # Traits
//!
//! - [`StoreBackend`]: The core trait for storage backends
//! - [`DynStoreBackend`]: A trait for dynamic dispatch over backend implementations
//! - [`StoreBackendBuilder`]: Factory trait for creating backend instances
//!
//! # Examples
//!
//! ```ignore
//! use tracker_core::backend::StoreBackend;
//! use bson::{Bson, doc};
//!
//! let backend = MyBackendImpl::new();
//! let key = backend
//!     .add_document(Bson::Document(doc! { "name": "Ada" }), "patient-data")
//!     .await?;
//! ```

use async_trait::async_trait;
use bson::{Bson, Document as BsonDocument};
use std::fmt::Debug;

use crate::{document::DocumentKey, error::DocumentStoreResult, query::Query};

/// Abstract interface for document storage backends.
///
/// # Thread Safety
///
/// All implementations must be thread-safe and support concurrent access from multiple
/// async tasks. Requests may complete in any order relative to each other.
///
/// # Error Handling
///
/// Operations return [`DocumentStoreResult<T>`](crate::error::DocumentStoreResult).
/// Transport failures are reported as
/// [`DocumentStoreError::Backend`](crate::error::DocumentStoreError::Backend).
#[async_trait]
pub trait StoreBackend: Send + Sync + Debug {
    /// Stores a new document under a freshly generated key and returns that key.
    ///
    /// The collection is created implicitly if it does not exist. No duplicate detection
    /// is performed on the document's contents.
    async fn add_document(&self, document: Bson, collection: &str) -> DocumentStoreResult<DocumentKey>;

    /// Creates or overwrites the document stored under `key`.
    async fn set_document(
        &self,
        key: &DocumentKey,
        document: Bson,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Merges `fields` into the top level of an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentNotFound`](crate::error::DocumentStoreError::DocumentNotFound)
    /// if no document is stored under `key`.
    async fn update_fields(
        &self,
        key: &DocumentKey,
        fields: BsonDocument,
        collection: &str,
    ) -> DocumentStoreResult<()>;

    /// Removes the document stored under `key`.
    ///
    /// Deleting a document (or collection) that does not exist succeeds, so the operation
    /// may safely be repeated.
    async fn delete_document(&self, key: &DocumentKey, collection: &str) -> DocumentStoreResult<()>;

    /// Fetches the document stored under `key`, or `None` if there is none.
    async fn get_document(&self, key: &DocumentKey, collection: &str) -> DocumentStoreResult<Option<Bson>>;

    /// Returns every document in `collection` matching the query, with its key.
    ///
    /// The order of the results is unspecified. A missing collection yields no documents.
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<(DocumentKey, Bson)>>;

    /// Lists the names of all collections in the store.
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;

    /// Drops a collection and all its documents.
    ///
    /// # Errors
    ///
    /// Returns [`CollectionNotFound`](crate::error::DocumentStoreError::CollectionNotFound)
    /// if the backend can tell the collection does not exist.
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;

    /// Cleanly shuts down the backend, releasing all resources.
    ///
    /// The default implementation is a no-op.
    async fn shutdown(self) -> DocumentStoreResult<()>
    where
        Self: Sized,
    {
        Ok(())
    }
}

#[async_trait]
pub trait DynStoreBackend: Send + Sync + Debug {
    async fn add_document(&self, document: Bson, collection: &str) -> DocumentStoreResult<DocumentKey>;
    async fn set_document(
        &self,
        key: &DocumentKey,
        document: Bson,
        collection: &str,
    ) -> DocumentStoreResult<()>;
    async fn update_fields(
        &self,
        key: &DocumentKey,
        fields: BsonDocument,
        collection: &str,
    ) -> DocumentStoreResult<()>;
    async fn delete_document(&self, key: &DocumentKey, collection: &str) -> DocumentStoreResult<()>;
    async fn get_document(&self, key: &DocumentKey, collection: &str) -> DocumentStoreResult<Option<Bson>>;
    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<(DocumentKey, Bson)>>;
    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>>;
    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()>;
    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()>;
}

#[async_trait]
impl<B: StoreBackend + Send + Sync + 'static> DynStoreBackend for B {
    async fn add_document(&self, document: Bson, collection: &str) -> DocumentStoreResult<DocumentKey> {
        <B as StoreBackend>::add_document(self, document, collection).await
    }

    async fn set_document(
        &self,
        key: &DocumentKey,
        document: Bson,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        <B as StoreBackend>::set_document(self, key, document, collection)
            .await
    }

    async fn update_fields(
        &self,
        key: &DocumentKey,
        fields: BsonDocument,
        collection: &str,
    ) -> DocumentStoreResult<()> {
        <B as StoreBackend>::update_fields(self, key, fields, collection)
            .await
    }

    async fn delete_document(&self, key: &DocumentKey, collection: &str) -> DocumentStoreResult<()> {
        <B as StoreBackend>::delete_document(self, key, collection).await
    }

    async fn get_document(&self, key: &DocumentKey, collection: &str) -> DocumentStoreResult<Option<Bson>> {
        <B as StoreBackend>::get_document(self, key, collection).await
    }

    async fn query_documents(
        &self,
        query: Query,
        collection: &str,
    ) -> DocumentStoreResult<Vec<(DocumentKey, Bson)>> {
        <B as StoreBackend>::query_documents(self, query, collection)
            .await
    }

    async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        <B as StoreBackend>::list_collections(self).await
    }

    async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        <B as StoreBackend>::drop_collection(self, name).await
    }

    async fn shutdown_boxed(self: Box<Self>) -> DocumentStoreResult<()> {
        <B as StoreBackend>::shutdown(*self).await
    }
}

#[async_trait]
pub trait StoreBackendBuilder {
    type Backend: StoreBackend;

    async fn build(self) -> DocumentStoreResult<Self::Backend>;
}
