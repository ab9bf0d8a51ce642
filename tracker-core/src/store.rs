//! Main document store interface for interacting with document backends.
//!
//! - [`DocumentStore`] - Typed store for working with a specific backend implementation
//! - [`DynDocumentStore`] - Dynamic dispatch store for runtime backend selection
//!
//! # Example
//!
//! ```ignore
//! use tracker_core::store::{DocumentStore, IntoDynDocumentStore};
//!
//! let store = DocumentStore::new(backend);
//! let patients = store.typed_collection::<Patient>();
//!
//! // Pick the backend at runtime instead
//! let store = store.into_dyn();
//! ```

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    collection::{DynTypedCollection, TypedCollection},
    document::Document,
    error::DocumentStoreResult,
};

/// A strongly-typed document store bound to a specific backend implementation.
///
/// # Type Parameters
///
/// * `B` - The backend implementation type
#[derive(Debug)]
pub struct DocumentStore<B: StoreBackend> {
    backend: B,
}

impl<B: StoreBackend> DocumentStore<B> {
    /// Creates a new document store with the given backend.
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Gets a typed collection named by the document type's `collection_name()`.
    pub fn typed_collection<'a, D: Document>(&'a self) -> TypedCollection<'a, B, D> {
        TypedCollection::new(D::collection_name().to_string(), &self.backend)
    }

    /// Gets a typed collection with an explicit name.
    pub fn typed_collection_named<'a, D: Document>(&'a self, name: &str) -> TypedCollection<'a, B, D> {
        TypedCollection::new(name.to_string(), &self.backend)
    }

    /// Lists all collections in the store.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Drops (deletes) a collection with the given name.
    ///
    /// # Errors
    ///
    /// Returns an error if the collection does not exist or deletion fails.
    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend.drop_collection(name).await
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown().await?;

        Ok(())
    }
}

#[derive(Debug)]
pub struct DynDocumentStore {
    backend: Box<dyn DynStoreBackend>,
}

impl DynDocumentStore {
    /// Creates a new dynamic document store with the given backend trait object.
    pub fn new(backend: Box<dyn DynStoreBackend>) -> Self {
        Self { backend }
    }

    /// Gets a typed collection named by the document type's `collection_name()`.
    pub fn typed_collection<'a, D: Document>(&'a self) -> DynTypedCollection<'a, D> {
        DynTypedCollection::new(D::collection_name().to_string(), &*self.backend)
    }

    /// Gets a typed collection with an explicit name.
    pub fn typed_collection_named<'a, D: Document>(&'a self, name: &str) -> DynTypedCollection<'a, D> {
        DynTypedCollection::new(name.to_string(), &*self.backend)
    }

    /// Lists all collections in the store.
    pub async fn list_collections(&self) -> DocumentStoreResult<Vec<String>> {
        self.backend.list_collections().await
    }

    /// Drops (deletes) a collection with the given name.
    pub async fn drop_collection(&self, name: &str) -> DocumentStoreResult<()> {
        self.backend.drop_collection(name).await
    }

    /// Shuts down the store and releases backend resources.
    pub async fn shutdown(self) -> DocumentStoreResult<()> {
        self.backend.shutdown_boxed().await
    }
}

/// Conversion trait for converting a document store into a dynamic owned store.
pub trait IntoDynDocumentStore {
    /// Converts this store into a dynamic owned store.
    fn into_dyn(self) -> DynDocumentStore;
}

impl<B: StoreBackend + 'static> IntoDynDocumentStore for DocumentStore<B> {
    fn into_dyn(self) -> DynDocumentStore {
        DynDocumentStore::new(Box::new(self.backend))
    }
}

impl IntoDynDocumentStore for DynDocumentStore {
    fn into_dyn(self) -> DynDocumentStore {
        self
    }
}
