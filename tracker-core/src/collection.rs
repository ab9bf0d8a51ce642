//! Collection types for document store operations.
//!
//! A collection handle binds a collection name to a backend and a [`Document`] type, and
//! exposes the single-document operations in terms of that type.
//!
//! # Collection Types
//!
//! - [`TypedCollection`] - Type-safe collection over a statically known backend
//! - [`DynTypedCollection`] - The same over a dynamically dispatched backend
//!
//! # Example
//!
//! ```ignore
//! use tracker_core::document::Document;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Ward {
//!     pub name: String,
//! }
//!
//! impl Document for Ward {
//!     fn collection_name() -> &'static str { "wards" }
//! }
//!
//! let wards = store.typed_collection::<Ward>();
//! let key = wards.add(&Ward { name: "North".into() }).await?;
//! let ward = wards.get(&key).await?;
//! ```

use bson::{Bson, Document as BsonDocument, doc};
use std::marker::PhantomData;

use crate::{
    backend::{DynStoreBackend, StoreBackend},
    document::{Document, DocumentExt, DocumentKey, DocumentSnapshot},
    error::DocumentStoreResult,
    query::Query,
};

fn decode_snapshots<D: Document>(
    documents: Vec<(DocumentKey, Bson)>,
) -> DocumentStoreResult<Vec<DocumentSnapshot<D>>> {
    documents
        .into_iter()
        .map(|(key, bson)| D::from_bson(bson).map(|data| DocumentSnapshot::new(key, data)))
        .collect()
}

fn single_field(field: &str, value: Bson) -> BsonDocument {
    doc! { field: value }
}

#[derive(Debug)]
pub struct TypedCollection<'a, B: StoreBackend, D: Document> {
    name: String,
    backend: &'a B,
    _marker: PhantomData<D>,
}

impl<'a, B: StoreBackend, D: Document> TypedCollection<'a, B, D> {
    pub(crate) fn new(name: String, backend: &'a B) -> Self {
        Self { name, backend, _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores a new document under a store-assigned key.
    ///
    /// # Errors
    ///
    /// Returns a [`DocumentStoreError`](crate::error::DocumentStoreError) if serialization
    /// or the write fails.
    pub async fn add(&self, document: &D) -> DocumentStoreResult<DocumentKey> {
        self.backend
            .add_document(document.to_bson()?, self.name())
            .await
    }

    /// Creates or overwrites the document stored under `key`.
    pub async fn set(&self, key: &DocumentKey, document: &D) -> DocumentStoreResult<()> {
        self.backend
            .set_document(key, document.to_bson()?, self.name())
            .await
    }

    /// Sets a single top-level field of an existing document.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentNotFound`](crate::error::DocumentStoreError::DocumentNotFound) if
    /// no document is stored under `key`.
    pub async fn update_field(
        &self,
        key: &DocumentKey,
        field: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<()> {
        self.backend
            .update_fields(key, single_field(field, value.into()), self.name())
            .await
    }

    /// Removes the document stored under `key`. Succeeds if it is already gone.
    pub async fn delete(&self, key: &DocumentKey) -> DocumentStoreResult<()> {
        self.backend
            .delete_document(key, self.name())
            .await
    }

    /// Fetches and decodes the document stored under `key`.
    ///
    /// # Returns
    ///
    /// `Ok(None)` if the document does not exist.
    pub async fn get(&self, key: &DocumentKey) -> DocumentStoreResult<Option<D>> {
        self.backend
            .get_document(key, self.name())
            .await?
            .map(D::from_bson)
            .transpose()
    }

    /// Returns every document matching the query, paired with its key.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<DocumentSnapshot<D>>> {
        decode_snapshots(
            self.backend
                .query_documents(query, self.name())
                .await?,
        )
    }
}

#[derive(Debug)]
pub struct DynTypedCollection<'a, D: Document> {
    name: String,
    backend: &'a dyn DynStoreBackend,
    _marker: PhantomData<D>,
}

impl<'a, D: Document> DynTypedCollection<'a, D> {
    pub(crate) fn new(name: String, backend: &'a dyn DynStoreBackend) -> Self {
        Self { name, backend, _marker: PhantomData }
    }

    /// Returns the name of this collection.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores a new document under a store-assigned key.
    pub async fn add(&self, document: &D) -> DocumentStoreResult<DocumentKey> {
        self.backend
            .add_document(document.to_bson()?, self.name())
            .await
    }

    /// Creates or overwrites the document stored under `key`.
    pub async fn set(&self, key: &DocumentKey, document: &D) -> DocumentStoreResult<()> {
        self.backend
            .set_document(key, document.to_bson()?, self.name())
            .await
    }

    /// Sets a single top-level field of an existing document.
    pub async fn update_field(
        &self,
        key: &DocumentKey,
        field: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<()> {
        self.backend
            .update_fields(key, single_field(field, value.into()), self.name())
            .await
    }

    /// Removes the document stored under `key`. Succeeds if it is already gone.
    pub async fn delete(&self, key: &DocumentKey) -> DocumentStoreResult<()> {
        self.backend
            .delete_document(key, self.name())
            .await
    }

    /// Fetches and decodes the document stored under `key`, or `None` if absent.
    pub async fn get(&self, key: &DocumentKey) -> DocumentStoreResult<Option<D>> {
        self.backend
            .get_document(key, self.name())
            .await?
            .map(D::from_bson)
            .transpose()
    }

    /// Returns every document matching the query, paired with its key.
    pub async fn query(&self, query: Query) -> DocumentStoreResult<Vec<DocumentSnapshot<D>>> {
        decode_snapshots(
            self.backend
                .query_documents(query, self.name())
                .await?,
        )
    }
}
