//! Error types and result types for document store operations.
//!
//! Every fallible operation in the tracker returns [`DocumentStoreResult<T>`]. A failed
//! request has exactly one of the variants below; there are no partial outcomes.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use thiserror::Error;

/// Represents all possible errors that can occur when interacting with a document store.
///
/// Transport and driver failures surface as [`DocumentStoreError::Backend`], writes against
/// a missing document as [`DocumentStoreError::DocumentNotFound`]. A point read of a missing
/// document is not an error at all; it resolves to `Ok(None)`.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// Error during store initialization or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// The requested document was not found in the collection.
    /// The first argument is the document key, the second is the collection name.
    #[error("Document not found {0} in collection {1}")]
    DocumentNotFound(String, String),
    /// The requested collection does not exist in the store.
    #[error("Collection not found: {0}")]
    CollectionNotFound(String),
    /// The value handed to the store is not a document (a map of fields).
    #[error("Invalid document: {0}")]
    InvalidDocument(String),
    /// The filter expression cannot be executed by the backend.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),
    /// An error occurred in the underlying storage backend or its transport.
    #[error("Backend error: {0}")]
    Backend(String),
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
