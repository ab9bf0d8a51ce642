//! Core traits and types for document representation and serialization.
//!
//! A stored document has two identities: the [`DocumentKey`] that names it inside its
//! collection, and whatever identifier fields its own data carries. The two are never
//! tied together by the store.

use bson::{Bson, de::deserialize_from_bson, ser::serialize_to_bson};
use serde::{Deserialize, Serialize};
use serde_json::{Value, from_value, to_value};
use std::fmt;
use uuid::Uuid;

use crate::error::DocumentStoreResult;

/// Core trait that all documents stored in a document store must implement.
///
/// # Example
///
/// ```ignore
/// use tracker_core::document::Document;
/// use serde::{Serialize, Deserialize};
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// pub struct Ward {
///     pub name: String,
///     pub beds: u32,
/// }
///
/// impl Document for Ward {
///     fn collection_name() -> &'static str {
///         "wards"
///     }
/// }
/// ```
pub trait Document: Serialize + for<'de> Deserialize<'de> + Send + Sync + Clone + 'static {
    /// Returns the name of the collection this document belongs to by default.
    ///
    /// Collections are created implicitly by the first write.
    fn collection_name() -> &'static str;
}

/// Extension trait providing serialization/deserialization utilities for documents.
///
/// This trait is automatically implemented for all types that implement [`Document`].
pub trait DocumentExt: Document {
    /// Converts this document to a BSON value for storage.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    fn to_bson(&self) -> DocumentStoreResult<Bson>;

    /// Creates a document from a BSON value.
    ///
    /// # Errors
    ///
    /// Returns an error if deserialization fails or the structure is invalid.
    fn from_bson(bson: Bson) -> DocumentStoreResult<Self>;

    /// Converts this document to a JSON value.
    fn to_json(&self) -> DocumentStoreResult<Value>;

    /// Creates a document from a JSON value.
    fn from_json(value: Value) -> DocumentStoreResult<Self>;
}

impl<D: Document> DocumentExt for D {
    fn to_bson(&self) -> DocumentStoreResult<Bson> {
        Ok(serialize_to_bson(self)?)
    }

    fn from_bson(bson: Bson) -> DocumentStoreResult<Self> {
        Ok(deserialize_from_bson(bson)?)
    }

    fn to_json(&self) -> DocumentStoreResult<Value> {
        Ok(to_value(self)?)
    }

    fn from_json(value: Value) -> DocumentStoreResult<Self> {
        Ok(from_value(value)?)
    }
}

/// Opaque name of a document within a collection.
///
/// Keys are either chosen by the caller (`"patient-0"`) or assigned by the store on
/// insertion via [`DocumentKey::generate`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentKey(String);

impl DocumentKey {
    /// Creates a key from any string-like value.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Generates a fresh store-assigned key: 32 lowercase hex characters.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DocumentKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for DocumentKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// A document returned by a query, paired with the key it is stored under.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot<D> {
    pub key: DocumentKey,
    pub data: D,
}

impl<D> DocumentSnapshot<D> {
    pub fn new(key: DocumentKey, data: D) -> Self {
        Self { key, data }
    }

    /// Discards the key and returns the document data.
    pub fn into_data(self) -> D {
        self.data
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_are_hex_and_unique() {
        let first = DocumentKey::generate();
        let second = DocumentKey::generate();

        assert_eq!(first.as_str().len(), 32);
        assert!(first.as_str().chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(first, second);
    }

    #[test]
    fn test_named_keys_keep_their_text() {
        let key = DocumentKey::from("patient-0");

        assert_eq!(key.to_string(), "patient-0");
        assert_eq!(key, DocumentKey::new(String::from("patient-0")));
    }
}
