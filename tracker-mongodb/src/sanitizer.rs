//! Field-name sanitization for MongoDB compatibility.
//!
//! MongoDB reserves dots and dollar signs in field names for its query syntax and does not
//! accept NUL bytes at all. Keys and collection names are escaped on the way in and
//! restored on the way out; field *values* are stored untouched so that filters compare
//! against exactly what the caller wrote.

use bson::{Bson, Document as BsonDocument};


pub(crate) struct KeySanitizer;

impl KeySanitizer {
    /// Character replacements for sanitization
    const REPLACEMENTS: [(&'static str, &'static str); 3] = [
        (".", "__dot__"),
        ("$", "__dollar__"),
        ("\0", "__null__"),
    ];

    /// Recursively escapes the keys of a document, including documents nested in arrays.
    pub(crate) fn sanitize_document(document: &BsonDocument) -> BsonDocument {
        document
            .iter()
            .map(|(k, v)| (Self::sanitize_string(k), Self::map_value(v, Self::sanitize_document)))
            .collect()
    }

    /// Reverts [`KeySanitizer::sanitize_document`].
    pub(crate) fn restore_document(document: &BsonDocument) -> BsonDocument {
        document
            .iter()
            .map(|(k, v)| (Self::restore_string(k), Self::map_value(v, Self::restore_document)))
            .collect()
    }

    fn map_value(value: &Bson, on_document: fn(&BsonDocument) -> BsonDocument) -> Bson {
        match value {
            Bson::Document(doc) => Bson::Document(on_document(doc)),
            Bson::Array(arr) => Bson::Array(
                arr
                    .iter()
                    .map(|item| Self::map_value(item, on_document))
                    .collect(),
            ),
            _ => value.clone(),
        }
    }

    /// Escapes a field or collection name.
    pub(crate) fn sanitize_string(input: &str) -> String {
        let mut sanitized = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter() {
            sanitized = sanitized.replace(*target, *replacement);
        }
        sanitized
    }

    /// Restores a name escaped by [`KeySanitizer::sanitize_string`].
    pub(crate) fn restore_string(input: &str) -> String {
        let mut restored = input.to_string();
        for (target, replacement) in Self::REPLACEMENTS.iter().rev() {
            restored = restored.replace(*replacement, *target);
        }
        restored
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_keys_are_escaped_and_values_are_not() {
        let original = doc! {
            "dr.notes": "see a.b",
            "nested": { "$ref": 1 },
            "visits": [{ "ward.name": "North" }],
        };

        let sanitized = KeySanitizer::sanitize_document(&original);

        assert_eq!(sanitized.get_str("dr__dot__notes").unwrap(), "see a.b");
        assert!(sanitized.get_document("nested").unwrap().contains_key("__dollar__ref"));
        assert_eq!(KeySanitizer::restore_document(&sanitized), original);
    }

    #[test]
    fn test_plain_names_pass_through() {
        assert_eq!(KeySanitizer::sanitize_string("patient-data"), "patient-data");
        assert_eq!(KeySanitizer::restore_string("illnesses"), "illnesses");
    }
}
