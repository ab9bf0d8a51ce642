//! The patient record and its fixtures.

use serde::{Deserialize, Serialize};
use tracker_core::document::{Document, DocumentKey};

/// Name of the collection patients are stored in unless configured otherwise.
pub const PATIENT_COLLECTION: &str = "patient-data";

/// A patient as stored in the document store.
///
/// Serialized as `{ "ID": integer, "name": text, "illnesses": [text] }`. The `ID` field is
/// the patient's own identifier and is unrelated to the key the document is stored under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Patient {
    #[serde(rename = "ID")]
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub illnesses: Vec<String>,
}

impl Patient {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            illnesses: Vec::new(),
        }
    }

    pub fn with_illnesses<I, S>(mut self, illnesses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.illnesses = illnesses.into_iter().map(Into::into).collect();
        self
    }
}

impl Document for Patient {
    fn collection_name() -> &'static str {
        PATIENT_COLLECTION
    }
}

/// Three patients stored under the well-known keys `patient-0`, `patient-1` and `patient-2`.
pub fn fixtures() -> Vec<(DocumentKey, Patient)> {
    vec![
        (
            DocumentKey::from("patient-0"),
            Patient::new(0, "Alan").with_illnesses(["Asthma"]),
        ),
        (
            DocumentKey::from("patient-1"),
            Patient::new(1, "Grace").with_illnesses(["Influenza", "Migraine"]),
        ),
        (
            DocumentKey::from("patient-2"),
            Patient::new(2, "Edsger").with_illnesses(["Hypertension"]),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{Bson, doc};
    use serde_json::json;
    use tracker_core::document::DocumentExt;

    fn ada() -> Patient {
        Patient::new(2, "Ada").with_illnesses(["TB", "Bronchitis"])
    }

    #[test]
    fn test_bson_round_trip() {
        let patient = ada();

        let stored = patient.to_bson().unwrap();
        assert_eq!(
            stored,
            Bson::Document(doc! { "ID": 2_i64, "name": "Ada", "illnesses": ["TB", "Bronchitis"] })
        );
        assert_eq!(Patient::from_bson(stored).unwrap(), patient);
    }

    #[test]
    fn test_reads_documents_written_with_narrow_integers() {
        let stored = Bson::Document(doc! { "ID": 1_i32, "name": "Grace", "illnesses": [] });

        assert_eq!(Patient::from_bson(stored).unwrap(), Patient::new(1, "Grace"));
    }

    #[test]
    fn test_from_json_defaults_missing_illnesses() {
        let patient = Patient::from_json(json!({ "ID": 7, "name": "Barbara" })).unwrap();

        assert_eq!(patient, Patient::new(7, "Barbara"));
        assert_eq!(patient.to_json().unwrap()["ID"], json!(7));
    }

    #[test]
    fn test_fixture_keys_differ_from_patient_ids() {
        let fixtures = fixtures();

        assert_eq!(fixtures.len(), 3);
        assert_eq!(fixtures[1].0.as_str(), "patient-1");
        assert_eq!(fixtures[1].1.id, 1);
    }
}
