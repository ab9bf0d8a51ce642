//! Patient operations addressed either by document key or by the patient's own `ID`.

use std::fmt;

use bson::Bson;
use tracker_core::{
    collection::DynTypedCollection,
    document::{DocumentKey, DocumentSnapshot},
    error::{DocumentStoreError, DocumentStoreResult},
    query::{Filter, Query},
    store::DynDocumentStore,
};

use crate::patient::Patient;

/// Which document(s) an operation applies to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocumentTarget {
    /// The document stored under this key.
    Key(DocumentKey),
    /// Every document whose `ID` field equals this value.
    PatientId(i64),
}

impl fmt::Display for DocumentTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentTarget::Key(key) => write!(f, "{key}"),
            DocumentTarget::PatientId(id) => write!(f, "ID={id}"),
        }
    }
}

impl From<DocumentKey> for DocumentTarget {
    fn from(key: DocumentKey) -> Self {
        DocumentTarget::Key(key)
    }
}

impl From<&str> for DocumentTarget {
    fn from(key: &str) -> Self {
        DocumentTarget::Key(DocumentKey::from(key))
    }
}

pub struct PatientRepository<'a> {
    patients: DynTypedCollection<'a, Patient>,
}

impl<'a> PatientRepository<'a> {
    pub fn new(store: &'a DynDocumentStore, collection: &str) -> Self {
        Self {
            patients: store.typed_collection_named::<Patient>(collection),
        }
    }

    pub fn collection_name(&self) -> &str {
        self.patients.name()
    }

    /// Stores a new patient and returns the key the store assigned to it.
    pub async fn create(&self, patient: &Patient) -> DocumentStoreResult<DocumentKey> {
        self.patients.add(patient).await
    }

    /// Writes each patient under its given key, replacing whatever was there.
    pub async fn seed(&self, fixtures: &[(DocumentKey, Patient)]) -> DocumentStoreResult<()> {
        for (key, patient) in fixtures {
            self.patients.set(key, patient).await?;
        }

        Ok(())
    }

    /// Sets one field on the targeted document(s).
    ///
    /// # Errors
    ///
    /// [`DocumentStoreError::DocumentNotFound`] if the target matches no document.
    pub async fn update_field(
        &self,
        target: &DocumentTarget,
        field: &str,
        value: impl Into<Bson>,
    ) -> DocumentStoreResult<()> {
        let value = value.into();

        match target {
            DocumentTarget::Key(key) => self.patients.update_field(key, field, value).await,
            DocumentTarget::PatientId(id) => {
                let keys = self.keys_for_patient_id(*id).await?;

                if keys.is_empty() {
                    return Err(DocumentStoreError::DocumentNotFound(
                        target.to_string(),
                        self.collection_name().to_string(),
                    ));
                }

                for key in &keys {
                    self.patients.update_field(key, field, value.clone()).await?;
                }

                Ok(())
            }
        }
    }

    /// Removes the targeted document(s). A target matching nothing is not an error.
    pub async fn delete(&self, target: &DocumentTarget) -> DocumentStoreResult<()> {
        match target {
            DocumentTarget::Key(key) => self.patients.delete(key).await,
            DocumentTarget::PatientId(id) => {
                for key in self.keys_for_patient_id(*id).await? {
                    self.patients.delete(&key).await?;
                }

                Ok(())
            }
        }
    }

    /// Fetches the targeted patient, or `None` when nothing matches.
    ///
    /// A `PatientId` target matching several documents yields one of them.
    pub async fn get(&self, target: &DocumentTarget) -> DocumentStoreResult<Option<Patient>> {
        match target {
            DocumentTarget::Key(key) => self.patients.get(key).await,
            DocumentTarget::PatientId(id) => Ok(
                self.find_by_patient_id(*id)
                    .await?
                    .into_iter()
                    .next()
            ),
        }
    }

    /// Returns every patient whose `field` equals `value`.
    ///
    /// Equality is type-strict: a text value never matches a numeric field.
    pub async fn find_where(&self, field: &str, value: impl Into<Bson>) -> DocumentStoreResult<Vec<Patient>> {
        Ok(
            self.patients
                .query(Query::filtered(Filter::eq(field, value)))
                .await?
                .into_iter()
                .map(DocumentSnapshot::into_data)
                .collect()
        )
    }

    pub async fn find_by_patient_id(&self, id: i64) -> DocumentStoreResult<Vec<Patient>> {
        self.find_where("ID", id).await
    }

    /// Resolves a patient `ID` to the keys of the documents carrying it.
    pub async fn keys_for_patient_id(&self, id: i64) -> DocumentStoreResult<Vec<DocumentKey>> {
        Ok(
            self.patients
                .query(Query::filtered(Filter::eq("ID", id)))
                .await?
                .into_iter()
                .map(|snapshot| snapshot.key)
                .collect()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patient::{PATIENT_COLLECTION, fixtures};
    use tracker_core::store::{DocumentStore, IntoDynDocumentStore};
    use tracker_memory::InMemoryStore;

    fn store() -> DynDocumentStore {
        DocumentStore::new(InMemoryStore::new()).into_dyn()
    }

    async fn seeded(store: &DynDocumentStore) -> PatientRepository<'_> {
        let repository = PatientRepository::new(store, PATIENT_COLLECTION);
        repository.seed(&fixtures()).await.unwrap();
        repository
    }

    #[tokio::test]
    async fn test_create_then_read_by_assigned_key() {
        let store = store();
        let repository = PatientRepository::new(&store, PATIENT_COLLECTION);
        let ada = Patient::new(2, "Ada").with_illnesses(["TB", "Bronchitis"]);

        let key = repository.create(&ada).await.unwrap();

        assert_eq!(repository.get(&DocumentTarget::Key(key)).await.unwrap(), Some(ada));
    }

    #[tokio::test]
    async fn test_read_absent_key_is_not_found() {
        let store = store();
        let repository = seeded(&store).await;

        let result = repository.get(&DocumentTarget::from("patient-9")).await;

        assert!(matches!(result, Ok(None)));
    }

    #[tokio::test]
    async fn test_update_absent_key_fails() {
        let store = store();
        let repository = seeded(&store).await;

        let result = repository
            .update_field(&DocumentTarget::from("patient-9"), "ID", 10)
            .await;

        assert!(matches!(result, Err(DocumentStoreError::DocumentNotFound(..))));
    }

    #[tokio::test]
    async fn test_delete_twice_in_succession() {
        let store = store();
        let repository = seeded(&store).await;
        let target = DocumentTarget::from("patient-2");

        repository.delete(&target).await.unwrap();
        repository.delete(&target).await.unwrap();

        assert_eq!(repository.get(&target).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_filter_by_numeric_id() {
        let store = store();
        let repository = seeded(&store).await;
        repository.create(&Patient::new(1, "Grace Again")).await.unwrap();

        let matched = repository.find_where("ID", 1).await.unwrap();

        assert_eq!(matched.len(), 2);
        assert!(matched.iter().all(|patient| patient.id == 1));
    }

    #[tokio::test]
    async fn test_text_id_filter_matches_nothing() {
        // Filtering the numeric ID field with the text "1" is a type mismatch, not a lookup.
        let store = store();
        let repository = seeded(&store).await;

        assert!(repository.find_where("ID", "1").await.unwrap().is_empty());
        assert_eq!(repository.find_by_patient_id(1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_targets_by_patient_id() {
        let store = store();
        let repository = seeded(&store).await;

        repository
            .update_field(&DocumentTarget::PatientId(1), "name", "Grace Hopper")
            .await
            .unwrap();
        let grace = repository.get(&DocumentTarget::PatientId(1)).await.unwrap().unwrap();
        assert_eq!(grace.name, "Grace Hopper");
        assert_eq!(
            repository.keys_for_patient_id(1).await.unwrap(),
            vec![DocumentKey::from("patient-1")]
        );

        repository.delete(&DocumentTarget::PatientId(2)).await.unwrap();
        assert!(repository.keys_for_patient_id(2).await.unwrap().is_empty());
        assert_eq!(repository.get(&DocumentTarget::from("patient-2")).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_absent_patient_id_targets() {
        let store = store();
        let repository = seeded(&store).await;
        let missing = DocumentTarget::PatientId(99);

        assert!(matches!(
            repository.update_field(&missing, "name", "Nobody").await,
            Err(DocumentStoreError::DocumentNotFound(target, _)) if target == "ID=99"
        ));
        repository.delete(&missing).await.unwrap();
        assert_eq!(repository.get(&missing).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_patient_ids_beyond_double_precision_stay_distinct() {
        let store = store();
        let repository = PatientRepository::new(&store, PATIENT_COLLECTION);
        let low = 9_007_199_254_740_992_i64;
        let high = low + 1;
        repository
            .seed(&[
                (DocumentKey::from("a"), Patient::new(low, "Low")),
                (DocumentKey::from("b"), Patient::new(high, "High")),
            ])
            .await
            .unwrap();

        let found = repository.find_by_patient_id(low).await.unwrap();
        assert_eq!(found, vec![Patient::new(low, "Low")]);

        repository
            .update_field(&DocumentTarget::PatientId(high), "name", "Higher")
            .await
            .unwrap();
        repository.delete(&DocumentTarget::PatientId(low)).await.unwrap();

        assert_eq!(repository.get(&DocumentTarget::from("a")).await.unwrap(), None);
        assert_eq!(
            repository.get(&DocumentTarget::from("b")).await.unwrap(),
            Some(Patient::new(high, "Higher"))
        );
    }
}
