//! Issues the five patient operations and reports how each one ended.
//!
//! The operations run concurrently and never depend on each other. Each one logs its
//! own outcome as it completes, so log order follows completion order.

use bson::Bson;
use tracing::{info, warn};
use tracker_core::{document::DocumentKey, error::DocumentStoreResult};

use crate::{
    patient::Patient,
    repository::{DocumentTarget, PatientRepository},
};

/// Parameters for one run of the dispatcher.
#[derive(Debug, Clone)]
pub struct CrudPlan {
    /// Patient stored by the create operation.
    pub new_patient: Patient,
    pub update_target: DocumentTarget,
    pub update_field: String,
    pub update_value: Bson,
    pub delete_target: DocumentTarget,
    pub read_target: DocumentTarget,
    /// Field and value of the equality filter used by the multi-read.
    pub filter_field: String,
    pub filter_value: Bson,
}

impl Default for CrudPlan {
    fn default() -> Self {
        Self {
            new_patient: Patient::new(2, "Ada").with_illnesses(["TB", "Bronchitis"]),
            update_target: DocumentTarget::from("patient-1"),
            update_field: "ID".to_string(),
            update_value: Bson::Int64(10),
            delete_target: DocumentTarget::from("patient-2"),
            read_target: DocumentTarget::from("patient-0"),
            filter_field: "ID".to_string(),
            filter_value: Bson::Int64(1),
        }
    }
}

/// Outcome of every operation of a run.
#[derive(Debug)]
pub struct RunReport {
    pub created: DocumentStoreResult<DocumentKey>,
    pub updated: DocumentStoreResult<()>,
    pub deleted: DocumentStoreResult<()>,
    pub fetched: DocumentStoreResult<Option<Patient>>,
    pub matched: DocumentStoreResult<Vec<Patient>>,
}

impl RunReport {
    /// Number of operations that ended in an error. An absent point read is not a failure.
    pub fn failures(&self) -> usize {
        [
            self.created.is_err(),
            self.updated.is_err(),
            self.deleted.is_err(),
            self.fetched.is_err(),
            self.matched.is_err(),
        ]
        .into_iter()
        .filter(|failed| *failed)
        .count()
    }
}

pub struct Dispatcher<'a> {
    repository: PatientRepository<'a>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(repository: PatientRepository<'a>) -> Self {
        Self { repository }
    }

    /// Runs create, update, delete, point read and multi-read concurrently.
    pub async fn run(&self, plan: &CrudPlan) -> RunReport {
        let (created, updated, deleted, fetched, matched) = futures::join!(
            self.create(plan),
            self.update(plan),
            self.delete(plan),
            self.read_one(plan),
            self.read_many(plan),
        );

        RunReport { created, updated, deleted, fetched, matched }
    }

    async fn create(&self, plan: &CrudPlan) -> DocumentStoreResult<DocumentKey> {
        let result = self.repository.create(&plan.new_patient).await;

        match &result {
            Ok(key) => info!(%key, collection = self.repository.collection_name(), "added patient document"),
            Err(error) => warn!(%error, "failed to add patient document"),
        }

        result
    }

    async fn update(&self, plan: &CrudPlan) -> DocumentStoreResult<()> {
        let result = self.repository
            .update_field(&plan.update_target, &plan.update_field, plan.update_value.clone())
            .await;

        match &result {
            Ok(()) => info!(document = %plan.update_target, field = %plan.update_field, "updated patient document"),
            Err(error) => warn!(document = %plan.update_target, %error, "could not update patient document"),
        }

        result
    }

    async fn delete(&self, plan: &CrudPlan) -> DocumentStoreResult<()> {
        let result = self.repository.delete(&plan.delete_target).await;

        match &result {
            Ok(()) => info!(document = %plan.delete_target, "deleted patient document"),
            Err(error) => warn!(document = %plan.delete_target, %error, "could not delete patient document"),
        }

        result
    }

    async fn read_one(&self, plan: &CrudPlan) -> DocumentStoreResult<Option<Patient>> {
        let result = self.repository.get(&plan.read_target).await;

        match &result {
            Ok(Some(patient)) => log_patient(patient),
            Ok(None) => info!(document = %plan.read_target, "patient document not found"),
            Err(error) => warn!(document = %plan.read_target, %error, "could not read patient document"),
        }

        result
    }

    async fn read_many(&self, plan: &CrudPlan) -> DocumentStoreResult<Vec<Patient>> {
        let result = self.repository
            .find_where(&plan.filter_field, plan.filter_value.clone())
            .await;

        match &result {
            Ok(patients) => {
                info!(field = %plan.filter_field, value = %plan.filter_value, count = patients.len(), "queried patients");
                patients.iter().for_each(log_patient);
            }
            Err(error) => warn!(field = %plan.filter_field, %error, "could not query patients"),
        }

        result
    }
}

fn log_patient(patient: &Patient) {
    info!(
        id = patient.id,
        name = %patient.name,
        illnesses = ?patient.illnesses,
        "patient"
    );
}
