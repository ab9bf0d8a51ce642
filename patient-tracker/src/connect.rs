//! Builds the configured backend and hands it out as a dynamically dispatched store.

use tracing::debug;
use tracker_core::{
    backend::StoreBackendBuilder,
    error::DocumentStoreResult,
    store::{DocumentStore, DynDocumentStore, IntoDynDocumentStore},
};
use tracker_memory::InMemoryStore;

use crate::config::{BackendKind, TrackerConfig};

/// Connects to the backend selected by `config`.
///
/// # Errors
///
/// [`DocumentStoreError::Initialization`](tracker_core::error::DocumentStoreError::Initialization) if the backend cannot be reached or was not
/// compiled into this build.
pub async fn connect(config: &TrackerConfig) -> DocumentStoreResult<DynDocumentStore> {
    debug!(backend = %config.backend, "connecting to document store");

    match config.backend {
        BackendKind::Memory => Ok(DocumentStore::new(InMemoryStore::builder().build().await?).into_dyn()),
        BackendKind::MongoDb => connect_mongodb(config).await,
    }
}

#[cfg(feature = "mongodb")]
async fn connect_mongodb(config: &TrackerConfig) -> DocumentStoreResult<DynDocumentStore> {
    use tracker_mongodb::MongoDbStore;

    let backend = MongoDbStore::builder(&config.mongodb_uri, &config.mongodb_database)
        .build()
        .await?;

    Ok(DocumentStore::new(backend).into_dyn())
}

#[cfg(not(feature = "mongodb"))]
async fn connect_mongodb(_config: &TrackerConfig) -> DocumentStoreResult<DynDocumentStore> {
    Err(tracker_core::error::DocumentStoreError::Initialization(
        "MongoDB support requires the `mongodb` feature".to_string(),
    ))
}
