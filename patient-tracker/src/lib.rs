//! Patient record tracking on top of a pluggable document store.
//!
//! A [`dispatcher::Dispatcher`] issues one create, update, delete, point read and
//! filtered multi-read against the patient collection, concurrently, and logs each
//! outcome on its own. The storage layer is re-exported from `tracker-core` together
//! with the available backends.
//!
//! ```ignore
//! use patient_tracker::{
//!     dispatcher::{CrudPlan, Dispatcher},
//!     memory::InMemoryStore,
//!     patient::{PATIENT_COLLECTION, fixtures},
//!     repository::PatientRepository,
//!     store::{DocumentStore, IntoDynDocumentStore},
//! };
//!
//! #[tokio::main]
//! async fn main() {
//!     let store = DocumentStore::new(InMemoryStore::new()).into_dyn();
//!     let repository = PatientRepository::new(&store, PATIENT_COLLECTION);
//!     repository.seed(&fixtures()).await.unwrap();
//!
//!     let report = Dispatcher::new(repository).run(&CrudPlan::default()).await;
//!     println!("{} operation(s) failed", report.failures());
//!
//!     store.shutdown().await.unwrap();
//! }
//! ```
//!
//! # Backends
//!
//! - [`memory`] - in-process storage, the default
//! - `mongodb` - MongoDB storage (requires the `mongodb` feature)

pub mod config;
pub mod connect;
pub mod dispatcher;
pub mod logging;
pub mod patient;
pub mod repository;

pub use tracker_core::{backend, collection, document, error, query, store};

pub use bson;

/// In-memory storage backend.
pub mod memory {
    pub use tracker_memory::{InMemoryStore, InMemoryStoreBuilder};
}

/// MongoDB storage backend.
#[cfg(feature = "mongodb")]
pub mod mongodb {
    pub use tracker_mongodb::{MongoDbStore, MongoDbStoreBuilder};
}
