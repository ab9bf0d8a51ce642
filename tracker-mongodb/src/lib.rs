//! MongoDB backend implementation for the patient tracker.
//!
//! Enable it through the `mongodb` feature of the `patient-tracker` crate:
//!
//! ```toml
//! [dependencies]
//! patient-tracker = { version = "x.y.z", features = ["mongodb"] }
//! ```
//!
//! Each document is stored with its [`DocumentKey`](tracker_core::document::DocumentKey)
//! in `_id`. Field names containing `.`, `$` or NUL are escaped before they reach the
//! server and restored on the way back.
//!
//! # Example
//!
//! ```ignore
//! use tracker_core::backend::StoreBackendBuilder;
//! use tracker_mongodb::MongoDbStore;
//!
//! let store = MongoDbStore::builder("mongodb://localhost:27017", "patient-tracker")
//!     .build()
//!     .await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as tracker_mongodb;

pub mod store;
pub mod query;
pub mod sanitizer;

pub use store::{MongoDbStore, MongoDbStoreBuilder};
