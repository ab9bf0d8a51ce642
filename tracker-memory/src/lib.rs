//! In-memory document storage backend for the patient tracker.
//!
//! This crate provides a thread-safe, in-memory implementation of the `StoreBackend` trait.
//! It needs no external service, which makes it the default backend and the one the
//! tests run against.
//!
//! # Quick Start
//!
//! ```ignore
//! use tracker_core::store::DocumentStore;
//! use tracker_memory::InMemoryStore;
//!
//! let store = DocumentStore::new(InMemoryStore::builder().build().await?);
//! let patients = store.typed_collection::<Patient>();
//! let key = patients.add(&patient).await?;
//! ```

#[allow(unused_extern_crates)]
extern crate self as tracker_memory;

pub mod store;
pub mod evaluator;

pub use store::{InMemoryStore, InMemoryStoreBuilder};
