//! Core abstractions for the patient tracker's document storage.
//!
//! This crate provides:
//!
//! - **Document traits** ([`document`]) - Core traits for defining and serializing documents, and document keys
//! - **Store backend abstraction** ([`backend`]) - Traits for implementing different storage backends
//! - **Query and filtering API** ([`query`]) - Filter expressions and a visitor for executing them
//! - **Collections interface** ([`collection`]) - Typed single-document operations on one collection
//! - **Document store** ([`store`]) - Static and dynamically dispatched store handles
//! - **Error handling** ([`error`]) - Error and result types
//!
//! # Example
//!
//! ```ignore
//! use tracker_core::document::Document;
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! pub struct Patient {
//!     #[serde(rename = "ID")]
//!     pub id: i64,
//!     pub name: String,
//! }
//!
//! impl Document for Patient {
//!     fn collection_name() -> &'static str {
//!         "patient-data"
//!     }
//! }
//! ```

#[allow(unused_extern_crates)]
extern crate self as tracker_core;

pub mod backend;
pub mod collection;
pub mod document;
pub mod error;
pub mod query;
pub mod store;
