//! Core domain model for sonority.
//!
//! This crate defines the canonical audio-feature vector and the adapter
//! that builds it from a raw provider response, the read-only track
//! catalog, and the SQLite schema the catalog is stored in.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod catalog;
pub mod error;
pub mod features;
pub mod schema;

pub use catalog::{Catalog, CatalogEntry};
pub use error::{Error, Result};
pub use features::{vector_from_raw_response, Feature, FeatureVector, RawFeatureResponse};
