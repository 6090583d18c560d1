//! SQLite storage for the track catalog.

pub mod db;
pub mod migrations;

pub use db::{CatalogImport, CatalogStats, Database};
