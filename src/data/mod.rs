//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Entity models and the ingestion record contract

mod database;
mod models;

pub use database::{Database, UpsertedVideo};
pub use models::*;

#[cfg(test)]
mod database_test;
