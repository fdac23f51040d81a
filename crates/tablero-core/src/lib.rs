//! Core domain crate: models, error taxonomy, configuration and pure
//! validation logic shared by the db, storage and api crates.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod validation;

pub use config::{Config, StorageBackendKind};
pub use error::{AppError, ErrorMetadata, LogLevel};
