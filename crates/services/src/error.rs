//! Shared error types for the services crate.

use thiserror::Error;

use storage::sqlite::SqliteInitError;
use trivia_core::model::ParseIdError;
use trivia_core::{CatalogError, SettingsError};

/// Reasons a persisted snapshot is rejected and treated as absent.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SnapshotError {
    #[error("snapshot is not valid JSON: {0}")]
    Json(#[source] serde_json::Error),
    #[error("snapshot has no schema version")]
    MissingVersion,
    #[error("snapshot schema version {found} does not match {expected}")]
    VersionMismatch { found: String, expected: u32 },
    #[error("snapshot has missing or malformed fields: {0}")]
    Shape(#[source] serde_json::Error),
    #[error("snapshot session id is invalid: {0}")]
    SessionId(#[from] ParseIdError),
    #[error("snapshot could not be encoded: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Errors emitted while bootstrapping the engine.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum EngineError {
    #[error("session engine must be hydrated inside a tokio runtime")]
    Runtime(#[from] tokio::runtime::TryCurrentError),
    #[error(transparent)]
    Catalog(#[from] CatalogError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Sqlite(#[from] SqliteInitError),
}
