#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod persistence;
pub mod sessions;

pub use trivia_core::Clock;

pub use app_services::AppServices;
pub use error::{EngineError, SnapshotError};
pub use persistence::{LoadedSnapshot, PersistedSnapshot, PersistenceGateway, SCHEMA_VERSION};
pub use sessions::{DiscardView, EngineView, RollResult, SessionManager, TopicStatus};
