//! Snapshot persistence: codec, load-time repair and debounced writes.

mod debounce;
mod gateway;
mod repair;
mod snapshot;

pub use crate::error::SnapshotError;
pub use debounce::Debouncer;
pub use gateway::{LoadedSnapshot, PersistenceGateway};
pub use repair::{RepairReport, repair};
pub use snapshot::{PersistedSnapshot, SessionRecord, SCHEMA_VERSION};
