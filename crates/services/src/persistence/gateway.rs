use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use storage::repository::KeyValueStore;
use tokio::runtime::Handle;
use trivia_core::{EngineSettings, QuestionCatalog};

use super::debounce::Debouncer;
use super::repair::{RepairReport, repair};
use super::snapshot::{PersistedSnapshot, SessionRecord};

/// A snapshot that passed validation, plus what repair changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadedSnapshot {
    pub snapshot: PersistedSnapshot,
    pub record: SessionRecord,
    pub repair: RepairReport,
}

type PendingSlot = Arc<Mutex<Option<PersistedSnapshot>>>;

/// Reads, validates, repairs and (debounced) writes the session snapshot.
///
/// Storage failures never reach the caller: they are logged and the
/// in-memory state stays authoritative until the next successful write.
pub struct PersistenceGateway {
    store: Arc<dyn KeyValueStore>,
    key: Arc<str>,
    pending: PendingSlot,
    debouncer: Debouncer,
}

impl PersistenceGateway {
    #[must_use]
    pub fn new(store: Arc<dyn KeyValueStore>, settings: &EngineSettings, runtime: Handle) -> Self {
        Self {
            store,
            key: Arc::from(settings.storage_key()),
            pending: Arc::new(Mutex::new(None)),
            debouncer: Debouncer::new(Duration::from_millis(settings.debounce_ms()), runtime),
        }
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Schedule a debounced write.
    ///
    /// Calls inside the debounce window collapse into one write carrying the
    /// snapshot most recently handed in before the timer fired.
    pub fn save(&mut self, snapshot: PersistedSnapshot) {
        *lock(&self.pending) = Some(snapshot);

        let store = Arc::clone(&self.store);
        let key = Arc::clone(&self.key);
        let pending = Arc::clone(&self.pending);
        self.debouncer.schedule(async move {
            let latest = lock(&pending).take();
            if let Some(snapshot) = latest {
                write(store.as_ref(), &key, &snapshot).await;
            }
        });
    }

    /// Write immediately, superseding any pending debounced write.
    ///
    /// Returns whether the write succeeded.
    pub async fn save_now(&mut self, snapshot: &PersistedSnapshot) -> bool {
        self.debouncer.cancel_and_wait().await;
        lock(&self.pending).take();
        write(self.store.as_ref(), &self.key, snapshot).await
    }

    /// Read and validate the stored snapshot, repairing stale references.
    ///
    /// Unreadable entries are treated as absent; invalid ones are also
    /// removed. A repaired snapshot is written back right away.
    pub async fn load(&mut self, catalog: &QuestionCatalog) -> Option<LoadedSnapshot> {
        let bytes = match self.store.get(&self.key).await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => return None,
            Err(err) => {
                tracing::warn!(%err, key = %self.key, "snapshot read failed; starting fresh");
                return None;
            }
        };

        let decoded = PersistedSnapshot::decode(&bytes)
            .and_then(|snapshot| snapshot.restore().map(|record| (snapshot, record)));
        let (snapshot, mut record) = match decoded {
            Ok(parts) => parts,
            Err(err) => {
                tracing::warn!(%err, key = %self.key, "discarding invalid snapshot");
                self.remove_entry().await;
                return None;
            }
        };

        let report = repair(&mut record, catalog, snapshot.cursor);
        if !report.changed() {
            return Some(LoadedSnapshot {
                snapshot,
                record,
                repair: report,
            });
        }

        tracing::info!(?report, "repaired persisted session");
        let repaired = PersistedSnapshot::capture_record(&record);
        self.save_now(&repaired).await;
        Some(LoadedSnapshot {
            snapshot: repaired,
            record,
            repair: report,
        })
    }

    /// Cancel any pending write and delete the stored snapshot.
    pub async fn clear(&mut self) {
        self.debouncer.cancel_and_wait().await;
        lock(&self.pending).take();
        self.remove_entry().await;
    }

    /// Cancel any pending write without persisting it.
    pub fn shutdown(&mut self) {
        if self.debouncer.cancel() {
            tracing::debug!(key = %self.key, "dropped pending snapshot write on shutdown");
        }
        lock(&self.pending).take();
    }

    #[must_use]
    pub fn has_pending_write(&self) -> bool {
        self.debouncer.is_pending()
    }

    async fn remove_entry(&self) {
        if let Err(err) = self.store.remove(&self.key).await {
            tracing::warn!(%err, key = %self.key, "snapshot remove failed");
        }
    }
}

fn lock(slot: &PendingSlot) -> MutexGuard<'_, Option<PersistedSnapshot>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

async fn write(store: &dyn KeyValueStore, key: &str, snapshot: &PersistedSnapshot) -> bool {
    let bytes = match snapshot.encode() {
        Ok(bytes) => bytes,
        Err(err) => {
            tracing::warn!(%err, "snapshot encode failed");
            return false;
        }
    };

    match store.set(key, &bytes).await {
        Ok(()) => {
            tracing::debug!(key, len = bytes.len(), "snapshot written");
            true
        }
        Err(err) => {
            tracing::warn!(%err, key, "snapshot write failed");
            false
        }
    }
}
