// crates/sync-engine/src/status.rs
//! Observable sync state: current status, counters, and a bounded
//! recent-activity log, partially persisted across restarts

use crate::error::SyncResult;
use crate::types::{SyncEvent, SyncStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tokio::sync::watch;

/// In-memory history ceiling
const MAX_EVENTS: usize = 50;
/// How many recent events survive a restart
const PERSISTED_EVENTS: usize = 10;

/// Aggregate counters and history for one engine instance
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SyncStats {
    pub save_count: u64,
    /// Consecutive failures; a successful save resets it
    pub error_count: u64,
    pub conflict_count: u64,
    /// Scheduled saves not yet confirmed; never goes below zero
    pub pending_changes: u64,
    /// Manual retries since the last successful save
    pub retry_count: u64,
    /// True from the first scheduled edit until a confirmed save
    pub unsaved_changes: bool,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
}

/// Subset of state written to disk; counters other than errors are
/// session-scoped and rebuilt from zero
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
struct PersistedStatus {
    error_count: u64,
    last_sync_time: Option<DateTime<Utc>>,
    recent_events: Vec<SyncEvent>,
}

struct StatusInner {
    stats: SyncStats,
    events: VecDeque<SyncEvent>,
}

/// Tracks and publishes sync status.
///
/// Reads are lock-cheap snapshots; status transitions are broadcast on
/// a watch channel so indicators can subscribe without polling.
pub struct SyncStatusStore {
    path: Option<PathBuf>,
    inner: Mutex<StatusInner>,
    status_tx: watch::Sender<SyncStatus>,
}

impl SyncStatusStore {
    /// Creates a store, restoring persisted state from `path` if it
    /// exists. A corrupt or missing file starts fresh.
    pub fn new(path: Option<PathBuf>) -> Self {
        let persisted = path
            .as_deref()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|raw| match serde_json::from_str::<PersistedStatus>(&raw) {
                Ok(state) => Some(state),
                Err(e) => {
                    log::warn!("Discarding corrupt sync status file: {}", e);
                    None
                }
            })
            .unwrap_or_default();

        let (status_tx, _) = watch::channel(SyncStatus::Idle);
        Self {
            path,
            inner: Mutex::new(StatusInner {
                stats: SyncStats {
                    error_count: persisted.error_count,
                    last_sync_time: persisted.last_sync_time,
                    ..Default::default()
                },
                events: persisted.recent_events.into(),
            }),
            status_tx,
        }
    }

    /// Current status value
    pub fn status(&self) -> SyncStatus {
        *self.status_tx.borrow()
    }

    /// Subscribes to status transitions
    pub fn subscribe(&self) -> watch::Receiver<SyncStatus> {
        self.status_tx.subscribe()
    }

    /// Publishes a status transition; no-op when unchanged
    pub fn set_status(&self, status: SyncStatus) {
        self.status_tx.send_if_modified(|current| {
            if *current == status {
                false
            } else {
                log::debug!("Sync status {:?} -> {:?}", current, status);
                *current = status;
                true
            }
        });
    }

    /// Records a completed sync attempt and persists the durable slice
    pub fn record_event(&self, event: SyncEvent) {
        {
            let mut inner = self.lock();
            if event.success {
                inner.stats.save_count += 1;
                inner.stats.last_sync_time = Some(event.timestamp);
                inner.stats.last_error = None;
                inner.stats.error_count = 0;
                inner.stats.retry_count = 0;
                inner.stats.unsaved_changes = false;
            } else {
                inner.stats.error_count += 1;
                inner.stats.last_error = event.error.clone();
            }
            inner.events.push_back(event);
            while inner.events.len() > MAX_EVENTS {
                inner.events.pop_front();
            }
        }

        if let Err(e) = self.persist() {
            log::warn!("Failed to persist sync status: {}", e);
        }
    }

    /// Bumps the conflict counter; the save itself is recorded
    /// separately once it completes
    pub fn record_conflict(&self) {
        self.lock().stats.conflict_count += 1;
    }

    /// Notes a new unconfirmed change entering the pipeline
    pub fn note_pending(&self) {
        let mut inner = self.lock();
        inner.stats.pending_changes += 1;
        inner.stats.unsaved_changes = true;
    }

    /// Clears one pending change: it was confirmed remotely or
    /// discarded by cancellation. Failed saves stay counted.
    pub fn clear_pending(&self) {
        let mut inner = self.lock();
        inner.stats.pending_changes = inner.stats.pending_changes.saturating_sub(1);
    }

    /// Counts a manual retry attempt
    pub fn record_retry(&self) {
        self.lock().stats.retry_count += 1;
    }

    /// Snapshot of the aggregate counters
    pub fn stats(&self) -> SyncStats {
        self.lock().stats.clone()
    }

    /// Most recent events, newest last
    pub fn recent_events(&self, limit: usize) -> Vec<SyncEvent> {
        let inner = self.lock();
        let skip = inner.events.len().saturating_sub(limit);
        inner.events.iter().skip(skip).cloned().collect()
    }

    /// Clears counters, history, and the on-disk state
    pub fn reset(&self) -> SyncResult<()> {
        {
            let mut inner = self.lock();
            inner.stats = SyncStats::default();
            inner.events.clear();
        }
        self.set_status(SyncStatus::Idle);
        if let Some(path) = &self.path {
            if path.exists() {
                std::fs::remove_file(path)?;
            }
        }
        Ok(())
    }

    fn persist(&self) -> SyncResult<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let state = {
            let inner = self.lock();
            let skip = inner.events.len().saturating_sub(PERSISTED_EVENTS);
            PersistedStatus {
                error_count: inner.stats.error_count,
                last_sync_time: inner.stats.last_sync_time,
                recent_events: inner.events.iter().skip(skip).cloned().collect(),
            }
        };

        let json = serde_json::to_string_pretty(&state)?;
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
            let mut temp = tempfile::NamedTempFile::new_in(parent)?;
            temp.write_all(json.as_bytes())?;
            temp.flush()?;
            temp.persist(path).map_err(|e| e.error)?;
        } else {
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StatusInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SaveTrigger;

    fn success_event() -> SyncEvent {
        SyncEvent::new(SaveTrigger::Auto, SyncStatus::Success, true, None, Some(1))
    }

    fn failure_event() -> SyncEvent {
        SyncEvent::new(
            SaveTrigger::Auto,
            SyncStatus::Error,
            false,
            Some("network down".to_string()),
            None,
        )
    }

    #[test]
    fn test_counters_track_events() {
        let store = SyncStatusStore::new(None);
        store.record_event(success_event());
        store.record_event(success_event());
        store.record_event(failure_event());
        store.record_conflict();

        let stats = store.stats();
        assert_eq!(stats.save_count, 2);
        assert_eq!(stats.error_count, 1);
        assert_eq!(stats.conflict_count, 1);
        assert!(stats.last_sync_time.is_some());
        assert_eq!(stats.last_error.as_deref(), Some("network down"));
    }

    #[test]
    fn test_success_resets_failure_counters() {
        let store = SyncStatusStore::new(None);
        store.note_pending();
        store.record_retry();
        store.record_event(failure_event());
        store.record_event(success_event());
        store.clear_pending();

        let stats = store.stats();
        assert_eq!(stats.error_count, 0);
        assert_eq!(stats.retry_count, 0);
        assert_eq!(stats.pending_changes, 0);
        assert!(!stats.unsaved_changes);
        assert!(stats.last_error.is_none());
    }

    #[test]
    fn test_failure_keeps_change_pending() {
        let store = SyncStatusStore::new(None);
        store.note_pending();
        store.record_event(failure_event());

        let stats = store.stats();
        assert_eq!(stats.pending_changes, 1);
        assert!(stats.unsaved_changes);
    }

    #[test]
    fn test_pending_never_goes_negative() {
        let store = SyncStatusStore::new(None);
        store.clear_pending();
        assert_eq!(store.stats().pending_changes, 0);
    }

    #[test]
    fn test_history_bounded() {
        let store = SyncStatusStore::new(None);
        for _ in 0..(MAX_EVENTS + 20) {
            store.record_event(success_event());
        }
        assert_eq!(store.recent_events(usize::MAX).len(), MAX_EVENTS);
    }

    #[test]
    fn test_status_watch_notifies() {
        let store = SyncStatusStore::new(None);
        let rx = store.subscribe();
        store.set_status(SyncStatus::Syncing);
        assert_eq!(*rx.borrow(), SyncStatus::Syncing);
    }

    #[test]
    fn test_persistence_restores_durable_slice() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sync-status.json");

        {
            let store = SyncStatusStore::new(Some(path.clone()));
            for _ in 0..15 {
                store.record_event(success_event());
            }
            store.record_event(failure_event());
        }

        let restored = SyncStatusStore::new(Some(path));
        let stats = restored.stats();
        assert_eq!(stats.error_count, 1);
        assert!(stats.last_sync_time.is_some());
        assert_eq!(stats.save_count, 0, "session counters start fresh");
        assert_eq!(restored.recent_events(usize::MAX).len(), PERSISTED_EVENTS);
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sync-status.json");
        std::fs::write(&path, "{ nope").unwrap();

        let store = SyncStatusStore::new(Some(path));
        assert_eq!(store.stats().error_count, 0);
    }

    #[test]
    fn test_reset_clears_everything() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("sync-status.json");

        let store = SyncStatusStore::new(Some(path.clone()));
        store.record_event(failure_event());
        store.set_status(SyncStatus::Error);

        store.reset().unwrap();
        assert_eq!(store.stats().error_count, 0);
        assert_eq!(store.status(), SyncStatus::Idle);
        assert!(!path.exists());
    }
}
