// crates/sync-engine/src/types.rs
//! Shared sync types: statuses, triggers, options, and reports

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tradedeck_storage::{Priority, SaveSource};
use uuid::Uuid;

/// Where the sync state machine currently is for a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Idle,
    Syncing,
    Success,
    Error,
    Offline,
    Conflict,
}

/// What kind of edit triggered a save
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SaveTrigger {
    Drag,
    Add,
    Remove,
    Resize,
    Manual,
    Auto,
}

/// Why a version snapshot was written
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChangeType {
    Manual,
    #[default]
    Auto,
    Migration,
    ConflictResolution,
}

/// Per-call knobs for [`SyncManager::save_layout`](crate::SyncManager::save_layout)
#[derive(Debug, Clone, Default)]
pub struct SyncOptions {
    /// Bypass debouncing entirely (destructive actions)
    pub immediate: bool,
    /// Override the priority-derived debounce window
    pub debounce: Option<Duration>,
    /// Urgency; drives the debounce window when `debounce` is unset
    pub priority: Priority,
    /// Human-readable description for the version snapshot
    pub description: Option<String>,
    /// Recorded on the version snapshot
    pub change_type: ChangeType,
}

impl SyncOptions {
    /// Options for an immediate, high-priority save
    pub fn immediate() -> Self {
        Self {
            immediate: true,
            priority: Priority::High,
            ..Default::default()
        }
    }
}

/// Outcome of a save, as surfaced to the UI
#[derive(Debug, Clone)]
pub struct SyncReport {
    pub success: bool,
    pub source: SaveSource,
    pub status: SyncStatus,
    pub version: Option<u64>,
    pub error: Option<String>,
    pub had_conflict: bool,
    pub retry_recommended: bool,
}

impl SyncReport {
    pub(crate) fn error(message: impl Into<String>, retry_recommended: bool) -> Self {
        Self {
            success: false,
            source: SaveSource::Local,
            status: SyncStatus::Error,
            version: None,
            error: Some(message.into()),
            had_conflict: false,
            retry_recommended,
        }
    }
}

/// One entry in the bounded recent-activity log
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncEvent {
    pub id: String,
    pub timestamp: DateTime<Utc>,
    pub trigger: SaveTrigger,
    pub status: SyncStatus,
    pub success: bool,
    pub error: Option<String>,
    pub version: Option<u64>,
}

impl SyncEvent {
    /// Creates an event stamped with a fresh id and the current time
    pub fn new(
        trigger: SaveTrigger,
        status: SyncStatus,
        success: bool,
        error: Option<String>,
        version: Option<u64>,
    ) -> Self {
        Self {
            id: format!("sync-{}", Uuid::new_v4()),
            timestamp: Utc::now(),
            trigger,
            status,
            success,
            error,
            version,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&SyncStatus::Conflict).unwrap(),
            "\"conflict\""
        );
    }

    #[test]
    fn test_change_type_serialization() {
        assert_eq!(
            serde_json::to_string(&ChangeType::ConflictResolution).unwrap(),
            "\"conflict_resolution\""
        );
    }

    #[test]
    fn test_immediate_options() {
        let options = SyncOptions::immediate();
        assert!(options.immediate);
        assert_eq!(options.priority, Priority::High);
    }

    #[test]
    fn test_sync_event_ids_unique() {
        let a = SyncEvent::new(SaveTrigger::Drag, SyncStatus::Success, true, None, Some(1));
        let b = SyncEvent::new(SaveTrigger::Drag, SyncStatus::Success, true, None, Some(1));
        assert_ne!(a.id, b.id);
    }
}
