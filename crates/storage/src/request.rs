// crates/storage/src/request.rs
//! Save requests queued for the remote store

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tradedeck_core::Layout;

/// How urgently a save should happen; drives the debounce window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    /// Idle housekeeping saves
    Low,
    /// Regular edits
    #[default]
    Normal,
    /// Drag-in-progress feedback and destructive actions
    High,
}

/// An attempted persistence of a layout.
///
/// Created on every edit; superseded by a newer request for the same
/// user before the in-flight one completes; removed from the offline
/// queue once its remote save is confirmed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaveRequest {
    /// Owning user; a replay must never write into another account
    pub user_id: String,
    pub layout: Layout,
    pub timestamp: DateTime<Utc>,
    pub retry_count: u32,
    pub priority: Priority,
    pub checksum: String,
}

impl SaveRequest {
    /// Creates a request stamped with the current time
    pub fn new(
        user_id: impl Into<String>,
        layout: Layout,
        priority: Priority,
        checksum: String,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            layout,
            timestamp: Utc::now(),
            retry_count: 0,
            priority,
            checksum,
        }
    }
}
