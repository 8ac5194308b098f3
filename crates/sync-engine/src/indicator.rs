// crates/sync-engine/src/indicator.rs
//! Presentation mapping for sync state
//!
//! Turns statuses and reports into badge and toast content so every
//! frontend renders the same wording.

use crate::types::{SyncReport, SyncStatus};
use tradedeck_storage::SaveSource;

/// Visual weight of a badge
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Neutral,
    Active,
    Positive,
    Warning,
    Critical,
}

/// Badge content for the dashboard header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Badge {
    pub label: &'static str,
    pub tone: Tone,
}

/// Maps a status to its badge
pub fn badge(status: SyncStatus) -> Badge {
    match status {
        SyncStatus::Idle => Badge {
            label: "Saved",
            tone: Tone::Neutral,
        },
        SyncStatus::Syncing => Badge {
            label: "Saving…",
            tone: Tone::Active,
        },
        SyncStatus::Success => Badge {
            label: "Saved",
            tone: Tone::Positive,
        },
        SyncStatus::Offline => Badge {
            label: "Offline — changes saved locally",
            tone: Tone::Warning,
        },
        SyncStatus::Conflict => Badge {
            label: "Merged changes from another device",
            tone: Tone::Warning,
        },
        SyncStatus::Error => Badge {
            label: "Save failed",
            tone: Tone::Critical,
        },
    }
}

/// Builds the toast message for a completed save, if one should be
/// shown. Routine successful saves stay quiet.
pub fn toast(report: &SyncReport) -> Option<String> {
    if report.success {
        if report.had_conflict {
            return Some("Your dashboard was updated on another device; changes were merged.".to_string());
        }
        if report.source == SaveSource::Local {
            return Some("You're offline. Changes will sync when you reconnect.".to_string());
        }
        return None;
    }

    let detail = report.error.as_deref().unwrap_or("unknown error");
    if report.retry_recommended {
        Some(format!("Couldn't save your layout ({detail}). Tap to retry."))
    } else {
        Some(format!("Couldn't save your layout: {detail}"))
    }
}
