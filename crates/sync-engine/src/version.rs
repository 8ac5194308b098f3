// crates/sync-engine/src/version.rs
//! Checksums, change sets, device identity, and version snapshots

use crate::error::SyncResult;
use crate::types::ChangeType;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use tradedeck_core::{Layout, Widget};
use uuid::Uuid;

/// Immutable historical snapshot of a layout.
///
/// Written as a best-effort side record after every confirmed remote
/// save; losing one never fails the save itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutVersion {
    pub desktop: Vec<Widget>,
    pub mobile: Vec<Widget>,
    pub version: u64,
    pub checksum: String,
    pub description: String,
    pub device_id: String,
    pub change_type: ChangeType,
    pub created_at: DateTime<Utc>,
}

/// Persists version snapshots (external collaborator)
#[async_trait]
pub trait VersionStore: Send + Sync {
    /// Stores one snapshot for a user
    async fn save_version(&self, user_id: &str, record: &LayoutVersion) -> SyncResult<()>;
}

/// Differences between two layouts, per logical widget
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub added: usize,
    pub removed: usize,
    pub moved: usize,
    pub resized: usize,
}

impl ChangeSet {
    /// True when the two layouts were identical
    pub fn is_empty(&self) -> bool {
        self.added == 0 && self.removed == 0 && self.moved == 0 && self.resized == 0
    }
}

/// Computes checksums and change descriptions, and owns the per-device
/// identifier used to attribute snapshots.
pub struct VersionService {
    device_id_path: PathBuf,
}

impl VersionService {
    /// Creates a service keeping its device id at the given path
    pub fn new(device_id_path: PathBuf) -> Self {
        Self { device_id_path }
    }

    /// Deterministic, order-independent content fingerprint.
    ///
    /// Widgets are hashed individually from a canonical serialization
    /// (volatile timestamps excluded) and the sorted 32-bit rolling
    /// hashes are then folded together, so array order and pure
    /// timestamp touches never change the result.
    pub fn generate_checksum(layout: &Layout) -> String {
        let mut combined: u32 = 17;
        for (tag, widgets) in [("d", &layout.desktop), ("m", &layout.mobile)] {
            let mut hashes: Vec<u32> = widgets
                .iter()
                .map(|w| Self::rolling_hash(&Self::canonical_widget(tag, w)))
                .collect();
            hashes.sort_unstable();
            for h in hashes {
                combined = combined.wrapping_mul(31).wrapping_add(h);
            }
        }
        to_base36(combined)
    }

    fn canonical_widget(tag: &str, w: &Widget) -> String {
        format!(
            "{tag}|{}|{}|{:?}|{}|{}|{}|{}",
            w.i, w.widget_type, w.size, w.x, w.y, w.w, w.h
        )
    }

    fn rolling_hash(s: &str) -> u32 {
        let mut hash: u32 = 0;
        for byte in s.bytes() {
            hash = hash.wrapping_mul(31).wrapping_add(byte as u32);
        }
        hash
    }

    /// Diffs two layouts into per-widget change counts
    pub fn compare_versions(old: &Layout, new: &Layout) -> ChangeSet {
        let mut changes = ChangeSet::default();
        for (old_widgets, new_widgets) in
            [(&old.desktop, &new.desktop), (&old.mobile, &new.mobile)]
        {
            for widget in new_widgets.iter() {
                match old_widgets.iter().find(|w| w.i == widget.i) {
                    None => changes.added += 1,
                    Some(previous) => {
                        if (previous.x, previous.y) != (widget.x, widget.y) {
                            changes.moved += 1;
                        }
                        if previous.size != widget.size
                            || (previous.w, previous.h) != (widget.w, widget.h)
                        {
                            changes.resized += 1;
                        }
                    }
                }
            }
            changes.removed += old_widgets
                .iter()
                .filter(|w| !new_widgets.iter().any(|n| n.i == w.i))
                .count();
        }
        changes
    }

    /// Renders a change set as a short human-readable summary
    pub fn describe_changes(changes: &ChangeSet) -> String {
        if changes.is_empty() {
            return "no changes".to_string();
        }

        let mut parts = Vec::new();
        for (count, verb) in [
            (changes.added, "added"),
            (changes.removed, "removed"),
            (changes.moved, "moved"),
            (changes.resized, "resized"),
        ] {
            if count > 0 {
                let noun = if count == 1 { "widget" } else { "widgets" };
                parts.push(format!("{verb} {count} {noun}"));
            }
        }
        parts.join(", ")
    }

    /// Returns the stable per-install device identifier, generating
    /// and persisting one on first use.
    pub fn get_or_create_device_id(&self) -> SyncResult<String> {
        if let Ok(existing) = fs::read_to_string(&self.device_id_path) {
            let trimmed = existing.trim();
            if !trimmed.is_empty() {
                return Ok(trimmed.to_string());
            }
        }

        let id = Uuid::new_v4().to_string();
        if let Some(parent) = self.device_id_path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
            let mut temp = tempfile::NamedTempFile::new_in(parent)?;
            temp.write_all(id.as_bytes())?;
            temp.flush()?;
            temp.persist(&self.device_id_path).map_err(|e| e.error)?;
        } else {
            fs::write(&self.device_id_path, &id)?;
        }

        log::info!("Generated device id {}", id);
        Ok(id)
    }

    /// Writes a version snapshot, swallowing failures.
    ///
    /// The snapshot is a side record; the parent save has already been
    /// confirmed by the time this runs.
    pub async fn record_snapshot(
        &self,
        store: &dyn VersionStore,
        user_id: &str,
        layout: &Layout,
        previous: Option<&Layout>,
        description: Option<String>,
        change_type: ChangeType,
    ) {
        let checksum = Self::generate_checksum(layout);
        let device_id = match self.get_or_create_device_id() {
            Ok(id) => id,
            Err(e) => {
                log::warn!("Device id unavailable, skipping snapshot: {}", e);
                return;
            }
        };

        let description = description.unwrap_or_else(|| {
            let changes = previous
                .map(|p| Self::compare_versions(p, layout))
                .unwrap_or_default();
            Self::describe_changes(&changes)
        });

        let record = LayoutVersion {
            desktop: layout.desktop.clone(),
            mobile: layout.mobile.clone(),
            version: layout.version,
            checksum,
            description,
            device_id,
            change_type,
            created_at: Utc::now(),
        };

        if let Err(e) = store.save_version(user_id, &record).await {
            log::warn!("Version snapshot failed (non-critical): {}", e);
        }
    }
}

fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tradedeck_core::{Arrangement, WidgetSize, WidgetType};

    fn sample_layout() -> Layout {
        let mut layout = Layout::new();
        layout
            .add_widget(Arrangement::Desktop, WidgetType::EquityChart, WidgetSize::Medium)
            .unwrap();
        layout
            .add_widget(Arrangement::Desktop, WidgetType::WinRate, WidgetSize::Tiny)
            .unwrap();
        layout
    }

    #[test]
    fn test_checksum_deterministic() {
        let layout = sample_layout();
        assert_eq!(
            VersionService::generate_checksum(&layout),
            VersionService::generate_checksum(&layout)
        );
    }

    #[test]
    fn test_checksum_order_independent() {
        let layout = sample_layout();
        let mut reversed = layout.clone();
        reversed.desktop.reverse();
        assert_eq!(
            VersionService::generate_checksum(&layout),
            VersionService::generate_checksum(&reversed)
        );
    }

    #[test]
    fn test_checksum_ignores_timestamp_touch() {
        let layout = sample_layout();
        let mut touched = layout.clone();
        touched.desktop[0].updated_at = Utc::now() + chrono::Duration::hours(1);
        assert_eq!(
            VersionService::generate_checksum(&layout),
            VersionService::generate_checksum(&touched)
        );
    }

    #[test]
    fn test_checksum_changes_on_move() {
        let layout = sample_layout();
        let mut moved = layout.clone();
        moved.desktop[0].y += 2;
        assert_ne!(
            VersionService::generate_checksum(&layout),
            VersionService::generate_checksum(&moved)
        );
    }

    #[test]
    fn test_compare_versions_counts() {
        let old = sample_layout();
        let mut new = old.clone();
        new.desktop[0].x = 6; // moved
        new.desktop[1].size = WidgetSize::Small; // resized
        new.desktop[1].w = 3;
        new.desktop[1].h = 4;
        new.add_widget(Arrangement::Desktop, WidgetType::PnlCalendar, WidgetSize::Medium)
            .unwrap();

        let changes = VersionService::compare_versions(&old, &new);
        assert_eq!(changes.added, 1);
        assert_eq!(changes.moved, 1);
        assert_eq!(changes.resized, 1);
        assert_eq!(changes.removed, 0);
    }

    #[test]
    fn test_describe_changes() {
        let changes = ChangeSet {
            added: 0,
            removed: 0,
            moved: 2,
            resized: 1,
        };
        assert_eq!(
            VersionService::describe_changes(&changes),
            "moved 2 widgets, resized 1 widget"
        );
        assert_eq!(
            VersionService::describe_changes(&ChangeSet::default()),
            "no changes"
        );
    }

    #[test]
    fn test_device_id_stable_across_instances() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("device-id");

        let first = VersionService::new(path.clone())
            .get_or_create_device_id()
            .unwrap();
        let second = VersionService::new(path).get_or_create_device_id().unwrap();
        assert_eq!(first, second);
    }

    struct RecordingStore {
        records: Mutex<Vec<LayoutVersion>>,
        fail: bool,
    }

    #[async_trait]
    impl VersionStore for RecordingStore {
        async fn save_version(&self, _user_id: &str, record: &LayoutVersion) -> SyncResult<()> {
            if self.fail {
                return Err(crate::error::SyncError::Validation("boom".to_string()));
            }
            self.records.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_record_snapshot_writes_record() {
        let dir = tempfile::TempDir::new().unwrap();
        let service = VersionService::new(dir.path().join("device-id"));
        let store = RecordingStore {
            records: Mutex::new(Vec::new()),
            fail: false,
        };

        let old = sample_layout();
        let mut new = old.clone();
        new.desktop[0].y += 4;

        service
            .record_snapshot(&store, "user-1", &new, Some(&old), None, ChangeType::Auto)
            .await;

        let records = store.records.lock().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].description, "moved 1 widget");
    }

    #[tokio::test]
    async fn test_record_snapshot_failure_swallowed() {
        let dir = tempfile::TempDir::new().unwrap();
        let service = VersionService::new(dir.path().join("device-id"));
        let store = RecordingStore {
            records: Mutex::new(Vec::new()),
            fail: true,
        };

        // Must not panic or propagate
        service
            .record_snapshot(
                &store,
                "user-1",
                &sample_layout(),
                None,
                None,
                ChangeType::Auto,
            )
            .await;
    }
}
