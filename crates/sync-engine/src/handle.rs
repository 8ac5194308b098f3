// crates/sync-engine/src/handle.rs
//! Per-user facade over the sync manager
//!
//! UI code talks to a handle: it pins the user id, exposes the save
//! and status surface, fires registered outcome callbacks, and offers
//! an optimistic apply-then-reconcile helper so edits render instantly
//! and roll back only when persistence truly fails.

use crate::error::{SyncError, SyncResult};
use crate::manager::SyncManager;
use crate::types::{SaveTrigger, SyncOptions, SyncReport, SyncStatus};
use std::sync::{Arc, Mutex};
use tradedeck_core::Layout;

type OutcomeCallback = Box<dyn Fn(&SyncReport) + Send + Sync>;

/// Handle binding one user to the shared [`SyncManager`]
pub struct WidgetSyncHandle {
    manager: Arc<SyncManager>,
    user_id: String,
    on_success: Mutex<Option<OutcomeCallback>>,
    on_error: Mutex<Option<OutcomeCallback>>,
}

impl WidgetSyncHandle {
    pub fn new(manager: Arc<SyncManager>, user_id: impl Into<String>) -> Self {
        Self {
            manager,
            user_id: user_id.into(),
            on_success: Mutex::new(None),
            on_error: Mutex::new(None),
        }
    }

    /// Registers a callback fired after every successful save
    pub fn on_success(&self, callback: impl Fn(&SyncReport) + Send + Sync + 'static) {
        *lock(&self.on_success) = Some(Box::new(callback));
    }

    /// Registers a callback fired after every failed save
    pub fn on_error(&self, callback: impl Fn(&SyncReport) + Send + Sync + 'static) {
        *lock(&self.on_error) = Some(Box::new(callback));
    }

    /// Schedules a save and waits for its outcome.
    ///
    /// Collapsed callers all resolve with the shared report. A save
    /// cancelled before it ran resolves to [`SyncError::Cancelled`].
    pub async fn save_layout(
        &self,
        layout: Layout,
        trigger: SaveTrigger,
        options: SyncOptions,
    ) -> SyncResult<SyncReport> {
        let rx = self
            .manager
            .clone()
            .save_layout(&self.user_id, layout, trigger, options);
        let report = rx.await.map_err(|_| SyncError::Cancelled)?;
        self.fire_callbacks(&report);
        Ok(report)
    }

    /// Applies an edit optimistically, then persists it.
    ///
    /// The mutation lands on `layout` before any network round trip,
    /// so the UI can render immediately. If persistence fails outright
    /// the layout is restored to its pre-edit state; an offline save
    /// parked in the queue counts as accepted and is not rolled back.
    pub async fn apply_then_reconcile<F>(
        &self,
        layout: &mut Layout,
        trigger: SaveTrigger,
        options: SyncOptions,
        mutate: F,
    ) -> SyncResult<SyncReport>
    where
        F: FnOnce(&mut Layout) -> SyncResult<()>,
    {
        let snapshot = layout.clone();
        mutate(layout)?;

        let report = self.save_layout(layout.clone(), trigger, options).await?;
        if !report.success {
            log::info!(
                "Rolling back optimistic edit for user {}: {}",
                self.user_id,
                report.error.as_deref().unwrap_or("unknown error")
            );
            *layout = snapshot;
        }
        Ok(report)
    }

    /// Flushes a pending save or replays the offline queue
    pub async fn sync_now(&self) -> Option<SyncReport> {
        let report = self.manager.sync_now(&self.user_id).await;
        if let Some(report) = &report {
            self.fire_callbacks(report);
        }
        report
    }

    /// Loads this user's layout, defaulting for first-time users
    pub async fn load_layout(&self) -> SyncResult<Layout> {
        self.manager.load_layout(&self.user_id).await
    }

    /// Cancels the pending debounced save, if any
    pub fn cancel_pending_save(&self) -> bool {
        self.manager.cancel_pending_save(&self.user_id)
    }

    /// True when a debounced save is waiting out its window
    pub fn has_pending_save(&self) -> bool {
        self.manager.has_pending_save(&self.user_id)
    }

    /// Marks a widget as mid-edit for conflict resolution
    pub fn begin_widget_edit(&self, widget_id: &str) {
        self.manager.begin_widget_edit(widget_id);
    }

    /// Clears the mid-edit mark
    pub fn end_widget_edit(&self, widget_id: &str) {
        self.manager.end_widget_edit(widget_id);
    }

    /// Current connectivity
    pub fn is_online(&self) -> bool {
        self.manager.is_online()
    }

    /// Current sync status
    pub fn sync_status(&self) -> SyncStatus {
        self.manager.sync_status()
    }

    /// The shared manager backing this handle
    pub fn manager(&self) -> &Arc<SyncManager> {
        &self.manager
    }

    fn fire_callbacks(&self, report: &SyncReport) {
        let slot = if report.success {
            &self.on_success
        } else {
            &self.on_error
        };
        if let Some(callback) = lock(slot).as_ref() {
            callback(report);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
