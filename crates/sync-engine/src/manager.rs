// crates/sync-engine/src/manager.rs
//! The sync manager: debounced, per-user-linearized layout saves
//!
//! Every save funnels through one pipeline: validate, detect and
//! resolve conflicts, persist with retry/offline fallback, snapshot,
//! publish status. Rapid edits within the debounce window collapse
//! into a single write; callers that raced into the same window all
//! receive the shared outcome.

use crate::conflict::{ConflictResolver, ResolutionStrategy};
use crate::error::{SyncError, SyncResult};
use crate::status::{SyncStats, SyncStatusStore};
use crate::types::{SaveTrigger, SyncEvent, SyncOptions, SyncReport, SyncStatus};
use crate::validator::LayoutValidator;
use crate::version::{VersionService, VersionStore};
use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tradedeck_core::{Arrangement, Layout};
use tradedeck_storage::{SaveSource, StorageError, StorageService};

/// Debounce window for high-priority saves (destructive actions)
pub const DEBOUNCE_HIGH: Duration = Duration::from_millis(100);
/// Debounce window for ordinary edits
pub const DEBOUNCE_NORMAL: Duration = Duration::from_millis(2000);
/// Debounce window for cosmetic, low-urgency changes
pub const DEBOUNCE_LOW: Duration = Duration::from_millis(5000);

/// Engine-wide settings, injected at construction
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub debounce_high: Duration,
    pub debounce_normal: Duration,
    pub debounce_low: Duration,
    pub strategy: ResolutionStrategy,
    /// Directory for engine-local state (device id, status file)
    pub state_dir: PathBuf,
}

impl Default for SyncConfig {
    fn default() -> Self {
        let state_dir = directories::ProjectDirs::from("com", "TradeDeck", "TradeDeck")
            .map(|dirs| dirs.data_local_dir().to_path_buf())
            .unwrap_or_else(|| std::env::temp_dir().join("tradedeck"));
        Self {
            debounce_high: DEBOUNCE_HIGH,
            debounce_normal: DEBOUNCE_NORMAL,
            debounce_low: DEBOUNCE_LOW,
            strategy: ResolutionStrategy::default(),
            state_dir,
        }
    }
}

impl SyncConfig {
    /// Settings rooted at an explicit state directory
    pub fn with_state_dir(state_dir: PathBuf) -> Self {
        Self {
            state_dir,
            ..Default::default()
        }
    }
}

/// A save waiting out its debounce window
struct PendingSave {
    layout: Layout,
    trigger: SaveTrigger,
    options: SyncOptions,
    waiters: Vec<oneshot::Sender<SyncReport>>,
    timer: JoinHandle<()>,
}

/// Orchestrates layout synchronization for any number of users.
///
/// All collaborators are injected; the manager owns no network client
/// of its own. Saves for the same user are linearized, saves for
/// different users proceed independently.
pub struct SyncManager {
    storage: Arc<StorageService>,
    validator: LayoutValidator,
    resolver: ConflictResolver,
    versions: VersionService,
    version_store: Option<Arc<dyn VersionStore>>,
    status: SyncStatusStore,
    config: SyncConfig,
    pending: Mutex<HashMap<String, PendingSave>>,
    /// Last layout and checksum confirmed against the remote copy
    baselines: Mutex<HashMap<String, (Layout, String)>>,
    /// Widget ids the user is actively editing on this device
    in_flight: Mutex<HashSet<String>>,
    /// Users with edits not yet confirmed by the remote store
    dirty: Mutex<HashSet<String>>,
    /// Per-user linearization guards
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl SyncManager {
    /// Creates a manager over an injected storage service.
    ///
    /// `version_store` is optional; without one, saves simply skip the
    /// history snapshot.
    pub fn new(
        storage: Arc<StorageService>,
        version_store: Option<Arc<dyn VersionStore>>,
        config: SyncConfig,
    ) -> Self {
        Self {
            storage,
            validator: LayoutValidator::new(),
            resolver: ConflictResolver::new(config.strategy),
            versions: VersionService::new(config.state_dir.join("device-id")),
            version_store,
            status: SyncStatusStore::new(Some(config.state_dir.join("sync-status.json"))),
            config,
            pending: Mutex::new(HashMap::new()),
            baselines: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashSet::new()),
            dirty: Mutex::new(HashSet::new()),
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Schedules a layout save.
    ///
    /// Debounced saves collapse: a second call inside the window
    /// replaces the pending layout and restarts the timer, and every
    /// caller's receiver resolves with the one shared outcome.
    /// `options.immediate` bypasses the window entirely, absorbing any
    /// pending save for the user so nothing is written twice.
    pub fn save_layout(
        self: Arc<Self>,
        user_id: &str,
        layout: Layout,
        trigger: SaveTrigger,
        options: SyncOptions,
    ) -> oneshot::Receiver<SyncReport> {
        let (tx, rx) = oneshot::channel();
        self.mark_dirty(user_id);

        if options.immediate {
            let mut waiters = self.absorb_pending(user_id);
            waiters.push(tx);
            let manager = Arc::clone(&self);
            let user = user_id.to_string();
            tokio::spawn(async move {
                let report = manager.perform_sync(&user, layout, trigger, &options).await;
                deliver(waiters, report);
            });
            return rx;
        }

        let delay = options.debounce.unwrap_or_else(|| match options.priority {
            tradedeck_storage::Priority::High => self.config.debounce_high,
            tradedeck_storage::Priority::Normal => self.config.debounce_normal,
            tradedeck_storage::Priority::Low => self.config.debounce_low,
        });

        let mut waiters = vec![tx];
        let mut pending = lock(&self.pending);
        if let Some(previous) = pending.remove(user_id) {
            previous.timer.abort();
            waiters.extend(previous.waiters);
        }

        let manager = Arc::clone(&self);
        let user = user_id.to_string();
        let timer = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            manager.flush(&user).await;
        });

        pending.insert(
            user_id.to_string(),
            PendingSave {
                layout,
                trigger,
                options,
                waiters,
                timer,
            },
        );
        rx
    }

    /// Forces sync activity for a user right now.
    ///
    /// A pending debounced save is flushed immediately; otherwise any
    /// queued offline saves are replayed. Returns `None` when there
    /// was nothing to do.
    pub async fn sync_now(&self, user_id: &str) -> Option<SyncReport> {
        if self.status.status() == SyncStatus::Error {
            self.status.record_retry();
        }
        if let Some(report) = self.flush(user_id).await {
            return Some(report);
        }
        self.replay_queue(user_id).await
    }

    /// Cancels the pending debounced save, if any.
    ///
    /// Waiters see their receiver close rather than a report.
    pub fn cancel_pending_save(&self, user_id: &str) -> bool {
        match lock(&self.pending).remove(user_id) {
            Some(previous) => {
                previous.timer.abort();
                // The discarded edit is no longer pending
                self.confirm_dirty(user_id);
                log::debug!("Cancelled pending save for user {}", user_id);
                true
            }
            None => false,
        }
    }

    /// True when a debounced save is waiting out its window
    pub fn has_pending_save(&self, user_id: &str) -> bool {
        lock(&self.pending).contains_key(user_id)
    }

    /// Marks a widget as mid-edit; conflict resolution keeps the
    /// local state for marked widgets
    pub fn begin_widget_edit(&self, widget_id: &str) {
        lock(&self.in_flight).insert(widget_id.to_string());
    }

    /// Clears the mid-edit mark
    pub fn end_widget_edit(&self, widget_id: &str) {
        lock(&self.in_flight).remove(widget_id);
    }

    /// Loads the remote layout, falling back to the default dashboard
    /// for first-time users. Records the loaded copy as the conflict
    /// baseline.
    pub async fn load_layout(&self, user_id: &str) -> SyncResult<Layout> {
        match self.storage.load(user_id).await {
            Ok(Some(layout)) => {
                self.set_baseline(user_id, &layout);
                Ok(layout)
            }
            Ok(None) => {
                log::info!("No stored layout for user {}, using defaults", user_id);
                Ok(Layout::default_layout())
            }
            Err(e) => Err(SyncError::Storage(StorageError::Remote(e))),
        }
    }

    /// Current connectivity, as seen by the storage layer
    pub fn is_online(&self) -> bool {
        self.storage.online().is_online()
    }

    /// Current sync status value
    pub fn sync_status(&self) -> SyncStatus {
        self.status.status()
    }

    /// Subscribes to status transitions
    pub fn subscribe_status(&self) -> tokio::sync::watch::Receiver<SyncStatus> {
        self.status.subscribe()
    }

    /// Aggregate sync counters
    pub fn stats(&self) -> SyncStats {
        self.status.stats()
    }

    /// Recent sync activity, newest last
    pub fn recent_events(&self, limit: usize) -> Vec<SyncEvent> {
        self.status.recent_events(limit)
    }

    /// Clears counters, history, and persisted status
    pub fn reset_status(&self) -> SyncResult<()> {
        self.status.reset()
    }

    /// Watches connectivity and replays the offline queue whenever the
    /// device comes back online. Runs until the manager is dropped.
    pub fn spawn_reconnect_replay(self: Arc<Self>, user_id: String) -> JoinHandle<()> {
        let mut rx = self.storage.online().subscribe();
        tokio::spawn(async move {
            loop {
                if rx.changed().await.is_err() {
                    break;
                }
                let online = *rx.borrow();
                if online {
                    log::info!("Back online, replaying queued saves for {}", user_id);
                    self.replay_queue(&user_id).await;
                } else {
                    self.status.set_status(SyncStatus::Offline);
                }
            }
        })
    }

    /// Runs the pending save for a user, if one exists
    async fn flush(&self, user_id: &str) -> Option<SyncReport> {
        let entry = lock(&self.pending).remove(user_id)?;
        // Harmless when called from the timer task itself
        entry.timer.abort();

        let report = self
            .perform_sync(user_id, entry.layout, entry.trigger, &entry.options)
            .await;
        deliver(entry.waiters, report.clone());
        Some(report)
    }

    /// The save pipeline: validate, reconcile, persist, snapshot
    async fn perform_sync(
        &self,
        user_id: &str,
        layout: Layout,
        trigger: SaveTrigger,
        options: &SyncOptions,
    ) -> SyncReport {
        let guard = self.user_lock(user_id);
        let _guard = guard.lock().await;

        self.status.set_status(SyncStatus::Syncing);

        let mut findings = self
            .validator
            .validate_layout(&layout.desktop, Arrangement::Desktop);
        findings.errors.extend(
            self.validator
                .validate_layout(&layout.mobile, Arrangement::Mobile)
                .errors,
        );
        if !findings.valid() {
            let message = format!("Layout validation failed: {}", findings.summary());
            log::warn!("{}", message);
            return self.finish(
                user_id,
                trigger,
                SyncReport::error(message, false),
                None,
            );
        }

        let previous = self.baseline_layout(user_id);
        let mut layout = layout;
        let mut had_conflict = false;

        if self.is_online() {
            match self.storage.load(user_id).await {
                Ok(Some(remote)) => {
                    let baseline = self.baseline_checksum(user_id);
                    if let Some(baseline) = baseline {
                        if self.resolver.detect_conflict(&layout, &remote, &baseline) {
                            self.status.set_status(SyncStatus::Conflict);
                            self.status.record_conflict();
                            let in_flight = lock(&self.in_flight).clone();
                            let resolution = self.resolver.resolve(&layout, &remote, &in_flight);
                            layout = resolution.layout;
                            had_conflict = true;
                        }
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    // Detection is advisory; a failed read never blocks
                    // the save
                    log::warn!("Skipping conflict detection for {}: {}", user_id, e);
                }
            }
        }

        if !had_conflict {
            layout.version += 1;
            layout.updated_at = chrono::Utc::now();
        }

        let checksum = VersionService::generate_checksum(&layout);
        let outcome = self
            .storage
            .save_with_retry(user_id, &layout, &checksum, options.priority)
            .await;

        let report = SyncReport {
            success: outcome.success,
            source: outcome.source,
            status: match (outcome.success, outcome.source) {
                (true, SaveSource::Database) => SyncStatus::Success,
                (true, SaveSource::Local) => SyncStatus::Offline,
                (false, _) => SyncStatus::Error,
            },
            version: outcome.success.then_some(layout.version),
            error: outcome.error,
            had_conflict,
            retry_recommended: outcome.retry_recommended,
        };

        if report.success && report.source == SaveSource::Database {
            self.record_baseline(user_id, layout.clone(), checksum);
            if let Some(store) = &self.version_store {
                self.versions
                    .record_snapshot(
                        store.as_ref(),
                        user_id,
                        &layout,
                        previous.as_ref(),
                        options.description.clone(),
                        options.change_type,
                    )
                    .await;
            }
        }

        self.finish(user_id, trigger, report, Some(layout.version))
    }

    /// Replays the offline queue until empty or a failure
    async fn replay_queue(&self, user_id: &str) -> Option<SyncReport> {
        let mut drained = 0u32;
        loop {
            match self.storage.sync(user_id).await {
                Ok(Some(_)) => drained += 1,
                Ok(None) => break,
                Err(e) => {
                    log::warn!("Queue replay stopped for {}: {}", user_id, e);
                    let report = SyncReport::error(e.to_string(), true);
                    return Some(self.finish(user_id, SaveTrigger::Auto, report, None));
                }
            }
        }

        if drained == 0 {
            return None;
        }
        log::info!("Replayed {} queued saves for user {}", drained, user_id);
        let report = SyncReport {
            success: true,
            source: SaveSource::Database,
            status: SyncStatus::Success,
            version: None,
            error: None,
            had_conflict: false,
            retry_recommended: false,
        };
        Some(self.finish(user_id, SaveTrigger::Auto, report, None))
    }

    /// Publishes the outcome and records the activity event
    fn finish(
        &self,
        user_id: &str,
        trigger: SaveTrigger,
        report: SyncReport,
        version: Option<u64>,
    ) -> SyncReport {
        if report.success && report.source == SaveSource::Database {
            self.confirm_dirty(user_id);
        }
        self.status.set_status(report.status);
        self.status.record_event(SyncEvent::new(
            trigger,
            report.status,
            report.success,
            report.error.clone(),
            version.or(report.version),
        ));
        if !report.success {
            log::warn!(
                "Layout save failed for user {}: {}",
                user_id,
                report.error.as_deref().unwrap_or("unknown error")
            );
        }
        report
    }

    fn absorb_pending(&self, user_id: &str) -> Vec<oneshot::Sender<SyncReport>> {
        match lock(&self.pending).remove(user_id) {
            Some(previous) => {
                previous.timer.abort();
                previous.waiters
            }
            None => Vec::new(),
        }
    }

    /// First edit for a user starts tracking an unconfirmed change;
    /// follow-up edits fold into the same one
    fn mark_dirty(&self, user_id: &str) {
        if lock(&self.dirty).insert(user_id.to_string()) {
            self.status.note_pending();
        }
    }

    /// A confirmed save (or a cancellation) settles the user's change
    fn confirm_dirty(&self, user_id: &str) {
        if lock(&self.dirty).remove(user_id) {
            self.status.clear_pending();
        }
    }

    fn user_lock(&self, user_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        lock(&self.locks)
            .entry(user_id.to_string())
            .or_default()
            .clone()
    }

    fn set_baseline(&self, user_id: &str, layout: &Layout) {
        let checksum = VersionService::generate_checksum(layout);
        self.record_baseline(user_id, layout.clone(), checksum);
    }

    fn record_baseline(&self, user_id: &str, layout: Layout, checksum: String) {
        lock(&self.baselines).insert(user_id.to_string(), (layout, checksum));
    }

    fn baseline_layout(&self, user_id: &str) -> Option<Layout> {
        lock(&self.baselines).get(user_id).map(|(l, _)| l.clone())
    }

    fn baseline_checksum(&self, user_id: &str) -> Option<String> {
        lock(&self.baselines).get(user_id).map(|(_, c)| c.clone())
    }
}

fn deliver(waiters: Vec<oneshot::Sender<SyncReport>>, report: SyncReport) {
    for waiter in waiters {
        // A dropped receiver just means the caller stopped listening
        let _ = waiter.send(report.clone());
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}
