// crates/sync-engine/src/lib.rs
//! Dashboard layout synchronization engine
//!
//! Orchestrates debounced, conflict-aware, offline-tolerant layout
//! persistence on top of the storage layer:
//! - [`SyncManager`]: the save pipeline (validate, reconcile, persist,
//!   snapshot, publish status), linearized per user
//! - [`WidgetSyncHandle`]: per-user facade with outcome callbacks and
//!   optimistic apply-then-reconcile
//! - [`LayoutValidator`] / [`ConflictResolver`] / [`VersionService`]:
//!   the pipeline stages, usable standalone
//! - [`indicator`]: shared badge and toast wording for frontends

mod conflict;
mod error;
mod handle;
pub mod indicator;
mod manager;
mod status;
mod types;
mod validator;
mod version;

pub use conflict::{ConflictResolver, Resolution, ResolutionStrategy};
pub use error::{SyncError, SyncResult};
pub use handle::WidgetSyncHandle;
pub use manager::{
    SyncConfig, SyncManager, DEBOUNCE_HIGH, DEBOUNCE_LOW, DEBOUNCE_NORMAL,
};
pub use status::{SyncStats, SyncStatusStore};
pub use types::{ChangeType, SaveTrigger, SyncEvent, SyncOptions, SyncReport, SyncStatus};
pub use validator::{LayoutValidator, Severity, ValidationError, ValidationReport};
pub use version::{ChangeSet, LayoutVersion, VersionService, VersionStore};
