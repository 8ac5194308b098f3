// crates/storage/src/lib.rs
//! Storage layer for dashboard layouts
//!
//! Bridges the sync engine and the remote database:
//! - [`RemoteStore`]: the injected database client abstraction
//! - [`OfflineQueue`]: durable, bounded FIFO of unconfirmed saves
//! - [`OnlineStatus`]: shared connectivity signal
//! - [`StorageService`]: save-with-retry, remote load, queue drain

mod connectivity;
mod error;
mod queue;
mod remote;
mod request;
mod service;

pub use connectivity::OnlineStatus;
pub use error::{StorageError, StorageResult, StoreError};
pub use queue::{OfflineQueue, DEFAULT_QUEUE_CAP, DEFAULT_QUEUE_MAX_BYTES};
pub use remote::RemoteStore;
pub use request::{Priority, SaveRequest};
pub use service::{SaveOutcome, SaveSource, StorageService};
