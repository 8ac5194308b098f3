// crates/storage/src/service.rs
//! Storage service: one save/load attempt against the remote store
//! with retry, falling back to the offline queue when offline

use crate::connectivity::OnlineStatus;
use crate::error::{StorageError, StorageResult, StoreError};
use crate::queue::OfflineQueue;
use crate::remote::RemoteStore;
use crate::request::{Priority, SaveRequest};
use std::sync::Arc;
use tradedeck_core::Layout;
use tradedeck_resilience::{retry, RetryError, RetryPolicy};

/// Where a save ultimately landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveSource {
    /// Confirmed by the remote database
    Database,
    /// Parked in the local offline queue
    Local,
}

/// Result of a save attempt
#[derive(Debug, Clone)]
pub struct SaveOutcome {
    pub success: bool,
    pub source: SaveSource,
    pub error: Option<String>,
    /// Whether a later manual retry is worth offering
    pub retry_recommended: bool,
}

impl SaveOutcome {
    fn database() -> Self {
        Self {
            success: true,
            source: SaveSource::Database,
            error: None,
            retry_recommended: false,
        }
    }

    fn local() -> Self {
        Self {
            success: true,
            source: SaveSource::Local,
            error: None,
            retry_recommended: false,
        }
    }

    fn failed(error: String, retry_recommended: bool) -> Self {
        Self {
            success: false,
            source: SaveSource::Local,
            error: Some(error),
            retry_recommended,
        }
    }
}

/// Orchestrates remote saves with retry and offline fallback
pub struct StorageService {
    remote: Arc<dyn RemoteStore>,
    queue: Arc<OfflineQueue>,
    online: OnlineStatus,
    policy: RetryPolicy,
}

impl StorageService {
    /// Creates a service over an injected remote store and queue
    pub fn new(
        remote: Arc<dyn RemoteStore>,
        queue: Arc<OfflineQueue>,
        online: OnlineStatus,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            remote,
            queue,
            online,
            policy,
        }
    }

    /// Saves a layout, retrying transient failures.
    ///
    /// When the device is offline the request goes straight to the
    /// queue and the outcome reports `source: Local` without treating
    /// it as an error. Retryable failures back off per the policy up
    /// to the retry ceiling, then the request is parked in the queue
    /// for a later replay. Permanent failures are surfaced
    /// immediately and never queued.
    pub async fn save_with_retry(
        &self,
        user_id: &str,
        layout: &Layout,
        checksum: &str,
        priority: Priority,
    ) -> SaveOutcome {
        if !self.online.is_online() {
            log::info!("Offline, queueing layout save for user {}", user_id);
            return match self.park(user_id, layout, checksum, priority) {
                Ok(()) => SaveOutcome::local(),
                Err(e) => SaveOutcome::failed(e.to_string(), false),
            };
        }

        let result = retry(&self.policy, || {
            self.remote.save_layout(user_id, layout)
        })
        .await;

        match result {
            Ok(()) => SaveOutcome::database(),
            Err(RetryError::Offline) => match self.park(user_id, layout, checksum, priority) {
                Ok(()) => SaveOutcome::local(),
                Err(e) => SaveOutcome::failed(e.to_string(), false),
            },
            Err(RetryError::Permanent(message)) => SaveOutcome::failed(message, false),
            Err(RetryError::AttemptsExhausted {
                attempts,
                last_error,
            }) => {
                // Park it so a reconnect can still replay the save
                if let Err(e) = self.park(user_id, layout, checksum, priority) {
                    log::warn!("Could not queue failed save: {}", e);
                }
                SaveOutcome::failed(
                    StorageError::RetriesExhausted {
                        attempts,
                        last_error,
                    }
                    .to_string(),
                    true,
                )
            }
        }
    }

    /// Reads the remote copy for conflict comparison
    pub async fn load(&self, user_id: &str) -> Result<Option<Layout>, StoreError> {
        self.remote.load_layout(user_id).await
    }

    /// Drains one of the user's queued requests, oldest first.
    ///
    /// Requests parked by other users sharing the queue are left
    /// alone. The request is removed only once its save is confirmed.
    pub async fn sync(&self, user_id: &str) -> StorageResult<Option<SaveOutcome>> {
        let Some(request) = self.queue.peek_oldest_for(user_id) else {
            return Ok(None);
        };

        self.remote
            .save_layout(&request.user_id, &request.layout)
            .await
            .map_err(StorageError::Remote)?;
        self.queue.dequeue(request.timestamp)?;

        log::info!(
            "Replayed queued save for user {} ({} left)",
            user_id,
            self.queue.len()
        );
        Ok(Some(SaveOutcome::database()))
    }

    /// The offline queue backing this service
    pub fn queue(&self) -> &OfflineQueue {
        &self.queue
    }

    /// The connectivity signal backing this service
    pub fn online(&self) -> &OnlineStatus {
        &self.online
    }

    fn park(
        &self,
        user_id: &str,
        layout: &Layout,
        checksum: &str,
        priority: Priority,
    ) -> StorageResult<()> {
        self.queue.enqueue(SaveRequest::new(
            user_id,
            layout.clone(),
            priority,
            checksum.to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Remote store scripted to fail a fixed number of times
    struct FlakyStore {
        fail_first: usize,
        permanent: bool,
        calls: AtomicUsize,
        saved: Mutex<Vec<(String, Layout)>>,
    }

    impl FlakyStore {
        fn new(fail_first: usize) -> Self {
            Self {
                fail_first,
                permanent: false,
                calls: AtomicUsize::new(0),
                saved: Mutex::new(Vec::new()),
            }
        }

        fn permanent() -> Self {
            Self {
                fail_first: usize::MAX,
                permanent: true,
                calls: AtomicUsize::new(0),
                saved: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteStore for FlakyStore {
        async fn save_layout(&self, user_id: &str, layout: &Layout) -> Result<(), StoreError> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            if n < self.fail_first {
                if self.permanent {
                    return Err(StoreError::permanent("invalid layout"));
                }
                return Err(StoreError::retryable("connection reset"));
            }
            self.saved
                .lock()
                .unwrap()
                .push((user_id.to_string(), layout.clone()));
            Ok(())
        }

        async fn load_layout(&self, _user_id: &str) -> Result<Option<Layout>, StoreError> {
            Ok(self.saved.lock().unwrap().last().map(|(_, l)| l.clone()))
        }
    }

    fn service(store: Arc<FlakyStore>, online: bool) -> (tempfile::TempDir, StorageService) {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let queue = Arc::new(OfflineQueue::open(dir.path().join("queue.json")));
        let policy = RetryPolicy::new(3)
            .with_base_delay(Duration::from_millis(1))
            .with_jitter(Duration::ZERO);
        let svc = StorageService::new(store, queue, OnlineStatus::with_initial(online), policy);
        (dir, svc)
    }

    #[tokio::test(start_paused = true)]
    async fn test_save_succeeds_after_transient_failures() {
        let store = Arc::new(FlakyStore::new(2));
        let (_dir, svc) = service(store.clone(), true);

        let outcome = svc
            .save_with_retry("user-1", &Layout::new(), "abc", Priority::Normal)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.source, SaveSource::Database);
        assert_eq!(store.calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_ceiling_then_queued() {
        let store = Arc::new(FlakyStore::new(usize::MAX));
        let (_dir, svc) = service(store.clone(), true);

        let outcome = svc
            .save_with_retry("user-1", &Layout::new(), "abc", Priority::Normal)
            .await;

        assert!(!outcome.success);
        assert!(outcome.retry_recommended);
        assert_eq!(store.calls(), 4);
        assert_eq!(svc.queue().len(), 1);
    }

    #[tokio::test]
    async fn test_permanent_error_not_retried_not_queued() {
        let store = Arc::new(FlakyStore::permanent());
        let (_dir, svc) = service(store.clone(), true);

        let outcome = svc
            .save_with_retry("user-1", &Layout::new(), "abc", Priority::Normal)
            .await;

        assert!(!outcome.success);
        assert!(!outcome.retry_recommended);
        assert_eq!(store.calls(), 1);
        assert!(svc.queue().is_empty());
    }

    #[tokio::test]
    async fn test_offline_enqueues_without_network_call() {
        let store = Arc::new(FlakyStore::new(0));
        let (_dir, svc) = service(store.clone(), false);

        let outcome = svc
            .save_with_retry("user-1", &Layout::new(), "abc", Priority::Normal)
            .await;

        assert!(outcome.success);
        assert_eq!(outcome.source, SaveSource::Local);
        assert_eq!(store.calls(), 0);
        assert_eq!(svc.queue().len(), 1);
    }

    #[tokio::test]
    async fn test_sync_drains_one_request() {
        let store = Arc::new(FlakyStore::new(0));
        let (_dir, svc) = service(store.clone(), false);

        svc.save_with_retry("user-1", &Layout::new(), "abc", Priority::Normal)
            .await;
        svc.online().set_online(true);

        let outcome = svc.sync("user-1").await.unwrap();
        assert!(outcome.is_some());
        assert!(svc.queue().is_empty());
        assert_eq!(store.calls(), 1);
    }

    #[tokio::test]
    async fn test_sync_replays_only_the_callers_requests() {
        let store = Arc::new(FlakyStore::new(0));
        let (_dir, svc) = service(store.clone(), false);

        let mut parked = Layout::new();
        parked.version = 77;
        svc.save_with_retry("user-a", &parked, "aaa", Priority::Normal)
            .await;
        svc.online().set_online(true);

        // Another user draining the shared queue must not touch it
        assert!(svc.sync("user-b").await.unwrap().is_none());
        assert_eq!(store.calls(), 0);
        assert_eq!(svc.queue().len(), 1);

        assert!(svc.sync("user-a").await.unwrap().is_some());
        assert!(svc.queue().is_empty());
        let saved = store.saved.lock().unwrap();
        assert_eq!(saved[0].0, "user-a");
        assert_eq!(saved[0].1.version, 77);
    }

    #[tokio::test]
    async fn test_sync_with_empty_queue_is_noop() {
        let store = Arc::new(FlakyStore::new(0));
        let (_dir, svc) = service(store, true);
        assert!(svc.sync("user-1").await.unwrap().is_none());
    }
}
