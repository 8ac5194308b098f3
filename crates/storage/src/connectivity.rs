// crates/storage/src/connectivity.rs
//! Connectivity signal
//!
//! The embedding application owns the actual online/offline events
//! (browser events, OS reachability callbacks); this type just holds
//! the current answer and notifies subscribers when it flips.

use tokio::sync::watch;

/// Shared online/offline flag with change notification
#[derive(Clone)]
pub struct OnlineStatus {
    tx: watch::Sender<bool>,
}

impl OnlineStatus {
    /// Creates a status that starts online
    pub fn new() -> Self {
        Self::with_initial(true)
    }

    /// Creates a status with an explicit initial value
    pub fn with_initial(online: bool) -> Self {
        let (tx, _) = watch::channel(online);
        Self { tx }
    }

    /// Returns the current connectivity state
    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Records a connectivity change; no-op if the value is unchanged
    pub fn set_online(&self, online: bool) {
        self.tx.send_if_modified(|current| {
            if *current != online {
                log::info!(
                    "Connectivity changed: {}",
                    if online { "online" } else { "offline" }
                );
                *current = online;
                true
            } else {
                false
            }
        });
    }

    /// Subscribes to connectivity changes
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }
}

impl Default for OnlineStatus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_online() {
        let status = OnlineStatus::new();
        assert!(status.is_online());
    }

    #[test]
    fn test_toggle() {
        let status = OnlineStatus::new();
        status.set_online(false);
        assert!(!status.is_online());
        status.set_online(true);
        assert!(status.is_online());
    }

    #[tokio::test]
    async fn test_subscriber_notified() {
        let status = OnlineStatus::new();
        let mut rx = status.subscribe();

        status.set_online(false);
        rx.changed().await.unwrap();
        assert!(!*rx.borrow());
    }
}
