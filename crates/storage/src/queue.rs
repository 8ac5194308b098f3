// crates/storage/src/queue.rs
//! Durable offline queue of unconfirmed save requests
//!
//! A bounded FIFO persisted as a JSON file so queued saves survive a
//! restart. Writes are atomic (temp file + rename), so the file is
//! never left half-written. The file is shared between concurrent
//! sessions without locking; the last writer wins. That is a known
//! limitation, accepted for dashboard layouts.

use crate::error::{StorageError, StorageResult};
use crate::request::SaveRequest;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;
use tempfile::NamedTempFile;

/// Default maximum number of queued requests
pub const DEFAULT_QUEUE_CAP: usize = 10;
/// Default ceiling on the serialized queue size, modeling the quota of
/// the backing store
pub const DEFAULT_QUEUE_MAX_BYTES: usize = 512 * 1024;

/// Bounded, durable FIFO of save requests awaiting network
pub struct OfflineQueue {
    path: PathBuf,
    cap: usize,
    max_bytes: usize,
    entries: Mutex<VecDeque<SaveRequest>>,
}

impl OfflineQueue {
    /// Opens (or creates) a queue backed by the given file
    pub fn open(path: PathBuf) -> Self {
        Self::with_limits(path, DEFAULT_QUEUE_CAP, DEFAULT_QUEUE_MAX_BYTES)
    }

    /// Opens a queue with explicit capacity and byte ceiling
    pub fn with_limits(path: PathBuf, cap: usize, max_bytes: usize) -> Self {
        let entries = Self::load_entries(&path);
        Self {
            path,
            cap,
            max_bytes,
            entries: Mutex::new(entries),
        }
    }

    /// A corrupt or missing file degrades to an empty queue; queued
    /// saves are best-effort recovery data, not a source of truth.
    fn load_entries(path: &PathBuf) -> VecDeque<SaveRequest> {
        let Ok(contents) = fs::read_to_string(path) else {
            return VecDeque::new();
        };
        match serde_json::from_str::<Vec<SaveRequest>>(&contents) {
            Ok(entries) => entries.into(),
            Err(e) => {
                log::warn!(
                    "Offline queue at {} is corrupt, starting empty: {}",
                    path.display(),
                    e
                );
                VecDeque::new()
            }
        }
    }

    /// Adds a request, deduplicating and evicting as needed.
    ///
    /// A request with the same user and checksum as a queued one
    /// replaces it (replaying identical saves is pointless). Past the
    /// capacity the oldest entry is evicted; recency is worth more
    /// than completeness for a UI layout. If the serialized queue
    /// would exceed the byte ceiling, the queue is cleared and the
    /// save fails loudly rather than silently dropping data.
    pub fn enqueue(&self, request: SaveRequest) -> StorageResult<()> {
        let mut entries = self.lock();

        entries.retain(|r| r.user_id != request.user_id || r.checksum != request.checksum);
        if entries.len() >= self.cap {
            entries.pop_front();
            log::warn!("Offline queue full, evicted oldest request");
        }
        entries.push_back(request);

        let serialized = serde_json::to_string(&Vec::from_iter(entries.iter()))?;
        if serialized.len() > self.max_bytes {
            entries.clear();
            drop(entries);
            let _ = self.persist(&[]);
            return Err(StorageError::QuotaExceeded);
        }

        let snapshot: Vec<SaveRequest> = entries.iter().cloned().collect();
        drop(entries);
        self.persist(&snapshot)
    }

    /// Removes the request with the given timestamp
    pub fn dequeue(&self, timestamp: DateTime<Utc>) -> StorageResult<()> {
        let mut entries = self.lock();
        entries.retain(|r| r.timestamp != timestamp);
        let snapshot: Vec<SaveRequest> = entries.iter().cloned().collect();
        drop(entries);
        self.persist(&snapshot)
    }

    /// Returns all queued requests, oldest first
    pub fn get_all(&self) -> Vec<SaveRequest> {
        self.lock().iter().cloned().collect()
    }

    /// Returns a user's oldest queued request without removing it
    pub fn peek_oldest_for(&self, user_id: &str) -> Option<SaveRequest> {
        self.lock().iter().find(|r| r.user_id == user_id).cloned()
    }

    /// Number of queued requests
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// True when nothing is queued
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drops every queued request
    pub fn clear(&self) -> StorageResult<()> {
        self.lock().clear();
        self.persist(&[])
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, VecDeque<SaveRequest>> {
        // Queue state is plain data; on poison, carry on with it
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn persist(&self, entries: &[SaveRequest]) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let dir = self
            .path
            .parent()
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."));
        let mut temp = NamedTempFile::new_in(dir)?;
        temp.write_all(serde_json::to_string(entries)?.as_bytes())?;
        temp.flush()?;
        temp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::Priority;
    use tradedeck_core::Layout;

    fn request(checksum: &str) -> SaveRequest {
        request_for("user-1", checksum)
    }

    fn request_for(user_id: &str, checksum: &str) -> SaveRequest {
        SaveRequest::new(user_id, Layout::new(), Priority::Normal, checksum.to_string())
    }

    fn temp_queue() -> (tempfile::TempDir, OfflineQueue) {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let queue = OfflineQueue::open(dir.path().join("queue.json"));
        (dir, queue)
    }

    #[test]
    fn test_enqueue_and_get_all() {
        let (_dir, queue) = temp_queue();
        queue.enqueue(request("a")).unwrap();
        queue.enqueue(request("b")).unwrap();

        let all = queue.get_all();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].checksum, "a");
    }

    #[test]
    fn test_dedupe_by_checksum_replaces() {
        let (_dir, queue) = temp_queue();
        queue.enqueue(request("a")).unwrap();
        queue.enqueue(request("b")).unwrap();
        queue.enqueue(request("a")).unwrap();

        let all = queue.get_all();
        assert_eq!(all.len(), 2);
        // The replayed checksum moved to the back
        assert_eq!(all[1].checksum, "a");
    }

    #[test]
    fn test_bounded_eviction_drops_oldest() {
        let (_dir, queue) = temp_queue();
        for n in 0..=DEFAULT_QUEUE_CAP {
            queue.enqueue(request(&format!("c{n}"))).unwrap();
        }

        let all = queue.get_all();
        assert_eq!(all.len(), DEFAULT_QUEUE_CAP);
        assert_eq!(all[0].checksum, "c1");
        assert_eq!(all.last().unwrap().checksum, format!("c{DEFAULT_QUEUE_CAP}"));
    }

    #[test]
    fn test_dedupe_scoped_to_user() {
        let (_dir, queue) = temp_queue();
        queue.enqueue(request_for("user-a", "same")).unwrap();
        queue.enqueue(request_for("user-b", "same")).unwrap();

        // Equal checksums from different users both survive
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn test_peek_oldest_for_filters_by_user() {
        let (_dir, queue) = temp_queue();
        queue.enqueue(request_for("user-a", "a1")).unwrap();
        queue.enqueue(request_for("user-b", "b1")).unwrap();
        queue.enqueue(request_for("user-a", "a2")).unwrap();

        assert_eq!(queue.peek_oldest_for("user-a").unwrap().checksum, "a1");
        assert_eq!(queue.peek_oldest_for("user-b").unwrap().checksum, "b1");
        assert!(queue.peek_oldest_for("user-c").is_none());
    }

    #[test]
    fn test_dequeue_by_timestamp() {
        let (_dir, queue) = temp_queue();
        queue.enqueue(request("a")).unwrap();
        let ts = queue.get_all()[0].timestamp;
        queue.dequeue(ts).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn test_queue_survives_reopen() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("queue.json");

        let queue = OfflineQueue::open(path.clone());
        queue.enqueue(request("persisted")).unwrap();
        drop(queue);

        let reopened = OfflineQueue::open(path);
        assert_eq!(reopened.get_all()[0].checksum, "persisted");
    }

    #[test]
    fn test_corrupt_file_degrades_to_empty() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let path = dir.path().join("queue.json");
        fs::write(&path, "not json {{{").unwrap();

        let queue = OfflineQueue::open(path);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_quota_exceeded_clears_and_fails() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let queue = OfflineQueue::with_limits(dir.path().join("queue.json"), 10, 64);

        let result = queue.enqueue(request("too-big"));
        assert!(matches!(result, Err(StorageError::QuotaExceeded)));
        assert!(queue.is_empty());
    }
}
