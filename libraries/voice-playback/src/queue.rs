//! Bounded FIFO queue of pending tracks for one tenant
//!
//! Full policy: `enqueue` beyond capacity is rejected with
//! [`PlaybackError::QueueFull`]. Nothing is ever evicted.

use crate::error::{PlaybackError, Result};
use crate::types::Track;
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Arc;

/// Pending tracks plus the loop flag of one tenant
///
/// ```text
/// Currently Playing: Track A      (held by the tenant state, not here)
/// ─────────────────────────────
/// Pending (FIFO):
///   - Track B
///   - Track C
/// ```
#[derive(Debug, Clone)]
pub struct TenantQueue {
    pending: VecDeque<Arc<Track>>,
    loop_enabled: bool,
    capacity: usize,
}

/// Display copy of the head of a queue
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueueSnapshot {
    /// First `limit` pending tracks, in play order
    pub tracks: Vec<Arc<Track>>,

    /// How many pending tracks were cut off by the limit
    pub overflow: usize,
}

impl TenantQueue {
    /// Create an empty queue holding at most `capacity` tracks
    pub fn new(capacity: usize) -> Self {
        Self {
            pending: VecDeque::with_capacity(capacity.min(64)),
            loop_enabled: false,
            capacity,
        }
    }

    /// Append a track to the tail
    ///
    /// Returns the 1-based position of the track in the queue.
    pub fn enqueue(&mut self, track: Arc<Track>) -> Result<usize> {
        if self.is_full() {
            return Err(PlaybackError::QueueFull {
                capacity: self.capacity,
            });
        }

        self.pending.push_back(track);
        Ok(self.pending.len())
    }

    /// Next track to play
    ///
    /// With loop enabled and a just-finished track supplied, that same track
    /// comes back (as if re-inserted at the head and popped again) and the
    /// pending tracks stay untouched. Otherwise pops the head.
    pub fn dequeue_next(&mut self, finished: Option<Arc<Track>>) -> Option<Arc<Track>> {
        if self.loop_enabled {
            if let Some(track) = finished {
                return Some(track);
            }
        }

        self.pending.pop_front()
    }

    /// Copy of up to `limit` pending tracks plus the overflow count
    pub fn peek_all(&self, limit: usize) -> QueueSnapshot {
        let tracks: Vec<_> = self.pending.iter().take(limit).cloned().collect();
        QueueSnapshot {
            overflow: self.pending.len() - tracks.len(),
            tracks,
        }
    }

    /// Drop all pending tracks, returning how many were removed
    pub fn clear(&mut self) -> usize {
        let removed = self.pending.len();
        self.pending.clear();
        removed
    }

    /// Flip loop mode, returning the new value
    pub fn toggle_loop(&mut self) -> bool {
        self.loop_enabled = !self.loop_enabled;
        self.loop_enabled
    }

    pub fn set_loop(&mut self, enabled: bool) {
        self.loop_enabled = enabled;
    }

    pub fn loop_enabled(&self) -> bool {
        self.loop_enabled
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.pending.len() >= self.capacity
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for TenantQueue {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_QUEUE_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_track(id: &str) -> Arc<Track> {
        Arc::new(Track {
            id: id.to_string(),
            title: format!("Track {}", id),
            source_url: format!("https://media.example/{}", id),
            duration_seconds: 180,
            requested_by: "tester".to_string(),
        })
    }

    #[test]
    fn create_empty_queue() {
        let queue = TenantQueue::new(50);
        assert_eq!(queue.len(), 0);
        assert!(queue.is_empty());
        assert!(!queue.loop_enabled());
        assert_eq!(queue.capacity(), 50);
    }

    #[test]
    fn enqueue_returns_position() {
        let mut queue = TenantQueue::new(50);
        assert_eq!(queue.enqueue(create_test_track("1")).unwrap(), 1);
        assert_eq!(queue.enqueue(create_test_track("2")).unwrap(), 2);
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn enqueue_rejects_when_full() {
        let mut queue = TenantQueue::new(2);
        queue.enqueue(create_test_track("1")).unwrap();
        queue.enqueue(create_test_track("2")).unwrap();

        let err = queue.enqueue(create_test_track("3")).unwrap_err();
        assert_eq!(err, PlaybackError::QueueFull { capacity: 2 });

        // Oldest tracks kept, nothing evicted
        let snapshot = queue.peek_all(10);
        assert_eq!(snapshot.tracks[0].id, "1");
        assert_eq!(snapshot.tracks[1].id, "2");
    }

    #[test]
    fn dequeue_is_fifo() {
        let mut queue = TenantQueue::new(50);
        queue.enqueue(create_test_track("1")).unwrap();
        queue.enqueue(create_test_track("2")).unwrap();

        assert_eq!(queue.dequeue_next(None).unwrap().id, "1");
        assert_eq!(queue.dequeue_next(None).unwrap().id, "2");
        assert!(queue.dequeue_next(None).is_none());
    }

    #[test]
    fn loop_returns_the_finished_track() {
        let mut queue = TenantQueue::new(50);
        queue.enqueue(create_test_track("next")).unwrap();
        queue.toggle_loop();

        let finished = create_test_track("current");
        let replay = queue.dequeue_next(Some(Arc::clone(&finished))).unwrap();

        assert!(Arc::ptr_eq(&replay, &finished));
        assert_eq!(queue.len(), 1, "pending tracks untouched while looping");
    }

    #[test]
    fn finished_track_ignored_without_loop() {
        let mut queue = TenantQueue::new(50);
        queue.enqueue(create_test_track("next")).unwrap();

        let next = queue.dequeue_next(Some(create_test_track("current"))).unwrap();
        assert_eq!(next.id, "next");
    }

    #[test]
    fn peek_all_truncates_and_counts_overflow() {
        let mut queue = TenantQueue::new(50);
        for i in 0..13 {
            queue.enqueue(create_test_track(&i.to_string())).unwrap();
        }

        let snapshot = queue.peek_all(10);
        assert_eq!(snapshot.tracks.len(), 10);
        assert_eq!(snapshot.overflow, 3);
        assert_eq!(snapshot.tracks[0].id, "0");

        // Snapshot is a copy
        drop(snapshot);
        assert_eq!(queue.len(), 13);
    }

    #[test]
    fn clear_is_idempotent() {
        let mut queue = TenantQueue::new(50);
        queue.enqueue(create_test_track("1")).unwrap();

        assert_eq!(queue.clear(), 1);
        assert_eq!(queue.clear(), 0);
        assert!(queue.is_empty());
    }

    #[test]
    fn toggle_loop_flips() {
        let mut queue = TenantQueue::new(50);
        assert!(queue.toggle_loop());
        assert!(!queue.toggle_loop());
    }
}
