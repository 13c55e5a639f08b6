//! Bounded event queue drained by the log worker.

use std::collections::VecDeque;

/// Fixed-capacity FIFO of pending log lines.
///
/// When full, a push evicts the oldest unread entry so producers never
/// wait on the sink.
#[derive(Debug)]
pub struct LogQueue {
    entries: VecDeque<String>,
    capacity: usize,
    closed: bool,
    dropped: u64,
}

impl LogQueue {
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
            closed: false,
            dropped: 0,
        }
    }

    /// Appends `message`, returning the entry evicted to make room.
    pub fn push(&mut self, message: String) -> Option<String> {
        let evicted = if self.entries.len() >= self.capacity {
            self.dropped += 1;
            self.entries.pop_front()
        } else {
            None
        };
        self.entries.push_back(message);
        evicted
    }

    /// Removes every pending entry, oldest first.
    pub fn drain(&mut self) -> Vec<String> {
        self.entries.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Entries evicted by overflow so far.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    /// Marks the queue as shutting down. Pending entries stay drainable.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_overflow_evicts_oldest() {
        let mut queue = LogQueue::with_capacity(2);
        assert_eq!(queue.push("a".into()), None);
        assert_eq!(queue.push("b".into()), None);
        assert_eq!(queue.push("c".into()), Some("a".into()));
        assert_eq!(queue.dropped(), 1);
        assert_eq!(queue.drain(), vec!["b".to_string(), "c".to_string()]);
        assert!(queue.is_empty());
    }

    #[test]
    fn test_close_keeps_pending_entries() {
        let mut queue = LogQueue::with_capacity(4);
        queue.push("last words".into());
        queue.close();
        assert!(queue.is_closed());
        assert_eq!(queue.len(), 1);
        assert_eq!(queue.drain(), vec!["last words".to_string()]);
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let queue = LogQueue::with_capacity(0);
        assert_eq!(queue.capacity(), 1);
    }
}
