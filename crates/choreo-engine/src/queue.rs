//! FIFO of fire requests.
//!
//! Requests are serviced in arrival order. Only one drain runs at a time:
//! a request submitted while a drain is in progress is appended and picked
//! up by that same drain.

use crate::types::DescriptorId;
use std::collections::VecDeque;

/// Request to begin the animation for one descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FireRequest {
    pub id: DescriptorId,
    /// Clock time the request was submitted.
    pub submitted_at_ms: u64,
}

#[derive(Debug, Default)]
pub struct QueueProcessor {
    pending: VecDeque<FireRequest>,
    draining: bool,
}

impl QueueProcessor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(&mut self, id: DescriptorId, now_ms: u64) {
        self.pending.push_back(FireRequest {
            id,
            submitted_at_ms: now_ms,
        });
    }

    /// Claim the drain. Returns false if a drain is already running.
    pub fn begin_drain(&mut self) -> bool {
        if self.draining {
            return false;
        }
        self.draining = true;
        true
    }

    pub fn pop_next(&mut self) -> Option<FireRequest> {
        self.pending.pop_front()
    }

    pub fn end_drain(&mut self) {
        self.draining = false;
    }

    pub fn is_draining(&self) -> bool {
        self.draining
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop every waiting request.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.len();
        self.pending.clear();
        dropped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order() {
        let mut queue = QueueProcessor::new();
        queue.submit(DescriptorId(3), 0);
        queue.submit(DescriptorId(1), 5);
        queue.submit(DescriptorId(2), 5);

        let order: Vec<_> = std::iter::from_fn(|| queue.pop_next()).map(|r| r.id.0).collect();
        assert_eq!(order, vec![3, 1, 2]);
    }

    #[test]
    fn test_single_drain_guard() {
        let mut queue = QueueProcessor::new();
        assert!(queue.begin_drain());
        assert!(!queue.begin_drain());
        assert!(queue.is_draining());

        // Appended mid-drain, visible to the running drain.
        queue.submit(DescriptorId(1), 0);
        assert_eq!(queue.pop_next().map(|r| r.id), Some(DescriptorId(1)));

        queue.end_drain();
        assert!(queue.begin_drain());
    }

    #[test]
    fn test_request_keeps_submission_time() {
        let mut queue = QueueProcessor::new();
        queue.submit(DescriptorId(7), 1_250);
        let request = queue.pop_next().unwrap();
        assert_eq!(request.id, DescriptorId(7));
        assert_eq!(request.submitted_at_ms, 1_250);
    }

    #[test]
    fn test_clear_reports_dropped() {
        let mut queue = QueueProcessor::new();
        queue.submit(DescriptorId(1), 0);
        queue.submit(DescriptorId(2), 0);
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }
}
