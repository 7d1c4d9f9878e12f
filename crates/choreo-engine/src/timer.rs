//! One-shot timers on the engine's virtual clock.
//!
//! Every suspension point of the engine (a descriptor's delay, its duration,
//! a timeline frame's wait) is a one-shot timer here. Timers are ordered by
//! deadline, ties broken by scheduling order. Cancelled timers stay in the
//! heap and are skipped when they surface.

use crate::types::{DescriptorId, TimelineId};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

/// Handle to a scheduled timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Work to perform when a timer fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Delay elapsed: move the descriptor to `running`.
    BeginExecution(DescriptorId),
    /// Duration elapsed: move the descriptor to `completed`.
    FinishExecution(DescriptorId),
    /// Current frame's wait elapsed: run the next frame.
    AdvanceTimeline(TimelineId),
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    heap: BinaryHeap<Reverse<(u64, TimerId)>>,
    tasks: HashMap<TimerId, TimerTask>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to fire at clock time `deadline_ms`.
    pub fn schedule(&mut self, deadline_ms: u64, task: TimerTask) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.heap.push(Reverse((deadline_ms, id)));
        self.tasks.insert(id, task);
        id
    }

    /// Cancel a pending timer. Returns the task if it had not fired yet.
    pub fn cancel(&mut self, id: TimerId) -> Option<TimerTask> {
        self.tasks.remove(&id)
    }

    /// Earliest live deadline.
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.discard_cancelled();
        self.heap.peek().map(|Reverse((deadline, _))| *deadline)
    }

    /// Pop the earliest timer due at or before `now_ms`.
    pub fn pop_due(&mut self, now_ms: u64) -> Option<(u64, TimerId, TimerTask)> {
        self.discard_cancelled();
        let Reverse((deadline, id)) = *self.heap.peek()?;
        if deadline > now_ms {
            return None;
        }
        self.heap.pop();
        let task = self.tasks.remove(&id)?;
        Some((deadline, id, task))
    }

    pub fn contains(&self, id: TimerId) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Number of live timers.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    pub fn clear(&mut self) {
        self.heap.clear();
        self.tasks.clear();
    }

    fn discard_cancelled(&mut self) {
        while let Some(Reverse((_, id))) = self.heap.peek() {
            if self.tasks.contains_key(id) {
                break;
            }
            self.heap.pop();
        }
    }
}
