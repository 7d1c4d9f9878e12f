//! Scripted timelines.
//!
//! A timeline is an ordered list of frames, each an action followed by a
//! wait. Frames run strictly one after another: run the action, wait the
//! frame's duration, move the cursor, repeat. Timelines are unrelated to
//! descriptors and never touch the registry.

use crate::error::{EngineError, Result};
use crate::types::TimelineId;
use std::collections::HashMap;
use std::fmt;

/// One step of a timeline.
pub struct Frame {
    pub duration_ms: u64,
    action: Box<dyn FnMut()>,
}

impl Frame {
    pub fn new(duration_ms: u64, action: impl FnMut() + 'static) -> Self {
        Self {
            duration_ms,
            action: Box::new(action),
        }
    }

    fn run(&mut self) {
        (self.action)();
    }
}

impl fmt::Debug for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Frame")
            .field("duration_ms", &self.duration_ms)
            .finish_non_exhaustive()
    }
}

#[derive(Debug)]
pub struct Timeline {
    pub id: TimelineId,
    frames: Vec<Frame>,
    current_frame: usize,
    running: bool,
}

impl Timeline {
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Index of the next frame to run.
    pub fn current_frame(&self) -> usize {
        self.current_frame
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Sum of all frame durations.
    pub fn total_duration_ms(&self) -> u64 {
        self.frames.iter().map(|f| f.duration_ms).sum()
    }
}

/// Result of advancing a timeline by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// A frame ran; call `advance` again after this many milliseconds.
    Wait(u64),
    /// All frames have run and the timeline stopped.
    Complete,
}

#[derive(Debug, Default)]
pub struct TimelineExecutor {
    timelines: HashMap<TimelineId, Timeline>,
}

impl TimelineExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, frames: Vec<Frame>) -> Result<TimelineId> {
        if frames.is_empty() {
            return Err(EngineError::EmptyTimeline);
        }
        let id = TimelineId::new();
        self.timelines.insert(
            id,
            Timeline {
                id,
                frames,
                current_frame: 0,
                running: false,
            },
        );
        Ok(id)
    }

    /// Mark a timeline running from its first frame.
    ///
    /// Returns false if it is unknown or already running.
    pub fn start(&mut self, id: TimelineId) -> bool {
        match self.timelines.get_mut(&id) {
            Some(timeline) if !timeline.running => {
                timeline.running = true;
                timeline.current_frame = 0;
                true
            }
            _ => false,
        }
    }

    /// Run the frame under the cursor, or finish the timeline.
    ///
    /// Returns `None` for unknown or stopped timelines.
    pub fn advance(&mut self, id: TimelineId) -> Option<Advance> {
        let timeline = self.timelines.get_mut(&id).filter(|t| t.running)?;
        match timeline.frames.get_mut(timeline.current_frame) {
            Some(frame) => {
                frame.run();
                timeline.current_frame += 1;
                Some(Advance::Wait(frame.duration_ms))
            }
            None => {
                timeline.running = false;
                Some(Advance::Complete)
            }
        }
    }

    pub fn get(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(&id)
    }

    pub fn len(&self) -> usize {
        self.timelines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timelines.is_empty()
    }

    pub fn clear(&mut self) {
        self.timelines.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recording_frames(log: &Rc<RefCell<Vec<&'static str>>>) -> Vec<Frame> {
        [("A", 100), ("B", 200), ("C", 50)]
            .into_iter()
            .map(|(name, duration)| {
                let log = Rc::clone(log);
                Frame::new(duration, move || log.borrow_mut().push(name))
            })
            .collect()
    }

    #[test]
    fn test_runs_frames_in_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut executor = TimelineExecutor::new();
        let id = executor.create(recording_frames(&log)).unwrap();

        assert_eq!(executor.get(id).unwrap().total_duration_ms(), 350);
        assert!(executor.start(id));

        assert_eq!(executor.advance(id), Some(Advance::Wait(100)));
        assert_eq!(executor.advance(id), Some(Advance::Wait(200)));
        assert_eq!(executor.advance(id), Some(Advance::Wait(50)));
        assert_eq!(executor.advance(id), Some(Advance::Complete));
        assert_eq!(executor.advance(id), None);

        assert_eq!(*log.borrow(), vec!["A", "B", "C"]);
        assert!(!executor.get(id).unwrap().is_running());
    }

    #[test]
    fn test_start_is_idempotent_while_running() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut executor = TimelineExecutor::new();
        let id = executor.create(recording_frames(&log)).unwrap();

        assert!(executor.start(id));
        executor.advance(id);
        assert!(!executor.start(id));
        assert_eq!(executor.get(id).unwrap().current_frame(), 1);
    }

    #[test]
    fn test_replay_after_completion() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut executor = TimelineExecutor::new();
        let id = executor.create(recording_frames(&log)).unwrap();

        for _ in 0..2 {
            assert!(executor.start(id));
            while let Some(Advance::Wait(_)) = executor.advance(id) {}
        }
        assert_eq!(log.borrow().len(), 6);
    }

    #[test]
    fn test_empty_timeline_rejected() {
        let mut executor = TimelineExecutor::new();
        assert_eq!(executor.create(Vec::new()), Err(EngineError::EmptyTimeline));
    }

    #[test]
    fn test_unknown_timeline() {
        let mut executor = TimelineExecutor::new();
        assert!(!executor.start(TimelineId(u64::MAX)));
        assert_eq!(executor.advance(TimelineId(u64::MAX)), None);
    }
}
