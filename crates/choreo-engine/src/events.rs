//! Lifecycle events.
//!
//! The engine never calls back into collaborators. Events are queued while
//! the engine ticks and polled afterwards, so delivery is never synchronous
//! with the call that caused them.
//!
//! ```
//! use choreo_engine::{Engine, EngineContext, RecordingDriver, TriggerKind};
//!
//! let ctx = EngineContext::new(Default::default());
//! let mut engine = Engine::new(ctx.clone(), RecordingDriver::new());
//! let id = engine.register(ctx.descriptor("hero").with_trigger(TriggerKind::Immediate));
//! engine.tick(1_000);
//!
//! let names: Vec<_> = engine.drain_events().filter(|e| e.is_lifecycle()).map(|e| e.name()).collect();
//! assert_eq!(names, ["animation:start", "animation:complete"]);
//! # let _ = id;
//! ```

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::types::{DescriptorId, DescriptorState, TimelineId};

/// Event surfaced to external collaborators.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum EngineEvent {
    /// A descriptor entered `running`.
    #[serde(rename = "animation:start")]
    AnimationStart { id: DescriptorId },
    /// A descriptor reached `completed`.
    #[serde(rename = "animation:complete")]
    AnimationComplete {
        id: DescriptorId,
        /// Clock time between `running` and `completed`.
        #[serde(rename = "durationMs")]
        duration_ms: u64,
    },
    /// A timeline ran out of frames.
    #[serde(rename = "timeline:complete")]
    TimelineComplete { id: TimelineId },
    /// Diagnostic record of every accepted state edge.
    #[serde(rename = "state:changed")]
    StateChanged {
        id: DescriptorId,
        from: DescriptorState,
        to: DescriptorState,
    },
}

impl EngineEvent {
    /// Wire name of the event.
    pub fn name(&self) -> &'static str {
        match self {
            Self::AnimationStart { .. } => "animation:start",
            Self::AnimationComplete { .. } => "animation:complete",
            Self::TimelineComplete { .. } => "timeline:complete",
            Self::StateChanged { .. } => "state:changed",
        }
    }

    /// Descriptor the event is about, if any.
    pub fn descriptor_id(&self) -> Option<DescriptorId> {
        match self {
            Self::AnimationStart { id }
            | Self::AnimationComplete { id, .. }
            | Self::StateChanged { id, .. } => Some(*id),
            Self::TimelineComplete { .. } => None,
        }
    }

    /// Start/complete events, as opposed to diagnostics.
    pub fn is_lifecycle(&self) -> bool {
        !matches!(self, Self::StateChanged { .. })
    }

    pub fn is_complete(&self) -> bool {
        matches!(
            self,
            Self::AnimationComplete { .. } | Self::TimelineComplete { .. }
        )
    }
}

/// FIFO of events waiting to be polled.
#[derive(Debug, Default)]
pub struct EventQueue {
    events: VecDeque<EngineEvent>,
}

impl EventQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, event: EngineEvent) {
        self.events.push_back(event);
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn pop(&mut self) -> Option<EngineEvent> {
        self.events.pop_front()
    }

    pub fn peek(&self) -> Option<&EngineEvent> {
        self.events.front()
    }

    pub fn drain(&mut self) -> impl Iterator<Item = EngineEvent> + '_ {
        self.events.drain(..)
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Queued events about one descriptor, oldest first.
    pub fn events_for(&self, id: DescriptorId) -> Vec<&EngineEvent> {
        self.events
            .iter()
            .filter(|event| event.descriptor_id() == Some(id))
            .collect()
    }
}
