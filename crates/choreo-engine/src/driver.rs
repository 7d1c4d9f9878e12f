//! Seam to the host's native transition primitive.
//!
//! The engine decides *when* things move; a [`TransitionDriver`] makes them
//! move. Style kinds are handed over as a [`NativeTransition`] the host can
//! forward to its own transition or keyframe machinery. Scripted kinds are
//! pushed frame by frame through [`TransitionDriver::step`].

use crate::easing::EasingFunction;
use crate::style::{AnimationKind, ScriptedFrame, StyleFrame};
use crate::types::TargetHandle;
use serde::Serialize;
use std::collections::HashMap;

/// A start→end transition for the host to run natively.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NativeTransition {
    pub kind: AnimationKind,
    pub from: StyleFrame,
    pub to: StyleFrame,
    pub duration_ms: u64,
    pub easing: EasingFunction,
}

/// Host-side executor for transitions.
pub trait TransitionDriver {
    /// Put a freshly registered target into its pre-animation state.
    fn prepare(&mut self, _target: &TargetHandle, _kind: &AnimationKind) {}

    /// Start a native transition for a style kind.
    fn begin(&mut self, target: &TargetHandle, transition: &NativeTransition);

    /// Apply one sample of a scripted kind.
    fn step(&mut self, _target: &TargetHandle, _frame: ScriptedFrame) {}

    /// Apply the final state immediately, with no visible transition.
    ///
    /// Scripted kinds also receive their final frame through `step` right
    /// after this call.
    fn settle(&mut self, target: &TargetHandle, kind: &AnimationKind);

    /// Return a re-armed target to its pre-animation state.
    fn reset(&mut self, target: &TargetHandle, kind: &AnimationKind) {
        self.prepare(target, kind);
    }

    /// Apply a continuous scroll-linked offset.
    fn apply_offset(&mut self, _target: &TargetHandle, _x: f64, _y: f64) {}
}

/// One call observed by a [`RecordingDriver`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "call", rename_all = "snake_case")]
pub enum DriverCall {
    Prepare { target: TargetHandle, kind: AnimationKind },
    Begin { target: TargetHandle, transition: NativeTransition },
    Step { target: TargetHandle, frame: ScriptedFrame },
    Settle { target: TargetHandle, kind: AnimationKind },
    Reset { target: TargetHandle, kind: AnimationKind },
    Offset { target: TargetHandle, x: f64, y: f64 },
}

impl DriverCall {
    pub fn target(&self) -> &TargetHandle {
        match self {
            Self::Prepare { target, .. }
            | Self::Begin { target, .. }
            | Self::Step { target, .. }
            | Self::Settle { target, .. }
            | Self::Reset { target, .. }
            | Self::Offset { target, .. } => target,
        }
    }
}

/// Driver that records every call and tracks where each target comes to rest.
#[derive(Debug, Default)]
pub struct RecordingDriver {
    calls: Vec<DriverCall>,
    styles: HashMap<TargetHandle, StyleFrame>,
    frames: HashMap<TargetHandle, ScriptedFrame>,
    offsets: HashMap<TargetHandle, (f64, f64)>,
}

impl RecordingDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[DriverCall] {
        &self.calls
    }

    pub fn calls_for<'a>(
        &'a self,
        target: &'a TargetHandle,
    ) -> impl Iterator<Item = &'a DriverCall> + 'a {
        self.calls.iter().filter(move |call| call.target() == target)
    }

    /// Style the target rests at once any running native transition ends.
    pub fn final_style(&self, target: &TargetHandle) -> Option<StyleFrame> {
        self.styles.get(target).copied()
    }

    /// Last scripted sample applied to the target.
    pub fn last_frame(&self, target: &TargetHandle) -> Option<ScriptedFrame> {
        self.frames.get(target).copied()
    }

    pub fn offset(&self, target: &TargetHandle) -> Option<(f64, f64)> {
        self.offsets.get(target).copied()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    fn rest_at_start(&mut self, target: &TargetHandle, kind: &AnimationKind) {
        match kind.style_pair() {
            Some((from, _)) => {
                self.styles.insert(target.clone(), from);
            }
            None => {
                if let Some(frame) = kind.sample_script(0.0) {
                    self.frames.insert(target.clone(), frame);
                }
            }
        }
    }
}

impl TransitionDriver for RecordingDriver {
    fn prepare(&mut self, target: &TargetHandle, kind: &AnimationKind) {
        self.rest_at_start(target, kind);
        self.calls.push(DriverCall::Prepare {
            target: target.clone(),
            kind: *kind,
        });
    }

    fn begin(&mut self, target: &TargetHandle, transition: &NativeTransition) {
        self.styles.insert(target.clone(), transition.to);
        self.calls.push(DriverCall::Begin {
            target: target.clone(),
            transition: *transition,
        });
    }

    fn step(&mut self, target: &TargetHandle, frame: ScriptedFrame) {
        self.frames.insert(target.clone(), frame);
        self.calls.push(DriverCall::Step {
            target: target.clone(),
            frame,
        });
    }

    fn settle(&mut self, target: &TargetHandle, kind: &AnimationKind) {
        match kind.style_pair() {
            Some((_, to)) => {
                self.styles.insert(target.clone(), to);
            }
            None => {
                if let Some(frame) = kind.final_script() {
                    self.frames.insert(target.clone(), frame);
                }
            }
        }
        self.calls.push(DriverCall::Settle {
            target: target.clone(),
            kind: *kind,
        });
    }

    fn reset(&mut self, target: &TargetHandle, kind: &AnimationKind) {
        self.rest_at_start(target, kind);
        self.calls.push(DriverCall::Reset {
            target: target.clone(),
            kind: *kind,
        });
    }

    fn apply_offset(&mut self, target: &TargetHandle, x: f64, y: f64) {
        self.offsets.insert(target.clone(), (x, y));
        self.calls.push(DriverCall::Offset {
            target: target.clone(),
            x,
            y,
        });
    }
}
