//! Core scheduling types.
//!
//! This module defines the identifiers and the descriptor state machine:
//! - `DescriptorId`, `SequenceId`, `TimelineId`: unique identifiers
//! - `TargetHandle`: non-owning reference to the thing being animated
//! - `DescriptorState`: lifecycle state of one descriptor
//! - `TriggerKind`: the condition that raises fire requests

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        pub struct $name(pub u64);

        impl $name {
            /// Generate a new unique ID.
            pub fn new() -> Self {
                static COUNTER: AtomicU64 = AtomicU64::new(1);
                Self(COUNTER.fetch_add(1, Ordering::Relaxed))
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "#{}"), self.0)
            }
        }
    };
}

define_id!(
    /// Unique identifier for a registered animation descriptor.
    DescriptorId,
    "anim"
);
define_id!(
    /// Unique identifier for a staggered sequence.
    SequenceId,
    "seq"
);
define_id!(
    /// Unique identifier for a scripted timeline.
    TimelineId,
    "timeline"
);

/// Opaque handle to an animated target.
///
/// The engine never owns the target itself; the handle is only a key the host
/// uses to find its element when the driver is called.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TargetHandle(String);

impl TargetHandle {
    /// Create a handle from any string key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// The host key for this target.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TargetHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TargetHandle {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for TargetHandle {
    fn from(key: String) -> Self {
        Self(key)
    }
}

/// Lifecycle state of a descriptor.
///
/// Legal edges are `pending → queued → running → completed`, plus
/// `completed → pending` for repeatable descriptors only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DescriptorState {
    /// Registered and waiting for its trigger.
    Pending,
    /// Accepted by the queue, waiting for its delay.
    Queued,
    /// The transition is executing.
    Running,
    /// The transition finished (or was settled instantly).
    Completed,
}

impl Default for DescriptorState {
    fn default() -> Self {
        Self::Pending
    }
}

impl DescriptorState {
    /// Whether `self → next` is a legal edge.
    pub fn can_transition_to(self, next: Self, repeatable: bool) -> bool {
        match (self, next) {
            (Self::Pending, Self::Queued)
            | (Self::Queued, Self::Running)
            | (Self::Running, Self::Completed) => true,
            (Self::Completed, Self::Pending) => repeatable,
            _ => false,
        }
    }

    /// Queued or running.
    pub fn is_in_flight(self) -> bool {
        matches!(self, Self::Queued | Self::Running)
    }
}

/// Condition that raises fire requests for a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerKind {
    /// The target intersects the viewport.
    Visibility,
    /// The pointer enters the target.
    Hover,
    /// The target is clicked.
    Click,
    /// Fires once at registration.
    Immediate,
    /// Only an explicit `fire` call raises the request.
    Manual,
}

impl Default for TriggerKind {
    fn default() -> Self {
        Self::Visibility
    }
}

impl FromStr for TriggerKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "visibility" | "visible" | "scroll" | "view" => Ok(Self::Visibility),
            "hover" | "mouseenter" => Ok(Self::Hover),
            "click" => Ok(Self::Click),
            "immediate" | "load" => Ok(Self::Immediate),
            "manual" => Ok(Self::Manual),
            _ => Err(()),
        }
    }
}
