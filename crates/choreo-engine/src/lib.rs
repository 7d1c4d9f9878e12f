//! Animation scheduling engine.
//!
//! Decides *when* a visual transition for a target may fire, serialises
//! competing fire requests and guarantees idempotent, accessibility-aware
//! execution. The transitions themselves are delegated to the host through a
//! [`TransitionDriver`].
//!
//! # Architecture
//!
//! ```text
//! host observations ──► TriggerDetector ──► fire request
//!                                              │
//!                                              ▼
//!   MotionPolicy ◄──────────────────────── QueueProcessor ◄── Sequencer
//!        │                                     │
//!        │                   DescriptorRegistry (state machine)
//!        │                                     │
//!        ▼                                     ▼
//!   ContinuousSampler                 TransitionDriver ──► host primitive
//!                                              │
//!                     TimelineExecutor         ▼
//!                            │          MetricsCollector
//!                            └──────► EventQueue ──► collaborators
//! ```
//!
//! Everything runs on one thread, driven by [`Engine::tick`].

pub mod context;
pub mod declarative;
pub mod driver;
pub mod easing;
pub mod engine;
pub mod error;
pub mod events;
pub mod interpolate;
pub mod metrics;
pub mod motion;
pub mod queue;
pub mod registry;
pub mod sampler;
pub mod sequence;
pub mod style;
pub mod timeline;
pub mod timer;
pub mod trigger;
pub mod types;

pub use context::EngineContext;
pub use declarative::RawDescriptor;
pub use driver::{DriverCall, NativeTransition, RecordingDriver, TransitionDriver};
pub use easing::{EasingFunction, StepPosition};
pub use engine::{Engine, Registration};
pub use error::{EngineError, TransitionError};
pub use events::EngineEvent;
pub use metrics::MetricsSnapshot;
pub use motion::MotionPolicy;
pub use registry::{AnimationDescriptor, DescriptorConfig};
pub use sampler::Axis;
pub use sequence::SequenceOptions;
pub use style::{AnimationKind, ScriptedFrame, StyleFrame};
pub use timeline::Frame;
pub use types::{DescriptorId, DescriptorState, SequenceId, TargetHandle, TimelineId, TriggerKind};

pub use choreo_config::ChoreoConfig;
