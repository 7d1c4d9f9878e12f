//! Error types for the engine.

use crate::types::{DescriptorId, DescriptorState};
use thiserror::Error;

/// Structurally invalid arguments to the public API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("a sequence needs at least one target")]
    EmptySequence,

    #[error("a timeline needs at least one frame")]
    EmptyTimeline,
}

/// A registry state change that was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("descriptor {0} is not registered")]
    UnknownDescriptor(DescriptorId),

    #[error("illegal transition for {id}: {from:?} -> {to:?}")]
    IllegalTransition {
        id: DescriptorId,
        from: DescriptorState,
        to: DescriptorState,
    },
}

pub type Result<T> = std::result::Result<T, EngineError>;
