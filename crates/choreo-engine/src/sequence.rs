//! Staggered sequences.
//!
//! A sequence registers one manual-trigger descriptor per target, each delayed
//! by `min(index * base, max)`, and hangs a single outward trigger on the
//! first target. When that trigger fires, every member is submitted at once
//! and the per-descriptor delays produce the visual stagger.

use crate::easing::EasingFunction;
use crate::error::{EngineError, Result};
use crate::registry::DescriptorConfig;
use crate::style::AnimationKind;
use crate::types::{DescriptorId, SequenceId, TargetHandle, TriggerKind};
use std::collections::HashMap;

/// Options for [`crate::Engine::create_sequence`].
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceOptions {
    pub kind: AnimationKind,
    pub base_stagger_ms: u64,
    pub max_stagger_ms: u64,
    pub duration_ms: u64,
    pub easing: EasingFunction,
    /// Trigger watched on the first member.
    pub trigger: TriggerKind,
    pub repeatable: bool,
}

impl Default for SequenceOptions {
    fn default() -> Self {
        Self {
            kind: AnimationKind::Fade,
            base_stagger_ms: 100,
            max_stagger_ms: 1000,
            duration_ms: 600,
            easing: EasingFunction::EaseOut,
            trigger: TriggerKind::Visibility,
            repeatable: false,
        }
    }
}

impl SequenceOptions {
    pub fn with_kind(mut self, kind: AnimationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_stagger(mut self, base_ms: u64, max_ms: u64) -> Self {
        self.base_stagger_ms = base_ms;
        self.max_stagger_ms = max_ms;
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerKind) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }
}

/// Delay of the member at `index`: `min(index * base, max)`.
pub fn stagger_delay(index: usize, base_ms: u64, max_ms: u64) -> u64 {
    (index as u64).saturating_mul(base_ms).min(max_ms)
}

/// Member configurations for a sequence over `targets`, in order.
pub fn plan(targets: &[TargetHandle], options: &SequenceOptions) -> Result<Vec<DescriptorConfig>> {
    if targets.is_empty() {
        return Err(EngineError::EmptySequence);
    }
    Ok(targets
        .iter()
        .enumerate()
        .map(|(index, target)| {
            DescriptorConfig::new(target.clone())
                .with_kind(options.kind)
                .with_trigger(TriggerKind::Manual)
                .with_duration(options.duration_ms)
                .with_delay(stagger_delay(
                    index,
                    options.base_stagger_ms,
                    options.max_stagger_ms,
                ))
                .with_easing(options.easing)
                .repeatable(options.repeatable)
        })
        .collect())
}

/// An immutable group of descriptors sharing one trigger.
#[derive(Debug, Clone, PartialEq)]
pub struct Sequence {
    pub id: SequenceId,
    pub members: Vec<DescriptorId>,
    /// Target carrying the outward trigger.
    pub anchor: TargetHandle,
    /// Trigger in effect on the anchor.
    pub trigger: TriggerKind,
    pub base_stagger_ms: u64,
}

#[derive(Debug, Default)]
pub struct Sequencer {
    sequences: HashMap<SequenceId, Sequence>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, sequence: Sequence) {
        self.sequences.insert(sequence.id, sequence);
    }

    pub fn get(&self, id: SequenceId) -> Option<&Sequence> {
        self.sequences.get(&id)
    }

    pub fn len(&self) -> usize {
        self.sequences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sequences.is_empty()
    }

    pub fn clear(&mut self) {
        self.sequences.clear();
    }
}
