//! Descriptor registry.
//!
//! Pure state store: it owns every registered descriptor and validates state
//! changes against the legal edges. It never schedules anything and never
//! decides what to do about a refused transition; the engine applies the
//! strict/lenient policy.

use crate::easing::EasingFunction;
use crate::error::TransitionError;
use crate::style::AnimationKind;
use crate::types::{DescriptorId, DescriptorState, SequenceId, TargetHandle, TriggerKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything needed to register one descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DescriptorConfig {
    pub target: TargetHandle,
    pub kind: AnimationKind,
    pub trigger: TriggerKind,
    pub duration_ms: u64,
    pub delay_ms: u64,
    pub easing: EasingFunction,
    pub repeatable: bool,
}

impl DescriptorConfig {
    /// Configuration with built-in defaults: fade, visibility, 600ms, no delay.
    ///
    /// Use `EngineContext::descriptor` to start from the configured defaults.
    pub fn new(target: impl Into<TargetHandle>) -> Self {
        Self {
            target: target.into(),
            kind: AnimationKind::Fade,
            trigger: TriggerKind::Visibility,
            duration_ms: 600,
            delay_ms: 0,
            easing: EasingFunction::EaseOut,
            repeatable: false,
        }
    }

    pub fn with_kind(mut self, kind: AnimationKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_trigger(mut self, trigger: TriggerKind) -> Self {
        self.trigger = trigger;
        self
    }

    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    pub fn with_delay(mut self, delay_ms: u64) -> Self {
        self.delay_ms = delay_ms;
        self
    }

    pub fn with_easing(mut self, easing: EasingFunction) -> Self {
        self.easing = easing;
        self
    }

    pub fn repeatable(mut self, repeatable: bool) -> Self {
        self.repeatable = repeatable;
        self
    }
}

/// A registered descriptor and its lifecycle state.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationDescriptor {
    pub id: DescriptorId,
    pub target: TargetHandle,
    pub kind: AnimationKind,
    pub trigger: TriggerKind,
    pub duration_ms: u64,
    pub delay_ms: u64,
    pub easing: EasingFunction,
    pub repeatable: bool,
    pub state: DescriptorState,
    /// Sequence this descriptor is a member of.
    pub sequence: Option<SequenceId>,
}

impl AnimationDescriptor {
    fn from_config(id: DescriptorId, config: DescriptorConfig) -> Self {
        Self {
            id,
            target: config.target,
            kind: config.kind,
            trigger: config.trigger,
            duration_ms: config.duration_ms,
            delay_ms: config.delay_ms,
            easing: config.easing,
            repeatable: config.repeatable,
            state: DescriptorState::Pending,
            sequence: None,
        }
    }

    /// Easing actually used: the kind's own curve wins over the descriptor's.
    pub fn effective_easing(&self) -> EasingFunction {
        self.kind.preferred_easing().unwrap_or(self.easing)
    }
}

#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    descriptors: HashMap<DescriptorId, AnimationDescriptor>,
    by_target: HashMap<TargetHandle, Vec<DescriptorId>>,
}

impl DescriptorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new descriptor in `pending`.
    pub fn register(&mut self, config: DescriptorConfig) -> DescriptorId {
        let id = DescriptorId::new();
        self.by_target
            .entry(config.target.clone())
            .or_default()
            .push(id);
        self.descriptors
            .insert(id, AnimationDescriptor::from_config(id, config));
        id
    }

    pub fn get(&self, id: DescriptorId) -> Option<&AnimationDescriptor> {
        self.descriptors.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: DescriptorId) -> Option<&mut AnimationDescriptor> {
        self.descriptors.get_mut(&id)
    }

    pub fn contains(&self, id: DescriptorId) -> bool {
        self.descriptors.contains_key(&id)
    }

    pub fn state(&self, id: DescriptorId) -> Option<DescriptorState> {
        self.descriptors.get(&id).map(|d| d.state)
    }

    /// Descriptors registered for a target, in registration order.
    pub fn ids_for_target(&self, target: &TargetHandle) -> &[DescriptorId] {
        self.by_target.get(target).map_or(&[], Vec::as_slice)
    }

    /// Move a descriptor to `next`. Returns the previous state.
    pub fn transition(
        &mut self,
        id: DescriptorId,
        next: DescriptorState,
    ) -> Result<DescriptorState, TransitionError> {
        let descriptor = self
            .descriptors
            .get_mut(&id)
            .ok_or(TransitionError::UnknownDescriptor(id))?;
        let from = descriptor.state;
        if !from.can_transition_to(next, descriptor.repeatable) {
            return Err(TransitionError::IllegalTransition { id, from, to: next });
        }
        descriptor.state = next;
        Ok(from)
    }

    /// Remove a descriptor, returning it.
    pub fn unregister(&mut self, id: DescriptorId) -> Option<AnimationDescriptor> {
        let descriptor = self.descriptors.remove(&id)?;
        if let Some(ids) = self.by_target.get_mut(&descriptor.target) {
            ids.retain(|other| *other != id);
            if ids.is_empty() {
                self.by_target.remove(&descriptor.target);
            }
        }
        Some(descriptor)
    }

    pub fn iter(&self) -> impl Iterator<Item = &AnimationDescriptor> {
        self.descriptors.values()
    }

    /// Ids currently `queued` or `running`, in ascending order.
    pub fn in_flight(&self) -> Vec<DescriptorId> {
        let mut ids: Vec<_> = self
            .descriptors
            .values()
            .filter(|d| d.state.is_in_flight())
            .map(|d| d.id)
            .collect();
        ids.sort();
        ids
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    pub fn clear(&mut self) {
        self.descriptors.clear();
        self.by_target.clear();
    }
}
