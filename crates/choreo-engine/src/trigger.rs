//! Trigger detection.
//!
//! Maps host observations (intersection reports, pointer events) back to the
//! descriptors or sequences watching that target. One shared visibility
//! watcher covers every visibility-triggered target. The detector only knows
//! who is listening; whether a report turns into a fire request depends on
//! descriptor state, which the engine checks.

use crate::types::{DescriptorId, SequenceId, TargetHandle, TriggerKind};
use std::collections::HashMap;

/// Something a trigger occurrence is delivered to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Watch {
    Descriptor(DescriptorId),
    /// A sequence anchored on this target; fires all members at once.
    Sequence(SequenceId),
}

#[derive(Debug)]
pub struct TriggerDetector {
    observer_available: bool,
    visibility: HashMap<TargetHandle, Vec<Watch>>,
    listeners: HashMap<(TargetHandle, TriggerKind), Vec<Watch>>,
}

impl TriggerDetector {
    /// `observer_available` is false when the host has no intersection
    /// primitive; visibility triggers then degrade to immediate.
    pub fn new(observer_available: bool) -> Self {
        Self {
            observer_available,
            visibility: HashMap::new(),
            listeners: HashMap::new(),
        }
    }

    pub fn observer_available(&self) -> bool {
        self.observer_available
    }

    /// Start watching `target` for `trigger` on behalf of `watch`.
    ///
    /// Returns the trigger that is actually in effect. `Immediate` means the
    /// caller must fire once right now; nothing is stored for it or for
    /// `Manual`.
    pub fn watch(&mut self, target: &TargetHandle, trigger: TriggerKind, watch: Watch) -> TriggerKind {
        match trigger {
            TriggerKind::Visibility if self.observer_available => {
                self.visibility.entry(target.clone()).or_default().push(watch);
                TriggerKind::Visibility
            }
            TriggerKind::Visibility => {
                tracing::debug!(element = %target, "no visibility observer, firing immediately");
                TriggerKind::Immediate
            }
            TriggerKind::Hover | TriggerKind::Click => {
                self.listeners
                    .entry((target.clone(), trigger))
                    .or_default()
                    .push(watch);
                trigger
            }
            TriggerKind::Immediate | TriggerKind::Manual => trigger,
        }
    }

    /// Stop delivering anything to `watch`.
    pub fn unwatch(&mut self, watch: Watch) {
        self.visibility.retain(|_, watches| {
            watches.retain(|w| *w != watch);
            !watches.is_empty()
        });
        self.listeners.retain(|_, watches| {
            watches.retain(|w| *w != watch);
            !watches.is_empty()
        });
    }

    /// Watches interested in an intersection report for `target`.
    pub fn on_intersection(&self, target: &TargetHandle) -> Vec<Watch> {
        self.visibility.get(target).cloned().unwrap_or_default()
    }

    /// Watches interested in a pointer event of `kind` on `target`.
    pub fn on_pointer(&self, target: &TargetHandle, kind: TriggerKind) -> Vec<Watch> {
        self.listeners
            .get(&(target.clone(), kind))
            .cloned()
            .unwrap_or_default()
    }

    /// Number of targets under the shared visibility watcher.
    pub fn observed_targets(&self) -> usize {
        self.visibility.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.values().map(Vec::len).sum()
    }

    pub fn clear(&mut self) {
        self.visibility.clear();
        self.listeners.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target(name: &str) -> TargetHandle {
        TargetHandle::new(name)
    }

    #[test]
    fn test_visibility_shares_one_watcher() {
        let mut detector = TriggerDetector::new(true);
        let a = Watch::Descriptor(DescriptorId(1));
        let b = Watch::Descriptor(DescriptorId(2));

        assert_eq!(detector.watch(&target("x"), TriggerKind::Visibility, a), TriggerKind::Visibility);
        detector.watch(&target("x"), TriggerKind::Visibility, b);
        detector.watch(&target("y"), TriggerKind::Visibility, a);

        assert_eq!(detector.observed_targets(), 2);
        assert_eq!(detector.on_intersection(&target("x")), vec![a, b]);
        assert!(detector.on_intersection(&target("z")).is_empty());
    }

    #[test]
    fn test_visibility_degrades_without_observer() {
        let mut detector = TriggerDetector::new(false);
        let effective = detector.watch(
            &target("x"),
            TriggerKind::Visibility,
            Watch::Descriptor(DescriptorId(1)),
        );
        assert_eq!(effective, TriggerKind::Immediate);
        assert_eq!(detector.observed_targets(), 0);
    }

    #[test]
    fn test_pointer_listeners_are_per_kind() {
        let mut detector = TriggerDetector::new(true);
        let hover = Watch::Descriptor(DescriptorId(1));
        let click = Watch::Sequence(SequenceId(1));
        detector.watch(&target("btn"), TriggerKind::Hover, hover);
        detector.watch(&target("btn"), TriggerKind::Click, click);

        assert_eq!(detector.on_pointer(&target("btn"), TriggerKind::Hover), vec![hover]);
        assert_eq!(detector.on_pointer(&target("btn"), TriggerKind::Click), vec![click]);
        assert_eq!(detector.listener_count(), 2);
    }

    #[test]
    fn test_manual_and_immediate_store_nothing() {
        let mut detector = TriggerDetector::new(true);
        let w = Watch::Descriptor(DescriptorId(1));
        assert_eq!(detector.watch(&target("a"), TriggerKind::Manual, w), TriggerKind::Manual);
        assert_eq!(detector.watch(&target("a"), TriggerKind::Immediate, w), TriggerKind::Immediate);
        assert_eq!(detector.observed_targets(), 0);
        assert_eq!(detector.listener_count(), 0);
    }

    #[test]
    fn test_unwatch() {
        let mut detector = TriggerDetector::new(true);
        let a = Watch::Descriptor(DescriptorId(1));
        let b = Watch::Descriptor(DescriptorId(2));
        detector.watch(&target("x"), TriggerKind::Visibility, a);
        detector.watch(&target("x"), TriggerKind::Visibility, b);
        detector.watch(&target("x"), TriggerKind::Click, a);

        detector.unwatch(a);
        assert_eq!(detector.on_intersection(&target("x")), vec![b]);
        assert_eq!(detector.listener_count(), 0);

        detector.unwatch(b);
        assert_eq!(detector.observed_targets(), 0);
    }
}
