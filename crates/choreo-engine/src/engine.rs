//! The scheduling engine.
//!
//! `Engine` wires every component together and owns the virtual clock. It:
//! - Turns trigger occurrences into fire requests and drains them FIFO
//! - Walks each descriptor through `pending → queued → running → completed`
//! - Hands style kinds to the driver and steps scripted kinds itself
//! - Runs timelines frame by frame
//! - Settles everything instantly while reduced motion is preferred
//!
//! All waiting is expressed as one-shot timers that fire inside
//! [`Engine::tick`]. Nothing blocks and nothing is delivered synchronously:
//! lifecycle events are queued and polled afterwards.
//!
//! # Usage
//!
//! ```
//! use choreo_engine::{Engine, EngineContext, RecordingDriver, DescriptorState};
//!
//! let ctx = EngineContext::new(Default::default());
//! let mut engine = Engine::new(ctx.clone(), RecordingDriver::new());
//!
//! let id = engine.register(ctx.descriptor("hero").with_duration(300));
//! engine.report_intersection("hero", true);
//! engine.tick(16);
//! assert_eq!(engine.state(id), Some(DescriptorState::Running));
//!
//! engine.tick(300);
//! assert_eq!(engine.state(id), Some(DescriptorState::Completed));
//! ```

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use tracing::{debug, info, warn};
use web_time::{Duration, Instant};

use crate::context::EngineContext;
use crate::declarative::RawDescriptor;
use crate::driver::{NativeTransition, TransitionDriver};
use crate::error::{EngineError, Result};
use crate::events::{EngineEvent, EventQueue};
use crate::interpolate::Interpolate;
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::motion::SubscriptionId;
use crate::queue::{FireRequest, QueueProcessor};
use crate::registry::{AnimationDescriptor, DescriptorConfig, DescriptorRegistry};
use crate::sampler::{Axis, ContinuousSampler, ParallaxLayer};
use crate::sequence::{self, Sequence, SequenceOptions, Sequencer};
use crate::style::StyleFrame;
use crate::timeline::{Advance, Frame, Timeline, TimelineExecutor};
use crate::timer::{TimerId, TimerQueue, TimerTask};
use crate::trigger::{TriggerDetector, Watch};
use crate::types::{
    DescriptorId, DescriptorState, SequenceId, TargetHandle, TimelineId, TriggerKind,
};

/// What one declarative entry (or group of staggered entries) became.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Descriptor(DescriptorId),
    Sequence(SequenceId),
}

/// Bookkeeping for a descriptor that is queued or running.
#[derive(Debug, Default)]
struct Execution {
    /// Timer that moves it to its next state.
    timer: Option<TimerId>,
    /// Clock time it entered `running`.
    started_at_ms: Option<u64>,
    /// Wall-clock time spent in driver calls on its behalf.
    cost: Duration,
}

/// Cooperative, tick-driven animation scheduler.
pub struct Engine<D: TransitionDriver> {
    ctx: Rc<EngineContext>,
    driver: D,

    registry: DescriptorRegistry,
    triggers: TriggerDetector,
    queue: QueueProcessor,
    sequencer: Sequencer,
    timelines: TimelineExecutor,
    timers: TimerQueue,
    metrics: MetricsCollector,
    sampler: ContinuousSampler,
    events: EventQueue,

    executions: HashMap<DescriptorId, Execution>,
    /// Pending wait timer of each running timeline.
    timeline_timers: HashMap<TimelineId, TimerId>,

    now_ms: u64,
    /// Set by the motion policy observer, consumed by the next tick.
    motion_changed: Rc<Cell<bool>>,
    subscription: SubscriptionId,
    strict: bool,
    state_change_events: bool,
}

impl<D: TransitionDriver> Engine<D> {
    pub fn new(ctx: Rc<EngineContext>, driver: D) -> Self {
        let motion_changed = Rc::new(Cell::new(false));
        let flag = Rc::clone(&motion_changed);
        let subscription = ctx.motion().subscribe(move |_| flag.set(true));

        let config = ctx.config();
        let engine = Self {
            driver,
            registry: DescriptorRegistry::new(),
            triggers: TriggerDetector::new(ctx.has_visibility_observer()),
            queue: QueueProcessor::new(),
            sequencer: Sequencer::new(),
            timelines: TimelineExecutor::new(),
            timers: TimerQueue::new(),
            metrics: MetricsCollector::new(&config.metrics),
            sampler: ContinuousSampler::new(config.parallax.enabled),
            events: EventQueue::new(),
            executions: HashMap::new(),
            timeline_timers: HashMap::new(),
            now_ms: 0,
            motion_changed,
            subscription,
            strict: config.engine.strict_transitions,
            state_change_events: config.engine.state_change_events,
            ctx,
        };

        info!(
            reduced_motion = engine.reduced_motion(),
            visibility_observer = engine.triggers.observer_available(),
            strict = engine.strict,
            "animation engine created"
        );
        engine
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register a descriptor and start watching its trigger.
    ///
    /// The target is put into its pre-animation state. Immediate triggers
    /// (and visibility triggers on hosts without an intersection primitive)
    /// fire right away.
    pub fn register(&mut self, config: DescriptorConfig) -> DescriptorId {
        let target = config.target.clone();
        let kind = config.kind;
        let trigger = config.trigger;

        let id = self.registry.register(config);
        self.metrics.record_registered();
        self.driver.prepare(&target, &kind);

        let effective = self.triggers.watch(&target, trigger, Watch::Descriptor(id));
        if effective != trigger {
            if let Some(descriptor) = self.registry.get_mut(id) {
                descriptor.trigger = effective;
            }
        }
        debug!(%id, element = %target, ?kind, trigger = ?effective, "descriptor registered");

        if effective == TriggerKind::Immediate {
            self.fire(id);
        }
        id
    }

    /// Remove a descriptor. Pending timers for it are cancelled and any fire
    /// request still queued for it is dropped when reached.
    pub fn unregister(&mut self, id: DescriptorId) {
        let Some(descriptor) = self.registry.unregister(id) else {
            debug!(%id, "unregister for unknown descriptor ignored");
            return;
        };
        self.triggers.unwatch(Watch::Descriptor(id));
        if let Some(timer) = self.executions.remove(&id).and_then(|e| e.timer) {
            self.timers.cancel(timer);
        }
        debug!(%id, element = %descriptor.target, state = ?descriptor.state, "descriptor unregistered");
    }

    /// Register a batch of declarative descriptors in order.
    ///
    /// Contiguous entries marked `stagger` become one sequence, triggered by
    /// the first entry's trigger and staggered with the configured base and
    /// cap on top of each entry's own delay.
    pub fn register_declarative<I>(&mut self, entries: I) -> Vec<Registration>
    where
        I: IntoIterator,
        I::Item: Into<RawDescriptor>,
    {
        let ctx = Rc::clone(&self.ctx);
        let mut registrations = Vec::new();
        let mut group: Vec<DescriptorConfig> = Vec::new();

        for entry in entries {
            let raw: RawDescriptor = entry.into();
            let resolved = raw.resolve(&ctx);
            if resolved.stagger {
                group.push(resolved.config);
                continue;
            }
            self.flush_stagger_group(&mut group, &mut registrations);
            registrations.push(Registration::Descriptor(self.register(resolved.config)));
        }
        self.flush_stagger_group(&mut group, &mut registrations);
        registrations
    }

    fn flush_stagger_group(
        &mut self,
        group: &mut Vec<DescriptorConfig>,
        registrations: &mut Vec<Registration>,
    ) {
        let Some(trigger) = group.first().map(|c| c.trigger) else {
            return;
        };
        let stagger = &self.ctx.config().stagger;
        let (base, max) = (stagger.base_ms, stagger.max_ms);

        let members: Vec<DescriptorConfig> = group
            .drain(..)
            .enumerate()
            .map(|(index, config)| {
                let delay = config
                    .delay_ms
                    .saturating_add(sequence::stagger_delay(index, base, max));
                config.with_delay(delay).with_trigger(TriggerKind::Manual)
            })
            .collect();

        if let Ok(id) = self.build_sequence(members, trigger, base) {
            registrations.push(Registration::Sequence(id));
        }
    }

    // ========================================================================
    // Firing
    // ========================================================================

    /// Raise a fire request for one descriptor (the manual trigger).
    ///
    /// Ignored unless the descriptor is `pending`; unknown ids are dropped.
    pub fn fire(&mut self, id: DescriptorId) {
        match self.registry.state(id) {
            Some(DescriptorState::Pending) => {
                self.queue.submit(id, self.now_ms);
                self.drain();
            }
            Some(state) => {
                debug!(%id, ?state, "trigger ignored, descriptor not pending");
            }
            None => {
                debug!(%id, "fire for unknown descriptor dropped");
                self.metrics.record_dropped();
            }
        }
    }

    /// Submit every pending member of a sequence at once.
    pub fn fire_sequence(&mut self, id: SequenceId) {
        let Some(sequence) = self.sequencer.get(id) else {
            debug!(%id, "fire for unknown sequence dropped");
            return;
        };

        let mut submitted = 0usize;
        for member in &sequence.members {
            if self.registry.state(*member) == Some(DescriptorState::Pending) {
                self.queue.submit(*member, self.now_ms);
                submitted += 1;
            }
        }
        debug!(%id, submitted, "sequence fired");
        self.drain();
    }

    /// Serve queued fire requests in arrival order until the queue is empty.
    fn drain(&mut self) {
        if !self.queue.begin_drain() {
            return;
        }
        while let Some(request) = self.queue.pop_next() {
            self.accept(request);
        }
        self.queue.end_drain();
    }

    fn accept(&mut self, request: FireRequest) {
        let id = request.id;
        let delay_ms = match self.registry.get(id) {
            Some(descriptor) if descriptor.state == DescriptorState::Pending => descriptor.delay_ms,
            Some(descriptor) => {
                debug!(
                    %id,
                    state = ?descriptor.state,
                    submitted_at_ms = request.submitted_at_ms,
                    "stale fire request dropped"
                );
                self.metrics.record_dropped();
                return;
            }
            None => {
                debug!(
                    %id,
                    submitted_at_ms = request.submitted_at_ms,
                    "fire request for removed descriptor dropped"
                );
                self.metrics.record_dropped();
                return;
            }
        };

        if !self.set_state(id, DescriptorState::Queued) {
            return;
        }
        if self.reduced_motion() {
            self.settle_now(id);
            return;
        }

        let timer = self
            .timers
            .schedule(self.now_ms.saturating_add(delay_ms), TimerTask::BeginExecution(id));
        self.executions.insert(
            id,
            Execution {
                timer: Some(timer),
                ..Execution::default()
            },
        );
    }

    // ========================================================================
    // Host observations
    // ========================================================================

    /// Intersection report from the host's shared visibility watcher.
    ///
    /// Entering fires pending watchers; leaving re-arms completed repeatable
    /// ones without firing them.
    pub fn report_intersection(&mut self, target: impl Into<TargetHandle>, intersecting: bool) {
        let target = target.into();
        for watch in self.triggers.on_intersection(&target) {
            if intersecting {
                self.trigger_watch(watch);
            } else {
                self.rearm_watch(watch);
            }
        }
    }

    pub fn pointer_enter(&mut self, target: impl Into<TargetHandle>) {
        let target = target.into();
        for watch in self.triggers.on_pointer(&target, TriggerKind::Hover) {
            self.trigger_watch(watch);
        }
    }

    /// Pointer left the target: re-arms completed repeatable hover watchers.
    pub fn pointer_leave(&mut self, target: impl Into<TargetHandle>) {
        let target = target.into();
        for watch in self.triggers.on_pointer(&target, TriggerKind::Hover) {
            self.rearm_watch(watch);
        }
    }

    /// A click replays completed repeatable watchers and fires pending ones.
    pub fn click(&mut self, target: impl Into<TargetHandle>) {
        let target = target.into();
        for watch in self.triggers.on_pointer(&target, TriggerKind::Click) {
            self.rearm_watch(watch);
            self.trigger_watch(watch);
        }
    }

    fn trigger_watch(&mut self, watch: Watch) {
        match watch {
            Watch::Descriptor(id) => self.fire(id),
            Watch::Sequence(id) => self.fire_sequence(id),
        }
    }

    fn rearm_watch(&mut self, watch: Watch) {
        match watch {
            Watch::Descriptor(id) => self.rearm(id),
            Watch::Sequence(id) => {
                let members = self
                    .sequencer
                    .get(id)
                    .map(|s| s.members.clone())
                    .unwrap_or_default();
                for member in members {
                    self.rearm(member);
                }
            }
        }
    }

    /// `completed → pending` for repeatable descriptors; anything else is
    /// left alone.
    fn rearm(&mut self, id: DescriptorId) {
        let Some(descriptor) = self.registry.get(id) else {
            return;
        };
        if descriptor.state != DescriptorState::Completed || !descriptor.repeatable {
            return;
        }
        let (target, kind) = (descriptor.target.clone(), descriptor.kind);
        if self.set_state(id, DescriptorState::Pending) {
            self.driver.reset(&target, &kind);
            debug!(%id, "descriptor re-armed");
        }
    }

    // ========================================================================
    // Sequences and timelines
    // ========================================================================

    /// Register one descriptor per target, staggered by index, behind a
    /// single trigger watched on the first target.
    pub fn create_sequence<I>(&mut self, targets: I, options: SequenceOptions) -> Result<SequenceId>
    where
        I: IntoIterator,
        I::Item: Into<TargetHandle>,
    {
        let targets: Vec<TargetHandle> = targets.into_iter().map(Into::into).collect();
        let members = sequence::plan(&targets, &options)?;
        self.build_sequence(members, options.trigger, options.base_stagger_ms)
    }

    fn build_sequence(
        &mut self,
        members: Vec<DescriptorConfig>,
        trigger: TriggerKind,
        base_stagger_ms: u64,
    ) -> Result<SequenceId> {
        let anchor = members
            .first()
            .map(|c| c.target.clone())
            .ok_or(EngineError::EmptySequence)?;

        let id = SequenceId::new();
        let members: Vec<DescriptorId> = members
            .into_iter()
            .map(|config| {
                let member = self.register(config);
                if let Some(descriptor) = self.registry.get_mut(member) {
                    descriptor.sequence = Some(id);
                }
                member
            })
            .collect();

        let effective = self.triggers.watch(&anchor, trigger, Watch::Sequence(id));
        debug!(%id, %anchor, members = members.len(), trigger = ?effective, "sequence created");
        self.sequencer.insert(Sequence {
            id,
            members,
            anchor,
            trigger: effective,
            base_stagger_ms,
        });

        if effective == TriggerKind::Immediate {
            self.fire_sequence(id);
        }
        Ok(id)
    }

    pub fn create_timeline(&mut self, frames: Vec<Frame>) -> Result<TimelineId> {
        let id = self.timelines.create(frames)?;
        debug!(%id, "timeline created");
        Ok(id)
    }

    /// Start a timeline. The first frame's action runs immediately.
    ///
    /// A second `play` while it is running is ignored; a completed timeline
    /// plays again from the start.
    pub fn play(&mut self, id: TimelineId) {
        if !self.timelines.start(id) {
            debug!(%id, "play ignored, timeline unknown or already running");
            return;
        }
        self.advance_timeline(id);
    }

    fn advance_timeline(&mut self, id: TimelineId) {
        match self.timelines.advance(id) {
            Some(Advance::Wait(wait_ms)) => {
                let wait_ms = if self.reduced_motion() { 0 } else { wait_ms };
                let timer = self
                    .timers
                    .schedule(self.now_ms.saturating_add(wait_ms), TimerTask::AdvanceTimeline(id));
                self.timeline_timers.insert(id, timer);
            }
            Some(Advance::Complete) => {
                debug!(%id, at_ms = self.now_ms, "timeline complete");
                self.events.push(EngineEvent::TimelineComplete { id });
            }
            None => {}
        }
    }

    // ========================================================================
    // Parallax
    // ========================================================================

    /// Add a scroll-linked layer. `None` uses the configured default speed.
    pub fn add_parallax_layer(
        &mut self,
        target: impl Into<TargetHandle>,
        speed: Option<f64>,
        axis: Axis,
    ) {
        let speed = speed
            .filter(|s| s.is_finite())
            .unwrap_or(self.ctx.config().parallax.default_speed);
        self.sampler.add_layer(ParallaxLayer {
            target: target.into(),
            speed,
            axis,
        });
    }

    pub fn remove_parallax_layer(&mut self, target: impl Into<TargetHandle>) -> bool {
        self.sampler.remove_layer(&target.into())
    }

    /// Record a scroll position; applied on the next tick.
    pub fn on_scroll(&mut self, position: f64) {
        self.sampler.on_scroll(position);
    }

    // ========================================================================
    // Clock
    // ========================================================================

    /// Advance the virtual clock by `delta_ms`.
    ///
    /// Every timer due within the window fires in deadline order, with the
    /// clock set to its deadline while it runs. Afterwards running scripted
    /// kinds are stepped and parallax offsets applied, once each.
    pub fn tick(&mut self, delta_ms: u64) {
        let until = self.now_ms.saturating_add(delta_ms);

        if self.motion_changed.replace(false) {
            self.apply_motion_change();
        }

        while let Some((deadline, _, task)) = self.timers.pop_due(until) {
            self.now_ms = self.now_ms.max(deadline);
            self.run_task(task);
        }
        self.now_ms = until;

        self.step_scripted();
        let reduced = self.reduced_motion();
        for (target, x, y) in self.sampler.sample(reduced) {
            self.driver.apply_offset(&target, x, y);
        }
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Deadline of the next pending timer, for hosts that sleep between ticks.
    pub fn next_deadline(&mut self) -> Option<u64> {
        self.timers.next_deadline()
    }

    fn run_task(&mut self, task: TimerTask) {
        match task {
            TimerTask::BeginExecution(id) => {
                if let Some(execution) = self.executions.get_mut(&id) {
                    execution.timer = None;
                }
                self.begin_execution(id);
            }
            TimerTask::FinishExecution(id) => {
                if let Some(execution) = self.executions.get_mut(&id) {
                    execution.timer = None;
                }
                self.finish_execution(id);
            }
            TimerTask::AdvanceTimeline(id) => {
                self.timeline_timers.remove(&id);
                self.advance_timeline(id);
            }
        }
    }

    // ========================================================================
    // Execution
    // ========================================================================

    fn begin_execution(&mut self, id: DescriptorId) {
        let Some((target, kind, duration_ms, easing)) = self
            .registry
            .get(id)
            .filter(|d| d.state == DescriptorState::Queued)
            .map(|d| (d.target.clone(), d.kind, d.duration_ms, d.effective_easing()))
        else {
            return;
        };
        if self.reduced_motion() {
            self.settle_now(id);
            return;
        }

        if !self.set_state(id, DescriptorState::Running) {
            return;
        }
        self.events.push(EngineEvent::AnimationStart { id });

        let started = Instant::now();
        match kind.style_pair() {
            Some((from, to)) => self.driver.begin(
                &target,
                &NativeTransition {
                    kind,
                    from,
                    to,
                    duration_ms,
                    easing,
                },
            ),
            None => {
                if let Some(frame) = kind.sample_script(0.0) {
                    self.driver.step(&target, frame);
                }
            }
        }
        let cost = started.elapsed();

        let timer = self
            .timers
            .schedule(self.now_ms.saturating_add(duration_ms), TimerTask::FinishExecution(id));
        let execution = self.executions.entry(id).or_default();
        execution.timer = Some(timer);
        execution.started_at_ms = Some(self.now_ms);
        execution.cost += cost;
    }

    fn finish_execution(&mut self, id: DescriptorId) {
        let Some(descriptor) = self
            .registry
            .get(id)
            .filter(|d| d.state == DescriptorState::Running)
        else {
            return;
        };

        if let Some(frame) = descriptor.kind.final_script() {
            let started = Instant::now();
            self.driver.step(&descriptor.target, frame);
            self.executions.entry(id).or_default().cost += started.elapsed();
        }
        self.complete(id, false);
    }

    /// Instant-settle path: apply the end state now and complete.
    fn settle_now(&mut self, id: DescriptorId) {
        if let Some(timer) = self.executions.get_mut(&id).and_then(|e| e.timer.take()) {
            self.timers.cancel(timer);
        }
        let Some(descriptor) = self.registry.get(id) else {
            return;
        };
        let state = descriptor.state;
        let target = descriptor.target.clone();
        let kind = descriptor.kind;

        if state == DescriptorState::Queued {
            if !self.set_state(id, DescriptorState::Running) {
                return;
            }
            self.events.push(EngineEvent::AnimationStart { id });
            self.executions.entry(id).or_default().started_at_ms = Some(self.now_ms);
        } else if state != DescriptorState::Running {
            return;
        }

        let started = Instant::now();
        self.driver.settle(&target, &kind);
        if let Some(frame) = kind.final_script() {
            self.driver.step(&target, frame);
        }
        self.executions.entry(id).or_default().cost += started.elapsed();
        self.complete(id, true);
    }

    fn complete(&mut self, id: DescriptorId, instant: bool) {
        if !self.set_state(id, DescriptorState::Completed) {
            return;
        }
        let execution = self.executions.remove(&id).unwrap_or_default();
        let duration_ms = execution
            .started_at_ms
            .map_or(0, |start| self.now_ms.saturating_sub(start));

        self.metrics.record_completion(execution.cost, instant);
        self.events
            .push(EngineEvent::AnimationComplete { id, duration_ms });
    }

    /// Push the current sample of every running scripted kind.
    fn step_scripted(&mut self) {
        let mut running: Vec<(DescriptorId, u64)> = self
            .executions
            .iter()
            .filter_map(|(id, e)| e.started_at_ms.map(|start| (*id, start)))
            .collect();
        running.sort();

        for (id, started_at_ms) in running {
            let Some(descriptor) = self.registry.get(id) else {
                continue;
            };
            if descriptor.state != DescriptorState::Running || !descriptor.kind.is_scripted() {
                continue;
            }
            let progress = self.eased_progress(descriptor, started_at_ms);
            if let Some(frame) = descriptor.kind.sample_script(progress) {
                let started = Instant::now();
                self.driver.step(&descriptor.target, frame);
                if let Some(execution) = self.executions.get_mut(&id) {
                    execution.cost += started.elapsed();
                }
            }
        }
    }

    fn eased_progress(&self, descriptor: &AnimationDescriptor, started_at_ms: u64) -> f32 {
        let elapsed = self.now_ms.saturating_sub(started_at_ms);
        let linear = if descriptor.duration_ms == 0 {
            1.0
        } else {
            (elapsed as f64 / descriptor.duration_ms as f64).min(1.0) as f32
        };
        descriptor.effective_easing().evaluate(linear)
    }

    /// Apply a state edge, enforcing the violation policy on refusal.
    fn set_state(&mut self, id: DescriptorId, to: DescriptorState) -> bool {
        match self.registry.transition(id, to) {
            Ok(from) => {
                if self.state_change_events {
                    self.events.push(EngineEvent::StateChanged { id, from, to });
                }
                true
            }
            Err(err) => {
                if self.strict {
                    panic!("animation state machine violation: {err}");
                }
                warn!(%err, "state machine violation ignored");
                false
            }
        }
    }

    // ========================================================================
    // Motion policy
    // ========================================================================

    fn reduced_motion(&self) -> bool {
        self.ctx.motion().prefers_reduced_motion()
    }

    /// Runs on the first tick after the preference changed. Switching to
    /// reduced motion settles everything in flight and collapses the waits
    /// of running timelines.
    fn apply_motion_change(&mut self) {
        self.sampler.invalidate();
        if !self.reduced_motion() {
            debug!("full motion restored");
            return;
        }

        let in_flight = self.registry.in_flight();
        for id in &in_flight {
            self.settle_now(*id);
        }

        let mut waiting: Vec<(TimelineId, TimerId)> = self.timeline_timers.drain().collect();
        waiting.sort();
        for (id, timer) in waiting {
            self.timers.cancel(timer);
            let timer = self.timers.schedule(self.now_ms, TimerTask::AdvanceTimeline(id));
            self.timeline_timers.insert(id, timer);
        }

        info!(settled = in_flight.len(), "reduced motion enabled");
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub fn descriptor(&self, id: DescriptorId) -> Option<&AnimationDescriptor> {
        self.registry.get(id)
    }

    pub fn state(&self, id: DescriptorId) -> Option<DescriptorState> {
        self.registry.state(id)
    }

    /// Descriptors registered for a target.
    pub fn descriptors_for(&self, target: impl Into<TargetHandle>) -> Vec<DescriptorId> {
        self.registry.ids_for_target(&target.into()).to_vec()
    }

    pub fn sequence(&self, id: SequenceId) -> Option<&Sequence> {
        self.sequencer.get(id)
    }

    pub fn timeline(&self, id: TimelineId) -> Option<&Timeline> {
        self.timelines.get(id)
    }

    /// Interpolated style of a style-kind descriptor at the current clock.
    pub fn current_style(&self, id: DescriptorId) -> Option<StyleFrame> {
        let descriptor = self.registry.get(id)?;
        let (from, to) = descriptor.kind.style_pair()?;
        match descriptor.state {
            DescriptorState::Pending | DescriptorState::Queued => Some(from),
            DescriptorState::Completed => Some(to),
            DescriptorState::Running => {
                let started = self.executions.get(&id)?.started_at_ms?;
                Some(from.interpolate(&to, self.eased_progress(descriptor, started)))
            }
        }
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.registry.in_flight().len())
    }

    pub fn context(&self) -> &Rc<EngineContext> {
        &self.ctx
    }

    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn driver_mut(&mut self) -> &mut D {
        &mut self.driver
    }

    pub fn len(&self) -> usize {
        self.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registry.is_empty()
    }

    // ========================================================================
    // Events
    // ========================================================================

    /// Take every queued event in emission order.
    ///
    /// The queue is unbounded, so hosts must drain it regularly. Set
    /// `engine.state_change_events = false` to keep only lifecycle events.
    pub fn drain_events(&mut self) -> impl Iterator<Item = EngineEvent> + '_ {
        self.events.drain()
    }

    pub fn pop_event(&mut self) -> Option<EngineEvent> {
        self.events.pop()
    }

    pub fn peek_event(&self) -> Option<&EngineEvent> {
        self.events.peek()
    }

    pub fn has_events(&self) -> bool {
        !self.events.is_empty()
    }

    /// Queued events about one descriptor.
    pub fn events_for(&self, id: DescriptorId) -> Vec<&EngineEvent> {
        self.events.events_for(id)
    }

    // ========================================================================
    // Teardown
    // ========================================================================

    /// Tear everything down.
    ///
    /// Targets that are queued or running snap to their end state so nothing
    /// is left half-animated; no events are emitted and no metrics recorded
    /// for them. Timers, queued requests, watchers, sequences, timelines,
    /// parallax layers and descriptors are all dropped. Events already
    /// emitted stay available for polling.
    pub fn destroy(&mut self) {
        let in_flight = self.registry.in_flight();
        for id in &in_flight {
            if let Some(descriptor) = self.registry.get(*id) {
                self.driver.settle(&descriptor.target, &descriptor.kind);
                if let Some(frame) = descriptor.kind.final_script() {
                    self.driver.step(&descriptor.target, frame);
                }
            }
        }

        let dropped = self.queue.clear();
        let descriptors = self.registry.len();
        self.timers.clear();
        self.triggers.clear();
        self.sequencer.clear();
        self.timelines.clear();
        self.sampler.clear();
        self.executions.clear();
        self.timeline_timers.clear();
        self.registry.clear();

        info!(
            descriptors,
            settled = in_flight.len(),
            dropped,
            "animation engine destroyed"
        );
    }
}

impl<D: TransitionDriver> Drop for Engine<D> {
    fn drop(&mut self) {
        self.ctx.motion().unsubscribe(self.subscription);
    }
}

impl<D: TransitionDriver> fmt::Debug for Engine<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("now_ms", &self.now_ms)
            .field("descriptors", &self.registry.len())
            .field("queued_requests", &self.queue.len())
            .field("timers", &self.timers.len())
            .field("sequences", &self.sequencer.len())
            .field("timelines", &self.timelines.len())
            .field("reduced_motion", &self.reduced_motion())
            .finish_non_exhaustive()
    }
}

// Events and configs cross into host code that may hand them to other
// threads; the engine itself is pinned to the event-loop thread.
static_assertions::assert_impl_all!(EngineEvent: Send, Sync);
static_assertions::assert_impl_all!(DescriptorConfig: Send, Sync);
static_assertions::assert_not_impl_any!(crate::motion::MotionPolicy: Sync);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::{DriverCall, RecordingDriver};
    use crate::style::{AnimationKind, ScriptedFrame};
    use choreo_config::ChoreoConfig;

    fn engine() -> (Rc<EngineContext>, Engine<RecordingDriver>) {
        engine_with(ChoreoConfig::default())
    }

    fn engine_with(mut config: ChoreoConfig) -> (Rc<EngineContext>, Engine<RecordingDriver>) {
        config.engine.strict_transitions = true;
        let ctx = EngineContext::new(config);
        let engine = Engine::new(Rc::clone(&ctx), RecordingDriver::new());
        (ctx, engine)
    }

    fn lifecycle(engine: &mut Engine<RecordingDriver>) -> Vec<&'static str> {
        engine
            .drain_events()
            .filter(EngineEvent::is_lifecycle)
            .map(|e| e.name())
            .collect()
    }

    // ========================================================================
    // Basic lifecycle
    // ========================================================================

    #[test]
    fn test_visibility_trigger_runs_to_completion() {
        let (ctx, mut engine) = engine();
        let id = engine.register(ctx.descriptor("hero").with_delay(50).with_duration(200));
        assert_eq!(engine.state(id), Some(DescriptorState::Pending));

        engine.report_intersection("hero", true);
        assert_eq!(engine.state(id), Some(DescriptorState::Queued));

        engine.tick(49);
        assert_eq!(engine.state(id), Some(DescriptorState::Queued));
        engine.tick(1);
        assert_eq!(engine.state(id), Some(DescriptorState::Running));
        engine.tick(200);
        assert_eq!(engine.state(id), Some(DescriptorState::Completed));

        let events: Vec<_> = engine.drain_events().filter(|e| e.is_lifecycle()).collect();
        assert_eq!(
            events,
            vec![
                EngineEvent::AnimationStart { id },
                EngineEvent::AnimationComplete { id, duration_ms: 200 },
            ]
        );
    }

    #[test]
    fn test_immediate_trigger_fires_at_registration() {
        let (ctx, mut engine) = engine();
        let id = engine.register(ctx.descriptor("logo").with_trigger(TriggerKind::Immediate));
        assert_eq!(engine.state(id), Some(DescriptorState::Queued));
        engine.tick(1000);
        assert_eq!(engine.state(id), Some(DescriptorState::Completed));
    }

    #[test]
    fn test_manual_trigger_only_fires_explicitly() {
        let (ctx, mut engine) = engine();
        let id = engine.register(ctx.descriptor("box").with_trigger(TriggerKind::Manual));
        engine.report_intersection("box", true);
        engine.tick(1000);
        assert_eq!(engine.state(id), Some(DescriptorState::Pending));

        engine.fire(id);
        engine.tick(1000);
        assert_eq!(engine.state(id), Some(DescriptorState::Completed));
    }

    #[test]
    fn test_missing_observer_degrades_to_immediate() {
        let mut config = ChoreoConfig::default();
        config.platform.visibility_observer = false;
        let (ctx, mut engine) = engine_with(config);

        let id = engine.register(ctx.descriptor("card"));
        assert_eq!(engine.descriptor(id).unwrap().trigger, TriggerKind::Immediate);
        assert_eq!(engine.state(id), Some(DescriptorState::Queued));
    }

    #[test]
    fn test_hover_and_click() {
        let (ctx, mut engine) = engine();
        let hover = engine.register(ctx.descriptor("a").with_trigger(TriggerKind::Hover));
        let click = engine.register(ctx.descriptor("b").with_trigger(TriggerKind::Click));

        engine.click("a");
        engine.pointer_enter("b");
        assert_eq!(engine.state(hover), Some(DescriptorState::Pending));
        assert_eq!(engine.state(click), Some(DescriptorState::Pending));

        engine.pointer_enter("a");
        engine.click("b");
        assert_eq!(engine.state(hover), Some(DescriptorState::Queued));
        assert_eq!(engine.state(click), Some(DescriptorState::Queued));
    }

    #[test]
    fn test_repeatable_click_replays() {
        let (ctx, mut engine) = engine();
        let id = engine.register(
            ctx.descriptor("btn")
                .with_trigger(TriggerKind::Click)
                .with_duration(100)
                .repeatable(true),
        );

        engine.click("btn");
        engine.tick(100);
        engine.click("btn");
        engine.tick(100);

        let completes = engine
            .drain_events()
            .filter(|e| e.name() == "animation:complete")
            .count();
        assert_eq!(completes, 2);
        assert_eq!(engine.state(id), Some(DescriptorState::Completed));
    }

    #[test]
    fn test_style_kind_hands_native_transition_to_driver() {
        let (ctx, mut engine) = engine();
        engine.register(
            ctx.descriptor("panel")
                .with_kind(AnimationKind::Bounce)
                .with_trigger(TriggerKind::Immediate)
                .with_duration(400),
        );
        engine.tick(0);

        let begin = engine
            .driver()
            .calls()
            .iter()
            .find_map(|call| match call {
                DriverCall::Begin { transition, .. } => Some(*transition),
                _ => None,
            })
            .unwrap();
        assert_eq!(begin.duration_ms, 400);
        assert_eq!(begin.to, StyleFrame::IDENTITY);
        assert_eq!(begin.easing, crate::easing::EasingFunction::BACK_OUT);
    }

    #[test]
    fn test_scripted_kind_is_stepped_each_tick() {
        let (ctx, mut engine) = engine();
        let target = TargetHandle::new("counter");
        engine.register(
            ctx.descriptor(target.clone())
                .with_kind(AnimationKind::CountUp { from: 0.0, to: 100.0 })
                .with_easing(crate::easing::EasingFunction::Linear)
                .with_trigger(TriggerKind::Immediate)
                .with_duration(100),
        );

        engine.tick(50);
        assert_eq!(
            engine.driver().last_frame(&target),
            Some(ScriptedFrame::Value { value: 50.0 })
        );

        engine.tick(50);
        assert_eq!(
            engine.driver().last_frame(&target),
            Some(ScriptedFrame::Value { value: 100.0 })
        );
    }

    #[test]
    fn test_current_style_interpolates() {
        let (ctx, mut engine) = engine();
        let id = engine.register(
            ctx.descriptor("fade")
                .with_easing(crate::easing::EasingFunction::Linear)
                .with_trigger(TriggerKind::Immediate)
                .with_duration(100),
        );
        assert_eq!(engine.current_style(id).unwrap().opacity, 0.0);

        engine.tick(25);
        assert!((engine.current_style(id).unwrap().opacity - 0.25).abs() < 1e-6);

        engine.tick(100);
        assert_eq!(engine.current_style(id), Some(StyleFrame::IDENTITY));
    }

    // ========================================================================
    // Idempotence and teardown races
    // ========================================================================

    #[test]
    fn test_duplicate_triggers_fire_once() {
        let (ctx, mut engine) = engine();
        let id = engine.register(ctx.descriptor("hero").with_duration(100));

        engine.report_intersection("hero", true);
        engine.report_intersection("hero", true);
        engine.tick(50);
        engine.report_intersection("hero", true);
        engine.fire(id);
        engine.tick(100);
        engine.report_intersection("hero", true);
        engine.tick(100);

        assert_eq!(lifecycle(&mut engine), vec!["animation:start", "animation:complete"]);
    }

    #[test]
    fn test_unregister_while_queued_drops_work() {
        let (ctx, mut engine) = engine();
        let id = engine.register(ctx.descriptor("gone").with_delay(100));
        engine.report_intersection("gone", true);
        engine.unregister(id);
        engine.tick(1000);

        assert!(engine.descriptor(id).is_none());
        assert!(lifecycle(&mut engine).is_empty());

        engine.fire(id);
        assert_eq!(engine.metrics().dropped_requests, 1);
    }

    #[test]
    fn test_destroy_snaps_in_flight_targets_to_end() {
        let (ctx, mut engine) = engine();
        let running = TargetHandle::new("running");
        let waiting = TargetHandle::new("waiting");
        engine.register(
            ctx.descriptor(running.clone())
                .with_kind(AnimationKind::SlideUp)
                .with_trigger(TriggerKind::Immediate),
        );
        engine.register(
            ctx.descriptor(waiting.clone())
                .with_kind(AnimationKind::ScaleIn)
                .with_trigger(TriggerKind::Immediate)
                .with_delay(500),
        );
        engine.tick(10);
        engine.drain_events().for_each(drop);

        engine.destroy();

        assert!(engine.is_empty());
        assert_eq!(engine.driver().final_style(&running), Some(StyleFrame::IDENTITY));
        assert_eq!(engine.driver().final_style(&waiting), Some(StyleFrame::IDENTITY));
        assert!(!engine.has_events());

        engine.tick(10_000);
        assert!(!engine.has_events());
        assert_eq!(engine.metrics().total_completed, 0);
    }

    #[test]
    fn test_drop_unsubscribes_from_motion_policy() {
        let (ctx, engine) = engine();
        assert_eq!(ctx.motion().observer_count(), 1);
        drop(engine);
        assert_eq!(ctx.motion().observer_count(), 0);
    }

    #[test]
    #[should_panic(expected = "animation state machine violation")]
    fn test_strict_mode_panics_on_violation() {
        let (ctx, mut engine) = engine();
        let id = engine.register(ctx.descriptor("x").with_trigger(TriggerKind::Manual));
        engine.set_state(id, DescriptorState::Completed);
    }

    #[test]
    fn test_lenient_mode_ignores_violation() {
        let mut config = ChoreoConfig::default();
        config.engine.strict_transitions = false;
        let ctx = EngineContext::new(config);
        let mut engine = Engine::new(Rc::clone(&ctx), RecordingDriver::new());

        let id = engine.register(ctx.descriptor("x").with_trigger(TriggerKind::Manual));
        assert!(!engine.set_state(id, DescriptorState::Completed));
        assert_eq!(engine.state(id), Some(DescriptorState::Pending));
    }

    #[test]
    fn test_state_change_events_can_be_disabled() {
        let mut config = ChoreoConfig::default();
        config.engine.state_change_events = false;
        let (ctx, mut engine) = engine_with(config);

        let id = engine.register(
            ctx.descriptor("quiet")
                .with_trigger(TriggerKind::Immediate)
                .with_duration(100),
        );
        engine.tick(100);

        let events: Vec<EngineEvent> = engine.drain_events().collect();
        assert!(events.iter().all(EngineEvent::is_lifecycle));
        assert_eq!(
            events.iter().map(|e| e.name()).collect::<Vec<_>>(),
            vec!["animation:start", "animation:complete"]
        );
        assert_eq!(engine.state(id), Some(DescriptorState::Completed));
    }

    // ========================================================================
    // Instant settle
    // ========================================================================

    /// Host that only understands scripted samples.
    #[derive(Debug, Default)]
    struct StepOnlyDriver {
        frames: HashMap<TargetHandle, ScriptedFrame>,
    }

    impl TransitionDriver for StepOnlyDriver {
        fn begin(&mut self, _: &TargetHandle, _: &NativeTransition) {}

        fn step(&mut self, target: &TargetHandle, frame: ScriptedFrame) {
            self.frames.insert(target.clone(), frame);
        }

        fn settle(&mut self, _: &TargetHandle, _: &AnimationKind) {}
    }

    #[test]
    fn test_instant_settle_steps_final_frame() {
        let mut config = ChoreoConfig::default();
        config.engine.strict_transitions = true;
        config.motion.prefers_reduced_motion = true;
        let ctx = EngineContext::new(config);
        let mut engine = Engine::new(Rc::clone(&ctx), StepOnlyDriver::default());

        let target = TargetHandle::new("headline");
        let kind = AnimationKind::Typewriter { chars: 12 };
        let id = engine.register(
            ctx.descriptor(target.clone())
                .with_kind(kind)
                .with_trigger(TriggerKind::Immediate)
                .with_duration(2_000),
        );

        assert_eq!(engine.state(id), Some(DescriptorState::Completed));
        assert_eq!(engine.driver().frames.get(&target).copied(), kind.final_script());
    }

    #[test]
    fn test_motion_flip_steps_final_frame_of_running_script() {
        let (ctx, _) = engine();
        let mut engine = Engine::new(Rc::clone(&ctx), StepOnlyDriver::default());
        let target = TargetHandle::new("counter");
        let id = engine.register(
            ctx.descriptor(target.clone())
                .with_kind(AnimationKind::CountUp { from: 0.0, to: 80.0 })
                .with_trigger(TriggerKind::Immediate)
                .with_duration(1_000),
        );
        engine.tick(100);
        assert_eq!(engine.state(id), Some(DescriptorState::Running));

        ctx.motion().set_preference(true);
        engine.tick(1);

        assert_eq!(engine.state(id), Some(DescriptorState::Completed));
        assert_eq!(
            engine.driver().frames.get(&target).copied(),
            Some(ScriptedFrame::Value { value: 80.0 })
        );
    }

    // ========================================================================
    // Parallax
    // ========================================================================

    #[test]
    fn test_parallax_applied_once_per_tick() {
        let (ctx, mut engine) = engine();
        let bg = TargetHandle::new("bg");
        engine.add_parallax_layer(bg.clone(), None, Axis::Vertical);

        engine.on_scroll(100.0);
        engine.on_scroll(200.0);
        engine.tick(16);
        assert_eq!(engine.driver().offset(&bg), Some((0.0, -100.0)));

        let offsets = |engine: &Engine<RecordingDriver>| {
            engine
                .driver()
                .calls()
                .iter()
                .filter(|c| matches!(c, DriverCall::Offset { .. }))
                .count()
        };
        assert_eq!(offsets(&engine), 1);
        engine.tick(16);
        assert_eq!(offsets(&engine), 1);

        ctx.motion().set_preference(true);
        engine.tick(16);
        assert_eq!(engine.driver().offset(&bg), Some((0.0, 0.0)));
    }
}
