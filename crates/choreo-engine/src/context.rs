//! Shared engine context.
//!
//! One context per page holds the loaded configuration and the motion policy.
//! It is passed explicitly to the engine constructor and shared with the host
//! through `Rc`, so the host can flip the motion preference at any time.

use crate::easing::EasingFunction;
use crate::motion::MotionPolicy;
use crate::registry::DescriptorConfig;
use crate::sequence::SequenceOptions;
use crate::style::AnimationKind;
use crate::types::TargetHandle;
use choreo_config::ChoreoConfig;
use std::rc::Rc;
use tracing::warn;

#[derive(Debug)]
pub struct EngineContext {
    config: ChoreoConfig,
    motion: MotionPolicy,
    default_kind: AnimationKind,
    default_easing: EasingFunction,
}

impl EngineContext {
    /// Build a context from configuration. Unknown default kind or easing
    /// names in the configuration fall back to fade / ease-out.
    pub fn new(config: ChoreoConfig) -> Rc<Self> {
        let default_kind = AnimationKind::parse(&config.engine.default_kind, None)
            .unwrap_or_else(|| {
                warn!(kind = %config.engine.default_kind, "unknown default kind, using fade");
                AnimationKind::Fade
            });
        let default_easing = EasingFunction::parse(&config.engine.default_easing)
            .unwrap_or_else(|| {
                warn!(easing = %config.engine.default_easing, "unknown default easing, using ease-out");
                EasingFunction::EaseOut
            });

        Rc::new(Self {
            motion: MotionPolicy::new(config.motion.prefers_reduced_motion),
            config,
            default_kind,
            default_easing,
        })
    }

    pub fn config(&self) -> &ChoreoConfig {
        &self.config
    }

    pub fn motion(&self) -> &MotionPolicy {
        &self.motion
    }

    /// Whether the host can report viewport intersections.
    pub fn has_visibility_observer(&self) -> bool {
        self.config.platform.visibility_observer
    }

    pub fn default_kind(&self) -> AnimationKind {
        self.default_kind
    }

    pub fn default_easing(&self) -> EasingFunction {
        self.default_easing
    }

    /// Descriptor configuration for `target` carrying the configured defaults.
    pub fn descriptor(&self, target: impl Into<TargetHandle>) -> DescriptorConfig {
        DescriptorConfig::new(target)
            .with_kind(self.default_kind)
            .with_easing(self.default_easing)
            .with_duration(self.config.engine.default_duration_ms)
            .with_delay(self.config.engine.default_delay_ms)
    }

    /// Sequence options carrying the configured defaults and stagger.
    pub fn sequence_options(&self) -> SequenceOptions {
        SequenceOptions::default()
            .with_kind(self.default_kind)
            .with_easing(self.default_easing)
            .with_duration(self.config.engine.default_duration_ms)
            .with_stagger(self.config.stagger.base_ms, self.config.stagger.max_ms)
    }
}

impl Default for EngineContext {
    fn default() -> Self {
        Self {
            config: ChoreoConfig::default(),
            motion: MotionPolicy::default(),
            default_kind: AnimationKind::Fade,
            default_easing: EasingFunction::EaseOut,
        }
    }
}
