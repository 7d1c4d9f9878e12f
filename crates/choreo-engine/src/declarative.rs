//! Declarative descriptors.
//!
//! A host that scans markup hands over the raw string attributes of each
//! marked target. Resolution never fails: any attribute that is missing or
//! does not parse is replaced by the configured default and logged.

use crate::context::EngineContext;
use crate::easing::EasingFunction;
use crate::registry::DescriptorConfig;
use crate::style::AnimationKind;
use crate::types::{TargetHandle, TriggerKind};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// String attributes of one marked target, exactly as found.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDescriptor {
    pub target: String,
    pub kind: Option<String>,
    /// Parameter for scripted kinds (text length, counter target, percent).
    pub value: Option<String>,
    pub trigger: Option<String>,
    pub duration: Option<String>,
    pub delay: Option<String>,
    pub easing: Option<String>,
    pub stagger: Option<String>,
    pub repeat: Option<String>,
}

/// A raw descriptor after defaults were substituted.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedDescriptor {
    pub config: DescriptorConfig,
    /// Member of a staggered group with its neighbours.
    pub stagger: bool,
}

impl RawDescriptor {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            ..Self::default()
        }
    }

    /// Collect recognised attributes from `(name, value)` pairs. Unknown
    /// names are ignored.
    pub fn from_attributes<'a>(
        target: impl Into<String>,
        attributes: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Self {
        let mut raw = Self::new(target);
        for (name, value) in attributes {
            let value = Some(value.to_string());
            match name.trim().to_ascii_lowercase().as_str() {
                "kind" | "animation" => raw.kind = value,
                "value" => raw.value = value,
                "trigger" => raw.trigger = value,
                "duration" => raw.duration = value,
                "delay" => raw.delay = value,
                "easing" => raw.easing = value,
                "stagger" => raw.stagger = value,
                "repeat" => raw.repeat = value,
                _ => {}
            }
        }
        raw
    }

    /// Resolve against the context's defaults.
    pub fn resolve(&self, ctx: &EngineContext) -> ResolvedDescriptor {
        let defaults = &ctx.config().engine;
        let target = self.target.as_str();

        let kind = match self.kind.as_deref() {
            None => ctx.default_kind(),
            Some(name) => AnimationKind::parse(name, self.value.as_deref()).unwrap_or_else(|| {
                warn!(element = target, kind = name, value = ?self.value, "unknown animation kind, using default");
                ctx.default_kind()
            }),
        };

        let trigger = match self.trigger.as_deref() {
            None => TriggerKind::Visibility,
            Some(name) => name.parse::<TriggerKind>().unwrap_or_else(|()| {
                warn!(element = target, trigger = name, "unknown trigger, using visibility");
                TriggerKind::Visibility
            }),
        };

        let duration_ms = resolve_ms(target, "duration", self.duration.as_deref(), defaults.default_duration_ms);
        let delay_ms = resolve_ms(target, "delay", self.delay.as_deref(), defaults.default_delay_ms);

        let easing = match self.easing.as_deref() {
            None => ctx.default_easing(),
            Some(text) => EasingFunction::parse(text).unwrap_or_else(|| {
                warn!(element = target, easing = text, "unknown easing, using default");
                ctx.default_easing()
            }),
        };

        ResolvedDescriptor {
            config: DescriptorConfig::new(target)
                .with_kind(kind)
                .with_trigger(trigger)
                .with_duration(duration_ms)
                .with_delay(delay_ms)
                .with_easing(easing)
                .repeatable(resolve_flag(target, "repeat", self.repeat.as_deref())),
            stagger: resolve_flag(target, "stagger", self.stagger.as_deref()),
        }
    }
}

impl From<&str> for RawDescriptor {
    fn from(target: &str) -> Self {
        Self::new(target)
    }
}

impl From<TargetHandle> for RawDescriptor {
    fn from(target: TargetHandle) -> Self {
        Self::new(target.as_str())
    }
}

/// Parse a millisecond amount: `300`, `300ms` or `0.3s`.
pub fn parse_ms(text: &str) -> Option<u64> {
    let text = text.trim().to_ascii_lowercase();
    let (number, scale) = if let Some(ms) = text.strip_suffix("ms") {
        (ms, 1.0)
    } else if let Some(s) = text.strip_suffix('s') {
        (s, 1000.0)
    } else {
        (text.as_str(), 1.0)
    };
    let value = number.trim().parse::<f64>().ok()? * scale;
    if !value.is_finite() || value < 0.0 || value > u64::MAX as f64 {
        return None;
    }
    Some(value.round() as u64)
}

/// Parse a boolean attribute. A present but empty attribute counts as true.
pub fn parse_flag(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn resolve_ms(target: &str, attribute: &str, text: Option<&str>, default: u64) -> u64 {
    match text {
        None => default,
        Some(text) => parse_ms(text).unwrap_or_else(|| {
            warn!(element = target, attribute, value = text, default, "invalid time, using default");
            default
        }),
    }
}

fn resolve_flag(target: &str, attribute: &str, text: Option<&str>) -> bool {
    match text {
        None => false,
        Some(text) => parse_flag(text).unwrap_or_else(|| {
            warn!(element = target, attribute, value = text, "invalid flag, using false");
            false
        }),
    }
}
