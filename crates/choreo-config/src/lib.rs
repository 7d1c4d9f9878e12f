//! Choreo configuration system
//!
//! This crate provides centralized configuration for the animation scheduling
//! engine, loading defaults from `choreo.toml` with environment variable
//! overrides layered on top.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Errors raised while loading a configuration file.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure for the engine
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ChoreoConfig {
    /// Descriptor defaults and state-machine policy
    pub engine: EngineConfig,
    /// Sequence stagger settings
    pub stagger: StaggerConfig,
    /// Initial motion preference snapshot
    pub motion: MotionConfig,
    /// Performance budget settings
    pub metrics: MetricsConfig,
    /// Host capability flags
    pub platform: PlatformConfig,
    /// Continuous scroll-linked sampler settings
    pub parallax: ParallaxConfig,
}

/// Defaults substituted for missing or unparseable descriptor attributes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Duration used when a descriptor's duration is absent or invalid
    pub default_duration_ms: u64,
    /// Delay used when a descriptor's delay is absent or invalid
    pub default_delay_ms: u64,
    /// Transition family used when the kind is unknown (e.g. "fade")
    pub default_kind: String,
    /// Timing function used when the easing is unknown (e.g. "ease-out")
    pub default_easing: String,
    /// Panic on illegal state transitions instead of logging them
    pub strict_transitions: bool,
    /// Queue a `state:changed` event for every descriptor state edge
    pub state_change_events: bool,
}

/// Stagger settings for sequences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StaggerConfig {
    /// Per-index delay offset in milliseconds
    pub base_ms: u64,
    /// Upper bound for any member's computed delay
    pub max_ms: u64,
}

/// Motion preference configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct MotionConfig {
    /// Initial value of the reduced-motion preference
    pub prefers_reduced_motion: bool,
}

/// Performance budget configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsConfig {
    /// Executions costing more than this are counted as over budget
    pub frame_budget_ms: f64,
    /// Exponential moving average factor (0.0-1.0, weight of the newest sample)
    pub smoothing: f64,
}

/// Host capability flags
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlatformConfig {
    /// Host exposes a viewport-intersection primitive
    pub visibility_observer: bool,
}

/// Parallax sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxConfig {
    /// Apply scroll-linked offsets at all
    pub enabled: bool,
    /// Speed used for layers registered without an explicit speed
    pub default_speed: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_duration_ms: 600,
            default_delay_ms: 0,
            default_kind: "fade".to_string(),
            default_easing: "ease-out".to_string(),
            strict_transitions: cfg!(debug_assertions),
            state_change_events: true,
        }
    }
}

impl Default for StaggerConfig {
    fn default() -> Self {
        Self {
            base_ms: 100,
            max_ms: 1000,
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            frame_budget_ms: 16.67, // one 60Hz frame
            smoothing: 0.1,
        }
    }
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            visibility_observer: true,
        }
    }
}

impl Default for ParallaxConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            default_speed: 0.5,
        }
    }
}

fn parse_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl ChoreoConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from `choreo.toml` in the current directory,
    /// or return the default configuration if it is missing or invalid
    pub fn load_or_default() -> Self {
        Self::load_from_file("choreo.toml").unwrap_or_default()
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over file values. Values that
    /// fail to parse are ignored.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("CHOREO_DURATION_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                self.engine.default_duration_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("CHOREO_DELAY_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                self.engine.default_delay_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("CHOREO_STRICT") {
            self.engine.strict_transitions = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("CHOREO_STAGGER_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                self.stagger.base_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("CHOREO_MAX_STAGGER_MS") {
            if let Ok(ms) = val.parse::<u64>() {
                self.stagger.max_ms = ms;
            }
        }

        if let Ok(val) = std::env::var("CHOREO_REDUCED_MOTION") {
            self.motion.prefers_reduced_motion = parse_flag(&val);
        }

        if let Ok(val) = std::env::var("CHOREO_FRAME_BUDGET_MS") {
            if let Ok(budget) = val.parse::<f64>() {
                if budget.is_finite() && budget > 0.0 {
                    self.metrics.frame_budget_ms = budget;
                }
            }
        }

        if let Ok(val) = std::env::var("CHOREO_NO_OBSERVER") {
            self.platform.visibility_observer = !parse_flag(&val);
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// 1. Load from choreo.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChoreoConfig::default();
        assert_eq!(config.engine.default_duration_ms, 600);
        assert_eq!(config.engine.default_delay_ms, 0);
        assert_eq!(config.stagger.base_ms, 100);
        assert_eq!(config.stagger.max_ms, 1000);
        assert!(!config.motion.prefers_reduced_motion);
        assert!(config.platform.visibility_observer);
        assert!(config.engine.state_change_events);
    }

    #[test]
    fn test_toml_serialization() {
        let config = ChoreoConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: ChoreoConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.engine.default_kind, "fade");
        assert_eq!(parsed.stagger.max_ms, 1000);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: ChoreoConfig = toml::from_str(
            r#"
            [stagger]
            base_ms = 80

            [motion]
            prefers_reduced_motion = true
            "#,
        )
        .unwrap();

        assert_eq!(parsed.stagger.base_ms, 80);
        assert_eq!(parsed.stagger.max_ms, 1000);
        assert!(parsed.motion.prefers_reduced_motion);
        assert_eq!(parsed.engine.default_duration_ms, 600);
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = ChoreoConfig::load_from_file("definitely/not/here/choreo.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_load_or_default() {
        // Should not panic even if choreo.toml doesn't exist
        let config = ChoreoConfig::load_or_default();
        assert!(config.stagger.base_ms > 0);
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("CHOREO_STAGGER_MS", "40");
            std::env::set_var("CHOREO_MAX_STAGGER_MS", "not-a-number");
            std::env::set_var("CHOREO_REDUCED_MOTION", "true");
            std::env::set_var("CHOREO_NO_OBSERVER", "1");
        }

        let mut config = ChoreoConfig::default();
        config.merge_with_env();

        assert_eq!(config.stagger.base_ms, 40);
        assert_eq!(config.stagger.max_ms, 1000);
        assert!(config.motion.prefers_reduced_motion);
        assert!(!config.platform.visibility_observer);

        unsafe {
            std::env::remove_var("CHOREO_STAGGER_MS");
            std::env::remove_var("CHOREO_MAX_STAGGER_MS");
            std::env::remove_var("CHOREO_REDUCED_MOTION");
            std::env::remove_var("CHOREO_NO_OBSERVER");
        }
    }
}
