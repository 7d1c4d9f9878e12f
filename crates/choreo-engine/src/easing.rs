//! Timing functions handed to the native transition primitive.
//!
//! The engine never animates curves itself; it only samples an easing when a
//! scripted kind needs a progress value, or when a host asks for the current
//! interpolated style. Names follow CSS so hosts can forward them verbatim.
//!
//! ```
//! use choreo_engine::easing::EasingFunction;
//!
//! let ease = EasingFunction::parse("cubic-bezier(0.4, 0, 0.2, 1)").unwrap();
//! assert!(ease.evaluate(0.5) > 0.5);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// Position for stepped timing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepPosition {
    /// Jump at the start of each interval (`jump-start` / `start`).
    Start,
    /// Jump at the end of each interval (`jump-end` / `end`).
    #[default]
    End,
}

/// Easing function for transition timing.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EasingFunction {
    /// No easing.
    Linear,
    /// `cubic-bezier(0.25, 0.1, 0.25, 1.0)`.
    Ease,
    /// `cubic-bezier(0.42, 0, 1, 1)`.
    EaseIn,
    /// `cubic-bezier(0, 0, 0.58, 1)`.
    #[default]
    EaseOut,
    /// `cubic-bezier(0.42, 0, 0.58, 1)`.
    EaseInOut,
    /// Custom curve; x values lie in [0, 1], y values may overshoot.
    CubicBezier { x1: f32, y1: f32, x2: f32, y2: f32 },
    /// Discrete jumps; `count >= 1`.
    Steps { count: u32, position: StepPosition },
}

impl EasingFunction {
    /// Overshooting curve used by the bounce kind.
    pub const BACK_OUT: Self = Self::CubicBezier {
        x1: 0.68,
        y1: -0.55,
        x2: 0.265,
        y2: 1.55,
    };

    /// Springy curve used by the elastic kind.
    pub const SPRING: Self = Self::CubicBezier {
        x1: 0.175,
        y1: 0.885,
        x2: 0.32,
        y2: 1.275,
    };

    /// Map linear progress in [0, 1] to eased progress.
    pub fn evaluate(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);

        match self {
            Self::Linear => t,
            Self::Ease => cubic_bezier(0.25, 0.1, 0.25, 1.0, t),
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::CubicBezier { x1, y1, x2, y2 } => cubic_bezier(*x1, *y1, *x2, *y2, t),
            Self::Steps { count, position } => stepped(*count, *position, t),
        }
    }

    /// Create a custom cubic bezier easing.
    ///
    /// # Panics
    /// Panics if `x1` or `x2` lie outside [0, 1].
    pub fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        assert!(
            valid_bezier_x(x1) && valid_bezier_x(x2),
            "Bezier x values must be in [0, 1]"
        );
        Self::CubicBezier { x1, y1, x2, y2 }
    }

    /// Create a stepped easing.
    ///
    /// # Panics
    /// Panics if `count` is 0.
    pub fn steps(count: u32, position: StepPosition) -> Self {
        assert!(count >= 1, "Steps must be at least 1");
        Self::Steps { count, position }
    }

    /// Parse a CSS timing function. Returns `None` for anything malformed;
    /// callers substitute their configured default.
    pub fn parse(input: &str) -> Option<Self> {
        let s = input.trim().to_ascii_lowercase();
        match s.as_str() {
            "linear" => return Some(Self::Linear),
            "ease" => return Some(Self::Ease),
            "ease-in" => return Some(Self::EaseIn),
            "ease-out" => return Some(Self::EaseOut),
            "ease-in-out" => return Some(Self::EaseInOut),
            "step-start" => return Some(Self::Steps { count: 1, position: StepPosition::Start }),
            "step-end" => return Some(Self::Steps { count: 1, position: StepPosition::End }),
            _ => {}
        }

        if let Some(args) = function_args(&s, "cubic-bezier") {
            let values: Vec<f32> = args
                .iter()
                .map(|a| a.parse::<f32>())
                .collect::<Result<_, _>>()
                .ok()?;
            let [x1, y1, x2, y2] = values.as_slice() else {
                return None;
            };
            if !(valid_bezier_x(*x1) && valid_bezier_x(*x2)) || !y1.is_finite() || !y2.is_finite() {
                return None;
            }
            return Some(Self::CubicBezier { x1: *x1, y1: *y1, x2: *x2, y2: *y2 });
        }

        if let Some(args) = function_args(&s, "steps") {
            let count = args.first()?.parse::<u32>().ok().filter(|c| *c >= 1)?;
            let position = match args.get(1).map(String::as_str) {
                None | Some("end") | Some("jump-end") => StepPosition::End,
                Some("start") | Some("jump-start") => StepPosition::Start,
                Some(_) => return None,
            };
            if args.len() > 2 {
                return None;
            }
            return Some(Self::Steps { count, position });
        }

        None
    }
}

impl fmt::Display for EasingFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linear => f.write_str("linear"),
            Self::Ease => f.write_str("ease"),
            Self::EaseIn => f.write_str("ease-in"),
            Self::EaseOut => f.write_str("ease-out"),
            Self::EaseInOut => f.write_str("ease-in-out"),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                write!(f, "cubic-bezier({x1}, {y1}, {x2}, {y2})")
            }
            Self::Steps { count, position } => {
                let pos = match position {
                    StepPosition::Start => "start",
                    StepPosition::End => "end",
                };
                write!(f, "steps({count}, {pos})")
            }
        }
    }
}

fn valid_bezier_x(x: f32) -> bool {
    (0.0..=1.0).contains(&x)
}

/// Split `name(a, b, ...)` into its trimmed arguments.
fn function_args(s: &str, name: &str) -> Option<Vec<String>> {
    let inner = s.strip_prefix(name)?.trim_start().strip_prefix('(')?.strip_suffix(')')?;
    Some(inner.split(',').map(|a| a.trim().to_string()).collect())
}

/// Evaluate a cubic bezier timing curve at the given progress.
///
/// Newton-Raphson finds the curve parameter whose x matches `progress`, then
/// the y coordinate at that parameter is returned.
fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, progress: f32) -> f32 {
    if progress <= 0.0 {
        return 0.0;
    }
    if progress >= 1.0 {
        return 1.0;
    }

    let mut t = progress;
    for _ in 0..8 {
        let x = bezier_component(x1, x2, t) - progress;
        if x.abs() < 1e-6 {
            break;
        }
        let dx = bezier_derivative(x1, x2, t);
        if dx.abs() < 1e-6 {
            break;
        }
        t = (t - x / dx).clamp(0.0, 1.0);
    }

    bezier_component(y1, y2, t)
}

/// `3(1-t)²t·p1 + 3(1-t)t²·p2 + t³`
#[inline]
fn bezier_component(p1: f32, p2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * t * p1 + 3.0 * mt * t * t * p2 + t * t * t
}

#[inline]
fn bezier_derivative(p1: f32, p2: f32, t: f32) -> f32 {
    let mt = 1.0 - t;
    3.0 * mt * mt * p1 + 6.0 * mt * t * (p2 - p1) + 3.0 * t * t * (1.0 - p2)
}

fn stepped(steps: u32, position: StepPosition, t: f32) -> f32 {
    if steps == 0 {
        return t;
    }
    let steps_f = steps as f32;
    match position {
        StepPosition::Start => (t * steps_f).ceil() / steps_f,
        StepPosition::End => (t * steps_f).floor() / steps_f,
    }
}
