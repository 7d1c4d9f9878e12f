//! Transition kinds and the styles they move between.
//!
//! Style kinds map to a fixed `StyleFrame` start→end pair that the host's
//! native transition primitive animates. Scripted kinds (typewriter, count-up,
//! progress bar, morph) have no native equivalent; the engine samples them per
//! tick and hands the driver a `ScriptedFrame` instead.

use crate::easing::EasingFunction;
use crate::interpolate::Interpolate;
use serde::{Deserialize, Serialize};

/// Distance in pixels covered by the directional slides.
pub const SLIDE_DISTANCE_PX: f64 = 50.0;

/// Visual state of a target at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StyleFrame {
    pub opacity: f64,
    pub translate_x: f64,
    pub translate_y: f64,
    pub scale: f64,
    pub rotate_deg: f64,
    pub rotate_y_deg: f64,
}

impl StyleFrame {
    /// Fully visible and untransformed. Every style kind ends here.
    pub const IDENTITY: Self = Self {
        opacity: 1.0,
        translate_x: 0.0,
        translate_y: 0.0,
        scale: 1.0,
        rotate_deg: 0.0,
        rotate_y_deg: 0.0,
    };

    const HIDDEN: Self = Self {
        opacity: 0.0,
        ..Self::IDENTITY
    };
}

impl Default for StyleFrame {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// One sample of a scripted kind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptedFrame {
    /// Number of characters revealed.
    Characters { visible: u32 },
    /// Displayed counter value.
    Value { value: f64 },
    /// Bar width in percent.
    Width { percent: f64 },
    /// Corner radius in pixels.
    Radius { px: f64 },
}

/// Transition family of a descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AnimationKind {
    #[default]
    Fade,
    SlideUp,
    SlideDown,
    SlideLeft,
    SlideRight,
    ScaleIn,
    ScaleOut,
    Rotate,
    Flip,
    Bounce,
    Elastic,
    /// Reveal `chars` characters one by one.
    Typewriter { chars: u32 },
    /// Count from `from` to `to`.
    CountUp { from: f64, to: f64 },
    /// Grow a bar from 0 to `percent`.
    ProgressBar { percent: f64 },
    /// Morph a corner radius.
    Morph { from_radius: f64, to_radius: f64 },
}

impl AnimationKind {
    /// Start and end style for style kinds, `None` for scripted kinds.
    pub fn style_pair(&self) -> Option<(StyleFrame, StyleFrame)> {
        let end = StyleFrame::IDENTITY;
        let start = match self {
            Self::Fade => StyleFrame::HIDDEN,
            Self::SlideUp => StyleFrame {
                translate_y: SLIDE_DISTANCE_PX,
                ..StyleFrame::HIDDEN
            },
            Self::SlideDown => StyleFrame {
                translate_y: -SLIDE_DISTANCE_PX,
                ..StyleFrame::HIDDEN
            },
            Self::SlideLeft => StyleFrame {
                translate_x: SLIDE_DISTANCE_PX,
                ..StyleFrame::HIDDEN
            },
            Self::SlideRight => StyleFrame {
                translate_x: -SLIDE_DISTANCE_PX,
                ..StyleFrame::HIDDEN
            },
            Self::ScaleIn => StyleFrame {
                scale: 0.8,
                ..StyleFrame::HIDDEN
            },
            Self::ScaleOut => StyleFrame {
                scale: 1.2,
                ..StyleFrame::HIDDEN
            },
            Self::Rotate => StyleFrame {
                rotate_deg: -180.0,
                ..StyleFrame::HIDDEN
            },
            Self::Flip => StyleFrame {
                rotate_y_deg: 90.0,
                ..StyleFrame::HIDDEN
            },
            Self::Bounce => StyleFrame {
                translate_y: SLIDE_DISTANCE_PX,
                ..StyleFrame::HIDDEN
            },
            Self::Elastic => StyleFrame {
                scale: 0.3,
                ..StyleFrame::HIDDEN
            },
            Self::Typewriter { .. }
            | Self::CountUp { .. }
            | Self::ProgressBar { .. }
            | Self::Morph { .. } => return None,
        };
        Some((start, end))
    }

    /// Whether the engine steps this kind itself.
    pub fn is_scripted(&self) -> bool {
        self.style_pair().is_none()
    }

    /// Style at eased progress `t`, for style kinds.
    pub fn style_at(&self, t: f32) -> Option<StyleFrame> {
        self.style_pair().map(|(from, to)| from.interpolate(&to, t))
    }

    /// Sample a scripted kind at eased progress `t`.
    pub fn sample_script(&self, t: f32) -> Option<ScriptedFrame> {
        let t = t.clamp(0.0, 1.0);
        match *self {
            Self::Typewriter { chars } => Some(ScriptedFrame::Characters {
                visible: ((chars as f32) * t).round() as u32,
            }),
            Self::CountUp { from, to } => Some(ScriptedFrame::Value {
                value: from.interpolate(&to, t),
            }),
            Self::ProgressBar { percent } => Some(ScriptedFrame::Width {
                percent: 0.0_f64.interpolate(&percent, t),
            }),
            Self::Morph {
                from_radius,
                to_radius,
            } => Some(ScriptedFrame::Radius {
                px: from_radius.interpolate(&to_radius, t),
            }),
            _ => None,
        }
    }

    /// Final sample of a scripted kind.
    pub fn final_script(&self) -> Option<ScriptedFrame> {
        self.sample_script(1.0)
    }

    /// Easing this kind is defined with, overriding the descriptor default.
    pub fn preferred_easing(&self) -> Option<EasingFunction> {
        match self {
            Self::Bounce => Some(EasingFunction::BACK_OUT),
            Self::Elastic => Some(EasingFunction::SPRING),
            _ => None,
        }
    }

    /// Parse a kind name with an optional parameter string.
    ///
    /// Names are case-insensitive and ignore `-`/`_`, so `slide-up`,
    /// `slide_up` and `slideUp` are the same kind. Parameters:
    /// - `typewriter`: character count
    /// - `count-up`: `to` or `from,to`
    /// - `progress-bar`: percent (default 100)
    /// - `morph`: `from,to` radius (default `0,50`)
    pub fn parse(name: &str, param: Option<&str>) -> Option<Self> {
        let key: String = name
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        let kind = match key.as_str() {
            "fade" | "fadein" => Self::Fade,
            "slideup" => Self::SlideUp,
            "slidedown" => Self::SlideDown,
            "slideleft" => Self::SlideLeft,
            "slideright" => Self::SlideRight,
            "scalein" | "zoomin" => Self::ScaleIn,
            "scaleout" | "zoomout" => Self::ScaleOut,
            "rotate" | "rotatein" => Self::Rotate,
            "flip" | "flipin" => Self::Flip,
            "bounce" | "bouncein" => Self::Bounce,
            "elastic" => Self::Elastic,
            "typewriter" => Self::Typewriter {
                chars: match param {
                    Some(p) => p.trim().parse().ok()?,
                    None => 0,
                },
            },
            "countup" | "counter" => {
                let (from, to) = match numeric_param(param)?.as_deref() {
                    None => (0.0, 100.0),
                    Some([to]) => (0.0, *to),
                    Some([from, to]) => (*from, *to),
                    Some(_) => return None,
                };
                Self::CountUp { from, to }
            }
            "progressbar" | "progress" => {
                let percent = match numeric_param(param)?.as_deref() {
                    None => 100.0,
                    Some([p]) => p.clamp(0.0, 100.0),
                    Some(_) => return None,
                };
                Self::ProgressBar { percent }
            }
            "morph" => {
                let (from_radius, to_radius) =
                    match numeric_param(param)?.as_deref() {
                        None => (0.0, 50.0),
                        Some([from, to]) => (*from, *to),
                        Some(_) => return None,
                    };
                Self::Morph {
                    from_radius,
                    to_radius,
                }
            }
            _ => return None,
        };
        Some(kind)
    }
}

/// `None` when no parameter was given, `Some(None)` when it is malformed.
fn numeric_param(param: Option<&str>) -> Option<Option<Vec<f64>>> {
    let Some(param) = param else {
        return Some(None);
    };
    param
        .split(',')
        .map(|p| p.trim().parse::<f64>().ok().filter(|v| v.is_finite()))
        .collect::<Option<Vec<_>>>()
        .map(Some)
}
