//! Interpolation for style values.
//!
//! Hosts with a native transition primitive never need this; it backs
//! `Engine::current_style` and the progress values of scripted kinds.

use crate::style::StyleFrame;

/// Types that can be interpolated between two values.
///
/// When `t = 0.0` the result is `self`, when `t = 1.0` it is `to`. Values of
/// `t` outside [0, 1] extrapolate, which overshooting easings rely on.
pub trait Interpolate: Sized {
    fn interpolate(&self, to: &Self, t: f32) -> Self;
}

#[inline]
fn lerp_f64(from: f64, to: f64, t: f32) -> f64 {
    from + (to - from) * t as f64
}

impl Interpolate for f64 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        lerp_f64(*self, *to, t)
    }
}

impl Interpolate for f32 {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        self + (to - self) * t
    }
}

impl Interpolate for StyleFrame {
    fn interpolate(&self, to: &Self, t: f32) -> Self {
        Self {
            // Opacity never leaves [0, 1] even when the curve overshoots.
            opacity: lerp_f64(self.opacity, to.opacity, t).clamp(0.0, 1.0),
            translate_x: lerp_f64(self.translate_x, to.translate_x, t),
            translate_y: lerp_f64(self.translate_y, to.translate_y, t),
            scale: lerp_f64(self.scale, to.scale, t),
            rotate_deg: lerp_f64(self.rotate_deg, to.rotate_deg, t),
            rotate_y_deg: lerp_f64(self.rotate_y_deg, to.rotate_y_deg, t),
        }
    }
}
