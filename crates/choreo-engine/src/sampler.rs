//! Continuous scroll-linked sampler (parallax).
//!
//! Parallax is a continuous function of scroll position, not a one-shot
//! lifecycle, so it lives outside the descriptor state machine. Scroll
//! reports are coalesced: only the latest position is applied, once, on the
//! next engine tick.

use crate::types::TargetHandle;
use serde::{Deserialize, Serialize};

/// Axis a layer moves along.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    #[default]
    Vertical,
    Horizontal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParallaxLayer {
    pub target: TargetHandle,
    /// Fraction of the scroll distance the layer moves against.
    pub speed: f64,
    pub axis: Axis,
}

impl ParallaxLayer {
    /// `(x, y)` offset for a scroll position.
    pub fn offset_at(&self, position: f64) -> (f64, f64) {
        let offset = -position * self.speed;
        match self.axis {
            Axis::Vertical => (0.0, offset),
            Axis::Horizontal => (offset, 0.0),
        }
    }
}

#[derive(Debug)]
pub struct ContinuousSampler {
    enabled: bool,
    layers: Vec<ParallaxLayer>,
    position: f64,
    dirty: bool,
}

impl ContinuousSampler {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            layers: Vec::new(),
            position: 0.0,
            dirty: false,
        }
    }

    /// Add a layer; a target already present is replaced.
    pub fn add_layer(&mut self, layer: ParallaxLayer) {
        self.layers.retain(|l| l.target != layer.target);
        self.layers.push(layer);
        self.dirty = true;
    }

    pub fn remove_layer(&mut self, target: &TargetHandle) -> bool {
        let before = self.layers.len();
        self.layers.retain(|l| &l.target != target);
        self.layers.len() != before
    }

    /// Record the latest scroll position. Non-finite positions are ignored.
    pub fn on_scroll(&mut self, position: f64) {
        if !position.is_finite() {
            return;
        }
        self.position = position;
        self.dirty = true;
    }

    /// Force the next `sample` to reapply every layer.
    pub fn invalidate(&mut self) {
        self.dirty = true;
    }

    /// Offsets to apply this frame, or nothing if no scroll arrived since the
    /// last sample. Reduced motion pins every layer at zero.
    pub fn sample(&mut self, reduced_motion: bool) -> Vec<(TargetHandle, f64, f64)> {
        if !self.enabled || !self.dirty {
            return Vec::new();
        }
        self.dirty = false;
        self.layers
            .iter()
            .map(|layer| {
                let (x, y) = if reduced_motion {
                    (0.0, 0.0)
                } else {
                    layer.offset_at(self.position)
                };
                (layer.target.clone(), x, y)
            })
            .collect()
    }

    pub fn layers(&self) -> &[ParallaxLayer] {
        &self.layers
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn clear(&mut self) {
        self.layers.clear();
        self.dirty = false;
        self.position = 0.0;
    }
}
