//! Camera movement from decoded input

use serde::{Deserialize, Serialize};

use super::{Camera, KeyDecoding, KeyMask};
use crate::display::DisplayController;
use crate::hw::Mmio;
use crate::rasterizer::clamp;

/// How pressed directions move the camera.
///
/// The two policies disagree on the X sign. Both are kept as-is so either
/// can be selected explicitly; neither is a "fixed" version of the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementPolicy {
    /// Up/down move Z by -/+step, left/right move X by -/+step. No bounds.
    Unclamped,
    /// Up/down move Z by -/+step and clamp Z to the axis range;
    /// left/right move X by +/-step (mirrored X), unclamped.
    ClampedInvertedX,
}

impl MovementPolicy {
    /// Step size each policy was tuned for
    pub fn default_step(self) -> f32 {
        match self {
            MovementPolicy::Unclamped => 2.0,
            MovementPolicy::ClampedInvertedX => 1.0,
        }
    }
}

/// One input pass per frame: decode the key register, then move
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MovementRule {
    pub decoding: KeyDecoding,
    pub policy: MovementPolicy,
    pub step: f32,
}

impl MovementRule {
    pub fn new(decoding: KeyDecoding, policy: MovementPolicy) -> Self {
        Self {
            decoding,
            policy,
            step: policy.default_step(),
        }
    }
}

impl Default for MovementRule {
    fn default() -> Self {
        Self::new(KeyDecoding::ActiveLow, MovementPolicy::Unclamped)
    }
}

/// Inclusive bounds for a clamped axis
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AxisRange {
    pub min: f32,
    pub max: f32,
}

impl Default for AxisRange {
    fn default() -> Self {
        Self { min: -100.0, max: 100.0 }
    }
}

/// Owns the camera and advances it once per frame
#[derive(Debug, Clone)]
pub struct CameraController {
    camera: Camera,
    /// Applied in order every frame
    pub rules: Vec<MovementRule>,
    /// Range for the Z axis under [`MovementPolicy::ClampedInvertedX`]
    pub z_range: AxisRange,
}

impl CameraController {
    pub fn new(camera: Camera, rules: Vec<MovementRule>, z_range: AxisRange) -> Self {
        Self { camera, rules, z_range }
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Read the key register once and decode it
    pub fn decode_input<B: Mmio>(display: &mut DisplayController<B>, decoding: KeyDecoding) -> KeyMask {
        decoding.decode(display.key_input())
    }

    /// Move the camera by `step` for every pressed direction in `mask`
    pub fn apply_movement(&mut self, policy: MovementPolicy, mask: KeyMask, step: f32) {
        let pos = &mut self.camera.position;
        match policy {
            MovementPolicy::Unclamped => {
                if mask.contains(KeyMask::UP) {
                    pos.z -= step;
                }
                if mask.contains(KeyMask::DOWN) {
                    pos.z += step;
                }
                if mask.contains(KeyMask::LEFT) {
                    pos.x -= step;
                }
                if mask.contains(KeyMask::RIGHT) {
                    pos.x += step;
                }
            }
            MovementPolicy::ClampedInvertedX => {
                let range = self.z_range;
                if mask.contains(KeyMask::UP) {
                    pos.z = Self::clamp_axis(pos.z - step, range.min, range.max);
                }
                if mask.contains(KeyMask::DOWN) {
                    pos.z = Self::clamp_axis(pos.z + step, range.min, range.max);
                }
                if mask.contains(KeyMask::LEFT) {
                    pos.x += step;
                }
                if mask.contains(KeyMask::RIGHT) {
                    pos.x -= step;
                }
            }
        }
    }

    /// Clamp a camera coordinate into `[min, max]`
    pub fn clamp_axis(value: f32, min: f32, max: f32) -> f32 {
        clamp(value, min, max)
    }

    /// Run every movement rule against the current key register
    pub fn update<B: Mmio>(&mut self, display: &mut DisplayController<B>) {
        for i in 0..self.rules.len() {
            let rule = self.rules[i];
            let mask = Self::decode_input(display, rule.decoding);
            self.apply_movement(rule.policy, mask, rule.step);
        }
    }
}
