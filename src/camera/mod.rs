//! Camera state and input-driven movement
//!
//! The [`CameraController`] is the only writer of [`Camera`]; the transform
//! pipeline only reads it.

mod controller;
mod input;

pub use controller::*;
pub use input::*;

use serde::{Deserialize, Serialize};

use crate::rasterizer::Vec3;

/// Camera state
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: Vec3,
    /// Rotation about the vertical axis, radians
    #[serde(default)]
    pub yaw: f32,
    /// Rotation about the lateral axis, radians
    #[serde(default)]
    pub pitch: f32,
    /// Rotation about the depth axis, radians. Stored but not applied by
    /// the transform; there is no roll step.
    #[serde(default)]
    pub roll: f32,
}

impl Camera {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            yaw: 0.0,
            pitch: 0.0,
            roll: 0.0,
        }
    }
}
