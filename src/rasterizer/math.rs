//! Vector math for the camera-relative transform
//!
//! World space is right-handed with +Z pointing away from the viewer. The
//! transform pipeline is translate -> yaw -> pitch -> translate back, followed
//! by a perspective divide onto a top-left-origin screen.

use std::fmt;
use std::ops::{Add, Sub};

use serde::{Deserialize, Serialize};

use crate::camera::Camera;
use crate::SCREEN_HEIGHT;

/// 3D Vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Vec3 = Vec3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Component-wise distance check, used by tests and the inverse transform
    pub fn approx_eq(self, other: Vec3, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance
            && (self.y - other.y).abs() <= tolerance
            && (self.z - other.z).abs() <= tolerance
    }
}

impl Add for Vec3 {
    type Output = Vec3;
    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;
    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

/// Integer screen coordinates, origin at the top-left corner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenPoint {
    pub x: i32,
    pub y: i32,
}

impl ScreenPoint {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Why a point could not be projected
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectionError {
    /// The point shares the camera's depth, so the perspective divide is by zero
    Coplanar { depth: f32 },
    /// The divide produced an infinite or NaN coordinate
    NonFinite,
}

impl fmt::Display for ProjectionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProjectionError::Coplanar { depth } => write!(
                f,
                "projection undefined: point is coplanar with the camera on the view axis (z = {})",
                depth
            ),
            ProjectionError::NonFinite => write!(f, "projection produced a non-finite coordinate"),
        }
    }
}

impl std::error::Error for ProjectionError {}

/// Move a point so the camera sits at the origin
pub fn translate_to_origin(point: Vec3, camera: &Camera) -> Vec3 {
    point - camera.position
}

/// Rotate the X/Z pair about the origin by `angle` radians (yaw)
pub fn rotate_yaw(point: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3 {
        x: point.x * cos - point.z * sin,
        y: point.y,
        z: point.x * sin + point.z * cos,
    }
}

/// Rotate the Y/Z pair about the origin by `angle` radians (pitch)
pub fn rotate_pitch(point: Vec3, angle: f32) -> Vec3 {
    let (sin, cos) = angle.sin_cos();
    Vec3 {
        x: point.x,
        y: point.y * cos - point.z * sin,
        z: point.y * sin + point.z * cos,
    }
}

/// Orient a world point around the camera.
///
/// Translate to the camera origin, apply yaw then pitch, and translate back so
/// the result stays in world units next to the camera position.
///
/// `camera.roll` is not applied: there is no roll rotation step in this
/// pipeline, and a roll value is carried on the camera without effect.
pub fn camera_transform(point: Vec3, camera: &Camera) -> Vec3 {
    let local = translate_to_origin(point, camera);
    let local = rotate_yaw(local, camera.yaw);
    let local = rotate_pitch(local, camera.pitch);
    local + camera.position
}

/// Undo [`camera_transform`]: negated angles applied in reverse order
pub fn inverse_camera_transform(point: Vec3, camera: &Camera) -> Vec3 {
    let local = translate_to_origin(point, camera);
    let local = rotate_pitch(local, -camera.pitch);
    let local = rotate_yaw(local, -camera.yaw);
    local + camera.position
}

/// Project a camera-transformed point onto the screen.
///
/// X and Y are divided by the depth relative to the camera, scaled by
/// `focal_length`, re-offset by the camera X/Y, and Y is flipped so the
/// origin is the top-left corner. Fractions are truncated toward zero.
pub fn project(point: Vec3, camera: &Camera, focal_length: f32) -> Result<ScreenPoint, ProjectionError> {
    let depth = point.z - camera.position.z;
    if depth == 0.0 {
        return Err(ProjectionError::Coplanar { depth: point.z });
    }

    let x = camera.position.x + (point.x - camera.position.x) * focal_length / depth;
    let y = camera.position.y + (point.y - camera.position.y) * focal_length / depth;
    let y = SCREEN_HEIGHT as f32 - y;

    if !x.is_finite() || !y.is_finite() {
        return Err(ProjectionError::NonFinite);
    }

    Ok(ScreenPoint::new(x as i32, y as i32))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const EPS: f32 = 0.0001;

    fn camera_at(x: f32, y: f32, z: f32) -> Camera {
        Camera::new(Vec3::new(x, y, z))
    }

    #[test]
    fn test_translate_to_origin() {
        let cam = camera_at(100.0, 50.0, -10.0);
        let p = translate_to_origin(Vec3::new(120.0, 80.0, 150.0), &cam);
        assert!(p.approx_eq(Vec3::new(20.0, 30.0, 160.0), EPS));
    }

    #[test]
    fn test_rotations_identity_at_zero() {
        let p = Vec3::new(3.5, -2.0, 7.25);
        assert!(rotate_yaw(p, 0.0).approx_eq(p, EPS));
        assert!(rotate_pitch(p, 0.0).approx_eq(p, EPS));
    }

    #[test]
    fn test_rotations_flip_at_pi() {
        let p = Vec3::new(3.0, -2.0, 5.0);

        let yawed = rotate_yaw(p, PI);
        assert!(yawed.approx_eq(Vec3::new(-3.0, -2.0, -5.0), 0.001));

        let pitched = rotate_pitch(p, PI);
        assert!(pitched.approx_eq(Vec3::new(3.0, 2.0, -5.0), 0.001));

        let yawed_back = rotate_yaw(p, -PI);
        assert!(yawed_back.approx_eq(Vec3::new(-3.0, -2.0, -5.0), 0.001));
    }

    #[test]
    fn test_yaw_quarter_turn() {
        let p = rotate_yaw(Vec3::new(1.0, 0.0, 0.0), PI / 2.0);
        assert!(p.approx_eq(Vec3::new(0.0, 0.0, 1.0), 0.001));
    }

    #[test]
    fn test_camera_transform_round_trip() {
        let mut cam = camera_at(100.0, 50.0, -10.0);
        cam.yaw = 0.7;
        cam.pitch = -0.35;

        for p in [
            Vec3::new(120.0, 80.0, 150.0),
            Vec3::new(-40.0, 0.0, 3.0),
            Vec3::new(100.0, 50.0, -10.0),
        ] {
            let there = camera_transform(p, &cam);
            let back = inverse_camera_transform(there, &cam);
            assert!(back.approx_eq(p, 0.01), "{:?} -> {:?} -> {:?}", p, there, back);
        }
    }

    #[test]
    fn test_camera_transform_ignores_roll() {
        let mut cam = camera_at(1.0, 2.0, 3.0);
        cam.yaw = 0.3;
        let p = Vec3::new(10.0, -4.0, 20.0);
        let without_roll = camera_transform(p, &cam);
        cam.roll = 1.2;
        assert_eq!(camera_transform(p, &cam), without_roll);
    }

    #[test]
    fn test_project_degenerate_center() {
        let cam = camera_at(0.0, 0.0, 0.0);
        let sp = project(Vec3::new(0.0, 0.0, 80.0), &cam, 160.0).unwrap();
        assert_eq!(sp, ScreenPoint::new(0, 160));
    }

    #[test]
    fn test_project_reference_object_lands_mid_screen() {
        let cam = camera_at(100.0, 50.0, -10.0);
        let sp = project(Vec3::new(120.0, 80.0, 150.0), &cam, 160.0).unwrap();
        assert_eq!(sp, ScreenPoint::new(120, 80));
    }

    #[test]
    fn test_project_coplanar_is_error() {
        let cam = camera_at(5.0, 5.0, 42.0);
        let err = project(Vec3::new(10.0, 10.0, 42.0), &cam, 160.0).unwrap_err();
        assert!(matches!(err, ProjectionError::Coplanar { .. }));
    }

    #[test]
    fn test_project_overflow_is_non_finite() {
        let cam = camera_at(0.0, 0.0, 0.0);
        let err = project(Vec3::new(f32::MAX, 0.0, 1.0e-30), &cam, 160.0).unwrap_err();
        assert_eq!(err, ProjectionError::NonFinite);
    }
}
