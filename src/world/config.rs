//! Scene loading and saving
//!
//! Uses RON (Rusty Object Notation) for human-readable scene files.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{Scene, SceneObject};
use crate::camera::{AxisRange, Camera, CameraController, MovementRule};
use crate::rasterizer::{RasterSettings, Rgb15, Vec3};

/// Error type for scene loading
#[derive(Debug)]
pub enum ConfigError {
    IoError(std::io::Error),
    ParseError(ron::error::SpannedError),
    SerializeError(ron::Error),
    Invalid(String),
}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::IoError(e)
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::ParseError(e)
    }
}

impl From<ron::Error> for ConfigError {
    fn from(e: ron::Error) -> Self {
        ConfigError::SerializeError(e)
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {}", e),
            ConfigError::ParseError(e) => write!(f, "Parse error: {}", e),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid scene: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Everything needed to start the frame loop
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    pub camera: Camera,
    pub raster: RasterSettings,
    /// Input passes run every frame, in order
    pub movement: Vec<MovementRule>,
    pub z_range: AxisRange,
    /// Stop the loop when Select is held
    pub quit_on_select: bool,
    pub objects: Vec<SceneObject>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: Camera::new(Vec3::new(100.0, 50.0, -10.0)),
            raster: RasterSettings::default(),
            movement: vec![MovementRule::default()],
            z_range: AxisRange::default(),
            quit_on_select: true,
            // projects to the middle of the screen from the default camera
            objects: vec![SceneObject::new(Vec3::new(120.0, 80.0, 150.0), 16, 16, Rgb15::RED)],
        }
    }
}

impl SceneConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.z_range.min > self.z_range.max {
            return Err(ConfigError::Invalid(format!(
                "z_range min {} is above max {}",
                self.z_range.min, self.z_range.max
            )));
        }
        if !self.raster.focal_length.is_finite() || self.raster.focal_length == 0.0 {
            return Err(ConfigError::Invalid(format!(
                "focal_length must be finite and non-zero, got {}",
                self.raster.focal_length
            )));
        }
        if !self.camera.position.is_finite() {
            return Err(ConfigError::Invalid("camera position must be finite".to_string()));
        }
        Ok(())
    }

    /// Split into the camera controller and the scene it looks at
    pub fn build(&self) -> (CameraController, Scene) {
        let controller = CameraController::new(self.camera, self.movement.clone(), self.z_range);
        (controller, Scene::new(self.objects.clone()))
    }
}

/// Load a scene from a RON file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<SceneConfig, ConfigError> {
    let contents = fs::read_to_string(path)?;
    load_config_from_str(&contents)
}

/// Load a scene from a RON string (for embedded scenes or testing)
pub fn load_config_from_str(s: &str) -> Result<SceneConfig, ConfigError> {
    let config: SceneConfig = ron::from_str(s)?;
    config.validate()?;
    Ok(config)
}

/// Save a scene to a RON file
pub fn save_config<P: AsRef<Path>>(config: &SceneConfig, path: P) -> Result<(), ConfigError> {
    let pretty = ron::ser::PrettyConfig::new()
        .depth_limit(4)
        .indentor("  ".to_string());

    let contents = ron::ser::to_string_pretty(config, pretty)?;
    fs::write(path, contents)?;
    Ok(())
}
