//! Scene objects
//!
//! Pure data with minimal behavior; transform and drawing live in the rasterizer.

use serde::{Deserialize, Serialize};

use crate::rasterizer::{ObjAttr, ObjectTraits, Rgb15, ScreenPoint, Vec3};

/// A single filled rectangle anchored at a world position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneObject {
    pub world_position: Vec3,
    /// Size on screen in pixels, independent of depth
    #[serde(default = "default_size")]
    pub width: i32,
    #[serde(default = "default_size")]
    pub height: i32,
    #[serde(default = "default_color")]
    pub color: Rgb15,
    #[serde(default)]
    pub traits: ObjectTraits,
    /// Top-left corner from the last frame's projection; `None` if it could
    /// not be projected. Not serialized.
    #[serde(skip)]
    pub projected: Option<ScreenPoint>,
}

fn default_size() -> i32 {
    16
}

fn default_color() -> Rgb15 {
    Rgb15::RED
}

impl SceneObject {
    pub fn new(world_position: Vec3, width: i32, height: i32, color: Rgb15) -> Self {
        Self {
            world_position,
            width,
            height,
            color,
            traits: ObjectTraits::default(),
            projected: None,
        }
    }

    /// Sprite attributes placing `tile` at the projected position
    pub fn sprite_attrs(&self, tile: u16) -> Option<ObjAttr> {
        let screen = self.projected?;
        let mut attrs = ObjAttr::default();
        attrs.set_y(screen.y);
        attrs.set_x(screen.x);
        attrs.set_tile_index(tile);
        Some(attrs)
    }
}

/// Everything drawn in a frame, in draw order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scene {
    pub objects: Vec<SceneObject>,
}

impl Scene {
    pub fn new(objects: Vec<SceneObject>) -> Self {
        Self { objects }
    }

    /// Objects that were projected on the last frame
    pub fn visible(&self) -> impl Iterator<Item = &SceneObject> {
        self.objects.iter().filter(|o| o.projected.is_some())
    }
}
