//! Camera-relative software rasterizer
//!
//! Features:
//! - Translate / yaw / pitch camera transform (roll is carried but not applied)
//! - Perspective projection onto a top-left-origin screen
//! - Clipped filled rectangles into an RGB555 off-screen buffer
//! - No z-buffer or depth sorting: objects draw in scene order

mod math;
mod types;
mod render;

pub use math::*;
pub use types::*;
pub use render::*;
