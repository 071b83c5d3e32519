//! vblank3d: camera-relative 3D scene on a fixed 240x160 RGB555 display
//!
//! Each frame runs the same pipeline:
//! - [`camera::CameraController`] decodes the key register and moves the camera
//! - [`rasterizer`] transforms every scene object into screen space and fills
//!   it into an off-screen [`rasterizer::PixelBuffer`]
//! - [`display::DisplaySynchronizer`] waits for vertical blank and programs the
//!   block-copy engine to move the buffer into VRAM
//!
//! All hardware access goes through a single [`display::DisplayController`]
//! built on top of an injected [`hw::Mmio`] bus.

pub mod camera;
pub mod display;
pub mod frame;
pub mod hw;
pub mod rasterizer;
pub mod world;

/// Visible display width in pixels
pub const SCREEN_WIDTH: usize = 240;
/// Visible display height in pixels
pub const SCREEN_HEIGHT: usize = 160;
