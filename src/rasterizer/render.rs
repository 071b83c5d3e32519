//! Core rendering functions
//! Clear-and-fill rasterization into an off-screen RGB555 buffer

use log::debug;

use super::math::{camera_transform, project};
use super::types::{RasterSettings, Rgb15};
use crate::camera::Camera;
use crate::world::Scene;

/// Row-major RGB555 pixel grid.
///
/// Used both for the off-screen working buffer and as the layout of the
/// visible buffer in VRAM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub pixels: Vec<u16>,
    pub width: usize,
    pub height: usize,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![0; width * height],
            width,
            height,
        }
    }

    /// Size in bytes as the block-copy engine sees it (2 bytes per pixel)
    pub fn byte_len(&self) -> usize {
        self.pixels.len() * 2
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.pixels
    }

    /// Fill every pixel with `color`
    pub fn clear(&mut self, color: Rgb15) {
        for pixel in self.pixels.iter_mut() {
            *pixel = color.0;
        }
    }

    pub fn set_pixel(&mut self, x: usize, y: usize, color: Rgb15) {
        if x < self.width && y < self.height {
            self.pixels[y * self.width + x] = color.0;
        }
    }

    /// Out-of-range coordinates read as black
    pub fn get_pixel(&self, x: usize, y: usize) -> Rgb15 {
        if x < self.width && y < self.height {
            Rgb15(self.pixels[y * self.width + x])
        } else {
            Rgb15::BLACK
        }
    }

    /// Fill `[x, x + width) x [y, y + height)` with `color`, clipped to the buffer.
    ///
    /// Any part of the rectangle outside the buffer is dropped; a rectangle
    /// entirely outside leaves the buffer untouched.
    pub fn draw_filled_rect(&mut self, x: i32, y: i32, width: i32, height: i32, color: Rgb15) {
        let x0 = (x as i64).max(0);
        let y0 = (y as i64).max(0);
        let x1 = (x as i64 + width as i64).min(self.width as i64);
        let y1 = (y as i64 + height as i64).min(self.height as i64);

        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let (x0, x1) = (x0 as usize, x1 as usize);
        for row in y0 as usize..y1 as usize {
            let start = row * self.width;
            self.pixels[start + x0..start + x1].fill(color.0);
        }
    }
}

/// Clear `fb` and draw every scene object in order.
///
/// Each object is camera-transformed and projected; the projected position is
/// stored back on the object. Objects that cannot be projected are skipped
/// for this frame and their projection cleared. Returns how many were drawn.
pub fn render_scene(fb: &mut PixelBuffer, scene: &mut Scene, camera: &Camera, settings: &RasterSettings) -> usize {
    fb.clear(settings.clear_color);

    let mut drawn = 0;
    for (index, object) in scene.objects.iter_mut().enumerate() {
        let view = camera_transform(object.world_position, camera);
        match project(view, camera, settings.focal_length) {
            Ok(screen) => {
                object.projected = Some(screen);
                fb.draw_filled_rect(screen.x, screen.y, object.width, object.height, object.color);
                drawn += 1;
            }
            Err(e) => {
                object.projected = None;
                debug!("skipping object {}: {}", index, e);
            }
        }
    }
    drawn
}
