//! Per-frame pipeline
//!
//! camera update -> clear + draw into the off-screen buffer -> wait for
//! vblank -> copy to the visible buffer. The off-screen buffer is written only
//! while drawing and only read while presenting.

use log::{debug, info};

use crate::camera::{Camera, CameraController, KeyDecoding, KeyMask};
use crate::display::{DisplayController, DisplaySynchronizer, PresentError};
use crate::hw::Mmio;
use crate::rasterizer::{render_scene, PixelBuffer, RasterSettings};
use crate::world::{Scene, SceneConfig};
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// What one call to [`FrameLoop::tick`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// A frame was drawn and copied to the display
    Presented { drawn: usize, polls: u32 },
    /// Select was held; nothing was drawn
    Quit,
}

/// Owns all per-frame state
pub struct FrameLoop {
    controller: CameraController,
    scene: Scene,
    settings: RasterSettings,
    buffer: PixelBuffer,
    sync: DisplaySynchronizer,
    quit_on_select: bool,
    frames: u64,
}

impl FrameLoop {
    pub fn new(config: &SceneConfig) -> Self {
        let (controller, scene) = config.build();
        Self {
            controller,
            scene,
            settings: config.raster,
            buffer: PixelBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT),
            sync: DisplaySynchronizer::new(),
            quit_on_select: config.quit_on_select,
            frames: 0,
        }
    }

    pub fn camera(&self) -> &Camera {
        self.controller.camera()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The off-screen buffer as of the last frame
    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Run one frame
    pub fn tick<B: Mmio>(&mut self, display: &mut DisplayController<B>) -> Result<FrameOutcome, PresentError> {
        if self.quit_on_select {
            let held = CameraController::decode_input(display, KeyDecoding::ActiveLow);
            if held.contains(KeyMask::SELECT) {
                info!("select held after {} frames, stopping", self.frames);
                return Ok(FrameOutcome::Quit);
            }
        }

        self.controller.update(display);
        let drawn = render_scene(&mut self.buffer, &mut self.scene, self.controller.camera(), &self.settings);

        let polls = self.sync.vsync(display);
        self.sync.present(display, &self.buffer)?;

        self.frames += 1;
        debug!("frame {}: {} objects drawn", self.frames, drawn);
        Ok(FrameOutcome::Presented { drawn, polls })
    }

    /// Run frames until Select is held. Returns the number of frames shown.
    pub fn run<B: Mmio>(&mut self, display: &mut DisplayController<B>) -> Result<u64, PresentError> {
        display.init_bitmap_mode();
        while self.tick(display)? != FrameOutcome::Quit {}
        Ok(self.frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::SimulatedBus;

    #[test]
    fn test_tick_waits_for_next_blank() {
        let mut display = DisplayController::new(SimulatedBus::new());
        display.bus_mut().set_scanline(100);
        let mut frame = FrameLoop::new(&SceneConfig::default());

        // line 100 ends the blank wait at once, then lines 101..=160 are read
        let outcome = frame.tick(&mut display).unwrap();
        assert_eq!(outcome, FrameOutcome::Presented { drawn: 1, polls: 61 });
        assert_eq!(frame.frames(), 1);
    }

    #[test]
    fn test_empty_scene_still_presents() {
        let mut config = SceneConfig::default();
        config.objects.clear();
        let mut display = DisplayController::new(SimulatedBus::new());
        let mut frame = FrameLoop::new(&config);

        assert!(matches!(frame.tick(&mut display).unwrap(), FrameOutcome::Presented { drawn: 0, .. }));
        assert_eq!(display.bus().copies().len(), 1);
    }
}
