//! Vertical-blank synchronization and buffer presentation
//!
//! The scan position splits each frame into two states:
//!
//! | State        | Scanlines      |
//! |--------------|----------------|
//! | `ActiveScan` | `0..160`       |
//! | `Blank`      | `160..228`     |
//!
//! Both waits are plain busy-polls of the scan-position register: there is
//! one thread of control and nothing else to schedule, so they block with no
//! timeout.

use std::fmt;

use log::debug;

use super::{DisplayController, DmaControl};
use crate::hw::{Mmio, MEM_VRAM};
use crate::rasterizer::PixelBuffer;
use crate::SCREEN_HEIGHT;

/// Largest unit count the 16-bit count register can express (written as 0)
pub const MAX_COPY_UNITS: usize = 0x1_0000;

/// Which part of the frame the display is scanning
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    ActiveScan,
    Blank,
}

impl ScanState {
    pub fn from_scanline(line: u16) -> Self {
        if (line as usize) < SCREEN_HEIGHT {
            ScanState::ActiveScan
        } else {
            ScanState::Blank
        }
    }
}

/// Why a block copy could not be programmed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentError {
    /// Nothing to copy
    Empty,
    /// Byte count is not a whole number of transfer units
    Unaligned { byte_count: usize, unit_bytes: usize },
    /// More units than the count register can hold
    TooLarge { units: usize },
}

impl fmt::Display for PresentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PresentError::Empty => write!(f, "block copy of zero units"),
            PresentError::Unaligned { byte_count, unit_bytes } => write!(
                f,
                "block copy of {} bytes is not a multiple of the {} byte unit",
                byte_count, unit_bytes
            ),
            PresentError::TooLarge { units } => write!(
                f,
                "block copy of {} units exceeds the {} unit limit",
                units, MAX_COPY_UNITS
            ),
        }
    }
}

impl std::error::Error for PresentError {}

/// Waits for vertical blank and copies the off-screen buffer into VRAM
#[derive(Debug, Clone, Copy)]
pub struct DisplaySynchronizer {
    /// Control flags for every transfer (enable is always added)
    pub control: DmaControl,
    /// Bus address of the visible buffer
    pub destination: u32,
}

impl DisplaySynchronizer {
    pub fn new() -> Self {
        Self {
            control: DmaControl::HALF_NOW,
            destination: MEM_VRAM,
        }
    }

    /// Poll until the scan position is in the blank region.
    ///
    /// Called during active scan this returns right after the scan position
    /// crosses into blank. Called during blank it returns after one poll and
    /// sees no crossing; [`Self::vsync`] waits out the blank first. Returns
    /// the number of polls.
    pub fn wait_for_blank_start<B: Mmio>(&self, display: &mut DisplayController<B>) -> u32 {
        let mut polls = 1;
        while display.scan_state() == ScanState::ActiveScan {
            polls += 1;
        }
        polls
    }

    /// Poll until the scan position is back in the visible region.
    ///
    /// Called during blank this returns right after the scan position wraps
    /// back to active scan. Returns the number of polls.
    pub fn wait_for_blank_end<B: Mmio>(&self, display: &mut DisplayController<B>) -> u32 {
        let mut polls = 1;
        while display.scan_state() == ScanState::Blank {
            polls += 1;
        }
        polls
    }

    /// Wait for the start of the next blank period.
    ///
    /// Leaves any blank already in progress first, so the caller always gets
    /// a whole blank window.
    pub fn vsync<B: Mmio>(&self, display: &mut DisplayController<B>) -> u32 {
        let polls = self.wait_for_blank_end(display) + self.wait_for_blank_start(display);
        debug!("vsync after {} polls", polls);
        polls
    }

    /// Copy `source` into the visible buffer at `self.destination`.
    ///
    /// Does not wait; call [`Self::vsync`] first for a tear-free copy.
    pub fn present<B: Mmio>(&self, display: &mut DisplayController<B>, source: &PixelBuffer) -> Result<(), PresentError> {
        let address = display.map_source(source.as_slice());
        self.block_copy(display, self.destination, address, source.byte_len())
    }

    /// Program one transfer of `byte_count` bytes.
    ///
    /// The engine is disabled, then source, destination and unit count are
    /// written, and only then are the control flags written with enable set.
    /// The unit count is `byte_count` divided by the unit size (2 bytes unless
    /// `WORD32` is set); a byte count that does not divide evenly is rejected.
    /// This happens in full on every call.
    pub fn block_copy<B: Mmio>(
        &self,
        display: &mut DisplayController<B>,
        destination: u32,
        source: u32,
        byte_count: usize,
    ) -> Result<(), PresentError> {
        let unit_bytes = self.control.unit_bytes();
        if byte_count % unit_bytes != 0 {
            return Err(PresentError::Unaligned { byte_count, unit_bytes });
        }
        let units = byte_count / unit_bytes;
        if units == 0 {
            return Err(PresentError::Empty);
        }
        if units > MAX_COPY_UNITS {
            return Err(PresentError::TooLarge { units });
        }

        display
            .copy_engine()
            .disable()
            .source(source)
            .destination(destination)
            .units(units as u16)
            .start(self.control);
        Ok(())
    }
}

impl Default for DisplaySynchronizer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hw::{BusWrite, SimulatedBus, MEM_EWRAM, REG_DMA3CNT_H, REG_DMA3CNT_L, REG_DMA3DAD, REG_DMA3SAD};
    use crate::rasterizer::Rgb15;
    use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

    fn present_sequence(units: u16) -> [BusWrite; 5] {
        [
            BusWrite::half(REG_DMA3CNT_H, 0),
            BusWrite::word(REG_DMA3SAD, MEM_EWRAM),
            BusWrite::word(REG_DMA3DAD, MEM_VRAM),
            BusWrite::half(REG_DMA3CNT_L, units),
            BusWrite::half(REG_DMA3CNT_H, 0x8000),
        ]
    }

    #[test]
    fn test_scan_state_threshold() {
        assert_eq!(ScanState::from_scanline(0), ScanState::ActiveScan);
        assert_eq!(ScanState::from_scanline(159), ScanState::ActiveScan);
        assert_eq!(ScanState::from_scanline(160), ScanState::Blank);
        assert_eq!(ScanState::from_scanline(227), ScanState::Blank);
    }

    #[test]
    fn test_wait_for_blank_start_stops_at_crossing() {
        let mut display = DisplayController::new(SimulatedBus::new());
        display.bus_mut().set_scanline(150);
        let sync = DisplaySynchronizer::new();
        // reads 150..=160
        assert_eq!(sync.wait_for_blank_start(&mut display), 11);
        assert_eq!(display.bus().scanline(), 161);
    }

    #[test]
    fn test_wait_for_blank_end_stops_at_wrap() {
        let mut display = DisplayController::new(SimulatedBus::new());
        display.bus_mut().set_scanline(220);
        let sync = DisplaySynchronizer::new();
        // reads 220..=227, then 0
        assert_eq!(sync.wait_for_blank_end(&mut display), 9);
        assert_eq!(display.bus().scanline(), 1);
    }

    #[test]
    fn test_vsync_from_mid_blank_waits_for_next_blank() {
        let mut display = DisplayController::new(SimulatedBus::new());
        display.bus_mut().set_scanline(200);
        let sync = DisplaySynchronizer::new();
        sync.vsync(&mut display);
        // the crossing read was line 160 of the next frame
        assert_eq!(display.bus().scanline(), 161);
    }

    #[test]
    fn test_present_twice_reprograms_everything() {
        let mut display = DisplayController::new(SimulatedBus::new());
        let fb = PixelBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        let sync = DisplaySynchronizer::new();

        sync.present(&mut display, &fb).unwrap();
        sync.present(&mut display, &fb).unwrap();

        let units = (SCREEN_WIDTH * SCREEN_HEIGHT) as u16;
        let expected: Vec<BusWrite> = present_sequence(units)
            .iter()
            .chain(present_sequence(units).iter())
            .copied()
            .collect();
        assert_eq!(display.bus().writes(), expected.as_slice());
        assert_eq!(display.bus().copies().len(), 2);
    }

    #[test]
    fn test_present_after_vsync_lands_in_vram_during_blank() {
        let mut display = DisplayController::new(SimulatedBus::new().with_lines_per_poll(3));
        let mut fb = PixelBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        fb.clear(Rgb15::BLUE);
        fb.set_pixel(239, 159, Rgb15::RED);

        let sync = DisplaySynchronizer::new();
        sync.vsync(&mut display);
        sync.present(&mut display, &fb).unwrap();

        let copy = display.bus().copies()[0];
        assert_eq!(ScanState::from_scanline(copy.scanline), ScanState::Blank);
        assert_eq!(display.bus().visible_frame(), fb);
    }

    #[test]
    fn test_block_copy_unit_count_is_halved_bytes() {
        let mut display = DisplayController::new(SimulatedBus::new());
        let sync = DisplaySynchronizer::new();
        sync.block_copy(&mut display, MEM_VRAM, MEM_EWRAM, 76_800).unwrap();
        assert_eq!(display.bus().writes()[3], BusWrite::half(REG_DMA3CNT_L, 38_400));
    }

    #[test]
    fn test_block_copy_word_mode() {
        let mut display = DisplayController::new(SimulatedBus::new());
        let mut sync = DisplaySynchronizer::new();
        sync.control = DmaControl::WORD32;
        sync.block_copy(&mut display, MEM_VRAM, MEM_EWRAM, 76_800).unwrap();
        let writes = display.bus().writes();
        assert_eq!(writes[3], BusWrite::half(REG_DMA3CNT_L, 19_200));
        assert_eq!(writes[4], BusWrite::half(REG_DMA3CNT_H, 0x8400));
    }

    #[test]
    fn test_block_copy_rejects_bad_counts() {
        let mut display = DisplayController::new(SimulatedBus::new());
        let sync = DisplaySynchronizer::new();
        assert_eq!(sync.block_copy(&mut display, MEM_VRAM, MEM_EWRAM, 0), Err(PresentError::Empty));
        assert_eq!(
            sync.block_copy(&mut display, MEM_VRAM, MEM_EWRAM, 0x2_0002),
            Err(PresentError::TooLarge { units: 0x1_0001 })
        );
        assert!(display.bus().writes().is_empty());
    }

    #[test]
    fn test_block_copy_rejects_partial_units() {
        let mut display = DisplayController::new(SimulatedBus::new());
        let mut sync = DisplaySynchronizer::new();
        assert_eq!(
            sync.block_copy(&mut display, MEM_VRAM, MEM_EWRAM, 7),
            Err(PresentError::Unaligned { byte_count: 7, unit_bytes: 2 })
        );

        sync.control = DmaControl::WORD32;
        assert_eq!(
            sync.block_copy(&mut display, MEM_VRAM, MEM_EWRAM, 76_802),
            Err(PresentError::Unaligned { byte_count: 76_802, unit_bytes: 4 })
        );
        assert!(display.bus().writes().is_empty());
    }

    #[test]
    fn test_wait_for_blank_start_inside_blank_returns_at_once() {
        let mut display = DisplayController::new(SimulatedBus::new());
        display.bus_mut().set_scanline(200);
        let sync = DisplaySynchronizer::new();
        assert_eq!(sync.wait_for_blank_start(&mut display), 1);
        assert_eq!(display.bus().scanline(), 201);

        // vsync from the same spot waits for the next frame's blank
        display.bus_mut().set_scanline(200);
        assert_eq!(sync.vsync(&mut display), 29 + 160);
    }
}
