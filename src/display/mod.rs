//! # Display hardware capability
//!
//! [`DisplayController`] is the one handle to the display's registers. It is
//! passed by reference to the parts of the frame that need hardware:
//! the camera controller reads the key register through it, and the
//! [`DisplaySynchronizer`] polls the scan position and drives the block-copy
//! engine through it.
//!
//! ## Block-copy engine
//!
//! The engine is reached only through [`DisplayController::copy_engine`],
//! which hands out a sequence of one-shot states. Each state consumes itself
//! and returns the next, so the register writes can only happen as:
//!
//! ```text
//! disable -> source -> destination -> unit count -> start (enable)
//! ```

mod sync;

pub use sync::*;

use log::info;

use crate::hw::{
    Mmio, REG_DISPCNT, REG_DMA3CNT_H, REG_DMA3CNT_L, REG_DMA3DAD, REG_DMA3SAD, REG_KEYINPUT, REG_VCOUNT,
};

bitflags::bitflags! {
    /// Block-copy control word (unit count in bits 0-15, control in 16-31).
    ///
    /// Only the upper half is written to the control register; the unit
    /// count has its own register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DmaControl: u32 {
        const DEST_DECREMENT = 1 << 21;
        const DEST_FIXED     = 2 << 21;
        const DEST_RELOAD    = 3 << 21;
        const SRC_DECREMENT  = 1 << 23;
        const SRC_FIXED      = 2 << 23;
        const REPEAT         = 1 << 25;
        /// 32-bit units; clear for 16-bit units
        const WORD32         = 1 << 26;
        const AT_VBLANK      = 1 << 28;
        const AT_HBLANK      = 2 << 28;
        const IRQ            = 1 << 30;
        const ENABLE         = 1 << 31;
        /// Same bit as `ENABLE`: in immediate mode enabling starts the copy
        const START          = 1 << 31;
    }
}

impl DmaControl {
    /// 16-bit units, incrementing addresses, start immediately
    pub const HALF_NOW: DmaControl = DmaControl::empty();

    /// Bytes per transferred unit
    pub fn unit_bytes(self) -> usize {
        if self.contains(DmaControl::WORD32) {
            4
        } else {
            2
        }
    }

    /// Value for the 16-bit control register
    pub fn register_half(self) -> u16 {
        (self.bits() >> 16) as u16
    }
}

bitflags::bitflags! {
    /// Display control register
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DisplayMode: u16 {
        /// Mode 3: single 240x160 RGB555 bitmap
        const MODE_3 = 0x0003;
        const BG0    = 0x0100;
        const BG1    = 0x0200;
        const BG2    = 0x0400;
        const BG3    = 0x0800;
        const OBJ    = 0x1000;
    }
}

/// Process-wide owner of the memory-mapped display registers
pub struct DisplayController<B: Mmio> {
    bus: B,
}

impl<B: Mmio> DisplayController<B> {
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut B {
        &mut self.bus
    }

    /// Switch to the 240x160 bitmap mode with background 2 shown
    pub fn init_bitmap_mode(&mut self) {
        let mode = DisplayMode::MODE_3 | DisplayMode::BG2;
        info!("display mode {:#06x}", mode.bits());
        self.bus.write_u16(REG_DISPCNT, mode.bits());
    }

    /// Current scanline
    pub fn scanline(&mut self) -> u16 {
        self.bus.read_u16(REG_VCOUNT)
    }

    pub fn scan_state(&mut self) -> ScanState {
        ScanState::from_scanline(self.scanline())
    }

    /// Raw key register (active low)
    pub fn key_input(&mut self) -> u16 {
        self.bus.read_u16(REG_KEYINPUT)
    }

    /// Bus address of `pixels` for the block-copy engine
    pub(crate) fn map_source(&mut self, pixels: &[u16]) -> u32 {
        self.bus.map_source(pixels)
    }

    /// Exclusive access to the block-copy registers for one transfer
    pub(crate) fn copy_engine(&mut self) -> CopyEngine<'_, B> {
        CopyEngine { bus: &mut self.bus }
    }
}

/// Block-copy engine before it has been disabled
pub(crate) struct CopyEngine<'a, B: Mmio> {
    bus: &'a mut B,
}

impl<'a, B: Mmio> CopyEngine<'a, B> {
    pub fn disable(self) -> CopySource<'a, B> {
        self.bus.write_u16(REG_DMA3CNT_H, 0);
        CopySource { bus: self.bus }
    }
}

pub(crate) struct CopySource<'a, B: Mmio> {
    bus: &'a mut B,
}

impl<'a, B: Mmio> CopySource<'a, B> {
    pub fn source(self, address: u32) -> CopyDestination<'a, B> {
        self.bus.write_u32(REG_DMA3SAD, address);
        CopyDestination { bus: self.bus }
    }
}

pub(crate) struct CopyDestination<'a, B: Mmio> {
    bus: &'a mut B,
}

impl<'a, B: Mmio> CopyDestination<'a, B> {
    pub fn destination(self, address: u32) -> CopyCount<'a, B> {
        self.bus.write_u32(REG_DMA3DAD, address);
        CopyCount { bus: self.bus }
    }
}

pub(crate) struct CopyCount<'a, B: Mmio> {
    bus: &'a mut B,
}

impl<'a, B: Mmio> CopyCount<'a, B> {
    /// `0` means 0x10000 units to the hardware
    pub fn units(self, units: u16) -> CopyArmed<'a, B> {
        self.bus.write_u16(REG_DMA3CNT_L, units);
        CopyArmed { bus: self.bus }
    }
}

pub(crate) struct CopyArmed<'a, B: Mmio> {
    bus: &'a mut B,
}

impl<'a, B: Mmio> CopyArmed<'a, B> {
    /// Write the control flags with the enable bit set
    pub fn start(self, control: DmaControl) {
        let control = control | DmaControl::ENABLE;
        self.bus.write_u16(REG_DMA3CNT_H, control.register_half());
    }
}
