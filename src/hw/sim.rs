//! Host-side model of the display hardware
//!
//! Enough of the machine to run the frame pipeline without a console: RAM and
//! VRAM, a scanline counter that advances as it is polled, an active-low key
//! register and an immediate-mode block-copy engine. Every bus write is kept
//! in a trace so tests can check register sequencing.

use log::{debug, warn};

use super::*;
use crate::rasterizer::PixelBuffer;
use crate::{SCREEN_HEIGHT, SCREEN_WIDTH};

/// Width of a single bus access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessWidth {
    Half,
    Word,
}

/// One write as it reached the bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusWrite {
    pub address: u32,
    pub value: u32,
    pub width: AccessWidth,
}

impl BusWrite {
    pub const fn half(address: u32, value: u16) -> Self {
        Self { address, value: value as u32, width: AccessWidth::Half }
    }

    pub const fn word(address: u32, value: u32) -> Self {
        Self { address, value, width: AccessWidth::Word }
    }
}

/// A completed block copy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CopyRecord {
    pub source: u32,
    pub destination: u32,
    pub units: u32,
    pub unit_bytes: u32,
    /// Scan position when the copy ran
    pub scanline: u16,
}

// Control register (upper half of the combined word) fields
const CNT_DEST_MODE_SHIFT: u16 = 5;
const CNT_SRC_MODE_SHIFT: u16 = 7;
const CNT_REPEAT: u16 = 1 << 9;
const CNT_WORD32: u16 = 1 << 10;
const CNT_TIMING_SHIFT: u16 = 12;
const CNT_ENABLE: u16 = 1 << 15;

const KEYS_RELEASED: u16 = 0x03FF;

/// Simulated [`Mmio`] bus
pub struct SimulatedBus {
    ewram: Vec<u8>,
    io: Vec<u8>,
    vram: Vec<u8>,
    scanline: u16,
    lines_per_poll: u16,
    trace: bool,
    writes: Vec<BusWrite>,
    copies: Vec<CopyRecord>,
}

impl SimulatedBus {
    pub fn new() -> Self {
        let mut bus = Self {
            ewram: vec![0; EWRAM_SIZE as usize],
            io: vec![0; IO_SIZE as usize],
            vram: vec![0; VRAM_SIZE as usize],
            scanline: 0,
            lines_per_poll: 1,
            trace: true,
            writes: Vec::new(),
            copies: Vec::new(),
        };
        bus.store(REG_KEYINPUT, AccessWidth::Half, KEYS_RELEASED as u32);
        bus
    }

    /// How far the scan position moves on every VCOUNT read (at least 1)
    pub fn with_lines_per_poll(mut self, lines: u16) -> Self {
        self.lines_per_poll = lines.max(1);
        self
    }

    /// Whether writes and copies are recorded (on by default). A long-running
    /// host turns this off, otherwise both logs grow every frame.
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    pub fn scanline(&self) -> u16 {
        self.scanline
    }

    pub fn set_scanline(&mut self, line: u16) {
        self.scanline = line % TOTAL_SCANLINES;
    }

    /// Set which buttons are held. `pressed` uses 1 = pressed; the register
    /// itself stores the inverse, like the real key pad.
    pub fn set_pressed(&mut self, pressed: u16) {
        let raw = !pressed & KEYS_RELEASED;
        self.store(REG_KEYINPUT, AccessWidth::Half, raw as u32);
    }

    /// Every write issued through [`Mmio`], oldest first. Empty with tracing off.
    pub fn writes(&self) -> &[BusWrite] {
        &self.writes
    }

    pub fn take_writes(&mut self) -> Vec<BusWrite> {
        std::mem::take(&mut self.writes)
    }

    pub fn copies(&self) -> &[CopyRecord] {
        &self.copies
    }

    /// The visible mode-3 frame currently in VRAM
    pub fn visible_frame(&self) -> PixelBuffer {
        let mut fb = PixelBuffer::new(SCREEN_WIDTH, SCREEN_HEIGHT);
        for (i, pixel) in fb.pixels.iter_mut().enumerate() {
            *pixel = u16::from_le_bytes([self.vram[i * 2], self.vram[i * 2 + 1]]);
        }
        fb
    }

    fn region(&mut self, address: u32, len: u32) -> Option<&mut [u8]> {
        let (memory, base) = match address {
            a if (MEM_EWRAM..MEM_EWRAM + EWRAM_SIZE).contains(&a) => (&mut self.ewram, MEM_EWRAM),
            a if (MEM_IO..MEM_IO + IO_SIZE).contains(&a) => (&mut self.io, MEM_IO),
            a if (MEM_VRAM..MEM_VRAM + VRAM_SIZE).contains(&a) => (&mut self.vram, MEM_VRAM),
            _ => return None,
        };
        let start = (address - base) as usize;
        memory.get_mut(start..start + len as usize)
    }

    fn load(&mut self, address: u32, width: AccessWidth) -> Option<u32> {
        match width {
            AccessWidth::Half => {
                let bytes = self.region(address, 2)?;
                Some(u16::from_le_bytes([bytes[0], bytes[1]]) as u32)
            }
            AccessWidth::Word => {
                let bytes = self.region(address, 4)?;
                Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
            }
        }
    }

    fn store(&mut self, address: u32, width: AccessWidth, value: u32) -> bool {
        match width {
            AccessWidth::Half => match self.region(address, 2) {
                Some(bytes) => {
                    bytes.copy_from_slice(&(value as u16).to_le_bytes());
                    true
                }
                None => false,
            },
            AccessWidth::Word => match self.region(address, 4) {
                Some(bytes) => {
                    bytes.copy_from_slice(&value.to_le_bytes());
                    true
                }
                None => false,
            },
        }
    }

    fn bus_write(&mut self, address: u32, width: AccessWidth, value: u32) {
        if self.trace {
            self.writes.push(BusWrite { address, value, width });
        }

        let control_before = self.control();
        if !self.store(address, width, value) {
            warn!("write to unmapped address {:#010x}", address);
            return;
        }

        let touches_control = match width {
            AccessWidth::Half => address == REG_DMA3CNT_H,
            AccessWidth::Word => address == REG_DMA3CNT_L,
        };
        if touches_control && control_before & CNT_ENABLE == 0 && self.control() & CNT_ENABLE != 0 {
            self.run_block_copy();
        }
    }

    fn control(&mut self) -> u16 {
        self.load(REG_DMA3CNT_H, AccessWidth::Half).unwrap_or(0) as u16
    }

    fn run_block_copy(&mut self) {
        let control = self.control();
        let timing = (control >> CNT_TIMING_SHIFT) & 0b11;
        if timing != 0 {
            warn!("block copy start timing {} is not simulated; transfer left pending", timing);
            return;
        }

        let source = self.load(REG_DMA3SAD, AccessWidth::Word).unwrap_or(0);
        let destination = self.load(REG_DMA3DAD, AccessWidth::Word).unwrap_or(0);
        let units = match self.load(REG_DMA3CNT_L, AccessWidth::Half).unwrap_or(0) {
            0 => 0x1_0000,
            n => n,
        };
        let (width, unit_bytes) = if control & CNT_WORD32 != 0 {
            (AccessWidth::Word, 4)
        } else {
            (AccessWidth::Half, 2)
        };

        let step = |mode: u16| -> i64 {
            match mode & 0b11 {
                1 => -(unit_bytes as i64),
                2 => 0,
                _ => unit_bytes as i64,
            }
        };
        let src_step = step(control >> CNT_SRC_MODE_SHIFT);
        let dst_step = step(control >> CNT_DEST_MODE_SHIFT);

        let mut src = source as i64;
        let mut dst = destination as i64;
        for _ in 0..units {
            let value = self.load(src as u32, width).unwrap_or(0);
            if !self.store(dst as u32, width, value) {
                warn!("block copy ran off mapped memory at {:#010x}", dst);
                break;
            }
            src += src_step;
            dst += dst_step;
        }

        debug!(
            "block copy {:#010x} -> {:#010x}, {} x {} bytes at scanline {}",
            source, destination, units, unit_bytes, self.scanline
        );
        if self.trace {
            self.copies.push(CopyRecord {
                source,
                destination,
                units,
                unit_bytes,
                scanline: self.scanline,
            });
        }

        if control & CNT_REPEAT == 0 {
            self.store(REG_DMA3CNT_H, AccessWidth::Half, (control & !CNT_ENABLE) as u32);
        }
    }
}

impl Default for SimulatedBus {
    fn default() -> Self {
        Self::new()
    }
}

impl Mmio for SimulatedBus {
    fn read_u16(&mut self, address: u32) -> u16 {
        if address == REG_VCOUNT {
            let line = self.scanline;
            self.scanline = (self.scanline + self.lines_per_poll) % TOTAL_SCANLINES;
            return line;
        }
        match self.load(address, AccessWidth::Half) {
            Some(value) => value as u16,
            None => {
                warn!("read from unmapped address {:#010x}", address);
                0
            }
        }
    }

    fn write_u16(&mut self, address: u32, value: u16) {
        self.bus_write(address, AccessWidth::Half, value as u32);
    }

    fn read_u32(&mut self, address: u32) -> u32 {
        if address == REG_VCOUNT {
            return self.read_u16(address) as u32;
        }
        match self.load(address, AccessWidth::Word) {
            Some(value) => value,
            None => {
                warn!("read from unmapped address {:#010x}", address);
                0
            }
        }
    }

    fn write_u32(&mut self, address: u32, value: u32) {
        self.bus_write(address, AccessWidth::Word, value);
    }

    fn map_source(&mut self, pixels: &[u16]) -> u32 {
        let capacity = EWRAM_SIZE as usize / 2;
        if pixels.len() > capacity {
            warn!("staging {} pixels into {} pixel EWRAM; truncating", pixels.len(), capacity);
        }
        for (i, pixel) in pixels.iter().take(capacity).enumerate() {
            self.ewram[i * 2..i * 2 + 2].copy_from_slice(&pixel.to_le_bytes());
        }
        MEM_EWRAM
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vcount_advances_and_wraps() {
        let mut bus = SimulatedBus::new().with_lines_per_poll(100);
        assert_eq!(bus.read_u16(REG_VCOUNT), 0);
        assert_eq!(bus.read_u16(REG_VCOUNT), 100);
        assert_eq!(bus.read_u16(REG_VCOUNT), 200);
        assert_eq!(bus.read_u16(REG_VCOUNT), 72);
    }

    #[test]
    fn test_keys_are_active_low() {
        let mut bus = SimulatedBus::new();
        assert_eq!(bus.read_u16(REG_KEYINPUT), 0x03FF);
        bus.set_pressed(0x0010);
        assert_eq!(bus.read_u16(REG_KEYINPUT), 0x03EF);
    }

    #[test]
    fn test_half_word_copy_into_vram() {
        let mut bus = SimulatedBus::new();
        let src = bus.map_source(&[0x001F, 0x03E0, 0x7C00]);
        bus.write_u16(REG_DMA3CNT_H, 0);
        bus.write_u32(REG_DMA3SAD, src);
        bus.write_u32(REG_DMA3DAD, MEM_VRAM);
        bus.write_u16(REG_DMA3CNT_L, 3);
        bus.write_u16(REG_DMA3CNT_H, CNT_ENABLE);

        assert_eq!(bus.read_u16(MEM_VRAM), 0x001F);
        assert_eq!(bus.read_u16(MEM_VRAM + 2), 0x03E0);
        assert_eq!(bus.read_u16(MEM_VRAM + 4), 0x7C00);
        assert_eq!(bus.read_u16(MEM_VRAM + 6), 0);
        // immediate transfers clear their enable bit when done
        assert_eq!(bus.read_u16(REG_DMA3CNT_H) & CNT_ENABLE, 0);
        assert_eq!(bus.copies().len(), 1);
        assert_eq!(bus.copies()[0].units, 3);
    }

    #[test]
    fn test_fixed_source_fills() {
        let mut bus = SimulatedBus::new();
        let src = bus.map_source(&[0x1234]);
        bus.write_u32(REG_DMA3SAD, src);
        bus.write_u32(REG_DMA3DAD, MEM_VRAM);
        bus.write_u16(REG_DMA3CNT_L, 4);
        bus.write_u16(REG_DMA3CNT_H, CNT_ENABLE | (2 << CNT_SRC_MODE_SHIFT));
        for i in 0..4 {
            assert_eq!(bus.read_u16(MEM_VRAM + i * 2), 0x1234);
        }
    }

    #[test]
    fn test_writes_are_traced_in_order() {
        let mut bus = SimulatedBus::new();
        bus.write_u16(REG_DISPCNT, 0x0403);
        bus.write_u32(REG_DMA3SAD, 0x0200_0000);
        assert_eq!(
            bus.writes(),
            &[BusWrite::half(REG_DISPCNT, 0x0403), BusWrite::word(REG_DMA3SAD, 0x0200_0000)]
        );
        assert_eq!(bus.take_writes().len(), 2);
        assert!(bus.writes().is_empty());
    }

    #[test]
    fn test_unmapped_access_is_harmless() {
        let mut bus = SimulatedBus::new();
        bus.write_u32(0x0900_0000, 7);
        assert_eq!(bus.read_u32(0x0900_0000), 0);
    }

    #[test]
    fn test_untraced_bus_still_copies() {
        let mut bus = SimulatedBus::new().with_trace(false);
        let src = bus.map_source(&[0x7FFF, 0x001F]);
        bus.write_u32(REG_DMA3SAD, src);
        bus.write_u32(REG_DMA3DAD, MEM_VRAM);
        bus.write_u16(REG_DMA3CNT_L, 2);
        bus.write_u16(REG_DMA3CNT_H, CNT_ENABLE);

        assert_eq!(bus.read_u16(MEM_VRAM + 2), 0x001F);
        assert!(bus.writes().is_empty());
        assert!(bus.copies().is_empty());
    }
}
