//! # Memory-mapped hardware access
//!
//! Every register read and write in the crate goes through an [`Mmio`] bus.
//! Two buses exist:
//!
//! | Bus | Use |
//! |-----|-----|
//! | [`VolatileBus`] | Real hardware. Volatile access at absolute addresses. Builds everywhere, only usable on the 32-bit target. |
//! | [`SimulatedBus`] | Host model: scanline clock, key register, block-copy engine, write trace. |
//!
//! ## Register Layout
//!
//! | Address       | Name      | Width | Description                               |
//! |---------------|-----------|-------|-------------------------------------------|
//! | `$0400_0000`  | DISPCNT   | 16    | Display control (video mode, layers)      |
//! | `$0400_0006`  | VCOUNT    | 16    | Current scanline, hardware-updated        |
//! | `$0400_00D4`  | DMA3SAD   | 32    | Block-copy source address                 |
//! | `$0400_00D8`  | DMA3DAD   | 32    | Block-copy destination address            |
//! | `$0400_00DC`  | DMA3CNT_L | 16    | Block-copy unit count                     |
//! | `$0400_00DE`  | DMA3CNT_H | 16    | Block-copy control (bit 15 = enable)      |
//! | `$0400_0130`  | KEYINPUT  | 16    | Button state, active low                  |

mod sim;
mod volatile;

pub use sim::*;
pub use volatile::*;

pub const MEM_EWRAM: u32 = 0x0200_0000;
pub const MEM_IO: u32 = 0x0400_0000;
pub const MEM_VRAM: u32 = 0x0600_0000;

pub const EWRAM_SIZE: u32 = 0x4_0000;
pub const IO_SIZE: u32 = 0x400;
pub const VRAM_SIZE: u32 = 0x1_8000;

pub const REG_DISPCNT: u32 = MEM_IO;
pub const REG_VCOUNT: u32 = MEM_IO + 0x0006;
pub const REG_DMA3SAD: u32 = MEM_IO + 0x00D4;
pub const REG_DMA3DAD: u32 = MEM_IO + 0x00D8;
pub const REG_DMA3CNT_L: u32 = MEM_IO + 0x00DC;
pub const REG_DMA3CNT_H: u32 = MEM_IO + 0x00DE;
pub const REG_KEYINPUT: u32 = MEM_IO + 0x0130;

/// Scanlines per frame, visible plus blank
pub const TOTAL_SCANLINES: u16 = 228;

/// Typed, ordered access to a memory-mapped address range.
///
/// Every call must reach the bus exactly once, in program order: no caching,
/// coalescing or reordering. Reads take `&mut self` because reading a
/// hardware register can have side effects (and advances the simulated clock).
pub trait Mmio {
    fn read_u16(&mut self, address: u32) -> u16;
    fn write_u16(&mut self, address: u32, value: u16);
    fn read_u32(&mut self, address: u32) -> u32;
    fn write_u32(&mut self, address: u32, value: u32);

    /// Bus address the block-copy engine can read `pixels` from.
    ///
    /// On hardware the buffer already lives in bus-visible RAM and this is its
    /// own address. A simulated bus stages the pixels into its RAM model.
    fn map_source(&mut self, pixels: &[u16]) -> u32;
}
