//! Volatile register access for real hardware

use volatile_register::{RO, RW};

use super::Mmio;

/// [`Mmio`] over the physical address space.
///
/// Each access is a single volatile load or store through a
/// `volatile_register` cell at the absolute address. The type builds on every
/// target so host builds keep it checked, but bus addresses are 32-bit and
/// constructing one anywhere else is undefined behavior.
pub struct VolatileBus {
    _private: (),
}

impl VolatileBus {
    /// # Safety
    ///
    /// Only valid on the target hardware, and only one `VolatileBus` may be
    /// alive at a time: it is the process-wide owner of the I/O registers.
    pub unsafe fn new() -> Self {
        Self { _private: () }
    }
}

impl Mmio for VolatileBus {
    #[inline(always)]
    fn read_u16(&mut self, address: u32) -> u16 {
        let reg = unsafe { &*(address as usize as *const RO<u16>) };
        reg.read()
    }

    #[inline(always)]
    fn write_u16(&mut self, address: u32, value: u16) {
        unsafe {
            let reg = &*(address as usize as *const RW<u16>);
            reg.write(value);
        }
    }

    #[inline(always)]
    fn read_u32(&mut self, address: u32) -> u32 {
        let reg = unsafe { &*(address as usize as *const RO<u32>) };
        reg.read()
    }

    #[inline(always)]
    fn write_u32(&mut self, address: u32, value: u32) {
        unsafe {
            let reg = &*(address as usize as *const RW<u32>);
            reg.write(value);
        }
    }

    /// Truncates on hosts with wider pointers; see [`VolatileBus::new`]
    #[inline(always)]
    fn map_source(&mut self, pixels: &[u16]) -> u32 {
        pixels.as_ptr() as usize as u32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::display::{DisplayController, DisplaySynchronizer};

    // never called: only has to type-check against the frame pipeline
    #[allow(dead_code)]
    fn present_on_hardware(display: &mut DisplayController<VolatileBus>, sync: &DisplaySynchronizer) -> u32 {
        display.init_bitmap_mode();
        sync.vsync(display)
    }

    #[test]
    fn test_volatile_bus_is_an_mmio_bus() {
        fn assert_mmio<B: Mmio>() {}
        assert_mmio::<VolatileBus>();
        assert_eq!(std::mem::size_of::<VolatileBus>(), 0);
    }
}
