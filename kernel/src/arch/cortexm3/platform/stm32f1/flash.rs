//! Flash memory interface: wait states and prefetch buffer

use kernel_bsp::HalError;
use kernel_bsp::clock::FlashLatency;

use super::memory_map::FLASH_R_BASE;
use super::mmio::MmioReg;

mod reg {
    pub const ACR: usize = 0x00;
}

mod acr {
    pub const LATENCY: (u32, u32) = (0b111, 0);
    pub const PRFTBE: u32 = 1 << 4;
    pub const PRFTBS: u32 = 1 << 5;
}

pub struct Flash {
    base: usize,
}

impl Flash {
    /// # Safety
    ///
    /// Only one `Flash` may exist.
    pub const unsafe fn new() -> Self {
        Self { base: FLASH_R_BASE }
    }

    /// Driver over a stand-in register block at `base`.
    #[cfg(test)]
    pub(super) const unsafe fn at(base: usize) -> Self {
        Self { base }
    }

    pub fn latency(&self) -> FlashLatency {
        match self.acr().read_field(acr::LATENCY.0, acr::LATENCY.1) {
            0 => FlashLatency::Ws0,
            1 => FlashLatency::Ws1,
            _ => FlashLatency::Ws2,
        }
    }

    /// # Errors
    /// [`HalError::FlashLatency`] if the new value does not read back.
    pub fn set_latency(&self, latency: FlashLatency) -> Result<(), HalError> {
        self.acr()
            .write_field(acr::LATENCY.0, acr::LATENCY.1, latency.wait_states());
        if self.latency() == latency {
            Ok(())
        } else {
            Err(HalError::FlashLatency)
        }
    }

    pub fn enable_prefetch(&self) {
        self.acr().set_bits(acr::PRFTBE);
    }

    pub fn prefetch_enabled(&self) -> bool {
        self.acr().is_set(acr::PRFTBS)
    }

    fn acr(&self) -> MmioReg<u32> {
        unsafe { MmioReg::new(self.base + reg::ACR) }
    }
}
