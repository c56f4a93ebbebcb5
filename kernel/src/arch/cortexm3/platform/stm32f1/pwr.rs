//! Power control: backup domain write access

use kernel_bsp::{HalError, ReadyFlag};

use super::memory_map::PWR_BASE;
use super::mmio::{MmioReg, budget};

mod reg {
    pub const CR: usize = 0x00;
}

/// Disable backup domain write protection
const DBP: u32 = 1 << 8;

pub struct Pwr {
    base: usize,
}

impl Pwr {
    /// # Safety
    ///
    /// Only one `Pwr` may exist. The PWR clock must be enabled before any
    /// method is called.
    pub const unsafe fn new() -> Self {
        Self { base: PWR_BASE }
    }

    /// Driver over a stand-in register block at `base`.
    #[cfg(test)]
    pub(super) const unsafe fn at(base: usize) -> Self {
        Self { base }
    }

    /// Unlock RCC_BDCR and the backup registers.
    ///
    /// # Errors
    /// [`HalError::Timeout`] if DBP does not latch, which happens when the
    /// PWR clock is off.
    pub fn enable_backup_access(&self) -> Result<(), HalError> {
        let cr = self.cr();
        if cr.is_set(DBP) {
            return Ok(());
        }
        cr.set_bits(DBP);
        cr.wait_set_for(DBP, ReadyFlag::BackupDomainAccess, budget::BACKUP_DOMAIN)
    }

    fn cr(&self) -> MmioReg<u32> {
        unsafe { MmioReg::new(self.base + reg::CR) }
    }
}
