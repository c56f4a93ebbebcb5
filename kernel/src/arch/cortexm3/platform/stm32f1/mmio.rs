//! Memory-mapped register access for STM32F1 peripherals
//!
//! All accesses are volatile so the compiler neither reorders nor elides
//! them. Ready-flag polling is bounded: a flag that never asserts yields
//! [`HalError::Timeout`] instead of hanging the boot.

use core::ptr::{read_volatile, write_volatile};

use kernel_bsp::{HalError, ReadyFlag};

/// Memory-mapped I/O register wrapper
///
/// The type parameter `T` is the register width (u32 for every F1
/// peripheral this kernel touches).
#[repr(transparent)]
pub struct MmioReg<T: Copy> {
    addr: *mut T,
}

impl<T: Copy> MmioReg<T> {
    /// # Safety
    ///
    /// `addr` must be the aligned address of a hardware register of width
    /// `T`, and no other code may access it concurrently.
    #[inline]
    pub const unsafe fn new(addr: usize) -> Self {
        Self {
            addr: addr as *mut T,
        }
    }

    #[inline(always)]
    pub fn read(&self) -> T {
        // Safety: address validated at construction
        unsafe { read_volatile(self.addr) }
    }

    #[inline(always)]
    pub fn write(&self, value: T) {
        // Safety: address validated at construction
        unsafe { write_volatile(self.addr, value) }
    }

    /// Read-modify-write. Not atomic.
    #[inline(always)]
    pub fn modify<F>(&self, f: F)
    where
        F: FnOnce(T) -> T,
    {
        let val = self.read();
        self.write(f(val));
    }
}

impl MmioReg<u32> {
    #[inline(always)]
    pub fn set_bits(&self, mask: u32) {
        self.modify(|v| v | mask);
    }

    #[inline(always)]
    pub fn clear_bits(&self, mask: u32) {
        self.modify(|v| v & !mask);
    }

    #[inline(always)]
    pub fn is_set(&self, mask: u32) -> bool {
        (self.read() & mask) != 0
    }

    /// Replace the bits under `mask` with `value << shift`.
    #[inline(always)]
    pub fn write_field(&self, mask: u32, shift: u32, value: u32) {
        self.modify(|v| (v & !mask) | ((value << shift) & mask));
    }

    #[inline(always)]
    pub fn read_field(&self, mask: u32, shift: u32) -> u32 {
        (self.read() & mask) >> shift
    }

    /// Poll until `mask` is set, at most `budget` reads.
    ///
    /// # Errors
    /// [`HalError::Timeout`] naming `flag` if the budget runs out.
    pub fn wait_set_for(&self, mask: u32, flag: ReadyFlag, budget: u32) -> Result<(), HalError> {
        self.wait_until(|v| v & mask != 0, flag, budget)
    }

    /// Poll until `mask` is clear, at most `budget` reads.
    ///
    /// # Errors
    /// [`HalError::Timeout`] naming `flag` if the budget runs out.
    pub fn wait_clear_for(&self, mask: u32, flag: ReadyFlag, budget: u32) -> Result<(), HalError> {
        self.wait_until(|v| v & mask == 0, flag, budget)
    }

    /// Poll until `done` accepts the register value, at most `budget` reads.
    ///
    /// # Errors
    /// [`HalError::Timeout`] naming `flag` if the budget runs out.
    pub fn wait_until(
        &self,
        done: impl Fn(u32) -> bool,
        flag: ReadyFlag,
        budget: u32,
    ) -> Result<(), HalError> {
        for _ in 0..budget {
            if done(self.read()) {
                return Ok(());
            }
            core::hint::spin_loop();
        }
        Err(HalError::Timeout(flag))
    }

    /// Spin until `mask` is set. Only for flags that always assert, like
    /// USART TXE.
    #[inline]
    pub fn wait_set(&self, mask: u32) {
        while !self.is_set(mask) {
            core::hint::spin_loop();
        }
    }
}

/// Ready-flag poll budgets, in register reads.
///
/// At the 8 MHz reset clock one poll iteration is roughly a microsecond, so
/// these approximate the reference timeouts: HSE 100 ms, LSE 5 s, PLL and
/// HSI 2 ms, clock switch 5 s.
pub mod budget {
    pub const HSE: u32 = 100_000;
    pub const HSI: u32 = 2_000;
    pub const LSE: u32 = 5_000_000;
    pub const LSI: u32 = 2_000;
    pub const PLL: u32 = 2_000;
    pub const CLOCK_SWITCH: u32 = 5_000_000;
    pub const BACKUP_DOMAIN: u32 = 100_000;
}

// The wrapper is only an address; the owning driver serializes access.
unsafe impl<T: Copy> Send for MmioReg<T> {}
unsafe impl<T: Copy> Sync for MmioReg<T> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn reg(cell: &mut u32) -> MmioReg<u32> {
        unsafe { MmioReg::new(cell as *mut u32 as usize) }
    }

    #[test]
    fn field_access() {
        let mut cell = 0xFFFF_FFFF;
        let r = reg(&mut cell);
        r.write_field(0xF << 4, 4, 0x5);
        assert_eq!(r.read(), 0xFFFF_FF5F);
        assert_eq!(r.read_field(0xF << 4, 4), 0x5);
    }

    #[test]
    fn bounded_wait_times_out() {
        let mut cell = 0;
        let r = reg(&mut cell);
        assert_eq!(
            r.wait_set_for(1 << 17, ReadyFlag::Hse, 10),
            Err(HalError::Timeout(ReadyFlag::Hse))
        );
        assert_eq!(r.wait_clear_for(1 << 17, ReadyFlag::Hse, 10), Ok(()));
    }

    #[test]
    fn bounded_wait_sees_set_flag() {
        let mut cell = 1 << 25;
        let r = reg(&mut cell);
        assert_eq!(r.wait_set_for(1 << 25, ReadyFlag::Pll, 1), Ok(()));
    }
}
