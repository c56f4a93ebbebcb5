//! STM32F1 GPIO port driver
//!
//! Each port has 16 pins. A pin is configured through its 4-bit field in
//! CRL (pins 0-7) or CRH (pins 8-15); the pull direction of a pulled input
//! is the pin's ODR bit, set atomically through BSRR/BRR.

use kernel_bsp::gpio::{GpioPort, PinConfig, PinLocation};

use super::mmio::MmioReg;

mod reg {
    pub const CRL: usize = 0x00;
    pub const CRH: usize = 0x04;
    pub const BSRR: usize = 0x10;
    pub const BRR: usize = 0x14;
}

/// Offset of the configuration register and bit shift of `pin`'s field.
pub const fn config_field(pin: u8) -> (usize, u32) {
    if pin < 8 {
        (reg::CRL, pin as u32 * 4)
    } else {
        (reg::CRH, (pin as u32 - 8) * 4)
    }
}

/// One GPIO port register block
pub struct GpioBank {
    base: usize,
}

impl GpioBank {
    /// # Safety
    ///
    /// The port clock must be enabled, and pins of this port must not be
    /// reconfigured concurrently.
    pub const unsafe fn new(port: GpioPort) -> Self {
        Self { base: port.base() }
    }

    /// Apply `config` to `pin` with a single read-modify-write of CRL/CRH.
    pub fn configure(&self, pin: PinLocation, config: PinConfig) {
        debug_assert_eq!(pin.port.base(), self.base);
        let (offset, shift) = config_field(pin.pin);
        self.reg(offset)
            .write_field(0xF << shift, shift, config.cr_nibble());

        let mask = u32::from(pin.mask());
        match config.odr_pull() {
            Some(true) => self.reg(reg::BSRR).write(mask),
            Some(false) => self.reg(reg::BRR).write(mask),
            None => {}
        }
    }

    fn reg(&self, offset: usize) -> MmioReg<u32> {
        unsafe { MmioReg::new(self.base + offset) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usart_pins_land_in_expected_fields() {
        // PA9/PA10: USART1
        assert_eq!(config_field(9), (reg::CRH, 4));
        assert_eq!(config_field(10), (reg::CRH, 8));
        // PA2/PA3: USART2
        assert_eq!(config_field(2), (reg::CRL, 8));
        assert_eq!(config_field(3), (reg::CRL, 12));
    }
}
