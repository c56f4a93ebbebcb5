//! Polled boot console on the configured USART
//!
//! Transmit only, 115200 8N1. The interrupt-driven serial driver replaces
//! it once the OS is up; until then every log line goes out here.

use core::fmt::{self, Write};

use kernel_bsp::UsartInstance;

use super::mmio::MmioReg;

mod reg {
    pub const SR: usize = 0x00;
    pub const DR: usize = 0x04;
    pub const BRR: usize = 0x08;
    pub const CR1: usize = 0x0C;
    pub const CR2: usize = 0x10;
    pub const CR3: usize = 0x14;
}

mod sr {
    /// Transmit data register empty
    pub const TXE: u32 = 1 << 7;
    /// Transmission complete
    pub const TC: u32 = 1 << 6;
}

mod cr1 {
    pub const UE: u32 = 1 << 13;
    pub const TE: u32 = 1 << 3;
}

pub const BAUD: u32 = 115_200;

/// BRR value for `baud` from a `pclk` kernel clock, rounded to nearest.
pub const fn brr(pclk: u32, baud: u32) -> u32 {
    (pclk + baud / 2) / baud
}

pub struct Console {
    base: usize,
}

impl Console {
    /// # Safety
    ///
    /// `usart` clocks and pins must be set up (MSP init) and nothing else
    /// may drive this USART.
    pub unsafe fn new(usart: UsartInstance) -> Self {
        Self { base: usart.base() }
    }

    /// Program 8N1 at [`BAUD`] for a `pclk` kernel clock and enable the
    /// transmitter.
    pub fn init(&mut self, pclk: u32) {
        let cr1 = self.reg(reg::CR1);
        cr1.write(0);
        self.reg(reg::CR2).write(0);
        self.reg(reg::CR3).write(0);
        self.reg(reg::BRR).write(brr(pclk, BAUD));
        cr1.write(cr1::UE | cr1::TE);
    }

    pub fn putc(&self, byte: u8) {
        self.reg(reg::SR).wait_set(sr::TXE);
        self.reg(reg::DR).write(u32::from(byte));
    }

    /// Block until the last byte has left the shift register.
    pub fn flush(&self) {
        self.reg(reg::SR).wait_set(sr::TC);
    }

    fn reg(&self, offset: usize) -> MmioReg<u32> {
        unsafe { MmioReg::new(self.base + offset) }
    }
}

impl Write for Console {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for byte in s.bytes() {
            if byte == b'\n' {
                self.putc(b'\r');
            }
            self.putc(byte);
        }
        Ok(())
    }
}
