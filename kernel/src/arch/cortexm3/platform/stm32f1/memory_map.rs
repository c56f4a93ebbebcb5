//! STM32F103 memory map
//!
//! Addresses from RM0008 section 3.3. The GPIO port and USART bases live in
//! `kernel_bsp` alongside the rest of the per-instance table.

/// Main flash, also where the boot vector table sits.
pub const FLASH_BASE: usize = 0x0800_0000;

/// SRAM start
pub const SRAM_BASE: usize = 0x2000_0000;

/// APB1 peripheral window
pub const APB1_BASE: usize = 0x4000_0000;

/// APB2 peripheral window
pub const APB2_BASE: usize = 0x4001_0000;

/// AHB peripheral window
pub const AHB_BASE: usize = 0x4001_8000;

/// Power control
pub const PWR_BASE: usize = APB1_BASE + 0x7000;

/// Reset and clock control
pub const RCC_BASE: usize = AHB_BASE + 0x9000;

/// Flash memory interface
pub const FLASH_R_BASE: usize = AHB_BASE + 0xA000;

/// System control block (Cortex-M3 private peripheral bus)
pub const SCB_BASE: usize = 0xE000_ED00;

/// External interrupt lines of the medium-density F103 (USBWakeUp is the last).
pub const IRQ_COUNT: usize = 43;

/// Cortex-M3 system exceptions preceding the external interrupts.
pub const SYSTEM_EXCEPTIONS: usize = 16;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn peripheral_bases() {
        assert_eq!(RCC_BASE, 0x4002_1000);
        assert_eq!(FLASH_R_BASE, 0x4002_2000);
        assert_eq!(PWR_BASE, 0x4000_7000);
    }
}
