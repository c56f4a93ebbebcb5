//! Build-time board configuration
//!
//! The console USART is picked with the `usart1` (default) or `usart2`
//! feature. `usart2` wins when both are enabled, so `--features usart2`
//! works without dropping the defaults. All values are `const`, so a board
//! variant that asks for an instance this board does not wire fails the
//! build rather than the boot.

use crate::usart::UsartInstance;

/// Number of the USART instance the console driver binds to.
#[cfg(feature = "usart2")]
pub const USARTX: u8 = 2;

/// Number of the USART instance the console driver binds to.
#[cfg(not(feature = "usart2"))]
pub const USARTX: u8 = 1;

/// The instance selected by [`USARTX`].
pub const CONSOLE_USART: UsartInstance = UsartInstance::from_number(USARTX);

/// Core frequency the board is designed for.
pub const CORE_FREQ_HZ: u32 = 72_000_000;

/// External crystal fitted on the board.
pub const HSE_HZ: u32 = 8_000_000;

/// Internal RC oscillator.
pub const HSI_HZ: u32 = 8_000_000;

/// 32.768 kHz watch crystal.
pub const LSE_HZ: u32 = 32_768;

/// Internal low-speed RC oscillator (nominal).
pub const LSI_HZ: u32 = 40_000;

/// System tick rate.
pub const TICK_HZ: u32 = 1_000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_instance_matches_option() {
        assert_eq!(CONSOLE_USART.number(), USARTX);
    }

    #[cfg(not(feature = "usart2"))]
    #[test]
    fn default_console_is_usart1() {
        assert_eq!(CONSOLE_USART, UsartInstance::Usart1);
    }

    #[cfg(feature = "usart2")]
    #[test]
    fn usart2_overrides_default_instance() {
        assert_eq!(USARTX, 2);
        assert_eq!(CONSOLE_USART, UsartInstance::Usart2);
        assert_eq!(CONSOLE_USART.bus_clock_hz(&crate::ClockConfig::BOARD.tree()), 36_000_000);
    }
}
