//! Register-level collaborator
//!
//! [`BoardHal`] is the seam between the board sequences in this crate and
//! the peripheral registers. The firmware implements it against the real
//! RCC/FLASH/GPIO/SCB blocks; tests implement it with a recorder.

use thiserror::Error;

use crate::clock::{BusClockConfig, ClockError, ClockGate, OscillatorConfig, PeripheralClockConfig};
use crate::gpio::{PinConfig, PinLocation};

/// Hardware status flag a configuration step waits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyFlag {
    Hse,
    Hsi,
    Lse,
    Lsi,
    Pll,
    SysclkSwitch,
    BackupDomainAccess,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HalError {
    #[error("timed out waiting for {0:?}")]
    Timeout(ReadyFlag),
    #[error("{0:?} selected as clock source but not ready")]
    NotReady(ReadyFlag),
    #[error("PLL drives SYSCLK and cannot be reconfigured")]
    PllInUse,
    #[error("{0:?} drives SYSCLK and cannot be stopped")]
    OscillatorInUse(ReadyFlag),
    #[error("flash latency did not latch")]
    FlashLatency,
    #[error(transparent)]
    InvalidConfig(#[from] ClockError),
}

/// Named register-level init calls used by the boot sequence.
///
/// Every call is made at most once per boot, from the single-threaded boot
/// path, in the order documented on [`crate::Board::arch_init`].
pub trait BoardHal {
    /// Return the clock tree to its reset configuration (HSI, no dividers,
    /// PLL off) and point the vector table at flash.
    fn system_init(&mut self);

    /// Base HAL setup: flash prefetch buffer, interrupt priority grouping,
    /// tick.
    ///
    /// # Errors
    /// Returns an error if the tick could not be configured.
    fn hal_init(&mut self) -> Result<(), HalError>;

    /// Point every external interrupt vector at a stub handler.
    fn fill_vector_stubs(&mut self);

    /// # Errors
    /// Returns an error if an oscillator does not reach the requested state.
    fn oscillator_config(&mut self, config: &OscillatorConfig) -> Result<(), HalError>;

    /// Switch SYSCLK, program the bus dividers and flash wait states.
    ///
    /// # Errors
    /// Returns an error if the requested source is not ready or the switch
    /// does not complete.
    fn clock_config(&mut self, config: &BusClockConfig) -> Result<(), HalError>;

    /// # Errors
    /// Returns an error if the RTC source cannot be selected.
    fn peripheral_clock_config(&mut self, config: &PeripheralClockConfig) -> Result<(), HalError>;

    /// Set a clock enable bit. Setting an already set bit has no effect.
    fn enable_clock(&mut self, gate: ClockGate);

    /// Assert then release a peripheral reset line.
    fn pulse_reset(&mut self, line: ClockGate);

    fn gpio_init(&mut self, pin: PinLocation, config: PinConfig);

    /// Return a pin to its reset configuration.
    fn gpio_deinit(&mut self, pin: PinLocation) {
        self.gpio_init(pin, PinConfig::RESET);
    }

    /// Request a system reset through the interrupt controller.
    fn system_reset(&mut self);
}
