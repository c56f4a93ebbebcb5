//! Boot-time bring-up and post-boot lifecycle
//!
//! [`Board`] exists only before the clock tree is configured. Calling
//! [`Board::arch_init`] consumes it and hands back a [`Platform`], so the
//! bring-up sequence cannot run twice.

use core::fmt;

use log::{debug, error, info, warn};

use crate::clock::{ClockConfig, ClockError, ClockTree};
use crate::config::CORE_FREQ_HZ;
use crate::hal::{BoardHal, HalError};
use crate::usart::{self, UsartInstance};

/// How the system should go down. Every mode ends in a hardware reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownMode {
    Halt,
    Reboot,
    Abort,
}

impl fmt::Display for ShutdownMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Halt => "halt",
            Self::Reboot => "reboot",
            Self::Abort => "abort",
        })
    }
}

/// Outcome of each bring-up step.
///
/// A failed step does not undo earlier ones: the board keeps running at
/// whatever operating point the last successful write left it in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BringUpReport {
    /// The configuration checked against the part's frequency limits.
    pub limits: Result<(), ClockError>,
    pub hal_init: Result<(), HalError>,
    pub oscillators: Result<(), HalError>,
    pub clock_tree: Result<(), HalError>,
    pub peripheral_clocks: Result<(), HalError>,
}

impl BringUpReport {
    /// True if all three clock steps succeeded. Only then does the
    /// hardware run the configured tree. The limits check and HAL init are
    /// not part of this.
    pub fn target_reached(&self) -> bool {
        self.oscillators.is_ok() && self.clock_tree.is_ok() && self.peripheral_clocks.is_ok()
    }

    fn steps(&self) -> [(&'static str, Result<(), HalError>); 3] {
        [
            ("oscillators", self.oscillators),
            ("clock tree", self.clock_tree),
            ("peripheral clocks", self.peripheral_clocks),
        ]
    }

    /// Re-emit the outcome through the logger.
    ///
    /// Bring-up runs before any logger can be installed, so the firmware
    /// calls this once its console is up.
    pub fn log(&self) {
        if let Err(err) = self.limits {
            warn!("clock configuration outside part limits: {err}");
        }
        if let Err(err) = self.hal_init {
            error!("HAL init failed: {err}");
        }
        for (step, result) in self.steps() {
            match result {
                Ok(()) => debug!("clock bring-up: {step} ok"),
                Err(err) => error!("clock bring-up: {step} failed: {err}"),
            }
        }
        if !self.target_reached() {
            warn!("core clock below {CORE_FREQ_HZ} Hz target");
        }
    }
}

/// The board before bring-up.
pub struct Board<H> {
    hal: H,
    config: ClockConfig,
}

impl<H: BoardHal> Board<H> {
    pub fn new(hal: H) -> Self {
        Self::with_config(hal, ClockConfig::BOARD)
    }

    /// Use a clock configuration other than [`ClockConfig::BOARD`].
    ///
    /// The configuration must still produce [`CORE_FREQ_HZ`];
    /// [`Board::arch_init`] asserts it.
    pub fn with_config(hal: H, config: ClockConfig) -> Self {
        Self { hal, config }
    }

    /// Bring the board from reset to its operating point.
    ///
    /// In order: reset-state init, HAL base init, interrupt vector stubs,
    /// oscillators, bus clocks, peripheral clocks. A failing clock step is
    /// logged and recorded in the [`BringUpReport`]; the remaining steps
    /// still run.
    ///
    /// # Panics
    ///
    /// Panics if the configuration does not produce [`CORE_FREQ_HZ`].
    pub fn arch_init(mut self) -> Platform<H> {
        let tree = self.config.tree();
        assert_eq!(
            tree.sysclk, CORE_FREQ_HZ,
            "clock configuration does not produce the core frequency"
        );
        let limits = self.config.validate().map(|_| ());
        if let Err(err) = limits {
            warn!("clock configuration outside part limits: {err}");
        }

        let hal = &mut self.hal;
        hal.system_init();
        let hal_init = hal.hal_init();
        if let Err(err) = hal_init {
            error!("HAL init failed: {err}");
        }
        hal.fill_vector_stubs();

        debug!("configuring oscillators");
        let oscillators = hal.oscillator_config(&self.config.oscillators);
        if let Err(err) = oscillators {
            error!("oscillator configuration failed: {err}");
        }

        debug!("configuring bus clocks");
        let clock_tree = hal.clock_config(&self.config.bus);
        if let Err(err) = clock_tree {
            error!("bus clock configuration failed: {err}");
        }

        debug!("configuring peripheral clocks");
        let peripheral_clocks = hal.peripheral_clock_config(&self.config.peripherals);
        if let Err(err) = peripheral_clocks {
            error!("peripheral clock configuration failed: {err}");
        }

        let report = BringUpReport {
            limits,
            hal_init,
            oscillators,
            clock_tree,
            peripheral_clocks,
        };
        if report.target_reached() {
            info!("clock bring-up done: {tree}");
        } else {
            warn!("clock bring-up incomplete, {tree} not reached");
        }

        Platform {
            hal: self.hal,
            clocks: tree,
            report,
        }
    }
}

/// The board after bring-up.
pub struct Platform<H> {
    hal: H,
    clocks: ClockTree,
    report: BringUpReport,
}

impl<H: BoardHal> Platform<H> {
    pub fn report(&self) -> &BringUpReport {
        &self.report
    }

    /// Frequencies the board was configured for. Only live if
    /// [`BringUpReport::target_reached`].
    pub fn clocks(&self) -> &ClockTree {
        &self.clocks
    }

    /// Idle hook. Nothing to do until low-power entry exists.
    pub fn idle(&mut self) {}

    pub fn usart_msp_init(&mut self, instance: UsartInstance) {
        usart::usart_msp_init(&mut self.hal, instance);
    }

    pub fn usart_msp_deinit(&mut self, instance: UsartInstance) {
        usart::usart_msp_deinit(&mut self.hal, instance);
    }

    /// Reset the system. Does not return.
    pub fn shutdown(&mut self, mode: ShutdownMode) -> ! {
        info!("shutdown ({mode}): resetting");
        self.hal.system_reset();
        loop {
            core::hint::spin_loop();
        }
    }

    pub fn hal(&self) -> &H {
        &self.hal
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::format;

    use super::*;
    use crate::hal::ReadyFlag;

    #[test]
    fn report_with_any_failure_misses_target() {
        let ok = BringUpReport {
            limits: Ok(()),
            hal_init: Ok(()),
            oscillators: Ok(()),
            clock_tree: Ok(()),
            peripheral_clocks: Ok(()),
        };
        assert!(ok.target_reached());

        let failed = BringUpReport {
            clock_tree: Err(HalError::NotReady(ReadyFlag::Pll)),
            ..ok
        };
        assert!(!failed.target_reached());

        let setup_warnings = BringUpReport {
            hal_init: Err(HalError::Timeout(ReadyFlag::Hsi)),
            limits: Err(ClockError::PllMultiplier(18)),
            ..ok
        };
        assert!(setup_warnings.target_reached());
    }

    #[test]
    fn shutdown_modes_display() {
        assert_eq!(format!("{}", ShutdownMode::Halt), "halt");
        assert_eq!(format!("{}", ShutdownMode::Abort), "abort");
    }
}
