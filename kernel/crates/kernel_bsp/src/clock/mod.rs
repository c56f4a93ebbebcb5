//! Clock tree configuration
//!
//! [`ClockConfig::BOARD`] is the configuration applied once at boot. The
//! records mirror the three register-level calls the bring-up makes:
//! oscillators, bus clocks, peripheral clocks.

mod config;
mod gate;
mod tree;

pub use config::{
    AdcPrescaler, AhbPrescaler, ApbPrescaler, BusClockConfig, ClockConfig, ClockTypes,
    FlashLatency, HsePrediv, OscState, OscillatorConfig, Oscillators, PeriphClocks,
    PeripheralClockConfig, PllConfig, PllSource, RtcClockSource, SysclkSource,
};
pub use gate::{Bus, ClockGate};
pub use tree::{ClockError, ClockTree, limits};
