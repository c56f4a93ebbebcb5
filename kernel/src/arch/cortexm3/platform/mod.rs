//! Platform-specific code for Cortex-M3 boards
//!
//! Each board has its own module with its register drivers and the
//! platform singletons.

pub mod stm32f1;

pub use stm32f1::*;
