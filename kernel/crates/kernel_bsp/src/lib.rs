//! STM32F103 board support
//!
//! Everything the boot path needs to know about this board, kept free of
//! register access so it can be exercised on the host:
//!
//! - [`usart`]: which pins, clocks and reset lines belong to each USART
//! - [`clock`]: the clock tree configuration applied at boot and its
//!   frequency math
//! - [`hal`]: the register-level collaborator the sequences are built on
//! - [`board`]: the one-shot bring-up and the post-boot lifecycle hooks
//! - [`tick`]: the system tick accessors
//!
//! The firmware crate implements [`hal::BoardHal`] against the real
//! peripherals and drives [`board::Board::arch_init`] from its reset handler.

#![no_std]

pub mod board;
pub mod clock;
pub mod config;
pub mod gpio;
pub mod hal;
pub mod tick;
pub mod usart;

pub use board::{Board, BringUpReport, Platform, ShutdownMode};
pub use clock::{ClockConfig, ClockError, ClockTree};
pub use config::{CONSOLE_USART, CORE_FREQ_HZ, USARTX};
pub use hal::{BoardHal, HalError, ReadyFlag};
pub use usart::{ConfigError, UsartInstance, UsartResources};
