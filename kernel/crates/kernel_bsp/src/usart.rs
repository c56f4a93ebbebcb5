//! USART instance resolution
//!
//! One table row per USART wired on this board. Every per-instance resource
//! (pins, ports, clock gates, reset line, interrupt) is read from the same
//! row, so adding an instance means adding one row.

use core::fmt;

use log::debug;
use thiserror::Error;

use crate::clock::{Bus, ClockGate, ClockTree};
use crate::gpio::{GpioPort, PinConfig, PinLocation};
use crate::hal::BoardHal;

/// Number of Cortex-M system exception vectors preceding IRQ 0.
pub const IRQ_VECTOR_OFFSET: u16 = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UsartInstance {
    Usart1,
    Usart2,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("USART{0} is not wired on this board")]
    UnsupportedInstance(u8),
    #[error("no USART at base address {0:#010x}")]
    UnknownBase(usize),
}

/// Everything needed to bring one USART instance online.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UsartResources {
    pub instance: UsartInstance,
    /// Register block base address.
    pub base: usize,
    pub tx: PinLocation,
    pub rx: PinLocation,
    /// Peripheral clock enable.
    pub clock: ClockGate,
    /// Peripheral reset line.
    pub reset: ClockGate,
    /// NVIC interrupt number.
    pub irq: u8,
}

static USART_TABLE: [UsartResources; UsartInstance::COUNT] = [
    UsartResources {
        instance: UsartInstance::Usart1,
        base: 0x4001_3800,
        tx: PinLocation::new(GpioPort::A, 9),
        rx: PinLocation::new(GpioPort::A, 10),
        clock: ClockGate::apb2(14),
        reset: ClockGate::apb2(14),
        irq: 37,
    },
    UsartResources {
        instance: UsartInstance::Usart2,
        base: 0x4000_4400,
        tx: PinLocation::new(GpioPort::A, 2),
        rx: PinLocation::new(GpioPort::A, 3),
        clock: ClockGate::apb1(17),
        reset: ClockGate::apb1(17),
        irq: 38,
    },
];

impl UsartInstance {
    pub const COUNT: usize = 2;
    pub const ALL: [Self; Self::COUNT] = [Self::Usart1, Self::Usart2];

    /// Resolve a build-time instance number.
    ///
    /// # Panics
    ///
    /// Panics if the board has no such instance. In a const context this is
    /// a build error.
    pub const fn from_number(number: u8) -> Self {
        match number {
            1 => Self::Usart1,
            2 => Self::Usart2,
            _ => panic!("USART instance not supported on this board"),
        }
    }

    /// Resolve a peripheral base address.
    ///
    /// # Panics
    ///
    /// Panics if no USART on this board lives at `base`.
    pub fn from_base(base: usize) -> Self {
        match Self::try_from_base(base) {
            Ok(instance) => instance,
            Err(err) => panic!("{err}"),
        }
    }

    /// # Errors
    /// Returns [`ConfigError::UnknownBase`] if no USART lives at `base`.
    pub fn try_from_base(base: usize) -> Result<Self, ConfigError> {
        USART_TABLE
            .iter()
            .find(|row| row.base == base)
            .map(|row| row.instance)
            .ok_or(ConfigError::UnknownBase(base))
    }

    pub const fn number(self) -> u8 {
        match self {
            Self::Usart1 => 1,
            Self::Usart2 => 2,
        }
    }

    pub fn resources(self) -> &'static UsartResources {
        &USART_TABLE[self as usize]
    }

    pub fn base(self) -> usize {
        self.resources().base
    }

    pub fn tx(self) -> PinLocation {
        self.resources().tx
    }

    pub fn rx(self) -> PinLocation {
        self.resources().rx
    }

    pub fn tx_port_clock(self) -> ClockGate {
        self.tx().port.clock_gate()
    }

    pub fn rx_port_clock(self) -> ClockGate {
        self.rx().port.clock_gate()
    }

    pub fn clock(self) -> ClockGate {
        self.resources().clock
    }

    pub fn reset(self) -> ClockGate {
        self.resources().reset
    }

    pub fn irq(self) -> u8 {
        self.resources().irq
    }

    /// Exception vector index of this instance's interrupt.
    pub fn vector(self) -> u16 {
        u16::from(self.irq()) + IRQ_VECTOR_OFFSET
    }

    /// Kernel clock feeding the baud-rate generator.
    pub fn bus_clock_hz(self, clocks: &ClockTree) -> u32 {
        match self.clock().bus {
            Bus::Apb2 => clocks.pclk2,
            Bus::Apb1 | Bus::Ahb => clocks.pclk1,
        }
    }
}

impl TryFrom<u8> for UsartInstance {
    type Error = ConfigError;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        match number {
            1 => Ok(Self::Usart1),
            2 => Ok(Self::Usart2),
            n => Err(ConfigError::UnsupportedInstance(n)),
        }
    }
}

impl fmt::Display for UsartInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "USART{}", self.number())
    }
}

/// Enable clocks and route the TX/RX pins of `instance`.
///
/// Port and peripheral clocks are enabled before any pin is configured: the
/// GPIO configuration registers are not writable while their port is gated.
pub fn usart_msp_init<H: BoardHal>(hal: &mut H, instance: UsartInstance) {
    let res = instance.resources();
    debug!("{instance}: msp init, tx {} rx {}", res.tx, res.rx);

    hal.enable_clock(instance.tx_port_clock());
    hal.enable_clock(instance.rx_port_clock());
    hal.enable_clock(res.clock);

    hal.gpio_init(res.tx, PinConfig::USART);
    hal.gpio_init(res.rx, PinConfig::USART);
}

/// Undo [`usart_msp_init`]: reset the peripheral and float its pins.
///
/// Port clocks stay enabled since other functions may share the port.
pub fn usart_msp_deinit<H: BoardHal>(hal: &mut H, instance: UsartInstance) {
    let res = instance.resources();
    debug!("{instance}: msp deinit");

    hal.pulse_reset(res.reset);
    hal.gpio_deinit(res.tx);
    hal.gpio_deinit(res.rx);
}
