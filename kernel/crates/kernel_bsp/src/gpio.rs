//! GPIO pin descriptors and electrical configuration
//!
//! The F1 GPIO block configures each pin with a 4-bit `CNF[1:0]:MODE[1:0]`
//! field in CRL (pins 0..=7) or CRH (pins 8..=15). Pull direction for inputs
//! is latched through the output data register.

use core::fmt;

use crate::clock::ClockGate;

/// GPIO port on the APB2 bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GpioPort {
    A,
    B,
    C,
    D,
    E,
}

impl GpioPort {
    /// Register block base address.
    pub const fn base(self) -> usize {
        0x4001_0800 + (self as usize) * 0x400
    }

    /// `IOPxEN` in `RCC_APB2ENR`, starting at bit 2 for port A.
    pub const fn clock_gate(self) -> ClockGate {
        ClockGate::apb2(2 + self as u8)
    }

    pub const fn letter(self) -> char {
        match self {
            Self::A => 'A',
            Self::B => 'B',
            Self::C => 'C',
            Self::D => 'D',
            Self::E => 'E',
        }
    }
}

/// A physical pin: port plus pin number within the port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PinLocation {
    pub port: GpioPort,
    pub pin: u8,
}

impl PinLocation {
    /// Number of pins per port.
    pub const PINS_PER_PORT: u8 = 16;

    /// # Panics
    ///
    /// Panics if `pin` is not below 16.
    pub const fn new(port: GpioPort, pin: u8) -> Self {
        assert!(pin < Self::PINS_PER_PORT, "GPIO pin out of range");
        Self { port, pin }
    }

    /// Single-bit mask for this pin in the 16-bit port registers.
    pub const fn mask(self) -> u16 {
        1 << self.pin
    }
}

impl fmt::Display for PinLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}{}", self.port.letter(), self.pin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinMode {
    Input,
    Analog,
    OutputPushPull,
    OutputOpenDrain,
    AlternatePushPull,
    AlternateOpenDrain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pull {
    None,
    Up,
    Down,
}

/// Output slew rate. The F1 expresses it as the maximum output frequency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speed {
    /// 2 MHz
    Low,
    /// 10 MHz
    Medium,
    /// 50 MHz
    High,
}

impl Speed {
    const fn mode_bits(self) -> u32 {
        match self {
            Self::Medium => 0b01,
            Self::Low => 0b10,
            Self::High => 0b11,
        }
    }
}

/// Electrical configuration of a single pin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinConfig {
    pub mode: PinMode,
    pub pull: Pull,
    pub speed: Speed,
}

impl PinConfig {
    /// USART TX/RX lines: alternate-function push-pull, pull-up, high slew.
    pub const USART: Self = Self {
        mode: PinMode::AlternatePushPull,
        pull: Pull::Up,
        speed: Speed::High,
    };

    /// Reset state of every pin: floating input.
    pub const RESET: Self = Self {
        mode: PinMode::Input,
        pull: Pull::None,
        speed: Speed::Low,
    };

    /// The `CNF[1:0]:MODE[1:0]` field for CRL/CRH.
    ///
    /// Speed only applies to outputs and pull only to inputs; the hardware has
    /// no field for the other combinations.
    pub const fn cr_nibble(self) -> u32 {
        let (cnf, mode) = match self.mode {
            PinMode::Analog => (0b00, 0b00),
            PinMode::Input => match self.pull {
                Pull::None => (0b01, 0b00),
                Pull::Up | Pull::Down => (0b10, 0b00),
            },
            PinMode::OutputPushPull => (0b00, self.speed.mode_bits()),
            PinMode::OutputOpenDrain => (0b01, self.speed.mode_bits()),
            PinMode::AlternatePushPull => (0b10, self.speed.mode_bits()),
            PinMode::AlternateOpenDrain => (0b11, self.speed.mode_bits()),
        };
        (cnf << 2) | mode
    }

    /// Output data level that selects the pull direction of a pulled input.
    pub const fn odr_pull(self) -> Option<bool> {
        match (self.mode, self.pull) {
            (PinMode::Input, Pull::Up) => Some(true),
            (PinMode::Input, Pull::Down) => Some(false),
            _ => None,
        }
    }
}
