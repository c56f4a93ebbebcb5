/// Peripheral bus a clock gate or reset line sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bus {
    Ahb,
    Apb1,
    Apb2,
}

/// One bit in an RCC enable register.
///
/// The `RCC_APBxRSTR` reset registers share the bit layout of the matching
/// `RCC_APBxENR`, so the same value also names a peripheral reset line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClockGate {
    pub bus: Bus,
    pub bit: u8,
}

impl ClockGate {
    pub const AFIO: Self = Self::apb2(0);
    pub const PWR: Self = Self::apb1(28);

    pub const fn ahb(bit: u8) -> Self {
        Self { bus: Bus::Ahb, bit }
    }

    pub const fn apb1(bit: u8) -> Self {
        Self { bus: Bus::Apb1, bit }
    }

    pub const fn apb2(bit: u8) -> Self {
        Self { bus: Bus::Apb2, bit }
    }

    pub const fn mask(self) -> u32 {
        1 << self.bit
    }
}
