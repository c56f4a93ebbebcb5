use bitflags::bitflags;

bitflags! {
    /// Oscillators an [`OscillatorConfig`] applies to. Fields for oscillators
    /// outside the set are left untouched.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Oscillators: u8 {
        const HSE = 1 << 0;
        const HSI = 1 << 1;
        const LSE = 1 << 2;
        const LSI = 1 << 3;
    }
}

bitflags! {
    /// Bus clocks a [`BusClockConfig`] applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ClockTypes: u8 {
        const SYSCLK = 1 << 0;
        const HCLK = 1 << 1;
        const PCLK1 = 1 << 2;
        const PCLK2 = 1 << 3;
    }
}

bitflags! {
    /// Peripheral kernel clocks a [`PeripheralClockConfig`] applies to.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PeriphClocks: u8 {
        const RTC = 1 << 0;
        const ADC = 1 << 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OscState {
    Off,
    On,
    /// External clock fed straight into the oscillator pin (HSE/LSE only).
    Bypass,
}

impl OscState {
    pub const fn is_running(self) -> bool {
        !matches!(self, Self::Off)
    }
}

/// HSE divider in front of the PLL (`PLLXTPRE`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HsePrediv {
    Div1,
    Div2,
}

impl HsePrediv {
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Div1 => 1,
            Self::Div2 => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PllSource {
    HsiDiv2,
    Hse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PllConfig {
    pub source: PllSource,
    /// Multiplier, x2 through x16.
    pub mul: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OscillatorConfig {
    pub oscillators: Oscillators,
    pub hse: OscState,
    pub hse_prediv: HsePrediv,
    pub hsi: OscState,
    pub lse: OscState,
    pub lsi: OscState,
    /// `None` switches the PLL off.
    pub pll: Option<PllConfig>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SysclkSource {
    Hsi,
    Hse,
    Pll,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AhbPrescaler {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
    Div64,
    Div128,
    Div256,
    Div512,
}

impl AhbPrescaler {
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Div1 => 1,
            Self::Div2 => 2,
            Self::Div4 => 4,
            Self::Div8 => 8,
            Self::Div16 => 16,
            Self::Div64 => 64,
            Self::Div128 => 128,
            Self::Div256 => 256,
            Self::Div512 => 512,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApbPrescaler {
    Div1,
    Div2,
    Div4,
    Div8,
    Div16,
}

impl ApbPrescaler {
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Div1 => 1,
            Self::Div2 => 2,
            Self::Div4 => 4,
            Self::Div8 => 8,
            Self::Div16 => 16,
        }
    }
}

/// Flash wait states. Must cover HCLK: see [`FlashLatency::for_hclk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FlashLatency {
    Ws0,
    Ws1,
    Ws2,
}

impl FlashLatency {
    pub const fn wait_states(self) -> u32 {
        self as u32
    }

    /// Minimum latency for an HCLK frequency: 0 WS up to 24 MHz, 1 WS up to
    /// 48 MHz, 2 WS above.
    pub const fn for_hclk(hclk: u32) -> Self {
        if hclk <= 24_000_000 {
            Self::Ws0
        } else if hclk <= 48_000_000 {
            Self::Ws1
        } else {
            Self::Ws2
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusClockConfig {
    pub clock_types: ClockTypes,
    pub sysclk_source: SysclkSource,
    pub ahb: AhbPrescaler,
    pub apb1: ApbPrescaler,
    pub apb2: ApbPrescaler,
    pub flash_latency: FlashLatency,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RtcClockSource {
    None,
    Lse,
    Lsi,
    HseDiv128,
}

/// ADC clock divider from PCLK2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdcPrescaler {
    Div2,
    Div4,
    Div6,
    Div8,
}

impl AdcPrescaler {
    pub const fn divisor(self) -> u32 {
        match self {
            Self::Div2 => 2,
            Self::Div4 => 4,
            Self::Div6 => 6,
            Self::Div8 => 8,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeripheralClockConfig {
    pub selection: PeriphClocks,
    pub rtc: RtcClockSource,
    pub adc: AdcPrescaler,
}

/// Snapshot of the whole clock tree configuration, applied once at boot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockConfig {
    pub oscillators: OscillatorConfig,
    pub bus: BusClockConfig,
    pub peripherals: PeripheralClockConfig,
}

impl ClockConfig {
    /// 8 MHz HSE x9 through the PLL: 72 MHz core, 36 MHz APB1, 72 MHz APB2,
    /// RTC on the 32.768 kHz crystal, 12 MHz ADC.
    pub const BOARD: Self = Self {
        oscillators: OscillatorConfig {
            oscillators: Oscillators::HSE
                .union(Oscillators::HSI)
                .union(Oscillators::LSE),
            hse: OscState::On,
            hse_prediv: HsePrediv::Div1,
            hsi: OscState::On,
            lse: OscState::On,
            lsi: OscState::Off,
            pll: Some(PllConfig {
                source: PllSource::Hse,
                mul: 9,
            }),
        },
        bus: BusClockConfig {
            clock_types: ClockTypes::SYSCLK
                .union(ClockTypes::HCLK)
                .union(ClockTypes::PCLK1)
                .union(ClockTypes::PCLK2),
            sysclk_source: SysclkSource::Pll,
            ahb: AhbPrescaler::Div1,
            apb1: ApbPrescaler::Div2,
            apb2: ApbPrescaler::Div1,
            flash_latency: FlashLatency::Ws2,
        },
        peripherals: PeripheralClockConfig {
            selection: PeriphClocks::RTC.union(PeriphClocks::ADC),
            rtc: RtcClockSource::Lse,
            adc: AdcPrescaler::Div6,
        },
    };
}

const _: () = assert!(
    ClockConfig::BOARD.tree().sysclk == crate::config::CORE_FREQ_HZ,
    "board clock configuration does not produce CORE_FREQ_HZ"
);
