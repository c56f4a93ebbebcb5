use core::fmt;

use thiserror::Error;

use super::config::{
    ClockConfig, FlashLatency, HsePrediv, OscState, Oscillators, PeriphClocks, PllSource,
    RtcClockSource, SysclkSource,
};
use crate::config::{HSE_HZ, HSI_HZ, LSE_HZ, LSI_HZ};

/// Operating limits of the STM32F103.
pub mod limits {
    pub const SYSCLK_MAX: u32 = 72_000_000;
    pub const PCLK1_MAX: u32 = 36_000_000;
    pub const PCLK2_MAX: u32 = 72_000_000;
    pub const ADCCLK_MAX: u32 = 14_000_000;
    pub const PLL_MUL_MIN: u8 = 2;
    pub const PLL_MUL_MAX: u8 = 16;
}

/// Frequencies, in Hz, produced by a [`ClockConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClockTree {
    pub sysclk: u32,
    pub hclk: u32,
    pub pclk1: u32,
    pub pclk2: u32,
    pub adcclk: u32,
    pub rtcclk: u32,
}

impl fmt::Display for ClockTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "sysclk={} hclk={} pclk1={} pclk2={} adc={} rtc={}",
            self.sysclk, self.hclk, self.pclk1, self.pclk2, self.adcclk, self.rtcclk
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ClockError {
    #[error("PLL multiplier x{0} outside x2..=x16")]
    PllMultiplier(u8),
    #[error("PLL input {0:?} is not enabled")]
    PllSourceDisabled(PllSource),
    #[error("SYSCLK source {0:?} is not enabled")]
    SysclkSourceDisabled(SysclkSource),
    #[error("RTC clock source {0:?} is not enabled")]
    RtcSourceDisabled(RtcClockSource),
    #[error("SYSCLK {0} Hz above 72 MHz")]
    Sysclk(u32),
    #[error("PCLK1 {0} Hz above 36 MHz")]
    Pclk1(u32),
    #[error("PCLK2 {0} Hz above 72 MHz")]
    Pclk2(u32),
    #[error("ADC clock {0} Hz above 14 MHz")]
    Adc(u32),
    #[error("flash latency {configured:?} too low for HCLK {hclk} Hz")]
    FlashLatency {
        configured: FlashLatency,
        hclk: u32,
    },
}

const fn pll_input(source: PllSource, prediv: HsePrediv) -> u32 {
    match source {
        PllSource::HsiDiv2 => HSI_HZ / 2,
        PllSource::Hse => HSE_HZ / prediv.divisor(),
    }
}

impl ClockConfig {
    /// Frequencies this configuration produces once applied.
    ///
    /// A PLL selected as SYSCLK while switched off yields 0 Hz; use
    /// [`ClockConfig::validate`] to reject such configurations.
    pub const fn tree(&self) -> ClockTree {
        let osc = &self.oscillators;
        let sysclk = match self.bus.sysclk_source {
            SysclkSource::Hsi => HSI_HZ,
            SysclkSource::Hse => HSE_HZ,
            SysclkSource::Pll => match osc.pll {
                Some(pll) => pll_input(pll.source, osc.hse_prediv) * pll.mul as u32,
                None => 0,
            },
        };
        let hclk = sysclk / self.bus.ahb.divisor();
        let pclk1 = hclk / self.bus.apb1.divisor();
        let pclk2 = hclk / self.bus.apb2.divisor();
        let rtcclk = match self.peripherals.rtc {
            RtcClockSource::None => 0,
            RtcClockSource::Lse => LSE_HZ,
            RtcClockSource::Lsi => LSI_HZ,
            RtcClockSource::HseDiv128 => HSE_HZ / 128,
        };
        ClockTree {
            sysclk,
            hclk,
            pclk1,
            pclk2,
            adcclk: pclk2 / self.peripherals.adc.divisor(),
            rtcclk,
        }
    }

    /// Check the configuration against the part's limits and return the
    /// resulting tree.
    ///
    /// # Errors
    /// Returns the first violated constraint.
    pub fn validate(&self) -> Result<ClockTree, ClockError> {
        let osc = &self.oscillators;
        let applies = |o: Oscillators, state: OscState| {
            osc.oscillators.contains(o) && state.is_running()
        };
        let hse = applies(Oscillators::HSE, osc.hse);
        // HSI runs out of reset and stays on unless explicitly stopped.
        let hsi = !osc.oscillators.contains(Oscillators::HSI) || osc.hsi.is_running();

        if let Some(pll) = osc.pll {
            if !(limits::PLL_MUL_MIN..=limits::PLL_MUL_MAX).contains(&pll.mul) {
                return Err(ClockError::PllMultiplier(pll.mul));
            }
            let input_running = match pll.source {
                PllSource::Hse => hse,
                PllSource::HsiDiv2 => hsi,
            };
            if !input_running {
                return Err(ClockError::PllSourceDisabled(pll.source));
            }
        }

        let source = self.bus.sysclk_source;
        let source_running = match source {
            SysclkSource::Hsi => hsi,
            SysclkSource::Hse => hse,
            SysclkSource::Pll => osc.pll.is_some(),
        };
        if !source_running {
            return Err(ClockError::SysclkSourceDisabled(source));
        }

        let tree = self.tree();
        if tree.sysclk > limits::SYSCLK_MAX {
            return Err(ClockError::Sysclk(tree.sysclk));
        }
        if tree.pclk1 > limits::PCLK1_MAX {
            return Err(ClockError::Pclk1(tree.pclk1));
        }
        if tree.pclk2 > limits::PCLK2_MAX {
            return Err(ClockError::Pclk2(tree.pclk2));
        }
        if self.bus.flash_latency < FlashLatency::for_hclk(tree.hclk) {
            return Err(ClockError::FlashLatency {
                configured: self.bus.flash_latency,
                hclk: tree.hclk,
            });
        }

        let periph = &self.peripherals;
        if periph.selection.contains(PeriphClocks::ADC) && tree.adcclk > limits::ADCCLK_MAX {
            return Err(ClockError::Adc(tree.adcclk));
        }
        if periph.selection.contains(PeriphClocks::RTC) {
            let rtc_running = match periph.rtc {
                RtcClockSource::None => true,
                RtcClockSource::Lse => applies(Oscillators::LSE, osc.lse),
                RtcClockSource::Lsi => applies(Oscillators::LSI, osc.lsi),
                RtcClockSource::HseDiv128 => hse,
            };
            if !rtc_running {
                return Err(ClockError::RtcSourceDisabled(periph.rtc));
            }
        }

        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::{AdcPrescaler, ApbPrescaler, PllConfig};
    use crate::config::CORE_FREQ_HZ;

    #[test]
    fn board_tree() {
        let tree = ClockConfig::BOARD.tree();
        assert_eq!(
            tree,
            ClockTree {
                sysclk: 72_000_000,
                hclk: 72_000_000,
                pclk1: 36_000_000,
                pclk2: 72_000_000,
                adcclk: 12_000_000,
                rtcclk: 32_768,
            }
        );
        assert_eq!(ClockConfig::BOARD.validate(), Ok(tree));
    }

    #[test]
    fn core_frequency_is_crystal_times_multiplier_over_dividers() {
        let config = ClockConfig::BOARD;
        let pll = config.oscillators.pll.unwrap();
        let derived = HSE_HZ / config.oscillators.hse_prediv.divisor() * u32::from(pll.mul)
            / config.bus.ahb.divisor();
        assert_eq!(derived, CORE_FREQ_HZ);
        assert_eq!(config.tree().hclk, CORE_FREQ_HZ);
    }

    #[test]
    fn undivided_apb1_at_72mhz_is_rejected() {
        let mut config = ClockConfig::BOARD;
        config.bus.apb1 = ApbPrescaler::Div1;
        assert_eq!(config.validate(), Err(ClockError::Pclk1(72_000_000)));
    }

    #[test]
    fn fast_adc_is_rejected() {
        let mut config = ClockConfig::BOARD;
        config.peripherals.adc = AdcPrescaler::Div4;
        assert_eq!(config.validate(), Err(ClockError::Adc(18_000_000)));
    }

    #[test]
    fn insufficient_flash_latency_is_rejected() {
        let mut config = ClockConfig::BOARD;
        config.bus.flash_latency = FlashLatency::Ws1;
        assert_eq!(
            config.validate(),
            Err(ClockError::FlashLatency {
                configured: FlashLatency::Ws1,
                hclk: 72_000_000
            })
        );
    }

    #[test]
    fn overclock_is_rejected() {
        let mut config = ClockConfig::BOARD;
        config.oscillators.pll = Some(PllConfig {
            source: PllSource::Hse,
            mul: 16,
        });
        assert_eq!(config.validate(), Err(ClockError::Sysclk(128_000_000)));
    }

    #[test]
    fn pll_multiplier_range() {
        let mut config = ClockConfig::BOARD;
        config.oscillators.pll = Some(PllConfig {
            source: PllSource::Hse,
            mul: 17,
        });
        assert_eq!(config.validate(), Err(ClockError::PllMultiplier(17)));
    }

    #[test]
    fn pll_from_stopped_hse_is_rejected() {
        let mut config = ClockConfig::BOARD;
        config.oscillators.hse = OscState::Off;
        assert_eq!(
            config.validate(),
            Err(ClockError::PllSourceDisabled(PllSource::Hse))
        );
    }

    #[test]
    fn pll_off_cannot_drive_sysclk() {
        let mut config = ClockConfig::BOARD;
        config.oscillators.pll = None;
        assert_eq!(config.tree().sysclk, 0);
        assert_eq!(
            config.validate(),
            Err(ClockError::SysclkSourceDisabled(SysclkSource::Pll))
        );
    }

    #[test]
    fn hsi_pll_48mhz_with_one_wait_state() {
        let mut config = ClockConfig::BOARD;
        config.oscillators.pll = Some(PllConfig {
            source: PllSource::HsiDiv2,
            mul: 12,
        });
        config.bus.apb1 = ApbPrescaler::Div2;
        config.bus.flash_latency = FlashLatency::Ws1;
        let tree = config.validate().unwrap();
        assert_eq!(tree.sysclk, 48_000_000);
        assert_eq!(tree.pclk1, 24_000_000);
    }

    #[test]
    fn rtc_on_lsi_needs_lsi() {
        let mut config = ClockConfig::BOARD;
        config.peripherals.rtc = RtcClockSource::Lsi;
        assert_eq!(
            config.validate(),
            Err(ClockError::RtcSourceDisabled(RtcClockSource::Lsi))
        );
        config.oscillators.oscillators |= Oscillators::LSI;
        config.oscillators.lsi = OscState::On;
        assert_eq!(config.validate().unwrap().rtcclk, 40_000);
    }
}
