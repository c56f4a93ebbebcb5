//! Reset and clock control (RCC)
//!
//! Applies the `kernel_bsp` clock records to the RCC registers following
//! RM0008 section 7: oscillators first, then the SYSCLK switch with bus
//! dividers and flash wait states, then the RTC and ADC kernel clocks.
//! Every ready-flag wait is bounded.

use bitflags::bitflags;
use kernel_bsp::clock::{
    AdcPrescaler, AhbPrescaler, ApbPrescaler, Bus, BusClockConfig, ClockGate, ClockTree,
    ClockTypes, HsePrediv, OscState, OscillatorConfig, Oscillators, PeriphClocks,
    PeripheralClockConfig, PllConfig, PllSource, RtcClockSource, SysclkSource,
};
use kernel_bsp::config::{HSE_HZ, HSI_HZ, LSE_HZ, LSI_HZ};
use kernel_bsp::{ClockError, HalError, ReadyFlag};
use log::{debug, warn};

use super::flash::Flash;
use super::memory_map::RCC_BASE;
use super::mmio::{MmioReg, budget};
use super::pwr::Pwr;

mod reg {
    pub const CR: usize = 0x00;
    pub const CFGR: usize = 0x04;
    pub const CIR: usize = 0x08;
    pub const APB2RSTR: usize = 0x0C;
    pub const APB1RSTR: usize = 0x10;
    pub const AHBENR: usize = 0x14;
    pub const APB2ENR: usize = 0x18;
    pub const APB1ENR: usize = 0x1C;
    pub const BDCR: usize = 0x20;
    pub const CSR: usize = 0x24;
}

bitflags! {
    /// RCC_CR
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Cr: u32 {
        const HSION = 1 << 0;
        const HSIRDY = 1 << 1;
        const HSEON = 1 << 16;
        const HSERDY = 1 << 17;
        const HSEBYP = 1 << 18;
        const CSSON = 1 << 19;
        const PLLON = 1 << 24;
        const PLLRDY = 1 << 25;
    }
}

bitflags! {
    /// RCC_BDCR, without the RTCSEL field
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Bdcr: u32 {
        const LSEON = 1 << 0;
        const LSERDY = 1 << 1;
        const LSEBYP = 1 << 2;
        const RTCEN = 1 << 15;
        const BDRST = 1 << 16;
    }
}

bitflags! {
    /// RCC_CSR, oscillator bits only
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Csr: u32 {
        const LSION = 1 << 0;
        const LSIRDY = 1 << 1;
    }
}

/// RCC_CFGR fields as (mask, shift)
mod cfgr {
    pub const SW: (u32, u32) = (0b11, 0);
    pub const SWS: (u32, u32) = (0b11 << 2, 2);
    pub const HPRE: (u32, u32) = (0b1111 << 4, 4);
    pub const PPRE1: (u32, u32) = (0b111 << 8, 8);
    pub const PPRE2: (u32, u32) = (0b111 << 11, 11);
    pub const ADCPRE: (u32, u32) = (0b11 << 14, 14);
    pub const PLLSRC: u32 = 1 << 16;
    pub const PLLXTPRE: u32 = 1 << 17;
    pub const PLLMUL: (u32, u32) = (0b1111 << 18, 18);
}

const RTCSEL: (u32, u32) = (0b11 << 8, 8);

/// Reset-state masks for F1 parts outside the connectivity line, applied in
/// this order: SW/HPRE/PPRE1/PPRE2/ADCPRE/MCO, HSEON/CSSON/PLLON, HSEBYP,
/// PLLSRC/PLLXTPRE/PLLMUL/USBPRE.
mod reset {
    pub const CFGR_CLOCKS: u32 = 0xF8FF_0000;
    pub const CR_OSCILLATORS: u32 = 0xFEF6_FFFF;
    pub const CR_HSEBYP: u32 = 0xFFFB_FFFF;
    pub const CFGR_PLL: u32 = 0xFF80_FFFF;
    /// Clear every ready-interrupt flag and the CSS flag, all interrupts off.
    pub const CIR_CLEAR: u32 = 0x009F_0000;
}

pub const fn sw_bits(source: SysclkSource) -> u32 {
    match source {
        SysclkSource::Hsi => 0b00,
        SysclkSource::Hse => 0b01,
        SysclkSource::Pll => 0b10,
    }
}

pub const fn hpre_bits(prescaler: AhbPrescaler) -> u32 {
    match prescaler {
        AhbPrescaler::Div1 => 0b0000,
        AhbPrescaler::Div2 => 0b1000,
        AhbPrescaler::Div4 => 0b1001,
        AhbPrescaler::Div8 => 0b1010,
        AhbPrescaler::Div16 => 0b1011,
        AhbPrescaler::Div64 => 0b1100,
        AhbPrescaler::Div128 => 0b1101,
        AhbPrescaler::Div256 => 0b1110,
        AhbPrescaler::Div512 => 0b1111,
    }
}

pub const fn ppre_bits(prescaler: ApbPrescaler) -> u32 {
    match prescaler {
        ApbPrescaler::Div1 => 0b000,
        ApbPrescaler::Div2 => 0b100,
        ApbPrescaler::Div4 => 0b101,
        ApbPrescaler::Div8 => 0b110,
        ApbPrescaler::Div16 => 0b111,
    }
}

pub const fn adcpre_bits(prescaler: AdcPrescaler) -> u32 {
    match prescaler {
        AdcPrescaler::Div2 => 0b00,
        AdcPrescaler::Div4 => 0b01,
        AdcPrescaler::Div6 => 0b10,
        AdcPrescaler::Div8 => 0b11,
    }
}

pub const fn rtcsel_bits(source: RtcClockSource) -> u32 {
    match source {
        RtcClockSource::None => 0b00,
        RtcClockSource::Lse => 0b01,
        RtcClockSource::Lsi => 0b10,
        RtcClockSource::HseDiv128 => 0b11,
    }
}

/// PLLSRC, PLLXTPRE and PLLMUL for a PLL setting.
pub const fn pll_bits(pll: PllConfig, prediv: HsePrediv) -> u32 {
    let mut bits = ((pll.mul as u32 - 2) << cfgr::PLLMUL.1) & cfgr::PLLMUL.0;
    if let PllSource::Hse = pll.source {
        bits |= cfgr::PLLSRC;
        if let HsePrediv::Div2 = prediv {
            bits |= cfgr::PLLXTPRE;
        }
    }
    bits
}

const fn ahb_divisor(hpre: u32) -> u32 {
    match hpre {
        0b1000 => 2,
        0b1001 => 4,
        0b1010 => 8,
        0b1011 => 16,
        0b1100 => 64,
        0b1101 => 128,
        0b1110 => 256,
        0b1111 => 512,
        _ => 1,
    }
}

const fn apb_divisor(ppre: u32) -> u32 {
    match ppre {
        0b100 => 2,
        0b101 => 4,
        0b110 => 8,
        0b111 => 16,
        _ => 1,
    }
}

/// Frequencies selected by raw CFGR and BDCR values.
pub fn decode_tree(cfgr_value: u32, bdcr_value: u32) -> ClockTree {
    let field = |(mask, shift): (u32, u32)| (cfgr_value & mask) >> shift;
    let sysclk = match field(cfgr::SWS) {
        0b01 => HSE_HZ,
        0b10 => {
            // PLLMUL 0b1111 also means x16
            let mul = match field(cfgr::PLLMUL) + 2 {
                17 => 16,
                m => m,
            };
            let input = if cfgr_value & cfgr::PLLSRC == 0 {
                HSI_HZ / 2
            } else if cfgr_value & cfgr::PLLXTPRE != 0 {
                HSE_HZ / 2
            } else {
                HSE_HZ
            };
            input * mul
        }
        _ => HSI_HZ,
    };
    let hclk = sysclk / ahb_divisor(field(cfgr::HPRE));
    let pclk2 = hclk / apb_divisor(field(cfgr::PPRE2));
    let rtcclk = match (bdcr_value & RTCSEL.0) >> RTCSEL.1 {
        0b01 => LSE_HZ,
        0b10 => LSI_HZ,
        0b11 => HSE_HZ / 128,
        _ => 0,
    };
    ClockTree {
        sysclk,
        hclk,
        pclk1: hclk / apb_divisor(field(cfgr::PPRE1)),
        pclk2,
        adcclk: pclk2 / (2 * (field(cfgr::ADCPRE) + 1)),
        rtcclk,
    }
}

/// The RCC register block
pub struct Rcc {
    base: usize,
}

impl Rcc {
    /// # Safety
    ///
    /// Only one `Rcc` may exist; it owns every RCC register.
    pub const unsafe fn new() -> Self {
        Self { base: RCC_BASE }
    }

    /// Driver over a stand-in register block at `base`.
    #[cfg(test)]
    pub(super) const unsafe fn at(base: usize) -> Self {
        Self { base }
    }

    /// Return the clock tree to its reset configuration: HSI on and selected,
    /// no dividers, HSE and PLL off, clock interrupts disabled.
    pub fn reset_to_default(&self) {
        let cr = self.reg(reg::CR);
        let cfgr = self.reg(reg::CFGR);

        cr.set_bits(Cr::HSION.bits());
        cfgr.modify(|v| v & reset::CFGR_CLOCKS);
        cr.modify(|v| v & reset::CR_OSCILLATORS);
        cr.modify(|v| v & reset::CR_HSEBYP);
        cfgr.modify(|v| v & reset::CFGR_PLL);
        self.reg(reg::CIR).write(reset::CIR_CLEAR);
    }

    fn cr(&self) -> Cr {
        Cr::from_bits_retain(self.reg(reg::CR).read())
    }

    fn sysclk_status(&self) -> SysclkSource {
        match self.reg(reg::CFGR).read_field(cfgr::SWS.0, cfgr::SWS.1) {
            0b01 => SysclkSource::Hse,
            0b10 => SysclkSource::Pll,
            _ => SysclkSource::Hsi,
        }
    }

    fn pll_source(&self) -> PllSource {
        if self.reg(reg::CFGR).is_set(cfgr::PLLSRC) {
            PllSource::Hse
        } else {
            PllSource::HsiDiv2
        }
    }

    /// Whether `source` currently feeds SYSCLK, directly or through the PLL.
    fn drives_sysclk(&self, source: SysclkSource, pll_input: PllSource) -> bool {
        let status = self.sysclk_status();
        status == source || (status == SysclkSource::Pll && self.pll_source() == pll_input)
    }

    /// Apply the oscillators named in `config.oscillators`, then the PLL.
    ///
    /// # Errors
    /// A ready flag timing out, an attempt to stop or reprogram the clock
    /// currently driving SYSCLK, or an out-of-range PLL multiplier.
    pub fn configure_oscillators(
        &self,
        config: &OscillatorConfig,
        pwr: &Pwr,
    ) -> Result<(), HalError> {
        if config.oscillators.contains(Oscillators::HSE) {
            self.configure_hse(config.hse)?;
        }
        if config.oscillators.contains(Oscillators::HSI) {
            self.configure_hsi(config.hsi)?;
        }
        if config.oscillators.contains(Oscillators::LSI) {
            self.configure_lsi(config.lsi)?;
        }
        if config.oscillators.contains(Oscillators::LSE) {
            self.configure_lse(config.lse, pwr)?;
        }
        self.configure_pll(config.pll, config.hse_prediv)
    }

    fn configure_hse(&self, state: OscState) -> Result<(), HalError> {
        if self.drives_sysclk(SysclkSource::Hse, PllSource::Hse) {
            // Cannot be touched while in use; only a request to stop it is an error.
            if !state.is_running() {
                return Err(HalError::OscillatorInUse(ReadyFlag::Hse));
            }
            return Ok(());
        }

        let cr = self.reg(reg::CR);
        cr.clear_bits((Cr::HSEON | Cr::HSEBYP).bits());
        cr.wait_clear_for(Cr::HSERDY.bits(), ReadyFlag::Hse, budget::HSE)?;
        match state {
            OscState::Off => return Ok(()),
            OscState::On => cr.set_bits(Cr::HSEON.bits()),
            OscState::Bypass => cr.set_bits((Cr::HSEBYP | Cr::HSEON).bits()),
        }
        cr.wait_set_for(Cr::HSERDY.bits(), ReadyFlag::Hse, budget::HSE)
    }

    fn configure_hsi(&self, state: OscState) -> Result<(), HalError> {
        let cr = self.reg(reg::CR);
        if self.drives_sysclk(SysclkSource::Hsi, PllSource::HsiDiv2) {
            if !state.is_running() {
                return Err(HalError::OscillatorInUse(ReadyFlag::Hsi));
            }
            return cr.wait_set_for(Cr::HSIRDY.bits(), ReadyFlag::Hsi, budget::HSI);
        }

        if state.is_running() {
            cr.set_bits(Cr::HSION.bits());
            cr.wait_set_for(Cr::HSIRDY.bits(), ReadyFlag::Hsi, budget::HSI)
        } else {
            cr.clear_bits(Cr::HSION.bits());
            cr.wait_clear_for(Cr::HSIRDY.bits(), ReadyFlag::Hsi, budget::HSI)
        }
    }

    fn configure_lsi(&self, state: OscState) -> Result<(), HalError> {
        let csr = self.reg(reg::CSR);
        if state.is_running() {
            csr.set_bits(Csr::LSION.bits());
            csr.wait_set_for(Csr::LSIRDY.bits(), ReadyFlag::Lsi, budget::LSI)
        } else {
            csr.clear_bits(Csr::LSION.bits());
            csr.wait_clear_for(Csr::LSIRDY.bits(), ReadyFlag::Lsi, budget::LSI)
        }
    }

    /// LSE lives in the backup domain, which is write-protected after reset.
    ///
    /// The backup domain survives system resets, so the LSE is usually
    /// already running for the RTC. It is only stopped when the requested
    /// mode differs from the current one.
    fn configure_lse(&self, state: OscState, pwr: &Pwr) -> Result<(), HalError> {
        self.enable_clock(ClockGate::PWR);
        pwr.enable_backup_access()?;

        let bdcr = self.reg(reg::BDCR);
        let mode = Bdcr::LSEON | Bdcr::LSEBYP;
        let requested = match state {
            OscState::Off => Bdcr::empty(),
            OscState::On => Bdcr::LSEON,
            OscState::Bypass => mode,
        };
        if Bdcr::from_bits_retain(bdcr.read()) & mode == requested {
            return if state.is_running() {
                bdcr.wait_set_for(Bdcr::LSERDY.bits(), ReadyFlag::Lse, budget::LSE)
            } else {
                bdcr.wait_clear_for(Bdcr::LSERDY.bits(), ReadyFlag::Lse, budget::LSE)
            };
        }

        bdcr.clear_bits(mode.bits());
        bdcr.wait_clear_for(Bdcr::LSERDY.bits(), ReadyFlag::Lse, budget::LSE)?;
        match state {
            OscState::Off => return Ok(()),
            OscState::On => bdcr.set_bits(Bdcr::LSEON.bits()),
            OscState::Bypass => bdcr.set_bits((Bdcr::LSEBYP | Bdcr::LSEON).bits()),
        }
        bdcr.wait_set_for(Bdcr::LSERDY.bits(), ReadyFlag::Lse, budget::LSE)
    }

    fn configure_pll(&self, pll: Option<PllConfig>, prediv: HsePrediv) -> Result<(), HalError> {
        if let Some(pll) = pll {
            if !(2..=16).contains(&pll.mul) {
                return Err(ClockError::PllMultiplier(pll.mul).into());
            }
        }

        let cr = self.reg(reg::CR);
        let cfgr = self.reg(reg::CFGR);
        let pll_mask = cfgr::PLLSRC | cfgr::PLLXTPRE | cfgr::PLLMUL.0;

        if self.sysclk_status() == SysclkSource::Pll {
            // Reprogramming the PLL would pull SYSCLK out from under the core.
            return match pll {
                Some(pll) if cfgr.read() & pll_mask == pll_bits(pll, prediv) => Ok(()),
                _ => Err(HalError::PllInUse),
            };
        }

        cr.clear_bits(Cr::PLLON.bits());
        cr.wait_clear_for(Cr::PLLRDY.bits(), ReadyFlag::Pll, budget::PLL)?;
        let Some(pll) = pll else {
            return Ok(());
        };

        cfgr.modify(|v| (v & !pll_mask) | pll_bits(pll, prediv));
        cr.set_bits(Cr::PLLON.bits());
        cr.wait_set_for(Cr::PLLRDY.bits(), ReadyFlag::Pll, budget::PLL)
    }

    /// Switch SYSCLK and program the bus dividers named in
    /// `config.clock_types`.
    ///
    /// # Errors
    /// The requested SYSCLK source not being ready, the switch not
    /// completing, or the flash latency not latching.
    pub fn configure_bus_clocks(
        &self,
        config: &BusClockConfig,
        flash: &Flash,
    ) -> Result<(), HalError> {
        let cfgr = self.reg(reg::CFGR);
        let types = config.clock_types;

        // More wait states before speeding up...
        if config.flash_latency > flash.latency() {
            flash.set_latency(config.flash_latency)?;
        }

        if types.contains(ClockTypes::HCLK) {
            // Slowest APB clocks while HCLK changes, so neither overshoots.
            if types.contains(ClockTypes::PCLK1) {
                cfgr.write_field(cfgr::PPRE1.0, cfgr::PPRE1.1, ppre_bits(ApbPrescaler::Div16));
            }
            if types.contains(ClockTypes::PCLK2) {
                cfgr.write_field(cfgr::PPRE2.0, cfgr::PPRE2.1, ppre_bits(ApbPrescaler::Div16));
            }
            cfgr.write_field(cfgr::HPRE.0, cfgr::HPRE.1, hpre_bits(config.ahb));
        }

        if types.contains(ClockTypes::SYSCLK) {
            let cr = self.cr();
            let (ready, flag) = match config.sysclk_source {
                SysclkSource::Hsi => (cr.contains(Cr::HSIRDY), ReadyFlag::Hsi),
                SysclkSource::Hse => (cr.contains(Cr::HSERDY), ReadyFlag::Hse),
                SysclkSource::Pll => (cr.contains(Cr::PLLRDY), ReadyFlag::Pll),
            };
            if !ready {
                return Err(HalError::NotReady(flag));
            }

            let sw = sw_bits(config.sysclk_source);
            cfgr.write_field(cfgr::SW.0, cfgr::SW.1, sw);
            cfgr.wait_until(
                |v| (v & cfgr::SWS.0) >> cfgr::SWS.1 == sw,
                ReadyFlag::SysclkSwitch,
                budget::CLOCK_SWITCH,
            )?;
        }

        // ...fewer after slowing down.
        if config.flash_latency < flash.latency() {
            flash.set_latency(config.flash_latency)?;
        }

        if types.contains(ClockTypes::PCLK1) {
            cfgr.write_field(cfgr::PPRE1.0, cfgr::PPRE1.1, ppre_bits(config.apb1));
        }
        if types.contains(ClockTypes::PCLK2) {
            cfgr.write_field(cfgr::PPRE2.0, cfgr::PPRE2.1, ppre_bits(config.apb2));
        }
        Ok(())
    }

    /// Select the RTC clock and the ADC prescaler.
    ///
    /// Changing the RTC source requires a backup domain reset; BDCR is
    /// saved around it so the LSE keeps running.
    ///
    /// # Errors
    /// Backup domain access not being granted, or the LSE not restarting
    /// after the reset.
    pub fn configure_peripheral_clocks(
        &self,
        config: &PeripheralClockConfig,
        pwr: &Pwr,
    ) -> Result<(), HalError> {
        if config.selection.contains(PeriphClocks::RTC) {
            self.enable_clock(ClockGate::PWR);
            pwr.enable_backup_access()?;

            let bdcr = self.reg(reg::BDCR);
            let selected = rtcsel_bits(config.rtc);
            let current = bdcr.read_field(RTCSEL.0, RTCSEL.1);
            if current != 0 && current != selected {
                debug!("RTC clock source change, resetting backup domain");
                let saved = bdcr.read() & !RTCSEL.0;
                bdcr.set_bits(Bdcr::BDRST.bits());
                bdcr.clear_bits(Bdcr::BDRST.bits());
                bdcr.write(saved);
                if Bdcr::from_bits_retain(saved).contains(Bdcr::LSEON) {
                    bdcr.wait_set_for(Bdcr::LSERDY.bits(), ReadyFlag::Lse, budget::LSE)?;
                }
            }
            bdcr.write_field(RTCSEL.0, RTCSEL.1, selected);
        }

        if config.selection.contains(PeriphClocks::ADC) {
            self.reg(reg::CFGR)
                .write_field(cfgr::ADCPRE.0, cfgr::ADCPRE.1, adcpre_bits(config.adc));
        }
        Ok(())
    }

    pub fn enable_clock(&self, gate: ClockGate) {
        let enr = self.reg(match gate.bus {
            Bus::Ahb => reg::AHBENR,
            Bus::Apb1 => reg::APB1ENR,
            Bus::Apb2 => reg::APB2ENR,
        });
        enr.set_bits(gate.mask());
        // Read back: the clock takes a bus cycle to reach the peripheral.
        let _ = enr.read();
    }

    pub fn pulse_reset(&self, line: ClockGate) {
        let rstr = match line.bus {
            Bus::Apb1 => self.reg(reg::APB1RSTR),
            Bus::Apb2 => self.reg(reg::APB2RSTR),
            Bus::Ahb => {
                warn!("no reset line for AHB bit {}", line.bit);
                return;
            }
        };
        rstr.set_bits(line.mask());
        rstr.clear_bits(line.mask());
    }

    /// Frequencies the RCC is running at right now.
    pub fn current_tree(&self) -> ClockTree {
        decode_tree(self.reg(reg::CFGR).read(), self.reg(reg::BDCR).read())
    }

    fn reg(&self, offset: usize) -> MmioReg<u32> {
        unsafe { MmioReg::new(self.base + offset) }
    }
}
