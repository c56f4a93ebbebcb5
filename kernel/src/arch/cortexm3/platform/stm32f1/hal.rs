//! [`BoardHal`] on the real STM32F103 registers

use kernel_bsp::clock::{
    BusClockConfig, ClockGate, ClockTree, OscillatorConfig, PeripheralClockConfig,
};
use kernel_bsp::gpio::{PinConfig, PinLocation};
use kernel_bsp::tick::init_tick;
use kernel_bsp::{BoardHal, HalError};
use log::debug;

use super::flash::Flash;
use super::gpio::GpioBank;
use super::memory_map::FLASH_BASE;
use super::nvic::{PRIORITY_GROUP_4, Scb};
use super::pwr::Pwr;
use super::rcc::Rcc;

/// Lowest priority with four preemption bits.
const TICK_PRIORITY: u8 = 15;

pub struct Stm32f1Hal {
    rcc: Rcc,
    flash: Flash,
    pwr: Pwr,
    scb: Scb,
}

impl Stm32f1Hal {
    /// # Safety
    ///
    /// Takes ownership of RCC, FLASH, PWR and SCB. Only one instance may
    /// exist.
    pub const unsafe fn new() -> Self {
        unsafe {
            Self {
                rcc: Rcc::new(),
                flash: Flash::new(),
                pwr: Pwr::new(),
                scb: Scb::new(),
            }
        }
    }

    /// Frequencies decoded from the RCC registers, which differ from the
    /// configured tree when a bring-up step failed.
    pub fn live_clocks(&self) -> ClockTree {
        self.rcc.current_tree()
    }
}

impl BoardHal for Stm32f1Hal {
    fn system_init(&mut self) {
        self.rcc.reset_to_default();
        self.scb.set_vector_table(FLASH_BASE);
    }

    fn hal_init(&mut self) -> Result<(), HalError> {
        self.flash.enable_prefetch();
        self.scb.set_priority_grouping(PRIORITY_GROUP_4);
        self.rcc.enable_clock(ClockGate::AFIO);
        self.rcc.enable_clock(ClockGate::PWR);
        debug!("prefetch buffer on: {}", self.flash.prefetch_enabled());
        init_tick(TICK_PRIORITY)
    }

    fn fill_vector_stubs(&mut self) {
        self.scb.install_stub_vectors();
    }

    fn oscillator_config(&mut self, config: &OscillatorConfig) -> Result<(), HalError> {
        self.rcc.configure_oscillators(config, &self.pwr)
    }

    fn clock_config(&mut self, config: &BusClockConfig) -> Result<(), HalError> {
        self.rcc.configure_bus_clocks(config, &self.flash)
    }

    fn peripheral_clock_config(&mut self, config: &PeripheralClockConfig) -> Result<(), HalError> {
        self.rcc.configure_peripheral_clocks(config, &self.pwr)
    }

    fn enable_clock(&mut self, gate: ClockGate) {
        self.rcc.enable_clock(gate);
    }

    fn pulse_reset(&mut self, line: ClockGate) {
        self.rcc.pulse_reset(line);
    }

    fn gpio_init(&mut self, pin: PinLocation, config: PinConfig) {
        // Safety: the port clock is on (MSP init enables it first) and the
        // platform lock serializes pin configuration.
        let bank = unsafe { GpioBank::new(pin.port) };
        bank.configure(pin, config);
    }

    fn system_reset(&mut self) {
        self.scb.request_reset();
    }
}
