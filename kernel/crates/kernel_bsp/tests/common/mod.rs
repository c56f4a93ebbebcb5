//! Recording stand-in for the register-level HAL.

#![allow(dead_code)]

use kernel_bsp::clock::{
    Bus, BusClockConfig, ClockGate, OscillatorConfig, PeripheralClockConfig,
};
use kernel_bsp::gpio::{PinConfig, PinLocation};
use kernel_bsp::{BoardHal, HalError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Call {
    SystemInit,
    HalInit,
    FillVectorStubs,
    OscillatorConfig,
    ClockConfig,
    PeripheralClockConfig,
    EnableClock(ClockGate),
    PulseReset(ClockGate),
    GpioInit(PinLocation, PinConfig),
    SystemReset,
}

/// Message carried by the panic the mock raises in place of a reset.
pub const RESET_PANIC: &str = "system reset requested";

#[derive(Debug, Default)]
pub struct MockHal {
    pub calls: Vec<Call>,
    pub ahbenr: u32,
    pub apb1enr: u32,
    pub apb2enr: u32,
    pub resets: usize,
    pub fail_hal_init: Option<HalError>,
    pub fail_oscillators: Option<HalError>,
    pub fail_clock_tree: Option<HalError>,
    pub fail_peripheral_clocks: Option<HalError>,
}

impl MockHal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_enabled(&self, gate: ClockGate) -> bool {
        self.enable_register(gate.bus) & gate.mask() != 0
    }

    pub fn enable_register(&self, bus: Bus) -> u32 {
        match bus {
            Bus::Ahb => self.ahbenr,
            Bus::Apb1 => self.apb1enr,
            Bus::Apb2 => self.apb2enr,
        }
    }

    /// Index of the first recorded call equal to `call`.
    pub fn position(&self, call: Call) -> Option<usize> {
        self.calls.iter().position(|c| *c == call)
    }

    pub fn count(&self, call: Call) -> usize {
        self.calls.iter().filter(|c| **c == call).count()
    }

    fn outcome(&mut self, call: Call, failure: Option<HalError>) -> Result<(), HalError> {
        self.calls.push(call);
        failure.map_or(Ok(()), Err)
    }
}

impl BoardHal for MockHal {
    fn system_init(&mut self) {
        self.calls.push(Call::SystemInit);
    }

    fn hal_init(&mut self) -> Result<(), HalError> {
        self.outcome(Call::HalInit, self.fail_hal_init)
    }

    fn fill_vector_stubs(&mut self) {
        self.calls.push(Call::FillVectorStubs);
    }

    fn oscillator_config(&mut self, _config: &OscillatorConfig) -> Result<(), HalError> {
        self.outcome(Call::OscillatorConfig, self.fail_oscillators)
    }

    fn clock_config(&mut self, _config: &BusClockConfig) -> Result<(), HalError> {
        self.outcome(Call::ClockConfig, self.fail_clock_tree)
    }

    fn peripheral_clock_config(
        &mut self,
        _config: &PeripheralClockConfig,
    ) -> Result<(), HalError> {
        self.outcome(Call::PeripheralClockConfig, self.fail_peripheral_clocks)
    }

    fn enable_clock(&mut self, gate: ClockGate) {
        self.calls.push(Call::EnableClock(gate));
        match gate.bus {
            Bus::Ahb => self.ahbenr |= gate.mask(),
            Bus::Apb1 => self.apb1enr |= gate.mask(),
            Bus::Apb2 => self.apb2enr |= gate.mask(),
        }
    }

    fn pulse_reset(&mut self, line: ClockGate) {
        self.calls.push(Call::PulseReset(line));
    }

    fn gpio_init(&mut self, pin: PinLocation, config: PinConfig) {
        // Writes to an ungated port are lost on the real part.
        assert!(
            self.is_enabled(pin.port.clock_gate()),
            "{pin} configured before its port clock"
        );
        self.calls.push(Call::GpioInit(pin, config));
    }

    fn system_reset(&mut self) {
        self.calls.push(Call::SystemReset);
        self.resets += 1;
        panic!("{RESET_PANIC}");
    }
}
