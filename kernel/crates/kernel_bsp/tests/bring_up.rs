//! Clock bring-up sequence and lifecycle against the recording HAL.

mod common;

use std::panic::{AssertUnwindSafe, catch_unwind};

use common::{Call, MockHal, RESET_PANIC};
use kernel_bsp::clock::{ApbPrescaler, FlashLatency, HsePrediv, PllConfig, PllSource};
use kernel_bsp::config::HSE_HZ;
use kernel_bsp::tick::{MonotonicTicks, get_tick, init_tick};
use kernel_bsp::{
    Board, ClockConfig, ClockError, CORE_FREQ_HZ, HalError, ReadyFlag, ShutdownMode, UsartInstance,
};

const BRING_UP_ORDER: [Call; 6] = [
    Call::SystemInit,
    Call::HalInit,
    Call::FillVectorStubs,
    Call::OscillatorConfig,
    Call::ClockConfig,
    Call::PeripheralClockConfig,
];

#[test]
fn bring_up_runs_every_step_once_in_order() {
    let platform = Board::new(MockHal::new()).arch_init();
    assert_eq!(platform.hal().calls, BRING_UP_ORDER);
    assert!(platform.report().target_reached());
    assert_eq!(platform.report().limits, Ok(()));
    assert_eq!(platform.report().hal_init, Ok(()));
}

#[test]
fn core_frequency_matches_crystal_and_dividers() {
    let platform = Board::new(MockHal::new()).arch_init();
    assert!(platform.report().target_reached());

    let config = ClockConfig::BOARD;
    let pll = config.oscillators.pll.unwrap();
    assert_eq!(pll.source, PllSource::Hse);
    let expected = HSE_HZ / config.oscillators.hse_prediv.divisor() * u32::from(pll.mul)
        / config.bus.ahb.divisor();
    assert_eq!(expected, CORE_FREQ_HZ);
    assert_eq!(platform.clocks().hclk, CORE_FREQ_HZ);
    assert_eq!(platform.clocks().pclk1, 36_000_000);
}

#[test]
fn failed_oscillator_step_does_not_stop_later_steps() {
    let mut hal = MockHal::new();
    hal.fail_oscillators = Some(HalError::Timeout(ReadyFlag::Hse));
    let platform = Board::new(hal).arch_init();

    assert_eq!(platform.hal().calls, BRING_UP_ORDER);
    let report = platform.report();
    assert_eq!(report.oscillators, Err(HalError::Timeout(ReadyFlag::Hse)));
    assert_eq!(report.clock_tree, Ok(()));
    assert_eq!(report.peripheral_clocks, Ok(()));
    assert!(!report.target_reached());
}

#[test]
fn every_step_failing_still_completes() {
    let mut hal = MockHal::new();
    hal.fail_hal_init = Some(HalError::FlashLatency);
    hal.fail_oscillators = Some(HalError::Timeout(ReadyFlag::Lse));
    hal.fail_clock_tree = Some(HalError::NotReady(ReadyFlag::Pll));
    hal.fail_peripheral_clocks = Some(HalError::Timeout(ReadyFlag::BackupDomainAccess));
    let mut platform = Board::new(hal).arch_init();

    assert_eq!(platform.hal().calls, BRING_UP_ORDER);
    let report = *platform.report();
    assert_eq!(report.hal_init, Err(HalError::FlashLatency));
    assert!(report.oscillators.is_err());
    assert!(report.clock_tree.is_err());
    assert!(report.peripheral_clocks.is_err());

    // The platform stays usable at whatever operating point it reached.
    platform.usart_msp_init(UsartInstance::Usart1);
    assert!(platform.hal().is_enabled(UsartInstance::Usart1.clock()));
}

#[test]
fn tree_check_alone_does_not_catch_out_of_range_pll() {
    let mut config = ClockConfig::BOARD;
    config.oscillators.hse_prediv = HsePrediv::Div2;
    config.oscillators.pll = Some(PllConfig {
        source: PllSource::Hse,
        mul: 18,
    });
    assert_eq!(config.tree().sysclk, CORE_FREQ_HZ);
    assert_eq!(config.validate(), Err(ClockError::PllMultiplier(18)));

    // Kept for the log replay once a console exists
    let platform = Board::with_config(MockHal::new(), config).arch_init();
    let report = platform.report();
    assert_eq!(report.limits, Err(ClockError::PllMultiplier(18)));
    assert_eq!(report.hal_init, Ok(()));
}

#[test]
#[should_panic(expected = "does not produce the core frequency")]
fn config_missing_core_frequency_is_fatal() {
    let mut config = ClockConfig::BOARD;
    config.oscillators.pll = Some(PllConfig {
        source: PllSource::Hse,
        mul: 6,
    });
    config.bus.apb1 = ApbPrescaler::Div2;
    config.bus.flash_latency = FlashLatency::Ws1;
    let _ = Board::with_config(MockHal::new(), config).arch_init();
}

#[test]
fn shutdown_resets_once_in_every_mode() {
    for mode in [ShutdownMode::Halt, ShutdownMode::Reboot, ShutdownMode::Abort] {
        let mut platform = Board::new(MockHal::new()).arch_init();

        let outcome = catch_unwind(AssertUnwindSafe(|| {
            platform.shutdown(mode);
        }));

        let panic = outcome.expect_err("shutdown returned");
        let message = panic
            .downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| panic.downcast_ref::<&str>().copied());
        assert_eq!(message, Some(RESET_PANIC));
        assert_eq!(platform.hal().resets, 1);
        assert_eq!(platform.hal().count(Call::SystemReset), 1);
    }
}

#[test]
fn idle_touches_no_hardware() {
    let mut platform = Board::new(MockHal::new()).arch_init();
    let before = platform.hal().calls.len();
    platform.idle();
    platform.idle();
    assert_eq!(platform.hal().calls.len(), before);
}

#[test]
fn console_pins_released_through_platform() {
    let mut platform = Board::new(MockHal::new()).arch_init();
    platform.usart_msp_init(UsartInstance::Usart2);
    platform.usart_msp_deinit(UsartInstance::Usart2);

    let calls = &platform.hal().calls;
    let reset = calls
        .iter()
        .position(|c| *c == Call::PulseReset(UsartInstance::Usart2.reset()))
        .unwrap();
    assert_eq!(calls.len(), reset + 3);
}

#[test]
fn tick_accessors() {
    static TICKS: MonotonicTicks = MonotonicTicks::new();
    let start = get_tick(&TICKS);
    TICKS.advance();
    assert_eq!(get_tick(&TICKS), start.wrapping_add(1));
    assert_eq!(init_tick(0), Ok(()));
}
