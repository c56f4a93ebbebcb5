#![no_std]

use ::log::info;
use kernel_bsp::CORE_FREQ_HZ;

pub mod arch;
mod log;
pub mod serial;
pub mod time;

/// Boot the board: clock bring-up, boot console, tick, logger.
///
/// Bring-up runs before the console exists, so its outcome is logged
/// afterwards.
pub fn init() {
    use arch::traits::Architecture;

    // Clocks and vector table, before any driver
    arch::Arch::early_init();
    // Console USART and SysTick, on the clocks just configured
    arch::Arch::init();

    log::init();
    arch::cortexm3::platform::report_bring_up();

    info!("kernel initialized, target core clock {CORE_FREQ_HZ} Hz");
}
