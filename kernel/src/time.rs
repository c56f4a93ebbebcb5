//! System tick
//!
//! SysTick runs off HCLK and fires at [`TICK_HZ`]; its handler is the only
//! writer of [`TICKS`].

use kernel_bsp::config::TICK_HZ;
use kernel_bsp::tick::{MonotonicTicks, get_tick};

/// System-wide monotonic tick counter
pub static TICKS: MonotonicTicks = MonotonicTicks::new();

/// Ticks since SysTick started.
pub fn sys_ticks() -> u32 {
    get_tick(&TICKS)
}

/// Milliseconds since SysTick started, wrapping with the tick counter.
pub fn uptime_ms() -> u32 {
    sys_ticks().wrapping_mul(1000 / TICK_HZ)
}

/// SysTick reload value for a core clock.
pub const fn systick_reload(hclk: u32) -> u32 {
    hclk / TICK_HZ - 1
}

#[cfg(target_arch = "arm")]
#[cortex_m_rt::exception]
fn SysTick() {
    TICKS.advance();
}

/// Start SysTick at [`TICK_HZ`] from `hclk`.
#[cfg(target_arch = "arm")]
pub fn start_systick(hclk: u32) {
    use cortex_m::peripheral::syst::SystClkSource;

    // SAFETY: SysTick is only ever touched here, once, during init.
    let mut syst = unsafe { cortex_m::Peripherals::steal() }.SYST;
    syst.set_clock_source(SystClkSource::Core);
    syst.set_reload(systick_reload(hclk));
    syst.clear_current();
    syst.enable_interrupt();
    syst.enable_counter();
}

#[cfg(not(target_arch = "arm"))]
pub fn start_systick(_hclk: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reload_for_one_millisecond() {
        assert_eq!(systick_reload(72_000_000), 71_999);
        assert_eq!(systick_reload(8_000_000), 7_999);
    }
}
