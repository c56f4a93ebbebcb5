//! STM32F103 platform support
//!
//! Cortex-M3 at up to 72 MHz, clocked here from an 8 MHz HSE crystal
//! through the PLL. The board-level sequencing (what to configure, in which
//! order) lives in `kernel_bsp`; this module provides the register-level
//! [`hal::Stm32f1Hal`] it runs on and owns the resulting platform.
//!
//! Key addresses:
//! - RCC: 0x4002_1000
//! - FLASH: 0x4002_2000
//! - PWR: 0x4000_7000
//! - SCB: 0xE000_ED00

pub mod console;
pub mod flash;
pub mod gpio;
pub mod hal;
pub mod memory_map;
pub mod mmio;
pub mod nvic;
pub mod pwr;
pub mod rcc;

use conquer_once::spin::OnceCell;
use console::Console;
use hal::Stm32f1Hal;
use kernel_bsp::{Board, CONSOLE_USART, ClockTree, Platform, ShutdownMode};
use log::info;
use spin::Mutex;

/// The board after clock bring-up
pub static PLATFORM: OnceCell<Mutex<Platform<Stm32f1Hal>>> = OnceCell::uninit();

/// Boot console on [`CONSOLE_USART`]
pub static CONSOLE: OnceCell<Mutex<Console>> = OnceCell::uninit();

/// Run clock bring-up. Later calls do nothing.
pub fn bring_up() {
    PLATFORM.init_once(|| {
        // Safety: the OnceCell guarantees a single HAL instance
        let hal = unsafe { Stm32f1Hal::new() };
        Mutex::new(Board::new(hal).arch_init())
    });
}

/// Route the console USART and start the boot console.
///
/// Returns the live clock tree so the caller can program timers against
/// what the hardware actually runs at.
pub fn init() -> Option<ClockTree> {
    let mut platform = PLATFORM.get()?.lock();
    platform.usart_msp_init(CONSOLE_USART);
    let live = platform.hal().live_clocks();

    CONSOLE.init_once(|| {
        // Safety: MSP init above set up clocks and pins; the OnceCell
        // guarantees a single console.
        let mut console = unsafe { Console::new(CONSOLE_USART) };
        console.init(CONSOLE_USART.bus_clock_hz(&live));
        Mutex::new(console)
    });
    Some(live)
}

/// Log the bring-up outcome now that the console exists.
pub fn report_bring_up() {
    if let Some(platform) = PLATFORM.get() {
        let platform = platform.lock();
        platform.report().log();
        info!("configured clocks: {}", platform.clocks());
        info!("live clocks: {}", platform.hal().live_clocks());
    }
}

pub fn idle() {
    if let Some(platform) = PLATFORM.get() {
        platform.lock().idle();
    }
}

/// Reset the board. Usable from the panic handler: never waits on the
/// platform lock.
pub fn shutdown(mode: ShutdownMode) -> ! {
    info!("{} unhandled interrupts since boot", nvic::unhandled_interrupts());
    if let Some(console) = CONSOLE.get().and_then(|c| c.try_lock()) {
        console.flush();
    }
    match PLATFORM.get().and_then(|p| p.try_lock()) {
        Some(mut platform) => platform.shutdown(mode),
        None => {
            // Safety: the system is going down; nothing else uses the SCB
            // after this point.
            unsafe { nvic::Scb::new() }.request_reset()
        }
    }
}
