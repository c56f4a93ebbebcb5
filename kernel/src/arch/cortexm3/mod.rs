pub mod platform;

use kernel_bsp::ShutdownMode;

use crate::arch::traits::Architecture;

pub struct CortexM3;

impl Architecture for CortexM3 {
    fn early_init() {
        // Clock tree and vector table, before any driver touches a bus
        platform::bring_up();
    }

    fn init() {
        let Some(clocks) = platform::init() else {
            return;
        };
        crate::time::start_systick(clocks.hclk);
    }

    fn enable_interrupts() {
        #[cfg(target_arch = "arm")]
        // SAFETY: only called once the vector table and every handler it
        // names are installed.
        unsafe {
            cortex_m::interrupt::enable();
        }
    }

    fn disable_interrupts() {
        #[cfg(target_arch = "arm")]
        cortex_m::interrupt::disable();
    }

    fn are_interrupts_enabled() -> bool {
        #[cfg(target_arch = "arm")]
        {
            cortex_m::register::primask::read().is_inactive()
        }
        #[cfg(not(target_arch = "arm"))]
        {
            false
        }
    }

    fn wait_for_interrupt() {
        #[cfg(target_arch = "arm")]
        cortex_m::asm::wfi();
    }

    fn idle() {
        platform::idle();
    }

    fn shutdown(mode: ShutdownMode) -> ! {
        platform::shutdown(mode)
    }
}
