#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(target_os = "none")]
mod firmware {
    use core::panic::PanicInfo;

    use cortex_m_rt::entry;
    use kernel::arch::{self, traits::Architecture};
    use kernel_bsp::ShutdownMode;
    use log::{error, info};

    #[entry]
    fn main() -> ! {
        kernel::init();

        info!("entering idle loop");
        arch::Arch::enable_interrupts();

        loop {
            arch::idle();
            arch::Arch::wait_for_interrupt();
        }
    }

    #[panic_handler]
    fn panic(info: &PanicInfo) -> ! {
        error!("{info}");
        arch::shutdown(ShutdownMode::Abort)
    }
}

#[cfg(not(target_os = "none"))]
fn main() {}
