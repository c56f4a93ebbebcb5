// Cortex-M3 serial implementation
#[cfg(target_arch = "arm")]
mod cortexm3_impl {
    pub fn internal_print(args: core::fmt::Arguments) {
        use core::fmt::Write;

        use crate::arch::cortexm3::platform::CONSOLE;

        // Interrupts off so a handler that prints cannot interleave. The
        // console may be busy only if printing itself panicked; drop the
        // output rather than deadlock in the panic handler.
        cortex_m::interrupt::free(|_| {
            if let Some(mut console) = CONSOLE.get().and_then(|c| c.try_lock()) {
                let _ = console.write_fmt(args);
            }
        });
    }
}

#[cfg(target_arch = "arm")]
#[doc(hidden)]
pub use cortexm3_impl::internal_print;

// No console off target
#[cfg(not(target_arch = "arm"))]
#[doc(hidden)]
pub fn internal_print(_args: core::fmt::Arguments) {}

/// Prints to the host through the serial interface.
#[macro_export]
macro_rules! serial_print {
    ($($arg:tt)*) => ($crate::serial::internal_print(format_args!($($arg)*)));
}

/// Prints to the host through the serial interface, appending a newline.
#[macro_export]
macro_rules! serial_println {
    () => ($crate::serial_print!("\n"));
    ($fmt:expr) => ($crate::serial_print!(concat!($fmt, "\n")));
    ($fmt:expr, $($arg:tt)*) => ($crate::serial_print!(
        concat!($fmt, "\n"), $($arg)*));
}
