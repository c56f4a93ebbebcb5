pub mod cortexm3;
pub mod traits;

use kernel_bsp::ShutdownMode;

pub use self::cortexm3::CortexM3 as Arch;
use self::traits::Architecture;

pub fn idle() {
    Arch::idle();
}

pub fn shutdown(mode: ShutdownMode) -> ! {
    Arch::shutdown(mode)
}
