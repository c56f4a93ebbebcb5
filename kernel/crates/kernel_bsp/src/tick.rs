//! System tick accessors
//!
//! The tick counter itself is owned by the firmware (advanced from the
//! SysTick exception); this module only reads it.

use core::sync::atomic::{AtomicU32, Ordering};

use crate::hal::HalError;

/// Source of the system-wide monotonic tick count.
pub trait TickCounter {
    /// Ticks since boot, wrapping at `u32::MAX`.
    fn ticks(&self) -> u32;
}

/// Tick counter advanced from interrupt context.
#[derive(Debug)]
pub struct MonotonicTicks(AtomicU32);

impl MonotonicTicks {
    pub const fn new() -> Self {
        Self(AtomicU32::new(0))
    }

    /// Advance by one tick. Called from the tick interrupt only.
    pub fn advance(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for MonotonicTicks {
    fn default() -> Self {
        Self::new()
    }
}

impl TickCounter for MonotonicTicks {
    fn ticks(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

pub fn get_tick(counter: &impl TickCounter) -> u32 {
    counter.ticks()
}

/// The tick runs at a fixed rate set up by the firmware, so there is
/// nothing to configure here.
///
/// # Errors
/// Never fails.
pub fn init_tick(_priority: u8) -> Result<(), HalError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn get_tick_reads_counter() {
        let ticks = MonotonicTicks::new();
        assert_eq!(get_tick(&ticks), 0);
        ticks.advance();
        ticks.advance();
        assert_eq!(get_tick(&ticks), 2);
    }

    #[test]
    fn counter_wraps() {
        let ticks = MonotonicTicks(AtomicU32::new(u32::MAX));
        ticks.advance();
        assert_eq!(ticks.ticks(), 0);
    }

    #[test]
    fn init_tick_always_succeeds() {
        assert_eq!(init_tick(0), Ok(()));
        assert_eq!(init_tick(15), Ok(()));
    }
}
