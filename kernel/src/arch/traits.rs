use kernel_bsp::ShutdownMode;

/// Architecture-independent trait for platform-specific operations
pub trait Architecture {
    /// Bring the board to its operating point (clocks, vector table),
    /// before any driver runs
    fn early_init();

    /// Perform full architecture initialization
    fn init();

    /// Enable interrupts
    fn enable_interrupts();

    /// Disable interrupts
    fn disable_interrupts();

    /// Check if interrupts are enabled
    fn are_interrupts_enabled() -> bool;

    /// Wait for an interrupt (halt until interrupt)
    fn wait_for_interrupt();

    /// Idle hook, called from the idle loop between interrupts
    fn idle();

    /// Take the system down. Every mode ends in a hardware reset.
    fn shutdown(mode: ShutdownMode) -> !;
}
