//! Sleep-depth selection.
//!
//! Between events the core always sleeps. While the beacon watches the light or
//! debounces an edge, the timer and comparator must stay clocked, so only the
//! light idle sleep is allowed. Once the enable line has shut everything down,
//! only the enable pin can wake the core and the deepest state is used.

use crate::beacon::Mode;

/// Low-power wait state entered at the bottom of every loop iteration.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepDepth {
    /// Core halted, peripherals clocked; any enabled interrupt wakes it.
    Idle,
    /// Clocks stopped; only pin-change class interrupts wake it.
    PowerDown,
}

/// Sleep depth allowed in `mode`.
pub const fn select(mode: Mode) -> SleepDepth {
    match mode {
        Mode::Idle | Mode::Wait | Mode::Change => SleepDepth::Idle,
        Mode::DeepSleep => SleepDepth::PowerDown,
    }
}

/// Suspends the core until the next interrupt.
pub trait Sleep {
    /// Enters `depth` unless `has_work` reports that an event is already pending.
    ///
    /// Implementations must evaluate `has_work` and enter the sleep state without
    /// an interrupt being serviced in between, otherwise an event raised right
    /// before sleeping would wait for the next unrelated interrupt.
    fn suspend(&mut self, depth: SleepDepth, has_work: impl FnOnce() -> bool);
}
