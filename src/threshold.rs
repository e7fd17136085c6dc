//! Day/night threshold detector.
//!
//! A comparator holds the ambient-light voltage against a fixed reference. Its
//! output is the only light information the beacon has; it is read live at every
//! decision and never cached.

/// Ambient light as reported by the comparator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Ambient {
    Day,
    Night,
}

/// Comparator with an any-edge interrupt.
///
/// The detector does no filtering of its own; chatter around the threshold
/// shows up as edges and is debounced by the state machine.
pub trait ThresholdDetector {
    /// Lets comparator edges raise the edge interrupt.
    fn enable_interrupt(&mut self);
    /// Stops comparator edges from raising the edge interrupt.
    fn disable_interrupt(&mut self);
    /// Current comparator output, whether or not the interrupt is enabled.
    fn read(&self) -> Ambient;
}
