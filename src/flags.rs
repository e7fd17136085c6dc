//! Interrupt flag inbox.
//!
//! Interrupt handlers and the foreground loop share one atomic byte. Each hardware
//! event source owns one bit. Handlers can only set bits through a [`FlagRaiser`];
//! only the single [`FlagReceiver`] can clear them, so a flag raised by a handler
//! stays visible until the loop has consumed it.
//!
//! Repeated raises before a take coalesce: the loop learns that an event happened
//! at least once, not how many times.

use portable_atomic::{AtomicBool, AtomicU8, Ordering};

/// Hardware event sources that report through the inbox.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Flag {
    /// Timer period elapsed (debounce tick)
    Tick = 1 << 0,
    // Bit 1 is reserved.
    /// Day/night comparator output flipped
    ComparatorEdge = 1 << 2,
    /// Enable line changed level
    PinChange = 1 << 3,
}

impl Flag {
    const fn mask(self) -> u8 {
        self as u8
    }
}

/// Process-wide set of event flags.
///
/// Lives in a `static` so interrupt handlers can reach it:
///
/// ```
/// use ambient_beacon::{Flag, FlagInbox};
///
/// static INBOX: FlagInbox = FlagInbox::new();
///
/// INBOX.raiser().raise(Flag::Tick);
/// let mut flags = INBOX.receiver().unwrap();
/// assert!(flags.take(Flag::Tick));
/// assert!(!flags.take(Flag::Tick));
/// ```
pub struct FlagInbox {
    bits: AtomicU8,
    receiver_claimed: AtomicBool,
}

impl FlagInbox {
    /// Creates an inbox with every flag clear.
    pub const fn new() -> Self {
        Self {
            bits: AtomicU8::new(0),
            receiver_claimed: AtomicBool::new(false),
        }
    }

    /// Returns the set-only handle used by interrupt handlers.
    pub const fn raiser(&self) -> FlagRaiser<'_> {
        FlagRaiser { inbox: self }
    }

    /// Claims the take-and-clear handle for the foreground loop.
    ///
    /// Only the first call succeeds; every later call returns `None`.
    pub fn receiver(&self) -> Option<FlagReceiver<'_>> {
        if self.receiver_claimed.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(FlagReceiver { inbox: self })
        }
    }

    fn set(&self, flag: Flag) {
        self.bits.fetch_or(flag.mask(), Ordering::Release);
    }
}

impl Default for FlagInbox {
    fn default() -> Self {
        Self::new()
    }
}

/// Set-only view of the inbox.
#[derive(Clone, Copy)]
pub struct FlagRaiser<'a> {
    inbox: &'a FlagInbox,
}

impl FlagRaiser<'_> {
    /// Marks `flag` as having occurred. Never blocks, safe to call from any interrupt.
    pub fn raise(self, flag: Flag) {
        self.inbox.set(flag);
    }
}

/// Take-and-clear view of the inbox, owned by the control loop.
pub struct FlagReceiver<'a> {
    inbox: &'a FlagInbox,
}

impl FlagReceiver<'_> {
    /// Returns whether `flag` was set and clears it in the same atomic operation.
    pub fn take(&mut self, flag: Flag) -> bool {
        let previous = self.inbox.bits.fetch_and(!flag.mask(), Ordering::AcqRel);
        previous & flag.mask() != 0
    }

    /// Returns whether `flag` is set without clearing it.
    pub fn peek(&self, flag: Flag) -> bool {
        self.inbox.bits.load(Ordering::Acquire) & flag.mask() != 0
    }

    /// Sets `flag` from the loop itself, so the next iteration handles it as if
    /// the hardware had raised it.
    pub fn force(&mut self, flag: Flag) {
        self.inbox.set(flag);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_clear() {
        let inbox = FlagInbox::new();
        let flags = inbox.receiver().unwrap();
        assert!(!flags.peek(Flag::Tick));
        assert!(!flags.peek(Flag::ComparatorEdge));
        assert!(!flags.peek(Flag::PinChange));
    }

    #[test]
    fn take_clears_only_the_requested_flag() {
        let inbox = FlagInbox::new();
        let mut flags = inbox.receiver().unwrap();
        inbox.raiser().raise(Flag::Tick);
        inbox.raiser().raise(Flag::PinChange);

        assert!(flags.take(Flag::Tick));
        assert!(!flags.peek(Flag::Tick));
        assert!(flags.peek(Flag::PinChange));
    }

    #[test]
    fn repeated_raises_coalesce() {
        let inbox = FlagInbox::new();
        let mut flags = inbox.receiver().unwrap();
        let irq = inbox.raiser();
        for _ in 0..10 {
            irq.raise(Flag::ComparatorEdge);
        }
        assert!(flags.take(Flag::ComparatorEdge));
        assert!(!flags.take(Flag::ComparatorEdge));
    }

    #[test]
    fn taking_a_clear_flag_changes_nothing() {
        let inbox = FlagInbox::new();
        let mut flags = inbox.receiver().unwrap();
        inbox.raiser().raise(Flag::PinChange);

        assert!(!flags.take(Flag::Tick));
        assert!(!flags.take(Flag::Tick));
        assert!(flags.peek(Flag::PinChange));
    }

    #[test]
    fn force_rearms_a_flag() {
        let inbox = FlagInbox::new();
        let mut flags = inbox.receiver().unwrap();
        flags.force(Flag::ComparatorEdge);
        assert!(flags.take(Flag::ComparatorEdge));
    }

    #[test]
    fn only_one_receiver() {
        let inbox = FlagInbox::new();
        let first = inbox.receiver();
        assert!(first.is_some());
        assert!(inbox.receiver().is_none());
    }
}
