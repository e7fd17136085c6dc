//! Beacon state machine.
//!
//! Implements the mode cycle of the beacon:
//! ```text
//! Idle      --edge-->        Wait       (timer ticks, flash pin off, comparator muted)
//! Wait      --5 ticks-->     Change
//! Change    --night-->       Idle       (timer blinking)
//! Change    --day-->         Idle       (timer stopped)
//! Idle      --disabled-->    DeepSleep  (everything off)
//! DeepSleep --enabled-->     Idle       (edge forced, day/night re-derived)
//! ```
//!
//! [`Beacon`] owns every driver and is the only writer of the mode and the wait
//! counter. It reads events exclusively through its [`FlagReceiver`].

use crate::config::INITIAL_WAIT;
use crate::enable::EnableInput;
use crate::flags::{Flag, FlagReceiver};
use crate::indicator::{AmbientIndicator, NoIndicator};
use crate::power::{self, Sleep, SleepDepth};
use crate::threshold::{Ambient, ThresholdDetector};
use crate::timer::BlinkTimer;

/// Mode of operation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Mode {
    /// Watching the comparator for a day/night edge
    #[default]
    Idle,
    /// Waiting out comparator chatter after an edge
    Wait,
    /// Committing to the light level read after the wait
    Change,
    /// Shut down by the enable line
    DeepSleep,
}

/// Debounce countdown in timer ticks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaitCounter {
    remaining: u8,
}

impl WaitCounter {
    /// Creates a counter holding the full [`INITIAL_WAIT`] ticks.
    pub const fn new() -> Self {
        Self {
            remaining: INITIAL_WAIT,
        }
    }

    /// Restores the full [`INITIAL_WAIT`] ticks.
    pub fn reset(&mut self) {
        self.remaining = INITIAL_WAIT;
    }

    /// Counts one tick. Returns `true` when the wait is over, in which case the
    /// counter is already reset for the next debounce.
    pub fn tick(&mut self) -> bool {
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.reset();
            true
        } else {
            false
        }
    }

    /// Ticks still to wait before the beacon commits.
    pub fn remaining(&self) -> u8 {
        self.remaining
    }
}

impl Default for WaitCounter {
    fn default() -> Self {
        Self::new()
    }
}

/// The beacon controller.
///
/// Generic over its drivers so the same state machine runs on the board and
/// against simulated hardware.
pub struct Beacon<'a, T, D, E, I = NoIndicator> {
    timer: T,
    detector: D,
    enable: E,
    indicator: I,
    flags: FlagReceiver<'a>,
    mode: Mode,
    wait: WaitCounter,
    sensed: Option<Ambient>,
}

impl<'a, T, D, E> Beacon<'a, T, D, E>
where
    T: BlinkTimer,
    D: ThresholdDetector,
    E: EnableInput,
{
    /// Takes over hardware that init left with the timer stopped and the
    /// comparator interrupt enabled.
    ///
    /// The comparator edge flag is forced so the first iterations work out the
    /// current light level instead of assuming one.
    ///
    /// # Arguments
    ///
    /// * `timer` - Tick and flash timer, stopped
    /// * `detector` - Day/night comparator, interrupt enabled
    /// * `enable` - External enable line
    /// * `flags` - The inbox receiver; interrupt handlers keep the raiser side
    pub fn new(timer: T, detector: D, enable: E, mut flags: FlagReceiver<'a>) -> Self {
        flags.force(Flag::ComparatorEdge);
        Self {
            timer,
            detector,
            enable,
            indicator: NoIndicator,
            flags,
            mode: Mode::Idle,
            wait: WaitCounter::new(),
            sensed: None,
        }
    }
}

impl<'a, T, D, E, I> Beacon<'a, T, D, E, I>
where
    T: BlinkTimer,
    D: ThresholdDetector,
    E: EnableInput,
    I: AmbientIndicator,
{
    /// Replaces the indicator that mirrors each sampled light level.
    ///
    /// # Arguments
    ///
    /// * `indicator` - Receives the level sampled at every comparator edge
    pub fn with_indicator<J: AmbientIndicator>(self, indicator: J) -> Beacon<'a, T, D, E, J> {
        Beacon {
            timer: self.timer,
            detector: self.detector,
            enable: self.enable,
            indicator,
            flags: self.flags,
            mode: self.mode,
            wait: self.wait,
            sensed: self.sensed,
        }
    }

    /// Current mode of operation.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Light level sampled when the current or last debounce started.
    pub fn sensed(&self) -> Option<Ambient> {
        self.sensed
    }

    /// Debounce countdown; only meaningful in [`Mode::Wait`].
    pub fn wait_counter(&self) -> WaitCounter {
        self.wait
    }

    /// Tick and flash timer driver.
    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Day/night comparator driver.
    pub fn detector(&self) -> &D {
        &self.detector
    }

    /// External enable line.
    pub fn enable(&self) -> &E {
        &self.enable
    }

    /// Ambient level indicator.
    pub fn indicator(&self) -> &I {
        &self.indicator
    }

    /// Handles the current mode once and returns the sleep depth for the mode
    /// the beacon is in afterwards.
    pub fn step(&mut self) -> SleepDepth {
        let next = match self.mode {
            Mode::Idle => self.idle(),
            Mode::Wait => self.wait(),
            Mode::Change => self.change(),
            Mode::DeepSleep => self.deep_sleep(),
        };
        if next != self.mode {
            info!("beacon: {} -> {}", self.mode, next);
            self.mode = next;
        }
        power::select(self.mode)
    }

    /// Whether the current mode has an event to handle right now.
    pub fn has_work(&self) -> bool {
        match self.mode {
            Mode::Idle => {
                self.flags.peek(Flag::PinChange) || self.flags.peek(Flag::ComparatorEdge)
            }
            Mode::Wait => self.flags.peek(Flag::Tick),
            Mode::Change => true,
            Mode::DeepSleep => self.flags.peek(Flag::PinChange),
        }
    }

    /// One loop iteration: handle the mode, then sleep until the next event.
    pub fn run_once<S: Sleep>(&mut self, sleeper: &mut S) {
        let depth = self.step();
        sleeper.suspend(depth, || self.has_work());
    }

    /// Runs the control loop forever.
    ///
    /// # Arguments
    ///
    /// * `sleeper` - Suspends the core between iterations
    pub fn run<S: Sleep>(&mut self, sleeper: &mut S) -> ! {
        loop {
            self.run_once(sleeper);
        }
    }

    fn idle(&mut self) -> Mode {
        // Consumed here; the live read below decides.
        self.flags.take(Flag::PinChange);

        if !self.enable.is_enabled() {
            self.shutdown();
            return Mode::DeepSleep;
        }

        if self.flags.take(Flag::ComparatorEdge) {
            self.detector.disable_interrupt();
            self.timer.start_as_debouncer();
            // A tick left over from blinking is not a debounce period.
            self.flags.take(Flag::Tick);
            self.wait.reset();
            let sensed = self.detector.read();
            debug!("beacon: edge, sensed {}", sensed);
            self.indicator.show(sensed);
            self.sensed = Some(sensed);
            return Mode::Wait;
        }

        Mode::Idle
    }

    fn wait(&mut self) -> Mode {
        if self.flags.take(Flag::Tick) {
            if self.wait.tick() {
                return Mode::Change;
            }
            trace!("beacon: {} ticks to go", self.wait.remaining());
        }
        Mode::Wait
    }

    fn change(&mut self) -> Mode {
        let ambient = self.detector.read();
        if self.sensed.is_some_and(|sensed| sensed != ambient) {
            warn!("beacon: light changed during debounce, applying {}", ambient);
        }

        match ambient {
            Ambient::Night => self.timer.start_as_blinker(),
            Ambient::Day => self.timer.stop(),
        }
        // An edge that slipped in before the comparator was masked is covered
        // by the live read above.
        self.flags.take(Flag::ComparatorEdge);
        self.detector.enable_interrupt();
        Mode::Idle
    }

    fn deep_sleep(&mut self) -> Mode {
        if self.flags.take(Flag::PinChange) && self.enable.is_enabled() {
            self.timer.start_as_debouncer();
            self.detector.enable_interrupt();
            // How long we slept is unknown, so re-derive day/night from scratch.
            self.flags.force(Flag::ComparatorEdge);
            return Mode::Idle;
        }
        Mode::DeepSleep
    }

    /// Turns the flash off and mutes every wake source except the enable line.
    fn shutdown(&mut self) {
        self.timer.stop();
        self.detector.disable_interrupt();
    }
}
