//! Tick and flash timer.
//!
//! A single hardware counter produces both the debounce tick (overflow interrupt)
//! and the flash waveform (compare-match output on the flash pin). Which of the
//! two is visible depends on whether the compare output is connected to the pin.
//!
//! Reconfiguring the counter is glitch-prone: connecting the output while the
//! counter runs at an unknown position can emit a partial flash, and powering the
//! timer down with the output still connected can leave the pin stuck high. The
//! orderings below are therefore fixed, and each lives in exactly one function of
//! [`FlashTimer`]. [`TimerRegisters`] only exposes the individual steps.

use crate::config::INITIAL_WAIT;

/// Configuration last applied to the timer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerState {
    /// Timer powered down, flash pin driven off
    #[default]
    Stopped,
    /// Counter running for ticks only, flash pin driven off
    Debouncing,
    /// Counter running with its compare output driving the flash pin
    Blinking,
}

/// Timer operations as seen by the state machine. None of them can fail.
pub trait BlinkTimer {
    /// Runs the counter with its compare output on the flash pin.
    fn start_as_blinker(&mut self);
    /// Runs the counter for ticks only; the flash pin stays off.
    fn start_as_debouncer(&mut self);
    /// Powers the timer down and leaves the flash pin off.
    fn stop(&mut self);
}

/// Single register-level steps of the timer peripheral.
///
/// Each method is one indivisible step of a reconfiguration sequence. It may
/// take several register writes, but implementations never call one another,
/// so the order of steps is decided by [`FlashTimer`] alone.
pub trait TimerRegisters {
    /// Enables the peripheral clock.
    fn power_up(&mut self);
    /// Disables the peripheral clock.
    fn power_down(&mut self);
    /// Loads prescaler, period and compare value and selects the PWM waveform.
    fn configure_waveform(&mut self);
    /// Hands the flash pin to the compare-match output.
    fn connect_output(&mut self);
    /// Takes the flash pin back from the compare-match output as a low GPIO.
    fn disconnect_output(&mut self);
    /// Unmasks the overflow interrupt that raises the tick flag.
    fn enable_tick_interrupt(&mut self);
    /// Masks the overflow interrupt.
    fn disable_tick_interrupt(&mut self);
    fn start_counter(&mut self);
    fn stop_counter(&mut self);
    /// Zeroes the counter.
    fn reset_counter(&mut self);
    /// Drives the flash pin low as a plain GPIO.
    fn drive_output_low(&mut self);
}

/// [`BlinkTimer`] built from the fixed register sequences.
pub struct FlashTimer<R> {
    registers: R,
    state: TimerState,
}

impl<R: TimerRegisters> FlashTimer<R> {
    /// Wraps the registers of a timer that hardware init left stopped.
    pub fn new(registers: R) -> Self {
        Self {
            registers,
            state: TimerState::Stopped,
        }
    }

    /// Configuration applied by the most recent operation.
    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Register-level driver underneath.
    pub fn registers(&self) -> &R {
        &self.registers
    }
}

impl<R: TimerRegisters> BlinkTimer for FlashTimer<R> {
    fn start_as_blinker(&mut self) {
        let regs = &mut self.registers;
        regs.power_up();
        // Park the counter at zero before the pin is connected.
        regs.stop_counter();
        regs.reset_counter();
        regs.configure_waveform();
        regs.connect_output();
        regs.enable_tick_interrupt();
        regs.start_counter();

        debug!("timer: {} -> blinking", self.state);
        self.state = TimerState::Blinking;
    }

    fn start_as_debouncer(&mut self) {
        let regs = &mut self.registers;
        regs.power_up();
        regs.stop_counter();
        regs.disconnect_output();
        regs.drive_output_low();
        regs.reset_counter();
        regs.configure_waveform();
        regs.enable_tick_interrupt();
        regs.start_counter();

        debug!(
            "timer: {} -> debouncing ({} ticks)",
            self.state, INITIAL_WAIT
        );
        self.state = TimerState::Debouncing;
    }

    fn stop(&mut self) {
        let regs = &mut self.registers;
        regs.disable_tick_interrupt();
        regs.disconnect_output();
        regs.stop_counter();
        regs.reset_counter();
        regs.power_down();
        regs.drive_output_low();

        debug!("timer: {} -> stopped", self.state);
        self.state = TimerState::Stopped;
    }
}
