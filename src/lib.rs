//! Control core for a battery-powered, ambient-light-triggered beacon.
//!
//! # Overview
//!
//! The beacon flashes at night and stays dark by day:
//! - A comparator senses the ambient-light voltage against a fixed reference
//! - Every day/night edge is debounced for a fixed number of timer ticks
//! - One hardware timer both paces the debounce and generates the flash waveform
//! - An external enable line forces the whole beacon into power-down
//!
//! # Event Flow
//!
//! Interrupt handlers only raise bits in a [`flags::FlagInbox`]. The foreground
//! [`beacon::Beacon`] takes those bits, reconfigures the timer and comparator for
//! the new mode, and asks a [`power::Sleep`] implementation to suspend the core
//! in the sleep depth [`power::select`] picks for that mode.
//!
//! # Module Organization
//!
//! - [`flags`] - Interrupt flag inbox shared with interrupt handlers
//! - [`config`] - Compile-time timing constants
//! - [`timer`] - Tick/flash timer contract and its fixed reconfiguration sequences
//! - [`threshold`] - Day/night comparator contract
//! - [`enable`] - External enable line
//! - [`indicator`] - Optional pin mirroring each sampled light level
//! - [`beacon`] - Mode state machine and control loop
//! - [`power`] - Sleep-depth selection
//!
//! The register-level drivers for the STM32L031 board live in the firmware binary.

#![cfg_attr(not(test), no_std)]

// This mod MUST go first, so that the others see its macros.
mod fmt;

pub mod beacon;
pub mod config;
pub mod enable;
pub mod flags;
pub mod indicator;
pub mod power;
pub mod threshold;
pub mod timer;

pub use beacon::{Beacon, Mode, WaitCounter};
pub use enable::{EnableInput, EnablePin};
pub use flags::{Flag, FlagInbox, FlagRaiser, FlagReceiver};
pub use indicator::{AmbientIndicator, IndicatorPin, NoIndicator};
pub use power::{Sleep, SleepDepth};
pub use threshold::{Ambient, ThresholdDetector};
pub use timer::{BlinkTimer, FlashTimer, TimerRegisters, TimerState};
