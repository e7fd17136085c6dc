//! Firmware for a battery-powered, ambient-light-triggered beacon.
//!
//! # Overview
//!
//! This firmware flashes a beacon LED at night and keeps it dark by day:
//! - COMP2 senses the ambient-light voltage against the internal reference
//! - Every day/night edge is debounced for 5 timer periods (~10 seconds)
//! - TIM2 paces the debounce and generates the ~86 ms flash every 2 seconds
//! - An external enable line shuts the whole beacon down into STOP mode
//!
//! # Hardware
//!
//! - **MCU**: STM32L031G6U6 (Cortex-M0+, ultra-low-power)
//! - **Light sensor**: resistive divider on PA3, rising voltage in the dark
//! - **Flash**: LED driver on PA5
//! - **Enable**: PA1, internal pull-up
//!
//! # Low Power Operation
//!
//! - MSI oscillator at 131 kHz for minimal active current
//! - SLEEP between events while watching the light or blinking
//! - STOP while disabled; only the enable pin wakes the MCU
//!
//! # Module Organization
//!
//! - [`hardware`] - Pin mappings and register-level drivers
//! - [`interrupts`] - Interrupt handlers and the shared flag inbox
//! - `ambient_beacon` - Mode state machine driving those drivers

#![no_std]
#![no_main]

mod hardware;
mod interrupts;

use ambient_beacon::Beacon;
use ambient_beacon::config::timer_prescaler;
use cortex_m_rt::entry;
use embassy_stm32::{
    Config,
    rcc::{LsConfig, mux::ClockMux},
};
use {defmt_rtt as _, panic_probe as _};

use hardware::Board;
use interrupts::{INBOX, setup_interrupts};

/// System clock produced by [`create_low_power_config`].
#[cfg(not(feature = "debug-mode"))]
const SYSCLK_HZ: u32 = 131_072;
#[cfg(feature = "debug-mode")]
const SYSCLK_HZ: u32 = 2_097_152;

/// Delay after reset before the first sleep, in seconds.
const DEBUGGER_ATTACH_SECS: u32 = 3;

/// Creates a low-power clock configuration for STM32L031.
///
/// # Clock Settings
///
/// - **MSI**: 131 kHz in normal mode, 2.097 MHz in debug mode (for reliable debugging)
/// - **System clock**: MSI (no PLL), also the clock MSI resumes with after STOP
/// - **LSE/LSI**: off, nothing needs the RTC
/// - **Voltage scale**: Range 3 (1.2V core, enough for sub-MHz clocks)
///
/// TIM2 divides this clock down to 128 Hz, so both settings produce the same
/// beacon timing.
///
/// # Returns
///
/// Configured RCC settings for embassy-stm32 initialization
fn create_low_power_config() -> embassy_stm32::rcc::Config {
    embassy_stm32::rcc::Config {
        #[cfg(feature = "debug-mode")]
        msi: Some(embassy_stm32::rcc::MSIRange::RANGE2M),
        #[cfg(not(feature = "debug-mode"))]
        msi: Some(embassy_stm32::rcc::MSIRange::RANGE131K),
        hsi: false,
        hse: None,
        pll: None,
        sys: embassy_stm32::rcc::Sysclk::MSI,
        ahb_pre: embassy_stm32::rcc::AHBPrescaler::DIV1,
        apb1_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        apb2_pre: embassy_stm32::rcc::APBPrescaler::DIV1,
        ls: LsConfig::off(),
        voltage_scale: embassy_stm32::rcc::VoltageScale::RANGE3,
        mux: ClockMux::default(),
    }
}

/// Main entry point for the beacon firmware.
///
/// # Initialization Sequence
///
/// 1. Configure clocks for low power operation (131 kHz MSI)
/// 2. Initialize STM32 peripherals
/// 3. Wait for a debugger to attach
/// 4. Set up timer, comparator and enable pin drivers
/// 5. Configure EXTI lines and unmask interrupts
/// 6. Claim the flag inbox and hand everything to the state machine
///
/// # Main Loop
///
/// [`Beacon::run`] never returns. Each iteration handles pending events, then
/// sleeps in SLEEP or STOP depending on the beacon's mode.
#[entry]
fn main() -> ! {
    let mut config = Config::default();
    config.rcc = create_low_power_config();

    let p = embassy_stm32::init(config);
    let Some(cp) = cortex_m::Peripherals::take() else {
        defmt::panic!("core peripherals already taken");
    };

    #[cfg(feature = "debug-mode")]
    defmt::info!(
        "Ambient beacon {=str} starting...",
        env!("CARGO_PKG_VERSION")
    );

    // Wait a few seconds after boot to allow debugger connection
    // before entering STOP mode. Negligible battery impact.
    #[cfg(feature = "debug-mode")]
    defmt::info!("Waiting {} seconds for debugger connection...", DEBUGGER_ATTACH_SECS);

    cortex_m::asm::delay(DEBUGGER_ATTACH_SECS * SYSCLK_HZ);

    #[cfg(feature = "debug-mode")]
    defmt::info!("Initializing peripherals...");

    let Board {
        timer,
        detector,
        enable,
        mut power,
        #[cfg(feature = "test-setup")]
        indicator,
    } = Board::new(p, cp.SCB, timer_prescaler(SYSCLK_HZ));

    #[cfg(feature = "debug-mode")]
    defmt::info!("Enabling interrupts...");

    setup_interrupts();

    let Some(flags) = INBOX.receiver() else {
        defmt::panic!("flag inbox already claimed");
    };

    #[cfg(feature = "debug-mode")]
    defmt::info!("Entering beacon loop...");

    let beacon = Beacon::new(timer, detector, enable, flags);
    #[cfg(feature = "test-setup")]
    let mut beacon = beacon.with_indicator(indicator);
    #[cfg(not(feature = "test-setup"))]
    let mut beacon = beacon;

    beacon.run(&mut power)
}
