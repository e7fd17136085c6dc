//! Compile-time timing constants.
//!
//! One hardware timer serves two purposes. Its overflow interrupt is the debounce
//! tick, and its first compare channel produces the flash waveform: the output is
//! high from the start of each period until the counter reaches [`FLASH_ON_COUNTS`].
//!
//! ```text
//!  counter  0 ........ 11 ............................ 255 | 0 ...
//!  output   ‾‾‾‾‾‾‾‾‾‾‾‾|____________________________________|‾‾‾ ...
//!  tick                                                    ^
//! ```

/// Number of ticks a day/night edge must be waited out before the beacon commits to it.
pub const INITIAL_WAIT: u8 = 5;

/// Counter clock after the prescaler.
pub const TIMER_CLOCK_HZ: u32 = 128;

/// Counter values per period; one tick interrupt per period.
pub const TICK_PERIOD_COUNTS: u16 = 256;

/// Counter values per period for which the flash output is on.
pub const FLASH_ON_COUNTS: u16 = 11;

/// Prescaler register value that divides `sysclk_hz` down to [`TIMER_CLOCK_HZ`].
///
/// The hardware divides by the register value plus one.
pub const fn timer_prescaler(sysclk_hz: u32) -> u16 {
    let divider = sysclk_hz / TIMER_CLOCK_HZ;
    if divider == 0 {
        0
    } else if divider > u16::MAX as u32 + 1 {
        u16::MAX
    } else {
        (divider - 1) as u16
    }
}

/// Time between two debounce ticks.
pub const fn tick_period_ms() -> u32 {
    TICK_PERIOD_COUNTS as u32 * 1000 / TIMER_CLOCK_HZ
}

/// Duration of one flash.
pub const fn flash_on_ms() -> u32 {
    FLASH_ON_COUNTS as u32 * 1000 / TIMER_CLOCK_HZ
}

/// Delay between a sensed day/night edge and the visible change of the beacon.
pub const fn debounce_ms() -> u32 {
    INITIAL_WAIT as u32 * tick_period_ms()
}

const _: () = assert!(FLASH_ON_COUNTS < TICK_PERIOD_COUNTS);
const _: () = assert!(INITIAL_WAIT > 0);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn msi_131k_divides_to_timer_clock() {
        assert_eq!(timer_prescaler(131_072), 1023);
        assert_eq!(timer_prescaler(2_097_152), 16_383);
    }

    #[test]
    fn prescaler_saturates() {
        assert_eq!(timer_prescaler(64), 0);
        assert_eq!(timer_prescaler(u32::MAX), u16::MAX);
    }

    #[test]
    fn timings() {
        assert_eq!(tick_period_ms(), 2000);
        assert_eq!(flash_on_ms(), 85);
        assert_eq!(debounce_ms(), 10_000);
    }
}
