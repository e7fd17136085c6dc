//! Ambient level indicator for bench setups.
//!
//! On the bench it is hard to tell what the comparator saw from the flash
//! alone, since the flash only changes after the debounce. An indicator pin
//! shows the level sampled at every day/night edge right away: high for night,
//! low for day. Production boards use [`NoIndicator`].

use core::convert::Infallible;

use embedded_hal::digital::v2::OutputPin;

use crate::threshold::Ambient;

/// Receives the light level sampled at each comparator edge.
pub trait AmbientIndicator {
    /// Shows `ambient`, the level the beacon is about to debounce.
    fn show(&mut self, ambient: Ambient);
}

/// Indicator for boards without an indicator pin.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoIndicator;

impl AmbientIndicator for NoIndicator {
    fn show(&mut self, _ambient: Ambient) {}
}

/// [`AmbientIndicator`] over a push-pull GPIO output.
pub struct IndicatorPin<P> {
    pin: P,
}

impl<P> IndicatorPin<P>
where
    P: OutputPin<Error = Infallible>,
{
    /// Wraps an output pin, which should start low.
    ///
    /// # Arguments
    ///
    /// * `pin` - Output driven high for night, low for day
    pub fn new(pin: P) -> Self {
        Self { pin }
    }

    /// Returns the wrapped pin.
    pub fn pin(&self) -> &P {
        &self.pin
    }
}

impl<P> AmbientIndicator for IndicatorPin<P>
where
    P: OutputPin<Error = Infallible>,
{
    fn show(&mut self, ambient: Ambient) {
        let result = match ambient {
            Ambient::Night => self.pin.set_high(),
            Ambient::Day => self.pin.set_low(),
        };
        if let Err(never) = result {
            match never {}
        }
    }
}
