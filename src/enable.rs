//! External enable line.
//!
//! The line is pulled up inside the MCU, so an unconnected input means the beacon
//! may operate. Pulling it low externally forces the beacon into power-down.

use core::convert::Infallible;

use embedded_hal::digital::v2::InputPin;

/// Live view of whether the beacon is allowed to operate.
pub trait EnableInput {
    /// Returns the live level: `true` when the beacon may operate.
    fn is_enabled(&self) -> bool;
}

/// [`EnableInput`] over a pulled-up GPIO input.
pub struct EnablePin<P> {
    pin: P,
}

impl<P> EnablePin<P>
where
    P: InputPin<Error = Infallible>,
{
    /// Wraps an input configured with its internal pull-up.
    ///
    /// # Arguments
    ///
    /// * `pin` - Enable input, high when the beacon may operate
    pub fn new(pin: P) -> Self {
        Self { pin }
    }
}

impl<P> EnableInput for EnablePin<P>
where
    P: InputPin<Error = Infallible>,
{
    fn is_enabled(&self) -> bool {
        match self.pin.is_high() {
            Ok(high) => high,
            Err(never) => match never {},
        }
    }
}
