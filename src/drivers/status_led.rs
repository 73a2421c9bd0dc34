//! Liveness LED.
//!
//! Generic over embedded-hal 1.0 `OutputPin` + `DelayNs`, so the same
//! driver runs on an esp-idf-hal `PinDriver` and on a host mock.  Each
//! authorized pass blinks the LED once for `pulse_ms`.  Without a pin the
//! pulse degrades to a trace-level mark.

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;

use crate::app::ports::Indicator;

pub struct StatusLed<P, D> {
    pin: Option<P>,
    delay: D,
    pulse_ms: u32,
    active_low: bool,
}

impl<P: OutputPin, D: DelayNs> StatusLed<P, D> {
    /// `pin = None` turns the pulse into a log mark only.
    pub fn new(pin: Option<P>, delay: D, pulse_ms: u32, active_low: bool) -> Self {
        let mut led = Self {
            pin,
            delay,
            pulse_ms,
            active_low,
        };
        led.set(false);
        led
    }

    // Pin errors are swallowed: the LED is purely observational.
    fn set(&mut self, on: bool) {
        if let Some(pin) = self.pin.as_mut() {
            let _ = if on != self.active_low {
                pin.set_high()
            } else {
                pin.set_low()
            };
        }
    }
}

impl<P: OutputPin, D: DelayNs> Indicator for StatusLed<P, D> {
    fn pulse(&mut self) {
        if self.pin.is_none() {
            log::trace!(".");
            return;
        }
        self.set(true);
        self.delay.delay_ms(self.pulse_ms);
        self.set(false);
    }
}
