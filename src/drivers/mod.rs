//! GPIO-level drivers and one-shot hardware initialisation.

pub mod button;
pub mod hw_init;
pub mod status_led;
pub mod watchdog;
