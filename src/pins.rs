//! GPIO assignments for the reference board (ESP32 DevKit class).
//!
//! Single source of truth: drivers and `main` reference this module rather
//! than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// On-board LED used for the liveness pulse.  `None` disables the pulse
/// (a trace-level mark is logged instead).
pub const STATUS_LED_GPIO: Option<i32> = Some(2);
/// The DevKit LED is wired between 3V3 and the pin.
pub const STATUS_LED_ACTIVE_LOW: bool = true;

// ---------------------------------------------------------------------------
// Wake button (active-low with internal pull-up)
// ---------------------------------------------------------------------------

/// BOOT button; a press re-arms the wake window.
pub const WAKE_BUTTON_GPIO: i32 = 0;
pub const WAKE_BUTTON_DEBOUNCE_MS: u32 = 50;
/// Holding the button this long requests a reboot.
pub const WAKE_BUTTON_LONG_PRESS_MS: u32 = 5_000;

// ---------------------------------------------------------------------------
// Reset hold line
// ---------------------------------------------------------------------------

/// Some boards wire a GPIO to EN/RST so that the deep-sleep timer output can
/// reset the chip.  It is left untouched while running and driven low just
/// before a software restart so the reset goes through cleanly.
pub const RESET_HOLD_GPIO: Option<i32> = None;
