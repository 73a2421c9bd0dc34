//! Port traits: the hexagonal boundary between the sequencer and the board.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ModuleSequencer / PowerManager (domain)
//! ```
//!
//! Driven adapters (clock, flag store, radio, sleep/reboot actuator, LED,
//! event sinks) implement these traits.  The
//! [`ModuleSequencer`](crate::sequencer::ModuleSequencer) consumes them via
//! generics, so the scheduling core never touches hardware directly and can
//! be driven tick-by-tick from host tests.
//!
//! ## Contract notes
//!
//! - **PowerPort** terminal calls (`deep_sleep`, `restart`) never return on
//!   hardware.  Simulation backends return, and the sequencer halts itself.
//! - **FlagStore** operations are idempotent: creating an existing flag or
//!   deleting a missing one is `Ok(())`.
//! - Nothing here may block beyond the explicit `Clock::delay_ms` guard
//!   delays; the task watchdog shares the scheduling domain.

use crate::app::events::SequencerEvent;
use crate::config::{SequencerConfig, SleepMode};

pub use crate::error::{ConfigError, StorageError};

// ───────────────────────────────────────────────────────────────
// Clock port
// ───────────────────────────────────────────────────────────────

/// Monotonic millisecond clock.
pub trait Clock {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u64;

    /// Busy/yielding delay used only for guard and grace periods around
    /// terminal actions and for the liveness pulse.
    fn delay_ms(&mut self, ms: u32);
}

// ───────────────────────────────────────────────────────────────
// Persistence flag store (driven adapter: domain ↔ flash)
// ───────────────────────────────────────────────────────────────

/// Durable named flags whose mere existence is the payload.
///
/// Must survive power loss.  Used to remember "a deep sleep was
/// deliberately initiated" across the fresh process image that a
/// deep-sleep wake produces.
pub trait FlagStore {
    /// Whether the flag is currently set.
    fn exists(&self, name: &str) -> bool;

    /// Set the flag.  Setting an existing flag is a no-op.
    fn create(&mut self, name: &str) -> Result<(), StorageError>;

    /// Clear the flag.  Clearing a missing flag is a no-op.
    fn delete(&mut self, name: &str) -> Result<(), StorageError>;
}

// ───────────────────────────────────────────────────────────────
// Wake-reason oracle (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Cause of the last wake-up / reset as reported by the chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WakeCause {
    /// Power-on, brown-out, software reset; not a sleep wake.
    PowerOn,
    /// RTC timer expired.
    Timer,
    /// Single RTC GPIO (EXT0).
    Ext0,
    /// RTC GPIO mask (EXT1).
    Ext1,
    /// Capacitive touch pad.
    Touchpad,
    /// ULP coprocessor program.
    Ulp,
    /// Light-sleep GPIO wake.
    Gpio,
    /// Raw cause code with no mapping.
    Other(u32),
}

impl WakeCause {
    /// True for the causes that only a deep-sleep wake can produce.
    ///
    /// On its own this is ambiguous (mis-detected resets can report a
    /// timer cause); [`PowerManager`](crate::power::PowerManager)
    /// corroborates it with the persisted marker.
    pub const fn is_deep_sleep_wake(self) -> bool {
        matches!(
            self,
            Self::Timer | Self::Ext0 | Self::Ext1 | Self::Touchpad | Self::Ulp
        )
    }
}

/// Queried once at boot.
pub trait WakeReasonOracle {
    fn wake_cause(&self) -> WakeCause;
}

// ───────────────────────────────────────────────────────────────
// Sleep / reboot actuator (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

pub trait PowerPort {
    /// Arm the RTC timer and enter deep sleep.  Does not return on hardware.
    fn deep_sleep(&mut self, duration_us: u64);

    /// Hard restart.  Does not return on hardware.
    fn restart(&mut self);

    /// Drive low the GPIO that some boards wire to the reset pin for
    /// deep-sleep wake support, so the restart is a clean hardware reset.
    fn release_reset_hold(&mut self) {}

    /// Enable maximum modem power save and lower the CPU clock.  Only
    /// called for the light-sleep modes and only in station mode.
    fn enable_modem_power_save(&mut self, _mode: SleepMode) {}
}

// ───────────────────────────────────────────────────────────────
// Radio port (driven adapter: domain ↔ WiFi helper)
// ───────────────────────────────────────────────────────────────

pub trait RadioPort {
    /// Station connected to an access point.
    fn is_available(&self) -> bool;

    /// Running as (or alongside) a soft access point.
    fn is_access_point(&self) -> bool;

    /// Disconnect and stop every radio before a sleep transition.
    fn disconnect_all(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Liveness indicator
// ───────────────────────────────────────────────────────────────

/// Best-effort visual heartbeat.  Failures are swallowed.
pub trait Indicator {
    fn pulse(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The sequencer emits structured [`SequencerEvent`]s through this port.
/// Adapters decide where they go (serial log, MQTT, test recorder, etc.).
pub trait EventSink {
    fn emit(&mut self, event: &SequencerEvent);
}

// ───────────────────────────────────────────────────────────────
// Board bundle
// ───────────────────────────────────────────────────────────────

/// Everything `setup()` and `tick()` need, implemented automatically for
/// any type that implements every port.
pub trait Board:
    Clock + FlagStore + WakeReasonOracle + PowerPort + RadioPort + Indicator + EventSink
{
}

impl<T> Board for T where
    T: Clock + FlagStore + WakeReasonOracle + PowerPort + RadioPort + Indicator + EventSink
{
}

// ───────────────────────────────────────────────────────────────
// Configuration port (driven adapter: domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists [`SequencerConfig`].
///
/// Implementations MUST validate before persisting and reject invalid
/// values with [`ConfigError::ValidationFailed`] rather than clamping.
pub trait ConfigPort {
    /// Returns [`SequencerConfig::default()`] if nothing is stored.
    fn load(&self) -> Result<SequencerConfig, ConfigError>;

    fn save(&self, config: &SequencerConfig) -> Result<(), ConfigError>;
}
