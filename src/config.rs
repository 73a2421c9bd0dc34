//! Sequencer configuration parameters
//!
//! All tunable timing and power parameters for the module sequencer.
//! Values can be overridden via NVS (non-volatile storage) through the
//! [`ConfigPort`](crate::app::ports::ConfigPort).

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Default location of the "deep sleep in progress" marker.
pub const DEFAULT_MARKER_PATH: &str = "/deepsleep";

/// Capacity of the marker path string.
pub const MARKER_PATH_CAP: usize = 32;

/// Radio / CPU power-saving strategy.
///
/// Modem sleep is the chip default while associated with an access point.
/// The light-sleep modes additionally suspend the CPU between DTIM beacons
/// and are only effective in station mode.  Deep sleep powers everything
/// down except the RTC; execution restarts at the entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SleepMode {
    #[default]
    ModemSleep,
    AutoLightSleep,
    ForcedLightSleep,
    /// Sleep at every authorized idle decision, regardless of policy.
    DeepSleep,
}

impl SleepMode {
    pub const fn is_light_sleep(self) -> bool {
        matches!(self, Self::AutoLightSleep | Self::ForcedLightSleep)
    }
}

/// Core sequencer configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequencerConfig {
    // --- Inter-pass delays ---
    /// Delay between passes while awake (milliseconds)
    pub short_interval_ms: u32,
    /// Delay between passes while idle (milliseconds)
    pub long_interval_ms: u32,
    /// How long a wake request keeps the device awake (milliseconds)
    pub wake_window_ms: u32,

    // --- Power ---
    /// Deep sleep length (milliseconds)
    pub deep_sleep_duration_ms: u64,
    /// Power-saving strategy applied at setup
    pub sleep_mode: SleepMode,
    /// Flag name of the "deep sleep in progress" marker
    pub marker_path: heapless::String<MARKER_PATH_CAP>,

    // --- Guard delays ---
    /// Delay before a restart so buffered output can flush (milliseconds)
    pub reboot_guard_ms: u32,
    /// Delay after the deep-sleep request so it can take effect (milliseconds)
    pub sleep_grace_ms: u32,
    /// Liveness pulse length (milliseconds)
    pub pulse_ms: u32,

    // --- Watchdog ---
    /// Task watchdog timeout (milliseconds)
    pub watchdog_timeout_ms: u32,
}

impl Default for SequencerConfig {
    fn default() -> Self {
        let mut marker_path = heapless::String::new();
        let _ = marker_path.push_str(DEFAULT_MARKER_PATH);

        Self {
            // Inter-pass delays
            short_interval_ms: 1_000, // 1 Hz while awake
            long_interval_ms: 10_000, // 0.1 Hz while idle
            wake_window_ms: 60_000,   // 1 min

            // Power
            deep_sleep_duration_ms: 3_600_000, // 1 h
            sleep_mode: SleepMode::ModemSleep,
            marker_path,

            // Guard delays
            reboot_guard_ms: 2_000,
            sleep_grace_ms: 100,
            pulse_ms: 5,

            // Watchdog
            watchdog_timeout_ms: 10_000,
        }
    }
}

impl SequencerConfig {
    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.short_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "short_interval_ms must be > 0",
            ));
        }
        if self.short_interval_ms > self.long_interval_ms {
            return Err(ConfigError::ValidationFailed(
                "short_interval_ms must be <= long_interval_ms",
            ));
        }
        if self.wake_window_ms == 0 {
            return Err(ConfigError::ValidationFailed("wake_window_ms must be > 0"));
        }
        if self.deep_sleep_duration_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "deep_sleep_duration_ms must be > 0",
            ));
        }
        if self.deep_sleep_duration_ms.checked_mul(1_000).is_none() {
            return Err(ConfigError::ValidationFailed(
                "deep_sleep_duration_ms overflows microseconds",
            ));
        }
        if !self.marker_path.starts_with('/') || self.marker_path.len() < 2 {
            return Err(ConfigError::ValidationFailed(
                "marker_path must be an absolute, non-root path",
            ));
        }
        if self.watchdog_timeout_ms < 1_000 {
            return Err(ConfigError::ValidationFailed(
                "watchdog_timeout_ms must be >= 1000",
            ));
        }
        if self.reboot_guard_ms >= self.watchdog_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "reboot_guard_ms must be < watchdog_timeout_ms",
            ));
        }
        if self.sleep_grace_ms >= self.watchdog_timeout_ms {
            return Err(ConfigError::ValidationFailed(
                "sleep_grace_ms must be < watchdog_timeout_ms",
            ));
        }
        if self.pulse_ms > 50 {
            return Err(ConfigError::ValidationFailed("pulse_ms must be 0–50"));
        }
        Ok(())
    }

    /// Deep sleep length in the unit the RTC timer expects.
    pub fn deep_sleep_duration_us(&self) -> u64 {
        self.deep_sleep_duration_ms.saturating_mul(1_000)
    }
}
