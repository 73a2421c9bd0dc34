//! Deep-sleep / reboot actuation and boot classification.
//!
//! ```text
//!  enter_deep_sleep()                     next boot: check_boot()
//!  ──────────────────                     ───────────────────────
//!  1. create marker (if absent)           1. cause = oracle.wake_cause()
//!  2. disconnect all radios               2. woke = cause is deep-sleep class
//!  3. deep_sleep(duration)  ── RTC ──▶                 && marker exists
//!  4. grace delay (unreachable on HW)     3. delete marker
//! ```
//!
//! The wake cause alone is ambiguous: mis-detected resets can report a
//! timer cause.  The persisted marker is written strictly before the
//! irreversible sleep call and removed only after the boot has been
//! classified, so an accidental reset never masquerades as a planned wake.

use log::{info, warn};

use crate::app::events::{BootKind, RebootCause, SequencerEvent};
use crate::app::ports::{
    Clock, EventSink, FlagStore, PowerPort, RadioPort, WakeReasonOracle,
};
use crate::config::{MARKER_PATH_CAP, SequencerConfig, SleepMode};

/// Owns the marker name and the timing of the terminal power actions.
#[derive(Debug, Clone)]
pub struct PowerManager {
    marker: heapless::String<MARKER_PATH_CAP>,
    deep_sleep_duration_ms: u64,
    deep_sleep_duration_us: u64,
    reboot_guard_ms: u32,
    sleep_grace_ms: u32,
}

impl PowerManager {
    pub fn new(config: &SequencerConfig) -> Self {
        Self {
            marker: config.marker_path.clone(),
            deep_sleep_duration_ms: config.deep_sleep_duration_ms,
            deep_sleep_duration_us: config.deep_sleep_duration_us(),
            reboot_guard_ms: config.reboot_guard_ms,
            sleep_grace_ms: config.sleep_grace_ms,
        }
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// True only if the chip reports a deep-sleep wake AND the marker exists.
    pub fn is_woke_from_deep_sleep<B>(&self, board: &B) -> bool
    where
        B: WakeReasonOracle + FlagStore + ?Sized,
    {
        board.wake_cause().is_deep_sleep_wake() && board.exists(&self.marker)
    }

    /// Classify this boot, then clear the marker so that the next ordinary
    /// reset is not mistaken for a planned wake.
    pub fn check_boot<B>(&self, board: &mut B) -> BootKind
    where
        B: WakeReasonOracle + FlagStore + ?Sized,
    {
        let cause = board.wake_cause();
        let marker_present = board.exists(&self.marker);

        let kind = if self.is_woke_from_deep_sleep(board) {
            BootKind::DeepSleepWake
        } else if cause.is_deep_sleep_wake() {
            BootKind::UnconfirmedWake
        } else {
            BootKind::ColdBoot
        };

        if marker_present {
            if let Err(e) = board.delete(&self.marker) {
                warn!("Power: could not clear marker '{}': {}", self.marker, e);
            }
        }

        info!("Power: boot classified as {:?} (cause={:?})", kind, cause);
        kind
    }

    /// Apply the light-sleep modes.  They are only effective in station
    /// mode, so nothing happens while offline or running an access point.
    pub fn configure_sleep_mode<B>(&self, board: &mut B, mode: SleepMode)
    where
        B: RadioPort + PowerPort + ?Sized,
    {
        if !mode.is_light_sleep() {
            return;
        }
        if board.is_available() && !board.is_access_point() {
            info!("Power: enabling {:?}", mode);
            board.enable_modem_power_save(mode);
        } else {
            info!("Power: {:?} requires station mode, skipped", mode);
        }
    }

    /// Persist the marker, shut the radios down and request deep sleep.
    ///
    /// Returns only in simulation.
    pub fn enter_deep_sleep<B>(&self, board: &mut B)
    where
        B: FlagStore + RadioPort + PowerPort + Clock + EventSink + ?Sized,
    {
        info!(
            "Power: entering deep sleep for {} ms",
            self.deep_sleep_duration_ms
        );
        board.emit(&SequencerEvent::EnteringDeepSleep {
            duration_ms: self.deep_sleep_duration_ms,
        });

        if !board.exists(&self.marker) {
            if let Err(e) = board.create(&self.marker) {
                // Sleep anyway; the next boot will just look like a cold boot.
                warn!("Power: could not persist marker '{}': {}", self.marker, e);
            }
        }

        board.disconnect_all();
        board.deep_sleep(self.deep_sleep_duration_us);
        board.delay_ms(self.sleep_grace_ms);
    }

    /// Release the reset hold line, let buffered output drain, restart.
    ///
    /// Returns only in simulation.
    pub fn reboot<B>(&self, board: &mut B, cause: RebootCause)
    where
        B: PowerPort + Clock + EventSink + ?Sized,
    {
        warn!("Power: rebooting ({:?})", cause);
        board.emit(&SequencerEvent::Rebooting(cause));

        board.release_reset_hold();
        board.delay_ms(self.reboot_guard_ms);
        board.restart();
    }

    pub(crate) fn reconfigure(&mut self, config: &SequencerConfig) {
        *self = Self::new(config);
    }
}
