//! Outbound sequencer events.
//!
//! The [`ModuleSequencer`](crate::sequencer::ModuleSequencer) and
//! [`PowerManager`](crate::power::PowerManager) emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them: log to serial, publish over MQTT, record
//! in a test, etc.

/// How the current process image came to be running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootKind {
    /// Power-on, crash or reset; no planned deep sleep preceded it.
    ColdBoot,
    /// Planned wake: deep-sleep wake cause AND the persisted marker agree.
    DeepSleepWake,
    /// The chip reports a deep-sleep wake cause but no marker was persisted.
    /// Treated like a cold boot.
    UnconfirmedWake,
}

/// Why a hardware restart was issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RebootCause {
    /// A collaborator called `request_reboot()`.
    Requested,
    /// The monotonic clock went backwards relative to the last completed pass.
    ClockWrapped,
}

/// Structured events emitted by the sequencer core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SequencerEvent {
    /// `setup()` finished; carries the boot classification and module count.
    Booted { kind: BootKind, modules: usize },

    /// The debounced awake state flipped.
    WakeStateChanged { awake: bool },

    /// A new round-robin pass was authorized.
    PassStarted { pass: u32 },

    /// Deep sleep is about to be requested.
    EnteringDeepSleep { duration_ms: u64 },

    /// A hardware restart is about to be requested.
    Rebooting(RebootCause),
}
