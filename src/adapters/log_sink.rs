//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing sequencer lifecycle events to the
//! ESP-IDF logger (UART / USB-CDC in production).  A telemetry adapter
//! would implement the same trait.

use log::{debug, info, warn};

use crate::app::events::SequencerEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`SequencerEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SequencerEvent) {
        match event {
            SequencerEvent::Booted { kind, modules } => {
                info!("BOOT  | kind={:?} modules={}", kind, modules);
            }
            SequencerEvent::WakeStateChanged { awake } => {
                info!("WAKE  | {}", if *awake { "awake" } else { "idle" });
            }
            SequencerEvent::PassStarted { pass } => {
                debug!("PASS  | #{}", pass);
            }
            SequencerEvent::EnteringDeepSleep { duration_ms } => {
                info!("SLEEP | deep sleep for {} ms", duration_ms);
            }
            SequencerEvent::Rebooting(cause) => {
                warn!("RESET | rebooting ({:?})", cause);
            }
        }
    }
}
