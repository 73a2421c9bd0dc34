//! Recording mock board for integration tests.
//!
//! Implements every port the sequencer consumes and records each call in
//! order, so tests can assert on the full side-effect history without
//! touching real flash, radios or the sleep controller.  `delay_ms`
//! advances the mock clock.

use std::collections::HashSet;

use powerloop::SequencerEvent;
use powerloop::app::ports::{
    Clock, EventSink, FlagStore, Indicator, PowerPort, RadioPort, StorageError, WakeCause,
    WakeReasonOracle,
};
use powerloop::config::SleepMode;

// ── Call record ───────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    CreateFlag(String),
    DeleteFlag(String),
    Disconnect,
    DeepSleep(u64),
    ReleaseHold,
    Restart,
    Delay(u32),
    PowerSave(SleepMode),
    Pulse,
    Event(SequencerEvent),
}

// ── MockBoard ─────────────────────────────────────────────────

pub struct MockBoard {
    pub now_ms: u64,
    pub flags: HashSet<String>,
    pub cause: WakeCause,
    pub online: bool,
    pub access_point: bool,
    pub fail_writes: bool,
    pub calls: Vec<Call>,
}

#[allow(dead_code)]
impl MockBoard {
    pub fn new() -> Self {
        Self {
            now_ms: 0,
            flags: HashSet::new(),
            cause: WakeCause::PowerOn,
            online: true,
            access_point: false,
            fail_writes: false,
            calls: Vec::new(),
        }
    }

    pub fn advance(&mut self, ms: u64) {
        self.now_ms += ms;
    }

    /// Simulate the fresh process image after a reset: volatile state and
    /// the call log are gone, flash flags survive.
    pub fn reboot_into(&mut self, cause: WakeCause) {
        self.cause = cause;
        self.now_ms = 0;
        self.calls.clear();
    }

    pub fn pulses(&self) -> usize {
        self.count(|c| matches!(c, Call::Pulse))
    }

    pub fn restarts(&self) -> usize {
        self.count(|c| matches!(c, Call::Restart))
    }

    pub fn deep_sleeps(&self) -> Vec<u64> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::DeepSleep(us) => Some(*us),
                _ => None,
            })
            .collect()
    }

    pub fn events(&self) -> Vec<SequencerEvent> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                Call::Event(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn wake_edges(&self) -> Vec<bool> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                SequencerEvent::WakeStateChanged { awake } => Some(awake),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }
}

impl Default for MockBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockBoard {
    fn now_ms(&self) -> u64 {
        self.now_ms
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(Call::Delay(ms));
        self.now_ms += u64::from(ms);
    }
}

impl FlagStore for MockBoard {
    fn exists(&self, name: &str) -> bool {
        self.flags.contains(name)
    }

    fn create(&mut self, name: &str) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::Full);
        }
        self.calls.push(Call::CreateFlag(name.to_string()));
        self.flags.insert(name.to_string());
        Ok(())
    }

    fn delete(&mut self, name: &str) -> Result<(), StorageError> {
        self.calls.push(Call::DeleteFlag(name.to_string()));
        self.flags.remove(name);
        Ok(())
    }
}

impl WakeReasonOracle for MockBoard {
    fn wake_cause(&self) -> WakeCause {
        self.cause
    }
}

impl PowerPort for MockBoard {
    fn deep_sleep(&mut self, duration_us: u64) {
        self.calls.push(Call::DeepSleep(duration_us));
    }

    fn restart(&mut self) {
        self.calls.push(Call::Restart);
    }

    fn release_reset_hold(&mut self) {
        self.calls.push(Call::ReleaseHold);
    }

    fn enable_modem_power_save(&mut self, mode: SleepMode) {
        self.calls.push(Call::PowerSave(mode));
    }
}

impl RadioPort for MockBoard {
    fn is_available(&self) -> bool {
        self.online
    }

    fn is_access_point(&self) -> bool {
        self.access_point
    }

    fn disconnect_all(&mut self) {
        self.calls.push(Call::Disconnect);
        self.online = false;
        self.access_point = false;
    }
}

impl Indicator for MockBoard {
    fn pulse(&mut self) {
        self.calls.push(Call::Pulse);
    }
}

impl EventSink for MockBoard {
    fn emit(&mut self, event: &SequencerEvent) {
        self.calls.push(Call::Event(event.clone()));
    }
}
