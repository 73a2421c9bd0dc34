//! Composite board adapter.
//!
//! Bundles one adapter per port and implements every port by delegation,
//! which makes it a [`Board`](crate::app::ports::Board) the sequencer can
//! drive.  Fields are public so `main` can reach the concrete adapters
//! (and host tests the simulation controls).

use crate::adapters::flag_file::FileFlagStore;
use crate::adapters::hardware::EspPower;
use crate::adapters::log_sink::LogEventSink;
use crate::adapters::time::Esp32Clock;
use crate::adapters::wifi::WifiRadio;
use crate::app::events::SequencerEvent;
use crate::app::ports::{
    Clock, EventSink, FlagStore, Indicator, PowerPort, RadioPort, StorageError, WakeCause,
    WakeReasonOracle,
};
use crate::config::SleepMode;

pub struct EspBoard<L> {
    pub clock: Esp32Clock,
    pub flags: FileFlagStore,
    pub power: EspPower,
    pub radio: WifiRadio,
    pub led: L,
    pub sink: LogEventSink,
}

impl<L: Indicator> EspBoard<L> {
    pub fn new(flags: FileFlagStore, power: EspPower, radio: WifiRadio, led: L) -> Self {
        Self {
            clock: Esp32Clock::new(),
            flags,
            power,
            radio,
            led,
            sink: LogEventSink::new(),
        }
    }
}

// ── Port delegation ───────────────────────────────────────────

impl<L> Clock for EspBoard<L> {
    fn now_ms(&self) -> u64 {
        self.clock.now_ms()
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.delay_ms(ms);
    }
}

impl<L> FlagStore for EspBoard<L> {
    fn exists(&self, name: &str) -> bool {
        self.flags.exists(name)
    }

    fn create(&mut self, name: &str) -> Result<(), StorageError> {
        self.flags.create(name)
    }

    fn delete(&mut self, name: &str) -> Result<(), StorageError> {
        self.flags.delete(name)
    }
}

impl<L> WakeReasonOracle for EspBoard<L> {
    fn wake_cause(&self) -> WakeCause {
        self.power.wake_cause()
    }
}

impl<L> PowerPort for EspBoard<L> {
    fn deep_sleep(&mut self, duration_us: u64) {
        self.power.deep_sleep(duration_us);
    }

    fn restart(&mut self) {
        self.power.restart();
    }

    fn release_reset_hold(&mut self) {
        self.power.release_reset_hold();
    }

    fn enable_modem_power_save(&mut self, mode: SleepMode) {
        self.power.enable_modem_power_save(mode);
    }
}

impl<L> RadioPort for EspBoard<L> {
    fn is_available(&self) -> bool {
        self.radio.is_available()
    }

    fn is_access_point(&self) -> bool {
        self.radio.is_access_point()
    }

    fn disconnect_all(&mut self) {
        self.radio.disconnect_all();
    }
}

impl<L: Indicator> Indicator for EspBoard<L> {
    fn pulse(&mut self) {
        self.led.pulse();
    }
}

impl<L> EventSink for EspBoard<L> {
    fn emit(&mut self, event: &SequencerEvent) {
        self.sink.emit(event);
    }
}
