//! Powerloop firmware library.
//!
//! Cooperative round-robin module sequencer with deep-sleep / reboot
//! arbitration for ESP32 boards.  The pure-logic core (`sequencer`,
//! `power`, `wake`, `signal`, `config`) is exposed for integration testing;
//! ESP-IDF specific code is guarded by `#[cfg(target_os = "espidf")]`
//! inside `drivers` and `adapters`.

#![deny(unused_must_use)]

pub mod app;
pub mod config;
pub mod error;
pub mod module;
pub mod power;
pub mod sequencer;
pub mod signal;
pub mod wake;

pub mod adapters;
pub mod drivers;

pub mod pins;

pub use app::events::{BootKind, RebootCause, SequencerEvent};
pub use config::{SequencerConfig, SleepMode};
pub use module::{FnModule, Module};
pub use sequencer::{ModuleSequencer, RebootHandle, Shutdown, SleepPolicy};
