//! Error types for the fallible setup-time operations.
//!
//! The tick loop never returns an error; it logs and carries on, reboots
//! or sleeps.  Peripheral bring-up errors live next to the code that
//! raises them ([`HwInitError`](crate::drivers::hw_init::HwInitError)).

use core::fmt;

/// Failure of a [`FlagStore`](crate::app::ports::FlagStore) operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageError {
    /// Partition or filesystem is full.
    Full,
    /// Filesystem not mounted.
    NotMounted,
    /// Any other backend failure.
    IoError,
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Full => "storage full",
            Self::NotMounted => "storage not mounted",
            Self::IoError => "storage I/O error",
        })
    }
}

impl std::error::Error for StorageError {}

/// Failure to validate, load or persist a
/// [`SequencerConfig`](crate::config::SequencerConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// Stored blob did not decode or no longer validates.
    Corrupted,
    /// A field is out of range; the message names the field and rule.
    ValidationFailed(&'static str),
    StorageFull,
    IoError,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => f.write_str("stored config corrupted"),
            Self::ValidationFailed(rule) => write!(f, "invalid config: {}", rule),
            Self::StorageFull => f.write_str("config storage full"),
            Self::IoError => f.write_str("config storage I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
