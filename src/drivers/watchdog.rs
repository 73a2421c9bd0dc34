//! Task watchdog for the sequencer loop.
//!
//! The loop task subscribes itself to the ESP-IDF TWDT and feeds it after
//! every `tick()`.  A module step that blocks, or a guard delay that runs
//! past the timeout, panics the chip into a reset.
//! `SequencerConfig::validate` keeps both guard delays below the timeout.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use log::{info, warn};

pub struct Watchdog {
    timeout_ms: u32,
    subscribed: bool,
}

impl Watchdog {
    /// Subscribe the calling task with a panic-on-expiry timeout.
    pub fn new(timeout_ms: u32) -> Self {
        let subscribed = subscribe_current_task(timeout_ms);
        if subscribed {
            info!("Watchdog: armed ({} ms)", timeout_ms);
        } else {
            warn!("Watchdog: running unsupervised");
        }
        Self {
            timeout_ms,
            subscribed,
        }
    }

    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Reset the countdown.
    pub fn feed(&self) {
        if !self.subscribed {
            return;
        }
        #[cfg(target_os = "espidf")]
        // SAFETY: the calling task was subscribed in `new`.
        unsafe {
            esp_task_wdt_reset();
        }
    }
}

impl Drop for Watchdog {
    fn drop(&mut self) {
        if self.subscribed {
            unsubscribe_current_task();
        }
    }
}

#[cfg(target_os = "espidf")]
fn subscribe_current_task(timeout_ms: u32) -> bool {
    let cfg = esp_task_wdt_config_t {
        timeout_ms,
        idle_core_mask: 0,
        trigger_panic: true,
    };
    // SAFETY: cfg lives across the call; the TWDT copies it.
    let rc = unsafe { esp_task_wdt_reconfigure(&cfg) };
    if rc != ESP_OK as i32 {
        // Not fatal: the TWDT keeps its sdkconfig timeout.
        warn!("Watchdog: reconfigure failed ({})", rc);
    }
    // SAFETY: a null handle means the calling task.
    let rc = unsafe { esp_task_wdt_add(core::ptr::null_mut()) };
    if rc != ESP_OK as i32 {
        warn!("Watchdog: subscribe failed ({})", rc);
        return false;
    }
    true
}

#[cfg(target_os = "espidf")]
fn unsubscribe_current_task() {
    // SAFETY: a null handle means the calling task.
    unsafe {
        esp_task_wdt_delete(core::ptr::null_mut());
    }
}

/// Host builds have no TWDT; report as unsubscribed.
#[cfg(not(target_os = "espidf"))]
fn subscribe_current_task(_timeout_ms: u32) -> bool {
    false
}

#[cfg(not(target_os = "espidf"))]
fn unsubscribe_current_task() {}
