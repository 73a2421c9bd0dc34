//! WiFi radio adapter.
//!
//! Implements [`RadioPort`], the slice of the WiFi helper that the
//! sequencer needs: "is the station up", "are we an access point" and
//! "shut every radio down before sleeping".  Connection management itself
//! stays with the application.
//!
//! ## cfg gating
//!
//! - **`target_os = "espidf"`**: raw `esp_wifi_*` queries against the
//!   driver that `esp_idf_svc::wifi` (or the application) started.
//! - **all other targets**: simulation state with setters for host tests.

use log::info;
#[cfg(target_os = "espidf")]
use log::warn;

use crate::app::ports::RadioPort;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

pub struct WifiRadio {
    #[cfg(not(target_os = "espidf"))]
    sim: SimRadio,
}

#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default)]
struct SimRadio {
    connected: bool,
    access_point: bool,
    shutdowns: u32,
}

impl Default for WifiRadio {
    fn default() -> Self {
        Self::new()
    }
}

impl WifiRadio {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            sim: SimRadio::default(),
        }
    }

    #[cfg(target_os = "espidf")]
    fn mode(&self) -> Option<wifi_mode_t> {
        let mut mode: wifi_mode_t = wifi_mode_t_WIFI_MODE_NULL;
        // SAFETY: out-pointer to a local; fails cleanly if WiFi is not
        // initialised.
        let ret = unsafe { esp_wifi_get_mode(&mut mode) };
        (ret == ESP_OK as i32).then_some(mode)
    }

    // ── Simulation controls ───────────────────────────────────

    #[cfg(not(target_os = "espidf"))]
    pub fn set_connected(&mut self, connected: bool) {
        self.sim.connected = connected;
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn set_access_point(&mut self, access_point: bool) {
        self.sim.access_point = access_point;
    }

    /// Number of `disconnect_all()` calls so far.
    #[cfg(not(target_os = "espidf"))]
    pub fn shutdowns(&self) -> u32 {
        self.sim.shutdowns
    }
}

impl RadioPort for WifiRadio {
    #[cfg(target_os = "espidf")]
    fn is_available(&self) -> bool {
        let mut ap_info = wifi_ap_record_t::default();
        // SAFETY: out-pointer to a local record.
        (unsafe { esp_wifi_sta_get_ap_info(&mut ap_info) }) == ESP_OK as i32
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_available(&self) -> bool {
        self.sim.connected
    }

    #[cfg(target_os = "espidf")]
    fn is_access_point(&self) -> bool {
        matches!(
            self.mode(),
            Some(m) if m == wifi_mode_t_WIFI_MODE_AP || m == wifi_mode_t_WIFI_MODE_APSTA
        )
    }

    #[cfg(not(target_os = "espidf"))]
    fn is_access_point(&self) -> bool {
        self.sim.access_point
    }

    #[cfg(target_os = "espidf")]
    fn disconnect_all(&mut self) {
        if self.mode().is_none() {
            info!("WiFi: not initialised, nothing to stop");
            return;
        }
        // SAFETY: both calls are valid on an initialised driver and report
        // errors through their return codes.
        unsafe {
            let ret = esp_wifi_disconnect();
            if ret != ESP_OK as i32 {
                warn!("WiFi: disconnect returned {}", ret);
            }
            let ret = esp_wifi_stop();
            if ret != ESP_OK as i32 {
                warn!("WiFi: stop returned {}", ret);
            }
        }
        info!("WiFi: radios stopped");
    }

    #[cfg(not(target_os = "espidf"))]
    fn disconnect_all(&mut self) {
        self.sim.connected = false;
        self.sim.access_point = false;
        self.sim.shutdowns += 1;
        info!("WiFi(sim): radios stopped");
    }
}
