//! Power adapter: bridges the ESP32 sleep/reset controller to the
//! [`PowerPort`] and [`WakeReasonOracle`] ports.
//!
//! This is the only module in the system that issues terminal power
//! actions.  On non-espidf targets every action is recorded instead, and
//! the calls return so the sequencer can observe itself halting.

use log::info;

use crate::app::ports::{PowerPort, WakeCause, WakeReasonOracle};
use crate::config::SleepMode;
use crate::drivers::hw_init;

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

/// Concrete sleep / reboot actuator and wake-reason source.
pub struct EspPower {
    reset_hold_gpio: Option<i32>,
    #[cfg(not(target_os = "espidf"))]
    sim: SimPower,
}

/// What the simulated chip was asked to do.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SimPower {
    pub wake_cause: Option<WakeCause>,
    pub deep_sleeps: Vec<u64>,
    pub restarts: u32,
    pub hold_released: u32,
    pub power_save: Option<PowerSaveProfile>,
}

/// Modem power-save level handed to the WiFi driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModemPowerSave {
    Min,
    Max,
}

/// Radio and CPU settings applied for a light-sleep mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PowerSaveProfile {
    pub modem: ModemPowerSave,
    pub cpu_freq_mhz: u32,
}

/// Lowest CPU clock the light-sleep modes run at.
pub const LIGHT_SLEEP_CPU_FREQ_MHZ: u32 = 40;

/// Both light-sleep modes use maximum modem power save and a 40 MHz CPU.
/// The other modes leave the hardware defaults alone.
pub const fn power_save_profile(mode: SleepMode) -> Option<PowerSaveProfile> {
    match mode {
        SleepMode::AutoLightSleep | SleepMode::ForcedLightSleep => Some(PowerSaveProfile {
            modem: ModemPowerSave::Max,
            cpu_freq_mhz: LIGHT_SLEEP_CPU_FREQ_MHZ,
        }),
        SleepMode::ModemSleep | SleepMode::DeepSleep => None,
    }
}

impl EspPower {
    /// `reset_hold_gpio` (wired to EN/RST) is driven low before a restart.
    pub fn new(reset_hold_gpio: Option<i32>) -> Self {
        Self {
            reset_hold_gpio,
            #[cfg(not(target_os = "espidf"))]
            sim: SimPower::default(),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn set_wake_cause(&mut self, cause: WakeCause) {
        self.sim.wake_cause = Some(cause);
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn sim(&self) -> &SimPower {
        &self.sim
    }
}

// ── WakeReasonOracle ──────────────────────────────────────────

impl WakeReasonOracle for EspPower {
    #[cfg(target_os = "espidf")]
    #[allow(non_upper_case_globals)]
    fn wake_cause(&self) -> WakeCause {
        // SAFETY: reads the cause latched by the ROM at reset.
        let raw = unsafe { esp_sleep_get_wakeup_cause() };
        match raw {
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_UNDEFINED => WakeCause::PowerOn,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_TIMER => WakeCause::Timer,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT0 => WakeCause::Ext0,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_EXT1 => WakeCause::Ext1,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_TOUCHPAD => WakeCause::Touchpad,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_ULP => WakeCause::Ulp,
            esp_sleep_source_t_ESP_SLEEP_WAKEUP_GPIO => WakeCause::Gpio,
            other => WakeCause::Other(other),
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn wake_cause(&self) -> WakeCause {
        self.sim.wake_cause.unwrap_or(WakeCause::PowerOn)
    }
}

// ── PowerPort ─────────────────────────────────────────────────

impl PowerPort for EspPower {
    #[cfg(target_os = "espidf")]
    fn deep_sleep(&mut self, duration_us: u64) {
        info!("Power: deep sleep for {} us", duration_us);
        // SAFETY: arming the RTC timer and entering deep sleep; the chip
        // restarts from the entry point on wake.
        let ret = unsafe { esp_sleep_enable_timer_wakeup(duration_us) };
        if ret != ESP_OK as i32 {
            // Still sleep: a reset line or button may wake the chip.
            log::warn!("Power: timer wake-up not armed ({})", ret);
        }
        // SAFETY: as above.
        unsafe { esp_deep_sleep_start() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn deep_sleep(&mut self, duration_us: u64) {
        info!("Power(sim): deep sleep for {} us", duration_us);
        self.sim.deep_sleeps.push(duration_us);
    }

    #[cfg(target_os = "espidf")]
    fn restart(&mut self) {
        // SAFETY: esp_restart never returns.
        unsafe { esp_restart() }
    }

    #[cfg(not(target_os = "espidf"))]
    fn restart(&mut self) {
        info!("Power(sim): restart");
        self.sim.restarts += 1;
    }

    fn release_reset_hold(&mut self) {
        if let Some(pin) = self.reset_hold_gpio {
            info!("Power: pulling reset line GPIO{} low", pin);
            if let Err(e) = hw_init::init_output(pin, false) {
                log::warn!("Power: {}", e);
            }
            #[cfg(not(target_os = "espidf"))]
            {
                self.sim.hold_released += 1;
            }
        }
    }

    #[cfg(target_os = "espidf")]
    fn enable_modem_power_save(&mut self, mode: SleepMode) {
        let Some(profile) = power_save_profile(mode) else {
            return;
        };
        let ps = match profile.modem {
            ModemPowerSave::Min => wifi_ps_type_t_WIFI_PS_MIN_MODEM,
            ModemPowerSave::Max => wifi_ps_type_t_WIFI_PS_MAX_MODEM,
        };
        // SAFETY: valid on a started station; errors are reported by code.
        let ret = unsafe { esp_wifi_set_ps(ps) };
        if ret == ESP_OK as i32 {
            info!("Power: WiFi power save {:?}", profile.modem);
        } else {
            log::warn!("Power: esp_wifi_set_ps returned {}", ret);
        }

        let freq = profile.cpu_freq_mhz as i32;
        let pm = esp_pm_config_t {
            max_freq_mhz: freq,
            min_freq_mhz: freq,
            light_sleep_enable: false,
        };
        // SAFETY: pm outlives the call; the driver copies it.
        let ret = unsafe { esp_pm_configure(core::ptr::from_ref(&pm).cast()) };
        if ret == ESP_OK as i32 {
            info!("Power: CPU clock {} MHz", freq);
        } else {
            log::warn!("Power: esp_pm_configure returned {}", ret);
        }
    }

    #[cfg(not(target_os = "espidf"))]
    fn enable_modem_power_save(&mut self, mode: SleepMode) {
        if let Some(profile) = power_save_profile(mode) {
            info!("Power(sim): {:?} -> {:?}", mode, profile);
            self.sim.power_save = Some(profile);
        }
    }
}
