//! One-shot GPIO and interrupt bring-up.
//!
//! Raw ESP-IDF sys calls, run once from `main()` before the sequencer
//! loop starts.  Host builds get no-op stand-ins so the drivers above this
//! layer can be exercised in tests.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

#[cfg(target_os = "espidf")]
use log::info;

use std::sync::Arc;

use crate::drivers::button::ButtonLine;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    GpioConfigFailed(i32),
    IsrInstallFailed(i32),
    IsrHandlerFailed(i32),
    SpiffsMountFailed(i32),
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::GpioConfigFailed(rc) => write!(f, "GPIO config failed (rc={})", rc),
            Self::IsrInstallFailed(rc) => write!(f, "GPIO ISR service install failed (rc={})", rc),
            Self::IsrHandlerFailed(rc) => write!(f, "GPIO ISR handler add failed (rc={})", rc),
            Self::SpiffsMountFailed(rc) => write!(f, "SPIFFS mount failed (rc={})", rc),
        }
    }
}

impl std::error::Error for HwInitError {}

// ── GPIO inputs ───────────────────────────────────────────────

/// Configure a button input with pull-up and any-edge interrupts.
#[cfg(target_os = "espidf")]
pub fn init_button_input(pin: i32) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_INPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_ENABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_ANYEDGE,
    };
    // SAFETY: called once from main() before the loop; single-threaded.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    info!("hw_init: GPIO{} configured as button input", pin);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_button_input(_pin: i32) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): button input skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: gpio_get_level is a read-only register access on an
    // already-configured input pin; safe to call from main context.
    (unsafe { gpio_get_level(pin) }) != 0
}

/// Simulated inputs float high (pull-up, nothing pressed).
#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

// ── GPIO outputs ──────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub fn init_output(pin: i32, high: bool) -> Result<(), HwInitError> {
    let cfg = gpio_config_t {
        pin_bit_mask: 1u64 << pin,
        mode: gpio_mode_t_GPIO_MODE_OUTPUT,
        pull_up_en: gpio_pullup_t_GPIO_PULLUP_DISABLE,
        pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
        intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
    };
    // SAFETY: called once from main() before the loop; single-threaded.
    let ret = unsafe { gpio_config(&cfg) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::GpioConfigFailed(ret));
    }
    gpio_write(pin, high);
    info!("hw_init: GPIO{} configured as output", pin);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_output(_pin: i32, _high: bool) -> Result<(), HwInitError> {
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: gpio_set_level writes to an already-configured output pin.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── GPIO ISR service ──────────────────────────────────────────

#[cfg(target_os = "espidf")]
unsafe extern "C" fn button_gpio_isr(arg: *mut core::ffi::c_void) {
    // SAFETY: `arg` comes from Arc::into_raw in install_button_isr and is
    // never released, so the ButtonLine outlives every interrupt.
    let line = unsafe { &*(arg as *const ButtonLine) };
    // SAFETY: esp_timer_get_time is an RTC counter read; safe in ISR context.
    let now_ms = (unsafe { esp_timer_get_time() } / 1_000) as u32;
    line.on_edge(now_ms);
}

/// Install the per-pin ISR service and route `pin` edges to `line`.
///
/// The handler only records a timestamp and raises the wake flag; all
/// decisions happen on the next `tick()`.
#[cfg(target_os = "espidf")]
pub fn install_button_isr(pin: i32, line: Arc<ButtonLine>) -> Result<(), HwInitError> {
    // SAFETY: gpio_install_isr_service is idempotent; ESP_ERR_INVALID_STATE
    // means it was already installed (acceptable).  The handler argument is
    // a leaked Arc, valid for the rest of the program.
    unsafe {
        let ret = gpio_install_isr_service(0);
        if ret != ESP_OK as i32 && ret != ESP_ERR_INVALID_STATE as i32 {
            return Err(HwInitError::IsrInstallFailed(ret));
        }

        let arg = Arc::into_raw(line) as *mut core::ffi::c_void;
        let ret = gpio_isr_handler_add(pin, Some(button_gpio_isr), arg);
        if ret != ESP_OK as i32 {
            drop(Arc::from_raw(arg as *const ButtonLine));
            return Err(HwInitError::IsrHandlerFailed(ret));
        }
        gpio_intr_enable(pin);
    }
    info!("hw_init: button ISR installed on GPIO{}", pin);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn install_button_isr(_pin: i32, _line: Arc<ButtonLine>) -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ISR service skipped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wake::IrqFlag;

    #[test]
    fn sim_inputs_read_released() {
        assert!(gpio_read(0));
    }

    #[test]
    fn sim_bring_up_succeeds() {
        assert_eq!(init_button_input(0), Ok(()));
        assert_eq!(init_output(2, true), Ok(()));
        let line = Arc::new(ButtonLine::new(IrqFlag::new()));
        assert_eq!(install_button_isr(0, line), Ok(()));
    }

    #[test]
    fn error_display_carries_code() {
        let e = HwInitError::SpiffsMountFailed(-1);
        assert_eq!(e.to_string(), "SPIFFS mount failed (rc=-1)");
    }
}
