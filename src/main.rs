//! Powerloop firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  Esp32Clock   FileFlagStore   EspPower        WifiRadio        │
//! │  (Clock)      (FlagStore)     (Power+Oracle)  (RadioPort)      │
//! │  StatusLed    LogEventSink    NvsAdapter                       │
//! │  (Indicator)  (EventSink)     (ConfigPort)                     │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │         ModuleSequencer (pure logic)                   │    │
//! │  │  round-robin · wake tracking · sleep / reboot policy   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  PushButton ISR → wake flag      Watchdog fed every tick       │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use std::sync::Arc;

use anyhow::Result;
use esp_idf_hal::delay::{Ets, FreeRtos};
use esp_idf_hal::gpio::{AnyOutputPin, PinDriver};
use log::{debug, info, warn};

use powerloop::adapters::board::EspBoard;
use powerloop::adapters::flag_file::{self, FileFlagStore, SPIFFS_BASE};
use powerloop::adapters::hardware::EspPower;
use powerloop::adapters::nvs::NvsAdapter;
use powerloop::adapters::wifi::WifiRadio;
use powerloop::app::ports::{Clock, ConfigPort};
use powerloop::drivers::button::{ButtonEvent, ButtonLine, PushButton};
use powerloop::drivers::hw_init;
use powerloop::drivers::status_led::StatusLed;
use powerloop::drivers::watchdog::Watchdog;
use powerloop::{pins, FnModule, Module, ModuleSequencer, SequencerConfig};

/// Yield between ticks so the idle task (and its watchdog) can run.
const LOOP_YIELD_MS: u32 = 10;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Powerloop v{}                    ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let config = match NvsAdapter::new().and_then(|nvs| nvs.load()) {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config unavailable ({}), using defaults", e);
            SequencerConfig::default()
        }
    };

    // ── 3. Storage + peripherals ──────────────────────────────
    if let Err(e) = flag_file::mount_spiffs(c"/spiffs") {
        // Marker writes will fail; every boot then reads as a cold boot.
        warn!("{}", e);
    }
    hw_init::init_button_input(pins::WAKE_BUTTON_GPIO)?;

    let led_pin = match pins::STATUS_LED_GPIO {
        // SAFETY: the pin number comes from the board table and no other
        // driver claims it.
        Some(n) => Some(PinDriver::output(unsafe { AnyOutputPin::new(n) })?),
        None => None,
    };
    let led = StatusLed::new(led_pin, Ets, config.pulse_ms, pins::STATUS_LED_ACTIVE_LOW);

    let mut board = EspBoard::new(
        FileFlagStore::new(SPIFFS_BASE),
        EspPower::new(pins::RESET_HOLD_GPIO),
        WifiRadio::new(),
        led,
    );

    // ── 4. Sequencer ──────────────────────────────────────────
    let mut sequencer = ModuleSequencer::new(config.clone())?;

    let line = Arc::new(ButtonLine::new(sequencer.wake_handle()));
    let mut button = PushButton::new(
        pins::WAKE_BUTTON_GPIO,
        true,
        pins::WAKE_BUTTON_DEBOUNCE_MS,
        pins::WAKE_BUTTON_LONG_PRESS_MS,
        Arc::clone(&line),
    );
    if let Err(e) = hw_init::install_button_isr(pins::WAKE_BUTTON_GPIO, line) {
        warn!("{}: wake button limited to polling", e);
    }

    let modules: Vec<Box<dyn Module>> = vec![
        Box::new(FnModule::new("heartbeat", || debug!("heartbeat"))),
        Box::new(FnModule::new("heap", || {
            // SAFETY: read-only heap statistics query.
            let free = unsafe { esp_idf_svc::sys::esp_get_free_heap_size() };
            debug!("heap: {} bytes free", free);
        })),
    ];

    let boot = sequencer.setup(modules, &mut board);
    info!("System ready ({:?}). Entering run loop.", boot);

    let watchdog = Watchdog::new(config.watchdog_timeout_ms);

    // ── 5. Run loop ───────────────────────────────────────────
    loop {
        sequencer.tick(&mut board);

        match button.poll(board.now_ms() as u32) {
            Some(ButtonEvent::ShortPress) => info!("Button: short press → wake"),
            Some(ButtonEvent::LongPress) => {
                warn!("Button: long press → reboot requested");
                sequencer.request_reboot();
            }
            None => {}
        }

        watchdog.feed();
        FreeRtos::delay_ms(LOOP_YIELD_MS);
    }
}
