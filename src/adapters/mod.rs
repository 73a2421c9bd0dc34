//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements                   | Connects to                 |
//! |-------------|------------------------------|-----------------------------|
//! | `board`     | every port (delegation)      | the adapters below          |
//! | `flag_file` | FlagStore                    | SPIFFS / host directory     |
//! | `hardware`  | PowerPort, WakeReasonOracle  | ESP32 sleep + reset control |
//! | `log_sink`  | EventSink                    | Serial log output           |
//! | `nvs`       | ConfigPort                   | NVS / in-memory store       |
//! | `time`      | Clock                        | ESP32 system timer          |
//! | `wifi`      | RadioPort                    | ESP-IDF WiFi driver         |
//!
//! The liveness [`Indicator`](crate::app::ports::Indicator) is implemented
//! by [`StatusLed`](crate::drivers::status_led::StatusLed) directly.

pub mod board;
pub mod flag_file;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub mod wifi;
