//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to              |
//! |-------------|---------------------|--------------------------|
//! | `hardware`  | IrPort, DelayNs     | RMT IR transmitter       |
//! | `http`      | (driving)           | ESP-IDF HTTP server      |
//! | `log_sink`  | EventSink           | Serial log output        |
//! | `nvs`       | ConfigPort          | NVS / in-memory store    |
//! |             | StoragePort         |                          |
//! | `time`      |                     | ESP32 system timer       |
//! | `wifi`      | ConnectivityPort    | ESP-IDF WiFi STA         |

pub mod hardware;
#[cfg(target_os = "espidf")]
pub mod http;
pub mod log_sink;
pub mod nvs;
pub mod time;
pub(crate) mod utils;
pub mod wifi;
