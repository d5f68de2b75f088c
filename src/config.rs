//! System configuration parameters
//!
//! Tunable parameters for the IR blaster.  Values can be overridden by a
//! `SystemConfig` blob in NVS (non-volatile storage); the trigger keymap
//! itself is a separate text document, see [`crate::keymap`].

use serde::{Deserialize, Serialize};

/// Hostname announced to the DHCP server.
pub const DEFAULT_HOSTNAME: &str = "ir-blaster";

/// WiFi SSID baked in at build time.  Firmware builds fail without it.
#[cfg(feature = "espidf")]
pub const WIFI_SSID: &str = env!("IRBLASTER_WIFI_SSID");
#[cfg(not(feature = "espidf"))]
pub const WIFI_SSID: &str = match option_env!("IRBLASTER_WIFI_SSID") {
    Some(ssid) => ssid,
    None => "",
};

/// WiFi passphrase baked in at build time.  Set it empty for an open
/// network.
#[cfg(feature = "espidf")]
pub const WIFI_PASS: &str = env!("IRBLASTER_WIFI_PASS");
#[cfg(not(feature = "espidf"))]
pub const WIFI_PASS: &str = match option_env!("IRBLASTER_WIFI_PASS") {
    Some(pass) => pass,
    None => "",
};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Network ---
    /// DHCP hostname
    pub hostname: heapless::String<32>,
    /// TCP port of the management / trigger HTTP server
    pub http_port: u16,
    /// Maximum time to wait for WiFi association before restarting (ms)
    pub startup_timeout_ms: u32,
    /// Association poll and status-LED blink period (ms)
    pub connect_poll_ms: u32,

    // --- Inputs ---
    /// Minimum spacing between accepted edges on one input line (ms)
    pub debounce_ms: u32,

    // --- Event loop ---
    /// Sleep between dispatcher steps when the queue is empty (ms)
    pub idle_poll_ms: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        let mut hostname = heapless::String::new();
        let _ = hostname.push_str(DEFAULT_HOSTNAME);
        Self {
            // Network
            hostname,
            http_port: 80,
            startup_timeout_ms: 20_000,
            connect_poll_ms: 200,

            // Inputs
            debounce_ms: 100,

            // Event loop
            idle_poll_ms: 10,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = SystemConfig::default();
        assert_eq!(c.hostname.as_str(), "ir-blaster");
        assert_eq!(c.http_port, 80);
        assert_eq!(c.debounce_ms, 100);
        assert!(c.idle_poll_ms > 0);
    }

    #[test]
    fn startup_window_allows_several_polls() {
        let c = SystemConfig::default();
        assert!(
            c.startup_timeout_ms / c.connect_poll_ms >= 10,
            "startup window should cover many association polls"
        );
    }

    #[test]
    fn serde_roundtrip() {
        let c = SystemConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: SystemConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn postcard_roundtrip() {
        let mut c = SystemConfig::default();
        c.debounce_ms = 250;
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: SystemConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c2.debounce_ms, 250);
        assert_eq!(c.hostname, c2.hostname);
    }
}
