//! IR Blaster Firmware — Main Entry Point
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HttpAdapter      InputWatcher (ISR)     WifiAdapter           │
//! │  (path triggers)  (edge rings)           (startup only)        │
//! │        │                 │                                     │
//! │        └──────▶ TriggerQueue ◀───────┘                         │
//! │                      │                                         │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                      ▼                                         │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │         IrService (keymap · dispatch, pure logic)      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                      │                                         │
//! │  HardwareAdapter (IR + delay)   NvsAdapter   LogEventSink      │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::delay::FreeRtos;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use irblaster::adapters::hardware::HardwareAdapter;
use irblaster::adapters::http::HttpAdapter;
use irblaster::adapters::log_sink::LogEventSink;
use irblaster::adapters::nvs::NvsAdapter;
use irblaster::adapters::wifi::{self, ConnectivityPort, WifiAdapter};
use irblaster::app::ports::ConfigPort;
use irblaster::config::{SystemConfig, WIFI_PASS, WIFI_SSID};
use irblaster::context::{self, DeviceContext};
use irblaster::drivers::hw_init;
use irblaster::drivers::inputs::InputWatcher;
use irblaster::drivers::ir_tx::IrTransmitter;
use irblaster::drivers::status_led::StatusLed;
use irblaster::error::Error;
use irblaster::events::TriggerQueue;
use irblaster::pins;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  IR Blaster v{}                      ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;

    // ── 2. NVS + config ───────────────────────────────────────
    let nvs = NvsAdapter::new().map_err(Error::from)?;
    let config = match nvs.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
    };
    info!(
        "Config: hostname={} port={} debounce={}ms",
        config.hostname, config.http_port, config.debounce_ms
    );

    hw_init::init_peripherals()
        .inspect_err(|e| error!("HAL init failed: {}", e))
        .map_err(Error::from)?;

    // ── 3. Document + keymap ──────────────────────────────────
    let ctx = DeviceContext::load(nvs, LogEventSink::new()).into_shared();

    // ── 4. Trigger queue, shared with the HTTP task ───────────
    let queue: &'static TriggerQueue = Box::leak(Box::new(TriggerQueue::new()));

    // ── 5. WiFi ───────────────────────────────────────────────
    let mut led = StatusLed::new();
    let mut wifi = WifiAdapter::new(
        peripherals.modem,
        sysloop,
        Some(EspDefaultNvsPartition::take()?),
        &config.hostname,
    )
    .map_err(Error::from)?;

    if let Err(e) = wifi
        .set_credentials(WIFI_SSID, WIFI_PASS)
        .and_then(|()| wifi.connect())
    {
        error!("WiFi: {}", e);
    }
    match wifi::wait_for_connection(
        &mut wifi,
        &mut FreeRtos,
        config.startup_timeout_ms,
        config.connect_poll_ms,
        || led.toggle(),
    ) {
        Ok(_) => {
            led.on();
            if let Some(ip) = wifi.ip_addr() {
                info!("WiFi: connected to '{}', IP {}", WIFI_SSID, ip);
            }
        }
        Err(e) => {
            error!("WiFi: {} within {} ms, restarting", e, config.startup_timeout_ms);
            esp_idf_svc::hal::reset::restart();
        }
    }

    // ── 6. HTTP server ────────────────────────────────────────
    let _http = HttpAdapter::start(config.http_port, ctx.clone(), queue).map_err(Error::from)?;

    // ── 7. Trigger inputs ─────────────────────────────────────
    let watcher: &'static InputWatcher = Box::leak(Box::new(InputWatcher::new(config.debounce_ms)));
    hw_init::init_isr_service(watcher)
        .inspect_err(|e| error!("ISR service init failed: {}", e))
        .map_err(Error::from)?;

    // ── 8. IR transmitter ─────────────────────────────────────
    info!("IR LED on GPIO{}", pins::IR_LED_GPIO);
    let ir = IrTransmitter::new(peripherals.rmt.channel0, peripherals.pins.gpio4)
        .map_err(Error::from)?;
    let mut hw = HardwareAdapter::new(ir);

    info!("System ready. Entering dispatch loop.");

    // ── 9. Dispatch loop ──────────────────────────────────────
    loop {
        let mut guard = context::lock(&ctx);
        let dev = &mut *guard;
        watcher.forward(queue, |label, reason| {
            dev.service.record_dropped(label, reason, &mut dev.sink);
        });
        let outcome = dev.step(queue, &mut hw);
        drop(guard);

        if outcome.is_none() {
            FreeRtos::delay_ms(config.idle_poll_ms);
        }
    }
}
