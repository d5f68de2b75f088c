//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART in production), one tagged line per event.

use log::{info, warn};

use crate::app::events::{AppEvent, DispatchOutcome};
use crate::app::ports::EventSink;
use crate::events::TRIGGER_KEY_CAP;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started { sections, commands } => {
                info!("START | sections={} commands={}", sections, commands);
            }
            AppEvent::DocumentReplaced { sections, bytes } => {
                info!("DOC | replaced, {} bytes, {} sections", bytes, sections);
            }
            AppEvent::DocumentRejected(e) => {
                warn!("DOC | rejected: {}", e);
            }
            AppEvent::Dispatch(DispatchOutcome::Dispatched {
                key,
                lines,
                emitted,
                paused_ms,
            }) => {
                info!(
                    "DISPATCH | {} | lines={} sent={} paused={}ms",
                    key, lines, emitted, paused_ms
                );
            }
            AppEvent::Dispatch(DispatchOutcome::NoSuchKey(key)) => {
                info!("MISS | {}", key);
            }
            AppEvent::Unparsed { key, line } => {
                warn!("UNPARSED | {} | {:?}", key, line);
            }
            AppEvent::IrFailed { key, error } => {
                warn!("IR | {} | {}", key, error);
            }
            AppEvent::UntriggerableKey { key } => {
                warn!("KEY | {} | longer than {} bytes, can never fire", key, TRIGGER_KEY_CAP);
            }
            AppEvent::TriggerDropped { key, reason } => {
                warn!("DROP | {} | {}", key, reason);
            }
        }
    }
}
