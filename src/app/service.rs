//! Application service — the hexagonal core.
//!
//! [`IrService`] owns the configuration document, the keymap parsed from it
//! and the dispatch counters.  All I/O flows through port traits injected
//! at call sites, making the entire service testable with mock adapters.
//!
//! ```text
//!  TriggerQueue ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                   │       IrService        │
//!  StoragePort  ◀──▶│  document · keymap     │ ──▶ IrPort + DelayNs
//!                   └────────────────────────┘
//! ```

use embedded_hal::delay::DelayNs;
use log::{debug, info, warn};

use crate::events::{QueueError, TriggerKey, TriggerQueue};
use crate::keymap::KeyMap;

use super::commands::{self, Command};
use super::events::{AppEvent, DispatchOutcome};
use super::ports::{EventSink, IrPort, StorageError, StoragePort};

/// NVS namespace holding the keymap document.
pub const DOCUMENT_NAMESPACE: &str = "irblaster";
/// NVS key of the keymap document.
pub const DOCUMENT_KEY: &str = "keymap";
/// Largest document accepted for persistence.
pub const MAX_DOCUMENT_LEN: usize = 4000;
/// Written on first boot so the editor starts from a valid document.
pub const EMPTY_DOCUMENT: &str = "\n";

/// Running counters, shown on the management page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub dispatched: u32,
    pub missed: u32,
    pub unparsed_lines: u32,
    pub ir_failures: u32,
    pub dropped: u32,
}

// ───────────────────────────────────────────────────────────────
// IrService
// ───────────────────────────────────────────────────────────────

/// Owns the keymap and turns dequeued triggers into IR traffic.
pub struct IrService {
    document: String,
    keymap: KeyMap,
    stats: DispatchStats,
}

impl Default for IrService {
    fn default() -> Self {
        Self::new()
    }
}

impl IrService {
    /// An empty service.  Call [`load`](Self::load) before dispatching.
    pub fn new() -> Self {
        Self {
            document: EMPTY_DOCUMENT.to_owned(),
            keymap: KeyMap::new(),
            stats: DispatchStats::default(),
        }
    }

    // ── Document lifecycle ────────────────────────────────────

    /// Load the document from storage and parse it.
    ///
    /// A missing or unreadable document is replaced by [`EMPTY_DOCUMENT`],
    /// both in storage and in memory.
    pub fn load(&mut self, storage: &mut impl StoragePort, sink: &mut impl EventSink) {
        let text = match read_document(storage) {
            Ok(text) => text,
            Err(e) => {
                if e == StorageError::NotFound {
                    info!("Keymap: no document stored, initialising empty one");
                } else {
                    warn!("Keymap: document unreadable ({}), initialising empty one", e);
                }
                if let Err(e) = storage.write(DOCUMENT_NAMESPACE, DOCUMENT_KEY, EMPTY_DOCUMENT.as_bytes()) {
                    warn!("Keymap: could not initialise document: {}", e);
                }
                EMPTY_DOCUMENT.to_owned()
            }
        };

        self.apply(text);
        sink.emit(&AppEvent::Started {
            sections: self.keymap.len(),
            commands: self.keymap.command_count(),
        });
        self.flag_untriggerable(sink);
    }

    /// Persist `text` and rebuild the keymap from it.
    ///
    /// On failure the previous document and keymap stay active.
    pub fn replace_document(
        &mut self,
        text: &str,
        storage: &mut impl StoragePort,
        sink: &mut impl EventSink,
    ) -> Result<(), StorageError> {
        let result = if text.len() > MAX_DOCUMENT_LEN {
            Err(StorageError::Full)
        } else {
            storage.write(DOCUMENT_NAMESPACE, DOCUMENT_KEY, text.as_bytes())
        };

        if let Err(e) = result {
            warn!("Keymap: document of {} bytes rejected: {}", text.len(), e);
            sink.emit(&AppEvent::DocumentRejected(e));
            return Err(e);
        }

        self.apply(text.to_owned());
        sink.emit(&AppEvent::DocumentReplaced {
            sections: self.keymap.len(),
            bytes: text.len(),
        });
        self.flag_untriggerable(sink);
        Ok(())
    }

    fn apply(&mut self, text: String) {
        self.keymap = KeyMap::parse(&text);
        self.document = text;
        info!(
            "Keymap loaded: {} sections, {} commands",
            self.keymap.len(),
            self.keymap.command_count()
        );
    }

    /// Report every header no trigger can reach.  The section stays in the
    /// document and the keymap.
    fn flag_untriggerable(&self, sink: &mut impl EventSink) {
        for key in self.keymap.untriggerable_keys() {
            sink.emit(&AppEvent::UntriggerableKey { key: key.to_owned() });
        }
    }

    // ── Dispatch ──────────────────────────────────────────────

    /// Run one dispatcher step: take at most one trigger off the queue.
    ///
    /// Never waits for work; returns `None` straight away when idle.
    pub fn step(
        &mut self,
        queue: &TriggerQueue,
        hw: &mut (impl IrPort + DelayNs),
        sink: &mut impl EventSink,
    ) -> Option<DispatchOutcome> {
        let key = queue.pop()?;
        Some(self.dispatch(&key, hw, sink))
    }

    /// Run every command line of `key` in order, synchronously.
    pub fn dispatch(
        &mut self,
        key: &TriggerKey,
        hw: &mut (impl IrPort + DelayNs),
        sink: &mut impl EventSink,
    ) -> DispatchOutcome {
        debug!("Requested key: {}", key);

        let Some(lines) = self.keymap.get(key) else {
            self.stats.missed += 1;
            let outcome = DispatchOutcome::NoSuchKey(key.clone());
            sink.emit(&AppEvent::Dispatch(outcome.clone()));
            return outcome;
        };

        let mut emitted = 0;
        let mut paused_ms: u64 = 0;

        for line in lines {
            let effects = commands::execute(line, hw);

            if let Some(ms) = effects.paused_ms {
                paused_ms += u64::from(ms);
            }
            if let Some(cmd) = effects.emitted {
                emitted += 1;
                match cmd {
                    Command::Nec { value, .. } => debug!("NEC {:08X}", value),
                    Command::Panasonic { address, data } => {
                        debug!("Panasonic {:X}:{:08X}", address, data);
                    }
                    _ => {}
                }
            }
            if let Some(error) = effects.ir_error {
                self.stats.ir_failures += 1;
                sink.emit(&AppEvent::IrFailed {
                    key: key.clone(),
                    error,
                });
            }
            if effects.is_empty() {
                self.stats.unparsed_lines += 1;
                sink.emit(&AppEvent::Unparsed {
                    key: key.clone(),
                    line: line.clone(),
                });
            }
        }

        self.stats.dispatched += 1;
        let outcome = DispatchOutcome::Dispatched {
            key: key.clone(),
            lines: lines.len(),
            emitted,
            paused_ms,
        };
        sink.emit(&AppEvent::Dispatch(outcome.clone()));
        outcome
    }

    /// Record a trigger that never made it into the queue.
    pub fn record_dropped(&mut self, key: &str, reason: QueueError, sink: &mut impl EventSink) {
        self.stats.dropped += 1;
        sink.emit(&AppEvent::TriggerDropped {
            key: key.to_owned(),
            reason,
        });
    }

    // ── Queries ───────────────────────────────────────────────

    /// The raw document exactly as stored, comments included.
    pub fn document(&self) -> &str {
        &self.document
    }

    pub fn keymap(&self) -> &KeyMap {
        &self.keymap
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }
}

/// Read the stored document, decoding invalid UTF-8 lossily.
fn read_document(storage: &impl StoragePort) -> Result<String, StorageError> {
    let mut buf = vec![0u8; MAX_DOCUMENT_LEN];
    let len = storage.read(DOCUMENT_NAMESPACE, DOCUMENT_KEY, &mut buf)?;
    buf.truncate(len);
    Ok(match String::from_utf8(buf) {
        Ok(text) => text,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    })
}
