//! Mock hardware adapter for integration tests.
//!
//! Records every transmission and pause so tests can assert on the full
//! output history without touching the RMT peripheral.

use embedded_hal::delay::DelayNs;
use irblaster::app::events::AppEvent;
use irblaster::app::ports::{EventSink, IrError, IrPort, StorageError, StoragePort};
use irblaster::app::service::{DOCUMENT_KEY, DOCUMENT_NAMESPACE};
use std::collections::HashMap;

// ── Output record ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrCall {
    Nec { value: u32, bits: u16 },
    Panasonic { address: u32, data: u32 },
    Delay { ms: u32 },
}

// ── MockHardware ──────────────────────────────────────────────

#[derive(Default)]
pub struct MockHardware {
    pub calls: Vec<IrCall>,
    /// Make every transmission fail with [`IrError::TransmitFailed`].
    pub fail_ir: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self::default()
    }

    /// Transmissions only, pauses filtered out.
    pub fn codes(&self) -> Vec<IrCall> {
        self.calls
            .iter()
            .copied()
            .filter(|c| !matches!(c, IrCall::Delay { .. }))
            .collect()
    }

    pub fn total_delay_ms(&self) -> u64 {
        self.calls
            .iter()
            .map(|c| match c {
                IrCall::Delay { ms } => u64::from(*ms),
                _ => 0,
            })
            .sum()
    }
}

impl IrPort for MockHardware {
    fn send_nec(&mut self, value: u32, bits: u16) -> Result<(), IrError> {
        if self.fail_ir {
            return Err(IrError::TransmitFailed);
        }
        self.calls.push(IrCall::Nec { value, bits });
        Ok(())
    }

    fn send_panasonic(&mut self, address: u32, data: u32) -> Result<(), IrError> {
        if self.fail_ir {
            return Err(IrError::TransmitFailed);
        }
        self.calls.push(IrCall::Panasonic { address, data });
        Ok(())
    }
}

impl DelayNs for MockHardware {
    fn delay_ns(&mut self, ns: u32) {
        self.calls.push(IrCall::Delay { ms: ns / 1_000_000 });
    }

    fn delay_ms(&mut self, ms: u32) {
        self.calls.push(IrCall::Delay { ms });
    }
}

// ── MockNvs ───────────────────────────────────────────────────

#[derive(Default)]
pub struct MockNvs {
    store: HashMap<String, Vec<u8>>,
    pub fail_writes: bool,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_document(text: &str) -> Self {
        let mut nvs = Self::new();
        nvs.store
            .insert(slot(DOCUMENT_NAMESPACE, DOCUMENT_KEY), text.as_bytes().to_vec());
        nvs
    }

    /// The stored document, if any.
    pub fn document(&self) -> Option<String> {
        self.store
            .get(&slot(DOCUMENT_NAMESPACE, DOCUMENT_KEY))
            .map(|v| String::from_utf8_lossy(v).into_owned())
    }
}

fn slot(namespace: &str, key: &str) -> String {
    format!("{}::{}", namespace, key)
}

impl StoragePort for MockNvs {
    fn read(&self, namespace: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.store.get(&slot(namespace, key)) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        if self.fail_writes {
            return Err(StorageError::IoError);
        }
        self.store.insert(slot(namespace, key), data.to_vec());
        Ok(())
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}
