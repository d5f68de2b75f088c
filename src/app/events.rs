//! Outbound application events.
//!
//! The [`IrService`](super::service::IrService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  They are diagnostics only:
//! nothing flows back to the HTTP client or input line that caused them.

use crate::events::{QueueError, TriggerKey};

use super::ports::{IrError, StorageError};

/// Result of one dispatch cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The key was found and its command lines ran to completion.
    Dispatched {
        key: TriggerKey,
        lines: usize,
        emitted: usize,
        paused_ms: u64,
    },
    /// No section matches the key.
    NoSuchKey(TriggerKey),
}

impl DispatchOutcome {
    pub fn was_found(&self) -> bool {
        matches!(self, Self::Dispatched { .. })
    }
}

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The keymap was loaded at startup.
    Started { sections: usize, commands: usize },

    /// The document was replaced and re-parsed.
    DocumentReplaced { sections: usize, bytes: usize },

    /// A document write was rejected; the previous keymap stays active.
    DocumentRejected(StorageError),

    /// A dispatch cycle finished.
    Dispatch(DispatchOutcome),

    /// A command line matched no grammar.
    Unparsed { key: TriggerKey, line: String },

    /// The transmitter failed on a command line.
    IrFailed { key: TriggerKey, error: IrError },

    /// A section header is longer than any trigger key, so it never fires.
    UntriggerableKey { key: String },

    /// A trigger could not be queued.
    TriggerDropped { key: String, reason: QueueError },
}
