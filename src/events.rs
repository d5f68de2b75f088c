//! Trigger queue shared between tasks.
//!
//! Triggers are produced by:
//! - The HTTP server task (request paths, `/livingroom_on` …)
//! - The main loop, forwarding input edges (`@IN_1_DOWN` …) from the
//!   per-line rings in [`crate::drivers::inputs`]
//!
//! and consumed by the main loop, which dispatches one per step in FIFO
//! order.
//!
//! ```text
//! ┌─────────────┐     ┌───────────────┐     ┌──────────────┐
//! │ HTTP task   │────▶│ TriggerQueue  │────▶│  Main Loop   │
//! │ edge rings  │────▶│ (crit. sect.) │     │  (consumer)  │
//! └─────────────┘     └───────────────┘     └──────────────┘
//! ```
//!
//! ISRs never touch this queue.  On ESP-IDF the critical section is a
//! FreeRTOS mutex, which is only valid in task context.

use core::cell::RefCell;
use core::fmt;

use embassy_sync::blocking_mutex::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use heapless::Deque;

/// Maximum number of pending triggers.
pub const TRIGGER_QUEUE_CAP: usize = 16;

/// Maximum length of a trigger key in bytes.
pub const TRIGGER_KEY_CAP: usize = 64;

/// A trigger key: `/path` from the network or `@EVENT` from an input line.
pub type TriggerKey = heapless::String<TRIGGER_KEY_CAP>;

/// Sigil of keys that come from network request paths.
pub const PATH_SIGIL: char = '/';
/// Sigil of keys that come from input transitions.
pub const EVENT_SIGIL: char = '@';

/// Which producer a key conventionally belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerKind {
    Path,
    Event,
}

/// Classify a key by its leading sigil.  `None` for anything else.
pub fn trigger_kind(key: &str) -> Option<TriggerKind> {
    if key.starts_with(PATH_SIGIL) {
        Some(TriggerKind::Path)
    } else if key.starts_with(EVENT_SIGIL) {
        Some(TriggerKind::Event)
    } else {
        None
    }
}

/// Build a [`TriggerKey`], rejecting keys that do not fit.
pub fn trigger_key(key: &str) -> Result<TriggerKey, QueueError> {
    let mut k = TriggerKey::new();
    k.push_str(key).map_err(|()| QueueError::KeyTooLong)?;
    Ok(k)
}

/// Why a trigger could not be queued.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    /// All slots are occupied; the trigger was dropped.
    Full,
    /// The key exceeds [`TRIGGER_KEY_CAP`] bytes.
    KeyTooLong,
}

impl fmt::Display for QueueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "trigger queue full"),
            Self::KeyTooLong => write!(f, "trigger key longer than {} bytes", TRIGGER_KEY_CAP),
        }
    }
}

/// Bounded FIFO of trigger keys shared between tasks.
///
/// Created once at startup and handed out by reference (`&'static` on the
/// target) to the HTTP server and the dispatcher.
pub struct TriggerQueue {
    inner: Mutex<CriticalSectionRawMutex, RefCell<Deque<TriggerKey, TRIGGER_QUEUE_CAP>>>,
}

impl Default for TriggerQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl TriggerQueue {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(RefCell::new(Deque::new())),
        }
    }

    /// Append a key.  Task context only.
    pub fn push(&self, key: TriggerKey) -> Result<(), QueueError> {
        self.inner.lock(|q| {
            q.borrow_mut()
                .push_back(key)
                .map_err(|_| QueueError::Full)
        })
    }

    /// Append a borrowed key, copying it into a fixed-capacity slot.
    pub fn push_str(&self, key: &str) -> Result<(), QueueError> {
        self.push(trigger_key(key)?)
    }

    /// Remove the oldest key.  Returns `None` if the queue is empty.
    pub fn pop(&self) -> Option<TriggerKey> {
        self.inner.lock(|q| q.borrow_mut().pop_front())
    }

    /// Number of pending keys.
    pub fn len(&self) -> usize {
        self.inner.lock(|q| q.borrow().len())
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock(|q| q.borrow().is_empty())
    }

}
