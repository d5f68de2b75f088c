//! ISR-debounced digital trigger inputs.
//!
//! ## Hardware
//!
//! Two inputs with any-edge interrupts.  The ISR reads the uptime clock and
//! the pin level and hands both to [`InputLine::on_edge`], which does the
//! debounce check and records the edge.
//!
//! ## ISR contract
//!
//! `on_edge` only touches atomics; it never locks or logs.
//! Each line owns a lock-free SPSC ring (its ISR produces, the main loop
//! consumes).  [`InputWatcher::forward`] runs in the main loop and moves
//! edges, oldest first across both lines, onto the shared [`TriggerQueue`]
//! as `@IN_n_DOWN` (level high) or `@IN_n_UP` (level low).
//!
//! ```text
//!  GPIO ISR ──▶ EdgeRing (IN_1) ──┐
//!  GPIO ISR ──▶ EdgeRing (IN_2) ──┴─ forward() ──▶ TriggerQueue
//! ```

use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use crate::events::{QueueError, TriggerKey, TriggerQueue};
use crate::pins;

/// Suffix for a high level on the input.
pub const DOWN_SUFFIX: &str = "_DOWN";
/// Suffix for a low level on the input.
pub const UP_SUFFIX: &str = "_UP";

/// Ring slots per line.  One slot stays free to tell full from empty.
pub const EDGE_RING_CAP: usize = 8;

/// The two physical trigger inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputId {
    In1,
    In2,
}

impl InputId {
    pub const ALL: [Self; 2] = [Self::In1, Self::In2];

    pub fn gpio(self) -> i32 {
        match self {
            Self::In1 => pins::INPUT_1_GPIO,
            Self::In2 => pins::INPUT_2_GPIO,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::In1 => pins::INPUT_1_LABEL,
            Self::In2 => pins::INPUT_2_LABEL,
        }
    }
}

/// Build the event key for an edge: `<label>_DOWN` or `<label>_UP`.
pub fn edge_key(label: &str, level_high: bool) -> TriggerKey {
    let mut key = TriggerKey::new();
    let _ = key.push_str(label);
    let _ = key.push_str(if level_high { DOWN_SUFFIX } else { UP_SUFFIX });
    key
}

/// An accepted transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub at_ms: u32,
    pub level_high: bool,
}

// ── Lock-free SPSC ring ───────────────────────────────────────

struct EdgeRing {
    stamps: [AtomicU32; EDGE_RING_CAP],
    levels: [AtomicBool; EDGE_RING_CAP],
    head: AtomicUsize,
    tail: AtomicUsize,
}

impl EdgeRing {
    const fn new() -> Self {
        Self {
            stamps: [const { AtomicU32::new(0) }; EDGE_RING_CAP],
            levels: [const { AtomicBool::new(false) }; EDGE_RING_CAP],
            head: AtomicUsize::new(0),
            tail: AtomicUsize::new(0),
        }
    }

    /// Producer side.  `false` when full.
    fn push(&self, edge: Edge) -> bool {
        let head = self.head.load(Ordering::Relaxed);
        let next = (head + 1) % EDGE_RING_CAP;
        if next == self.tail.load(Ordering::Acquire) {
            return false;
        }
        self.stamps[head].store(edge.at_ms, Ordering::Relaxed);
        self.levels[head].store(edge.level_high, Ordering::Relaxed);
        self.head.store(next, Ordering::Release);
        true
    }

    /// Consumer side.
    fn peek(&self) -> Option<Edge> {
        let tail = self.tail.load(Ordering::Relaxed);
        if tail == self.head.load(Ordering::Acquire) {
            return None;
        }
        Some(Edge {
            at_ms: self.stamps[tail].load(Ordering::Relaxed),
            level_high: self.levels[tail].load(Ordering::Relaxed),
        })
    }

    /// Consumer side.
    fn pop(&self) -> Option<Edge> {
        let edge = self.peek()?;
        let tail = self.tail.load(Ordering::Relaxed);
        self.tail.store((tail + 1) % EDGE_RING_CAP, Ordering::Release);
        Some(edge)
    }
}

// ── InputLine ─────────────────────────────────────────────────

/// Debounce state and edge ring for one input.
pub struct InputLine {
    id: InputId,
    debounce_ms: u32,
    /// Uptime of the last accepted edge.  Written only by this line's ISR.
    last_accept_ms: AtomicU32,
    /// Edges lost to a full ring.
    dropped: AtomicU32,
    ring: EdgeRing,
}

impl InputLine {
    pub const fn new(id: InputId, debounce_ms: u32) -> Self {
        Self {
            id,
            debounce_ms,
            last_accept_ms: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
            ring: EdgeRing::new(),
        }
    }

    pub fn id(&self) -> InputId {
        self.id
    }

    pub fn gpio(&self) -> i32 {
        self.id.gpio()
    }

    /// ISR entry point.  `now_ms` is uptime, `level_high` the pin level
    /// read after the edge.  Returns `true` if the edge was recorded.
    pub fn on_edge(&self, now_ms: u32, level_high: bool) -> bool {
        let last = self.last_accept_ms.load(Ordering::Relaxed);
        if now_ms.wrapping_sub(last) < self.debounce_ms {
            return false;
        }
        self.last_accept_ms.store(now_ms, Ordering::Relaxed);

        if !self.ring.push(Edge {
            at_ms: now_ms,
            level_high,
        }) {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        true
    }

    /// Oldest recorded edge.  Main loop only.
    pub fn pop_edge(&self) -> Option<Edge> {
        self.ring.pop()
    }

    /// Edges lost to a full ring since the last call.
    pub fn take_dropped(&self) -> u32 {
        self.dropped.swap(0, Ordering::Relaxed)
    }
}

// ── InputWatcher ──────────────────────────────────────────────

/// Both trigger inputs.
pub struct InputWatcher {
    lines: [InputLine; 2],
}

impl InputWatcher {
    pub fn new(debounce_ms: u32) -> Self {
        Self {
            lines: InputId::ALL.map(|id| InputLine::new(id, debounce_ms)),
        }
    }

    pub fn line(&self, id: InputId) -> &InputLine {
        match id {
            InputId::In1 => &self.lines[0],
            InputId::In2 => &self.lines[1],
        }
    }

    pub fn lines(&self) -> &[InputLine] {
        &self.lines
    }

    /// Move every recorded edge onto `queue`, oldest first across both
    /// lines.  Edges the queue refuses, and edges a ring had to drop, are
    /// passed to `on_drop` with the line label.  Main loop only.
    ///
    /// Returns the number of triggers queued.
    pub fn forward(&self, queue: &TriggerQueue, mut on_drop: impl FnMut(&str, QueueError)) -> usize {
        let mut queued = 0;
        while let Some(line) = self.oldest_pending() {
            let Some(edge) = line.pop_edge() else { break };
            let label = line.id.label();
            match queue.push(edge_key(label, edge.level_high)) {
                Ok(()) => queued += 1,
                Err(reason) => on_drop(label, reason),
            }
        }
        for line in &self.lines {
            for _ in 0..line.take_dropped() {
                on_drop(line.id.label(), QueueError::Full);
            }
        }
        queued
    }

    /// Line whose next edge is oldest.  Uptime may wrap, so stamps are
    /// compared by signed distance.
    fn oldest_pending(&self) -> Option<&InputLine> {
        let [a, b] = &self.lines;
        match (a.ring.peek(), b.ring.peek()) {
            (Some(x), Some(y)) => Some(if (y.at_ms.wrapping_sub(x.at_ms) as i32) < 0 { b } else { a }),
            (Some(_), None) => Some(a),
            (None, Some(_)) => Some(b),
            (None, None) => None,
        }
    }
}
