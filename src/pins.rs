//! GPIO / peripheral pin assignments for the IR blaster board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// IR transmitter
// ---------------------------------------------------------------------------

/// IR LED driver transistor, driven by RMT channel 0.
pub const IR_LED_GPIO: i32 = 4;
/// RMT channel carrying the modulated IR signal.
pub const IR_RMT_CHANNEL: u32 = 0;

// ---------------------------------------------------------------------------
// Status LED
// ---------------------------------------------------------------------------

/// On-board LED.  Blinks while WiFi associates, steady once connected.
pub const STATUS_LED_GPIO: i32 = 16;

// ---------------------------------------------------------------------------
// Digital trigger inputs (any-edge interrupts)
// ---------------------------------------------------------------------------

/// Trigger input 1, reported as `@IN_1_UP` / `@IN_1_DOWN`.
pub const INPUT_1_GPIO: i32 = 5;
/// Trigger input 2, reported as `@IN_2_UP` / `@IN_2_DOWN`.
pub const INPUT_2_GPIO: i32 = 14;

/// Event-key label for input 1.
pub const INPUT_1_LABEL: &str = "@IN_1";
/// Event-key label for input 2.
pub const INPUT_2_LABEL: &str = "@IN_2";
