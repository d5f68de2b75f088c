//! Command-line interpreter.
//!
//! A keymap command line is checked against two independent grammars, in
//! this order, and **every** grammar that matches takes effect:
//!
//! | Grammar | Form                 | Effect                           |
//! |---------|----------------------|----------------------------------|
//! | Pause   | `P<decimal>…`        | block for that many milliseconds |
//! | Code    | `<hex>`              | NEC frame, 32 bits               |
//! | Code    | `<hex>:<hex>`        | Panasonic frame (address, data)  |
//!
//! The pause grammar ignores anything after the number.  The code grammar
//! must cover the whole line; hex fields take an optional `0x` prefix and
//! at most 8 digits.  A line matching neither is a silent no-op.

use embedded_hal::delay::DelayNs;

use super::ports::{IrError, IrPort};

/// Standard NEC frame width.
pub const NEC_BITS: u16 = 32;

/// Leading literal of the pause grammar.
pub const PAUSE_PREFIX: char = 'P';

/// Separator between the two Panasonic fields.
pub const PANASONIC_SEPARATOR: char = ':';

/// One interpreted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Pause { millis: u32 },
    Nec { value: u32, bits: u16 },
    Panasonic { address: u32, data: u32 },
    NoOp,
}

/// Both grammar slots for one line: `[pause, code]`, `NoOp` where unmatched.
pub type Interpretation = [Command; 2];

/// Interpret one cleaned command line.
pub fn interpret(line: &str) -> Interpretation {
    [parse_pause(line), parse_code(line)]
}

/// `true` when no grammar matched.
pub fn is_unparsed(interp: &Interpretation) -> bool {
    interp.iter().all(|c| *c == Command::NoOp)
}

fn parse_pause(line: &str) -> Command {
    let Some(rest) = line.strip_prefix(PAUSE_PREFIX) else {
        return Command::NoOp;
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    match rest[..digits].parse::<u32>() {
        Ok(millis) => Command::Pause { millis },
        Err(_) => Command::NoOp,
    }
}

fn parse_code(line: &str) -> Command {
    match line.split_once(PANASONIC_SEPARATOR) {
        None => match parse_hex(line) {
            Some(value) => Command::Nec {
                value,
                bits: NEC_BITS,
            },
            None => Command::NoOp,
        },
        Some((address, data)) => match (parse_hex(address), parse_hex(data)) {
            (Some(address), Some(data)) => Command::Panasonic { address, data },
            _ => Command::NoOp,
        },
    }
}

fn parse_hex(field: &str) -> Option<u32> {
    let digits = field
        .strip_prefix("0x")
        .or_else(|| field.strip_prefix("0X"))
        .unwrap_or(field);
    if digits.is_empty() || digits.len() > 8 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(digits, 16).ok()
}

/// What executing a line actually did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineEffects {
    pub paused_ms: Option<u32>,
    pub emitted: Option<Command>,
    /// Set when the transmitter reported a failure.
    pub ir_error: Option<IrError>,
}

impl LineEffects {
    pub fn is_empty(&self) -> bool {
        self.paused_ms.is_none() && self.emitted.is_none() && self.ir_error.is_none()
    }
}

/// Interpret and execute one line: pause first, then transmit.
///
/// Transmitter failures are recorded in the returned effects and otherwise
/// swallowed.
pub fn execute(line: &str, hw: &mut (impl IrPort + DelayNs)) -> LineEffects {
    let mut effects = LineEffects::default();

    for cmd in interpret(line) {
        match cmd {
            Command::Pause { millis } => {
                hw.delay_ms(millis);
                effects.paused_ms = Some(millis);
            }
            Command::Nec { value, bits } => match hw.send_nec(value, bits) {
                Ok(()) => effects.emitted = Some(cmd),
                Err(e) => effects.ir_error = Some(e),
            },
            Command::Panasonic { address, data } => match hw.send_panasonic(address, data) {
                Ok(()) => effects.emitted = Some(cmd),
                Err(e) => effects.ir_error = Some(e),
            },
            Command::NoOp => {}
        }
    }

    effects
}
