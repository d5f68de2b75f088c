//! Fuzz target: `commands::execute`
//!
//! Runs arbitrary command lines against a recording transmitter and checks
//! that at most one pause and one transmission come out of a line.
//!
//! cargo fuzz run fuzz_command_line

#![no_main]

use embedded_hal::delay::DelayNs;
use irblaster::app::commands;
use irblaster::app::ports::{IrError, IrPort};
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Counter {
    pauses: usize,
    frames: usize,
}

impl IrPort for Counter {
    fn send_nec(&mut self, _value: u32, bits: u16) -> Result<(), IrError> {
        irblaster::drivers::ir_tx::encode_nec(0, bits)?;
        self.frames += 1;
        Ok(())
    }

    fn send_panasonic(&mut self, address: u32, data: u32) -> Result<(), IrError> {
        irblaster::drivers::ir_tx::encode_panasonic(address, data)?;
        self.frames += 1;
        Ok(())
    }
}

impl DelayNs for Counter {
    fn delay_ns(&mut self, _ns: u32) {}

    fn delay_ms(&mut self, _ms: u32) {
        self.pauses += 1;
    }
}

fuzz_target!(|data: &[u8]| {
    let Ok(line) = core::str::from_utf8(data) else {
        return;
    };
    let mut hw = Counter::default();
    let effects = commands::execute(line, &mut hw);

    assert!(hw.pauses <= 1);
    assert!(hw.frames <= 1);
    assert_eq!(effects.paused_ms.is_some(), hw.pauses == 1);
    assert_eq!(effects.emitted.is_some(), hw.frames == 1);
});
