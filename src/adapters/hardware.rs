//! Hardware adapter: bridges the IR transmitter and the scheduler delay to
//! the domain port traits.
//!
//! Owns the [`IrTransmitter`] and exposes it through [`IrPort`] and
//! [`DelayNs`].  On non-espidf targets the transmitter records frames and
//! delays sleep the calling thread.

use embedded_hal::delay::DelayNs;

use crate::app::ports::{IrError, IrPort};
use crate::drivers::ir_tx::{self, IrTransmitter};

pub struct HardwareAdapter {
    ir: IrTransmitter,
}

impl HardwareAdapter {
    pub fn new(ir: IrTransmitter) -> Self {
        Self { ir }
    }

    pub fn transmitter(&self) -> &IrTransmitter {
        &self.ir
    }
}

// ── IrPort implementation ─────────────────────────────────────

impl IrPort for HardwareAdapter {
    fn send_nec(&mut self, value: u32, bits: u16) -> Result<(), IrError> {
        let frame = ir_tx::encode_nec(value, bits)?;
        self.ir.transmit(&frame)
    }

    fn send_panasonic(&mut self, address: u32, data: u32) -> Result<(), IrError> {
        let frame = ir_tx::encode_panasonic(address, data)?;
        self.ir.transmit(&frame)
    }
}

// ── DelayNs implementation ────────────────────────────────────

impl DelayNs for HardwareAdapter {
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_hal::delay::Ets::delay_us(ns.div_ceil(1_000));
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }

    /// Millisecond pauses yield to the scheduler.
    #[cfg(target_os = "espidf")]
    fn delay_ms(&mut self, ms: u32) {
        esp_idf_hal::delay::FreeRtos::delay_ms(ms);
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

#[cfg(all(test, not(target_os = "espidf")))]
mod tests {
    use super::*;

    #[test]
    fn nec_goes_through_encoder() {
        let mut hw = HardwareAdapter::new(IrTransmitter::new());
        hw.send_nec(0x20DF_10EF, 32).unwrap();
        hw.send_panasonic(0x4004, 0x0100_BCBD).unwrap();
        let sent = hw.transmitter().sent();
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[0].len(), 34);
        assert_eq!(sent[1].len(), 50);
    }

    #[test]
    fn oversized_nec_is_rejected_before_transmit() {
        let mut hw = HardwareAdapter::new(IrTransmitter::new());
        assert_eq!(hw.send_nec(0, 40), Err(IrError::FrameTooLong));
        assert_eq!(hw.transmitter().frames_sent(), 0);
    }
}
