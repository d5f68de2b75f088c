//! IR transmitter driver.
//!
//! Encodes NEC and Panasonic (Kaseikyo) frames into mark/space symbols and
//! plays them on the RMT peripheral with a carrier.
//!
//! ## Frames
//!
//! | Protocol  | Header (µs)  | Bit mark | `1` space | `0` space | Bits |
//! |-----------|--------------|----------|-----------|-----------|------|
//! | NEC       | 9000 / 4500  | 560      | 1690      | 560       | 32   |
//! | Panasonic | 3456 / 1728  | 432      | 1296      | 432       | 48   |
//!
//! Both send MSB first and end with a lone stop mark.  The Panasonic frame
//! is the low 16 bits of the address followed by the 32 data bits.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: RMT channel at 1 µs resolution, 38 kHz carrier.
//! On host/test: frames are recorded in memory only.

use crate::app::ports::IrError;

// ── Timings ───────────────────────────────────────────────────

pub const NEC_HDR_MARK_US: u16 = 9000;
pub const NEC_HDR_SPACE_US: u16 = 4500;
pub const NEC_BIT_MARK_US: u16 = 560;
pub const NEC_ONE_SPACE_US: u16 = 1690;
pub const NEC_ZERO_SPACE_US: u16 = 560;

pub const PANASONIC_HDR_MARK_US: u16 = 3456;
pub const PANASONIC_HDR_SPACE_US: u16 = 1728;
pub const PANASONIC_BIT_MARK_US: u16 = 432;
pub const PANASONIC_ONE_SPACE_US: u16 = 1296;
pub const PANASONIC_ZERO_SPACE_US: u16 = 432;
pub const PANASONIC_ADDRESS_BITS: u16 = 16;
pub const PANASONIC_DATA_BITS: u16 = 32;

/// Carrier used for both protocols.
pub const CARRIER_HZ: u32 = 38_000;

/// Header + 48 data bits + stop, with headroom.
pub const MAX_SYMBOLS: usize = 64;

/// One mark (carrier on) followed by one space (carrier off).
/// A zero space terminates the frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub mark_us: u16,
    pub space_us: u16,
}

pub type Frame = heapless::Vec<Symbol, MAX_SYMBOLS>;

struct BitTiming {
    mark: u16,
    one: u16,
    zero: u16,
}

fn push(frame: &mut Frame, mark_us: u16, space_us: u16) -> Result<(), IrError> {
    frame
        .push(Symbol { mark_us, space_us })
        .map_err(|_| IrError::FrameTooLong)
}

fn push_bits(frame: &mut Frame, value: u32, bits: u16, t: &BitTiming) -> Result<(), IrError> {
    for i in (0..bits).rev() {
        let space = if (value >> i) & 1 == 1 { t.one } else { t.zero };
        push(frame, t.mark, space)?;
    }
    Ok(())
}

/// Encode an NEC frame of `bits` bits (at most 32).
pub fn encode_nec(value: u32, bits: u16) -> Result<Frame, IrError> {
    if bits > 32 {
        return Err(IrError::FrameTooLong);
    }
    let timing = BitTiming {
        mark: NEC_BIT_MARK_US,
        one: NEC_ONE_SPACE_US,
        zero: NEC_ZERO_SPACE_US,
    };
    let mut frame = Frame::new();
    push(&mut frame, NEC_HDR_MARK_US, NEC_HDR_SPACE_US)?;
    push_bits(&mut frame, value, bits, &timing)?;
    push(&mut frame, NEC_BIT_MARK_US, 0)?;
    Ok(frame)
}

/// Encode a 48-bit Panasonic frame.
pub fn encode_panasonic(address: u32, data: u32) -> Result<Frame, IrError> {
    let timing = BitTiming {
        mark: PANASONIC_BIT_MARK_US,
        one: PANASONIC_ONE_SPACE_US,
        zero: PANASONIC_ZERO_SPACE_US,
    };
    let mut frame = Frame::new();
    push(&mut frame, PANASONIC_HDR_MARK_US, PANASONIC_HDR_SPACE_US)?;
    push_bits(&mut frame, address & 0xFFFF, PANASONIC_ADDRESS_BITS, &timing)?;
    push_bits(&mut frame, data, PANASONIC_DATA_BITS, &timing)?;
    push(&mut frame, PANASONIC_BIT_MARK_US, 0)?;
    Ok(frame)
}

// ── Driver ────────────────────────────────────────────────────

pub struct IrTransmitter {
    #[cfg(target_os = "espidf")]
    tx: esp_idf_hal::rmt::TxRmtDriver<'static>,
    #[cfg(not(target_os = "espidf"))]
    sent: Vec<Frame>,
    frames_sent: u32,
}

impl IrTransmitter {
    /// Bind the transmitter to an RMT channel and the IR LED pin.
    #[cfg(target_os = "espidf")]
    pub fn new<C: esp_idf_hal::rmt::RmtChannel>(
        channel: impl esp_idf_hal::peripheral::Peripheral<P = C> + 'static,
        pin: impl esp_idf_hal::peripheral::Peripheral<P = impl esp_idf_hal::gpio::OutputPin> + 'static,
    ) -> Result<Self, IrError> {
        use esp_idf_hal::rmt::config::{CarrierConfig, DutyPercent, TransmitConfig};
        use esp_idf_hal::units::Hertz;

        let duty = DutyPercent::new(33).map_err(|_| IrError::TransmitFailed)?;
        let carrier = CarrierConfig::new()
            .frequency(Hertz(CARRIER_HZ))
            .duty_percent(duty);
        // 80 MHz APB / 80 = 1 tick per microsecond.
        let config = TransmitConfig::new().clock_divider(80).carrier(Some(carrier));
        let tx = esp_idf_hal::rmt::TxRmtDriver::new(channel, pin, &config).map_err(|e| {
            log::error!("ir_tx: RMT init failed ({})", e);
            IrError::TransmitFailed
        })?;
        log::info!("ir_tx: RMT ready ({} Hz carrier)", CARRIER_HZ);
        Ok(Self { tx, frames_sent: 0 })
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn new() -> Self {
        Self {
            sent: Vec::new(),
            frames_sent: 0,
        }
    }

    /// Play `frame`, blocking until the last symbol is out.
    pub fn transmit(&mut self, frame: &Frame) -> Result<(), IrError> {
        self.transmit_hw(frame)?;
        self.frames_sent = self.frames_sent.wrapping_add(1);
        Ok(())
    }

    #[cfg(target_os = "espidf")]
    fn transmit_hw(&mut self, frame: &Frame) -> Result<(), IrError> {
        use esp_idf_hal::rmt::{PinState, Pulse, PulseTicks, VariableLengthSignal};

        let ticks = |us: u16| PulseTicks::new(us).map_err(|_| IrError::FrameTooLong);
        let mut signal = VariableLengthSignal::new();
        for sym in frame {
            let mark = Pulse::new(PinState::High, ticks(sym.mark_us)?);
            signal.push([&mark]).map_err(|_| IrError::FrameTooLong)?;
            if sym.space_us > 0 {
                let space = Pulse::new(PinState::Low, ticks(sym.space_us)?);
                signal.push([&space]).map_err(|_| IrError::FrameTooLong)?;
            }
        }
        self.tx.start_blocking(&signal).map_err(|e| {
            log::warn!("ir_tx: transmit failed ({})", e);
            IrError::TransmitFailed
        })
    }

    #[cfg(not(target_os = "espidf"))]
    fn transmit_hw(&mut self, frame: &Frame) -> Result<(), IrError> {
        self.sent.push(frame.clone());
        Ok(())
    }

    /// Frames put on the air since boot.
    pub fn frames_sent(&self) -> u32 {
        self.frames_sent
    }

    /// Frames recorded by the simulation backend.
    #[cfg(not(target_os = "espidf"))]
    pub fn sent(&self) -> &[Frame] {
        &self.sent
    }
}

#[cfg(not(target_os = "espidf"))]
impl Default for IrTransmitter {
    fn default() -> Self {
        Self::new()
    }
}
