//! LoRa transmit path for the LR11xx family.
//!
//! The register/SPI driver is supplied by the board through [`RadioHal`];
//! this module owns the per-attempt transmit sequence.

use crate::fault::TxFault;

pub mod irq;
pub mod transmitter;

pub use irq::TxDoneFlag;
pub use transmitter::{RadioTransmitter, TxState};

/// Non-OK status returned by a radio command (driver-defined code).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HalStatus(pub i32);

impl core::fmt::Display for HalStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "status {}", self.0)
    }
}

/// Radio IRQ status/enable bits.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct IrqMask(pub u32);

impl IrqMask {
    pub const NONE: Self = Self(0);
    pub const TX_DONE: Self = Self(1 << 2);
    pub const RX_DONE: Self = Self(1 << 3);
    pub const TIMEOUT: Self = Self(1 << 10);
    pub const CMD_ERROR: Self = Self(1 << 22);
    pub const ERROR: Self = Self(1 << 23);
    /// Every maskable source.
    pub const ALL: Self = Self(0x0BF8_0FFC);

    #[inline]
    pub fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    #[inline]
    pub fn bits(self) -> u32 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum PacketType {
    Gfsk = 0x01,
    Lora = 0x02,
}

/// TCXO supply voltage driven on VTCXO.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TcxoVoltage {
    V1_6 = 0x00,
    V1_7 = 0x01,
    V1_8 = 0x02,
    V2_2 = 0x03,
    V2_4 = 0x04,
    V2_7 = 0x05,
    V3_0 = 0x06,
    V3_3 = 0x07,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum SpreadingFactor {
    Sf5 = 5,
    Sf6 = 6,
    Sf7 = 7,
    Sf8 = 8,
    Sf9 = 9,
    Sf10 = 10,
    Sf11 = 11,
    Sf12 = 12,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Bandwidth {
    Bw62 = 0x03,
    Bw125 = 0x04,
    Bw250 = 0x05,
    Bw500 = 0x06,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum CodingRate {
    Cr4_5 = 0x01,
    Cr4_6 = 0x02,
    Cr4_7 = 0x03,
    Cr4_8 = 0x04,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum HeaderType {
    Explicit = 0x00,
    Implicit = 0x01,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum IqMode {
    Standard = 0x00,
    Inverted = 0x01,
}

/// LoRa modulation parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoraModParams {
    pub sf: SpreadingFactor,
    pub bw: Bandwidth,
    pub cr: CodingRate,
    /// Low data rate optimization.
    pub ldro: bool,
}

/// LoRa packet parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoraPktParams {
    pub preamble_len_symb: u16,
    pub header_type: HeaderType,
    pub payload_len: u8,
    pub crc: bool,
    pub iq: IqMode,
}

/// Primitive radio operations used by the transmit sequence.
///
/// Implemented by the board's SPI driver; every call maps to one radio
/// command and reports a non-OK status as `Err`.
pub trait RadioHal {
    /// Enable the TCXO supply; `timeout_steps` in 30.52 µs units.
    fn set_tcxo_mode(&mut self, voltage: TcxoVoltage, timeout_steps: u32) -> Result<(), HalStatus>;

    /// Clear latched system errors.
    fn clear_errors(&mut self) -> Result<(), HalStatus>;

    /// Latched system error bits (0 = none).
    fn get_errors(&mut self) -> Result<u16, HalStatus>;

    fn set_packet_type(&mut self, packet_type: PacketType) -> Result<(), HalStatus>;

    fn set_rf_frequency(&mut self, freq_hz: u32) -> Result<(), HalStatus>;

    fn set_lora_mod_params(&mut self, params: &LoraModParams) -> Result<(), HalStatus>;

    fn set_lora_pkt_params(&mut self, params: &LoraPktParams) -> Result<(), HalStatus>;

    /// Write the TX buffer.
    fn write_buffer(&mut self, data: &[u8]) -> Result<(), HalStatus>;

    /// Start transmission; `timeout_steps` 0 disables the radio's own timeout.
    fn set_tx(&mut self, timeout_steps: u32) -> Result<(), HalStatus>;

    fn get_irq_status(&mut self) -> Result<IrqMask, HalStatus>;

    fn clear_irq_status(&mut self, mask: IrqMask) -> Result<(), HalStatus>;

    /// Route IRQ sources to the DIO lines.
    fn set_dio_irq_params(&mut self, irq1: IrqMask, irq2: IrqMask) -> Result<(), HalStatus>;
}

/// Radio command that failed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TxStep {
    DioIrqParams = 1,
    ClearErrors = 2,
    ClearIrq = 3,
    Tcxo = 4,
    PacketType = 5,
    RfFrequency = 6,
    ModParams = 7,
    PktParams = 8,
    WriteBuffer = 9,
    GetErrors = 10,
    StartTx = 11,
    PollIrq = 12,
}

impl TxStep {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn as_str(self) -> &'static str {
        match self {
            TxStep::DioIrqParams => "set_dio_irq_params",
            TxStep::ClearErrors => "clear_errors",
            TxStep::ClearIrq => "clear_irq_status",
            TxStep::Tcxo => "set_tcxo_mode",
            TxStep::PacketType => "set_pkt_type",
            TxStep::RfFrequency => "set_rf_freq",
            TxStep::ModParams => "set_lora_mod_params",
            TxStep::PktParams => "set_lora_pkt_params",
            TxStep::WriteBuffer => "write_buffer",
            TxStep::GetErrors => "get_errors",
            TxStep::StartTx => "set_tx",
            TxStep::PollIrq => "get_irq_status",
        }
    }
}

/// Transmit attempt failure.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RadioError {
    /// Payload wider than the frame; hardware untouched.
    Oversized { len: usize, max: usize },
    /// A radio command returned a bad status.
    Command { step: TxStep, status: HalStatus },
    /// No TX_DONE within the timeout window.
    Timeout { elapsed_ms: u32, irq: IrqMask },
}

impl RadioError {
    /// Short error code for logs.
    pub fn code(&self) -> &'static str {
        match self {
            RadioError::Oversized { .. } => "R01",
            RadioError::Command { .. } => "R02",
            RadioError::Timeout { .. } => "R03",
        }
    }

    /// Fault record for this error: the code plus its detail word
    /// (payload length, failing step code or last IRQ status).
    pub fn fault(&self) -> (TxFault, u32) {
        match *self {
            RadioError::Oversized { len, .. } => (TxFault::Oversized, len as u32),
            RadioError::Command { step, .. } => (TxFault::Command, step.code() as u32),
            RadioError::Timeout { irq, .. } => (TxFault::Timeout, irq.bits()),
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RadioError::Oversized { .. } => "payload too large",
            RadioError::Command { .. } => "radio command failed",
            RadioError::Timeout { .. } => "transmit timeout",
        }
    }
}

impl core::fmt::Display for RadioError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            RadioError::Oversized { len, max } => {
                write!(f, "{}: payload {} bytes exceeds max {}", self.code(), len, max)
            }
            RadioError::Command { step, status } => {
                write!(f, "{}: {} failed: {}", self.code(), step.as_str(), status)
            }
            RadioError::Timeout { elapsed_ms, irq } => {
                write!(f, "{}: timeout after {} ms, IRQ 0x{:08X}", self.code(), elapsed_ms, irq.0)
            }
        }
    }
}
