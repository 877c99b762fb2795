//! Module: config
//!
//! Purpose: Compiled-in configuration for GpsLoraBeacon.
//!
//! Architecture:
//! - One `Copy` struct per subsystem, `Default` carries the board constants
//! - Radio parameters are fixed: they are re-applied on every transmit, never
//!   changed at runtime
//! - Pin assignments live in the binary's HAL, not here
//!
//! Safety: Safe. Plain data only.

use crate::radio::{
    Bandwidth, CodingRate, HeaderType, IqMode, LoraModParams, LoraPktParams, PacketType,
    SpreadingFactor, TcxoVoltage,
};
use crate::telemetry::FRAME_LEN;

/// PMTK251: switch the receiver UART to 57600 baud.
pub const PMTK_SET_BAUD_57600: &str = "$PMTK251,57600*2C\r\n";

/// PMTK314: emit only RMC and GGA sentences.
pub const PMTK_SET_OUTPUT_RMC_GGA: &str =
    "$PMTK314,0,1,0,1,0,0,0,0,0,0,0,0,0,0,0,0,0,0,0*28\r\n";

/// PMTK220: 200 ms fix interval (5 Hz).
pub const PMTK_SET_RATE_5HZ: &str = "$PMTK220,200*2C\r\n";

/// Positioning receiver bring-up parameters.
#[derive(Clone, Copy, Debug)]
pub struct ReceiverConfig {
    /// Operating baud rate (fast enough for 5 Hz GGA+RMC).
    pub target_baud: u32,
    /// Factory default baud rate of the receiver.
    pub fallback_baud: u32,
    /// How long to listen for a `$` at the target rate before falling back.
    pub probe_window_ms: u32,
    /// Each configuration command is sent this many times.
    pub repeat: u8,
    /// Gap between repeated commands.
    pub command_gap_ms: u32,
    /// Settle time after switching to the fallback rate.
    pub fallback_settle_ms: u32,
    /// Time the receiver needs to apply a baud switch.
    pub baud_switch_ms: u32,
    /// Settle time after returning to the target rate.
    pub resync_settle_ms: u32,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            target_baud: 57_600,
            fallback_baud: 9_600,
            probe_window_ms: 1000,
            repeat: 3,
            command_gap_ms: 50,
            fallback_settle_ms: 100,
            baud_switch_ms: 200,
            resync_settle_ms: 100,
        }
    }
}

/// Acquisition loop limits.
#[derive(Clone, Copy, Debug)]
pub struct AcquisitionConfig {
    /// Upper bound on bytes drained in one step.
    ///
    /// At 57600 baud the receiver delivers ~5760 bytes/s, so one step never
    /// sees more than this unless the loop has stalled.
    pub max_bytes_per_step: usize,
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self {
            max_bytes_per_step: 1024,
        }
    }
}

/// Stability (anti-drift) filter thresholds.
#[derive(Clone, Copy, Debug)]
pub struct FilterConfig {
    /// Fixes with HDOP above this are ignored.
    pub max_hdop: f32,
    /// Below this ground speed (km/h) the display position is locked.
    pub min_moving_speed_kph: f32,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_hdop: 3.0,
            min_moving_speed_kph: 3.0,
        }
    }
}

/// LoRa transmit parameters and timing.
#[derive(Clone, Copy, Debug)]
pub struct RadioConfig {
    pub rf_freq_hz: u32,
    pub packet_type: PacketType,
    pub modulation: LoraModParams,
    pub packet: LoraPktParams,
    pub tcxo_voltage: TcxoVoltage,
    /// TCXO start-up timeout in 30.52 µs RTC steps (500 ≈ 15 ms).
    pub tcxo_timeout_steps: u32,
    /// Delay after enabling the TCXO before touching the radio again.
    pub tcxo_settle_ms: u32,
    /// Give up on TX_DONE after this long.
    pub tx_timeout_ms: u32,
    /// Sleep between IRQ status polls.
    pub poll_interval_ms: u32,
}

impl Default for RadioConfig {
    fn default() -> Self {
        Self {
            rf_freq_hz: 915_000_000,
            packet_type: PacketType::Lora,
            modulation: LoraModParams {
                sf: SpreadingFactor::Sf7,
                bw: Bandwidth::Bw125,
                cr: CodingRate::Cr4_5,
                ldro: false,
            },
            packet: LoraPktParams {
                preamble_len_symb: 8,
                header_type: HeaderType::Explicit,
                payload_len: FRAME_LEN as u8,
                crc: true,
                iq: IqMode::Standard,
            },
            tcxo_voltage: TcxoVoltage::V3_0,
            tcxo_timeout_steps: 500,
            tcxo_settle_ms: 5,
            tx_timeout_ms: 2000,
            poll_interval_ms: 1,
        }
    }
}

/// Transmit cadence.
#[derive(Clone, Copy, Debug)]
pub struct BroadcastConfig {
    /// Sleep between transmit attempts (~1 Hz beacon).
    pub interval_ms: u32,
    /// Log a link health line every N cycles (0 disables).
    pub health_every: u32,
}

impl Default for BroadcastConfig {
    fn default() -> Self {
        Self {
            interval_ms: 1000,
            health_every: 10,
        }
    }
}
