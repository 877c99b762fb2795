//! Module: telemetry
//!
//! Purpose: Binary frame broadcast over LoRa, one per transmit attempt.
//!
//! Layout (little-endian, packed, 22 bytes):
//! ```text
//! [magic:2 "GB"][lat:f32][lon:f32][speed_kph:f32][alt_m:f32][counter:u16][sats:u8][fix:u8]
//!  0             2        6        10             14         18           20       21
//! ```
//!
//! Latitude/longitude are the filtered display position. Encode only:
//! decoding happens on the ground station.

use crate::fix::DisplayFix;

/// Frame tag.
pub const FRAME_MAGIC: [u8; 2] = *b"GB";

/// Total frame width in bytes.
pub const FRAME_LEN: usize = 22;

const OFF_MAGIC: usize = 0;
const OFF_LAT: usize = 2;
const OFF_LON: usize = 6;
const OFF_SPEED: usize = 10;
const OFF_ALT: usize = 14;
const OFF_COUNTER: usize = 18;
const OFF_SATS: usize = 20;
const OFF_FIX: usize = 21;

/// One encoded telemetry frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TelemetryFrame {
    bytes: [u8; FRAME_LEN],
}

impl TelemetryFrame {
    /// Encode a fix snapshot with the transmit sequence counter.
    pub fn encode(fix: &DisplayFix, counter: u16) -> Self {
        let mut bytes = [0u8; FRAME_LEN];

        bytes[OFF_MAGIC..OFF_LAT].copy_from_slice(&FRAME_MAGIC);
        bytes[OFF_LAT..OFF_LON].copy_from_slice(&fix.display_latitude.to_le_bytes());
        bytes[OFF_LON..OFF_SPEED].copy_from_slice(&fix.display_longitude.to_le_bytes());
        bytes[OFF_SPEED..OFF_ALT].copy_from_slice(&fix.raw.speed_kph.to_le_bytes());
        bytes[OFF_ALT..OFF_COUNTER].copy_from_slice(&fix.raw.altitude.to_le_bytes());
        bytes[OFF_COUNTER..OFF_SATS].copy_from_slice(&counter.to_le_bytes());
        bytes[OFF_SATS] = fix.raw.satellites;
        bytes[OFF_FIX] = fix.raw.fix_valid as u8;

        Self { bytes }
    }

    #[inline]
    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.bytes
    }

    #[inline]
    pub fn counter(&self) -> u16 {
        u16::from_le_bytes([self.bytes[OFF_COUNTER], self.bytes[OFF_COUNTER + 1]])
    }
}

impl AsRef<[u8]> for TelemetryFrame {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}
