//! Module: fix
//!
//! Purpose: Navigation fix records.
//!
//! - [`RawFix`]: running aggregate of GGA and RMC fields
//! - [`DisplayFix`]: raw fix plus the anti-drift display position
//!
//! Safety: Safe. `Copy` types only, so the shared store can copy them whole.

/// Running aggregate of receiver output.
///
/// GGA updates position, altitude, HDOP, satellites and validity.
/// RMC updates speed and course. Each sentence touches only its own fields.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RawFix {
    pub fix_valid: bool,
    /// Decimal degrees, south negative.
    pub latitude: f32,
    /// Decimal degrees, west negative.
    pub longitude: f32,
    /// Meters above mean sea level.
    pub altitude: f32,
    /// Ground speed in km/h.
    pub speed_kph: f32,
    /// Course over ground in degrees.
    pub course: f32,
    pub hdop: f32,
    pub satellites: u8,
}

/// Filtered fix as published to the transmit core.
///
/// `display_latitude`/`display_longitude` equal the raw position while
/// moving, and hold the last moving (or first seen) position while static.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DisplayFix {
    pub raw: RawFix,
    pub display_latitude: f32,
    pub display_longitude: f32,
    pub is_moving: bool,
}

impl DisplayFix {
    /// Fix with every field zero and no validity.
    pub const EMPTY: Self = Self {
        raw: RawFix {
            fix_valid: false,
            latitude: 0.0,
            longitude: 0.0,
            altitude: 0.0,
            speed_kph: 0.0,
            course: 0.0,
            hdop: 0.0,
            satellites: 0,
        },
        display_latitude: 0.0,
        display_longitude: 0.0,
        is_moving: false,
    };

    #[inline]
    pub fn has_fix(&self) -> bool {
        self.raw.fix_valid
    }
}
