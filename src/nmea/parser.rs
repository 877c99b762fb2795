//! GGA / RMC field extraction into a [`RawFix`].
//!
//! Fields are positional, so the tokenizer keeps empty fields. Unparseable
//! numbers read as zero: a bad field must never stop the acquisition loop.

use crate::fix::RawFix;

use super::checksum::Sentence;

/// Knots to km/h.
pub const KNOTS_TO_KPH: f32 = 1.852;

/// Fields beyond this index are never consulted.
const MAX_FIELDS: usize = 16;

// GGA field positions (tag is field 0)
const GGA_LAT: usize = 2;
const GGA_LAT_HEMI: usize = 3;
const GGA_LON: usize = 4;
const GGA_LON_HEMI: usize = 5;
const GGA_SATELLITES: usize = 7;
const GGA_HDOP: usize = 8;
const GGA_ALTITUDE: usize = 9;

// RMC field positions
const RMC_STATUS: usize = 2;
const RMC_SPEED_KNOTS: usize = 7;
const RMC_COURSE: usize = 8;

/// The two consumed sentence kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SentenceKind {
    /// GGA: position, satellites, HDOP, altitude.
    FixData,
    /// RMC: status, speed, course.
    Velocity,
}

impl SentenceKind {
    /// Map a tag to a kind. GP (GPS) and GN (multi-constellation) talkers
    /// are synonyms.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "GPGGA" | "GNGGA" => Some(SentenceKind::FixData),
            "GPRMC" | "GNRMC" => Some(SentenceKind::Velocity),
            _ => None,
        }
    }
}

/// Update `fix` from a validated sentence.
///
/// Returns the kind applied, or `None` if the sentence is not GGA/RMC
/// (the fix is then untouched).
pub fn apply(fix: &mut RawFix, sentence: &Sentence<'_>) -> Option<SentenceKind> {
    let kind = SentenceKind::from_tag(sentence.tag())?;
    let fields = split_fields(sentence);

    match kind {
        SentenceKind::FixData => apply_gga(fix, &fields),
        SentenceKind::Velocity => apply_rmc(fix, &fields),
    }

    Some(kind)
}

/// Positional fields; missing trailing fields read as empty.
struct Fields<'a> {
    tokens: [&'a str; MAX_FIELDS],
}

impl<'a> Fields<'a> {
    #[inline]
    fn get(&self, idx: usize) -> &'a str {
        self.tokens.get(idx).copied().unwrap_or("")
    }
}

fn split_fields<'a>(sentence: &Sentence<'a>) -> Fields<'a> {
    let mut tokens = [""; MAX_FIELDS];
    for (slot, token) in tokens.iter_mut().zip(sentence.fields()) {
        *slot = token;
    }
    Fields { tokens }
}

fn apply_gga(fix: &mut RawFix, fields: &Fields<'_>) {
    fix.hdop = parse_f32(fields.get(GGA_HDOP));

    // Satellite count tracks even without a fix, so "searching" shows progress
    let sats = fields.get(GGA_SATELLITES);
    if !sats.is_empty() {
        fix.satellites = parse_satellites(sats);
    }

    let lat = fields.get(GGA_LAT);
    if !lat.is_empty() && fix.satellites > 0 {
        fix.fix_valid = true;
        fix.latitude = nmea_to_decimal(lat, fields.get(GGA_LAT_HEMI));
        fix.longitude = nmea_to_decimal(fields.get(GGA_LON), fields.get(GGA_LON_HEMI));
        fix.altitude = parse_f32(fields.get(GGA_ALTITUDE));
    } else {
        fix.fix_valid = false;
    }
}

fn apply_rmc(fix: &mut RawFix, fields: &Fields<'_>) {
    if fields.get(RMC_STATUS) == "A" {
        fix.speed_kph = parse_f32(fields.get(RMC_SPEED_KNOTS)) * KNOTS_TO_KPH;
        fix.course = parse_f32(fields.get(RMC_COURSE));
    } else {
        // Void: stale motion must not outlive the fix
        fix.speed_kph = 0.0;
        fix.course = 0.0;
    }
}

/// Convert `DDMM.mmmm` / `DDDMM.mmmm` to signed decimal degrees.
///
/// `S` and `W` hemispheres are negative. An empty field yields 0.
pub fn nmea_to_decimal(field: &str, hemisphere: &str) -> f32 {
    if field.is_empty() {
        return 0.0;
    }

    let value = parse_f64(field);
    let degrees = (value / 100.0) as i32 as f64;
    let minutes = value - degrees * 100.0;
    let decimal = degrees + minutes / 60.0;

    match hemisphere.as_bytes().first() {
        Some(b'S') | Some(b'W') => -decimal as f32,
        _ => decimal as f32,
    }
}

// `str::parse` accepts "nan" and "inf"; those read as zero like any other
// non-numeric text.
#[inline]
fn parse_f32(field: &str) -> f32 {
    field
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[inline]
fn parse_f64(field: &str) -> f64 {
    field
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

#[inline]
fn parse_satellites(field: &str) -> u8 {
    field
        .trim()
        .parse::<u32>()
        .map(|n| n.min(u8::MAX as u32) as u8)
        .unwrap_or(0)
}
