//! Stability (anti-drift) filter.
//!
//! Consumer receivers wander by several meters while stationary. The
//! filter locks the display position unless ground speed says the unit is
//! moving, and ignores fixes whose HDOP is too poor to trust.
//!
//! Evaluated once per RMC sentence, the receiver's per-fix heartbeat.
//!
//! ```text
//! !fix_valid ──────────────▶ Searching   (display untouched)
//! hdop > max_hdop ─────────▶ Suppressed  (nothing changes, raw included)
//! speed >= min_moving ─────▶ Updated, moving, display = raw
//! otherwise ───────────────▶ Updated, static, display locked
//!                            (seeded from raw on the first update)
//! ```

use crate::config::FilterConfig;
use crate::fix::{DisplayFix, RawFix};

/// Outcome of one filter evaluation.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FilterEvent {
    /// No valid fix yet. Satellite count still reported.
    Searching { reading: u32, satellites: u8 },
    /// Valid fix, but HDOP above threshold. Nothing changed.
    Suppressed { reading: u32, hdop: f32 },
    /// Display position re-evaluated.
    Updated { reading: u32, fix: DisplayFix },
}

impl FilterEvent {
    /// Sequence number of the evaluation (1-based).
    pub fn reading(&self) -> u32 {
        match *self {
            FilterEvent::Searching { reading, .. }
            | FilterEvent::Suppressed { reading, .. }
            | FilterEvent::Updated { reading, .. } => reading,
        }
    }
}

/// Anti-drift state machine over [`DisplayFix`].
pub struct StabilityFilter {
    config: FilterConfig,
    state: DisplayFix,
    /// Display position has been set at least once.
    seeded: bool,
    readings: u32,
}

impl StabilityFilter {
    pub fn new(config: FilterConfig) -> Self {
        Self {
            config,
            state: DisplayFix::EMPTY,
            seeded: false,
            readings: 0,
        }
    }

    /// Evaluate the latest raw fix.
    ///
    /// A fix over the HDOP limit leaves the filtered state untouched, raw
    /// part included. Otherwise the raw part follows `raw` and only the
    /// display position and moving flag are gated.
    pub fn update(&mut self, raw: &RawFix) -> FilterEvent {
        self.readings = self.readings.wrapping_add(1);
        let reading = self.readings;

        if !raw.fix_valid {
            self.state.raw = *raw;
            return FilterEvent::Searching {
                reading,
                satellites: raw.satellites,
            };
        }

        if raw.hdop > self.config.max_hdop {
            return FilterEvent::Suppressed {
                reading,
                hdop: raw.hdop,
            };
        }

        self.state.raw = *raw;

        if raw.speed_kph >= self.config.min_moving_speed_kph {
            self.state.is_moving = true;
            self.lock_display_to(raw);
        } else {
            self.state.is_moving = false;
            if !self.seeded {
                self.lock_display_to(raw);
            }
        }

        FilterEvent::Updated {
            reading,
            fix: self.state,
        }
    }

    #[inline]
    fn lock_display_to(&mut self, raw: &RawFix) {
        self.state.display_latitude = raw.latitude;
        self.state.display_longitude = raw.longitude;
        self.seeded = true;
    }

    /// Current filtered fix (what gets published).
    #[inline]
    pub fn current(&self) -> DisplayFix {
        self.state
    }

    /// Number of evaluations so far.
    #[inline]
    pub fn readings(&self) -> u32 {
        self.readings
    }

    #[inline]
    pub fn config(&self) -> &FilterConfig {
        &self.config
    }
}

impl Default for StabilityFilter {
    fn default() -> Self {
        Self::new(FilterConfig::default())
    }
}
