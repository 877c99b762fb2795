//! Acquisition context (Core 0).
//!
//! One `step` drains whatever the receiver UART holds right now and never
//! waits for more:
//!
//! ```text
//! ByteSource ─▶ SentenceAssembler ─▶ validate ─▶ parser::apply ─▶ RawFix
//!                                                     │ (RMC)
//!                                                     ▼
//!                                   StabilityFilter ─▶ FixPublisher
//! ```

use crate::config::{AcquisitionConfig, FilterConfig};
use crate::filter::{FilterEvent, StabilityFilter};
use crate::fix::RawFix;
use crate::logging::DiagStream;
use crate::nmea::{self, SentenceAssembler, SentenceKind};
use crate::store::FixPublisher;
use crate::{diag_debug, diag_info};

/// Non-blocking byte input (the receiver UART).
pub trait ByteSource {
    /// True if at least one byte can be read without waiting.
    fn is_readable(&mut self) -> bool;

    /// Read one byte, `None` if nothing is available.
    fn read_byte(&mut self) -> Option<u8>;
}

/// Input counters. Malformed input is dropped silently and only counted here.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AcquisitionStats {
    pub bytes: u32,
    /// Checksum-valid sentences of any kind.
    pub sentences: u32,
    pub checksum_failures: u32,
    pub overflows: u32,
    /// Valid sentences that are neither GGA nor RMC.
    pub unknown_kinds: u32,
    /// GGA sentences applied.
    pub fix_updates: u32,
    /// RMC sentences applied; each one is a filter reading.
    pub readings: u32,
}

pub struct Acquisition<'a> {
    assembler: SentenceAssembler,
    fix: RawFix,
    filter: StabilityFilter,
    publisher: FixPublisher<'a>,
    log: &'a DiagStream,
    config: AcquisitionConfig,
    stats: AcquisitionStats,
    last_event: Option<FilterEvent>,
}

impl<'a> Acquisition<'a> {
    pub fn new(
        publisher: FixPublisher<'a>,
        log: &'a DiagStream,
        filter: FilterConfig,
        config: AcquisitionConfig,
    ) -> Self {
        Self {
            assembler: SentenceAssembler::new(),
            fix: RawFix::default(),
            filter: StabilityFilter::new(filter),
            publisher,
            log,
            config,
            stats: AcquisitionStats::default(),
            last_event: None,
        }
    }

    /// Drain the currently available input.
    ///
    /// Returns the number of bytes consumed. Bounded by
    /// `AcquisitionConfig::max_bytes_per_step`.
    pub fn step<S: ByteSource + ?Sized>(&mut self, source: &mut S, now_us: i64) -> usize {
        let mut consumed = 0;
        while consumed < self.config.max_bytes_per_step && source.is_readable() {
            let Some(byte) = source.read_byte() else {
                break;
            };
            consumed += 1;
            self.process_byte(byte, now_us);
        }
        self.stats.bytes = self.stats.bytes.wrapping_add(consumed as u32);
        consumed
    }

    /// Feed one byte through the pipeline.
    pub fn process_byte(&mut self, byte: u8, now_us: i64) {
        let Some(line) = self.assembler.feed(byte) else {
            self.stats.overflows = self.assembler.overflows();
            return;
        };

        let Some(sentence) = nmea::validate(line) else {
            self.stats.checksum_failures = self.stats.checksum_failures.wrapping_add(1);
            return;
        };
        self.stats.sentences = self.stats.sentences.wrapping_add(1);

        match nmea::apply(&mut self.fix, &sentence) {
            Some(SentenceKind::FixData) => {
                self.stats.fix_updates = self.stats.fix_updates.wrapping_add(1);
            }
            Some(SentenceKind::Velocity) => {
                self.stats.readings = self.stats.readings.wrapping_add(1);
                self.evaluate(now_us);
            }
            None => {
                self.stats.unknown_kinds = self.stats.unknown_kinds.wrapping_add(1);
            }
        }
    }

    /// RMC closes a fix epoch: filter, publish, report.
    ///
    /// A suppressed fix is not published; the store keeps the last trusted
    /// record (or the empty one on a cold start).
    fn evaluate(&mut self, now_us: i64) {
        let event = self.filter.update(&self.fix);
        if !matches!(event, FilterEvent::Suppressed { .. }) {
            self.publisher.publish(self.filter.current());
        }
        self.last_event = Some(event);

        match event {
            FilterEvent::Searching { reading, satellites } => {
                diag_info!(self.log, now_us, "[{}] Searching... (Sats: {})", reading, satellites);
            }
            FilterEvent::Suppressed { reading, hdop } => {
                diag_debug!(self.log, now_us, "[{}] HDOP {:.1} too high, holding", reading, hdop);
            }
            FilterEvent::Updated { reading, fix } => {
                diag_info!(
                    self.log,
                    now_us,
                    "[{}] {} | {:.6}, {:.6} | {:.1} kph",
                    reading,
                    if fix.is_moving { "MOVING" } else { "STATIC" },
                    fix.display_latitude,
                    fix.display_longitude,
                    fix.raw.speed_kph
                );
            }
        }
    }

    /// Drop any partial sentence (after a baud rate change).
    pub fn reset_input(&mut self) {
        self.assembler.clear();
    }

    /// Raw aggregate as of the last sentence.
    #[inline]
    pub fn raw_fix(&self) -> &RawFix {
        &self.fix
    }

    #[inline]
    pub fn filter(&self) -> &StabilityFilter {
        &self.filter
    }

    /// Result of the most recent filter evaluation.
    #[inline]
    pub fn last_event(&self) -> Option<FilterEvent> {
        self.last_event
    }

    #[inline]
    pub fn stats(&self) -> AcquisitionStats {
        self.stats
    }
}
