//! Diagnostic output drain.
//!
//! Moves entries from the per-core [`DiagStream`]s to a byte sink
//! (stdout on the device). Only the drain side touches the output
//! transport, so both cores log without waiting on it.
//!
//! Format: `[timestamp_us] LEVEL: message\n`

use core::fmt::Write;

use crate::logging::{BufWriter, DiagStream, LogEntry};

/// Formatting buffer size for one output line.
pub const LINE_CAPACITY: usize = 160;

/// Interval between dropped-message reports.
pub const DROPPED_REPORT_INTERVAL_US: i64 = 10_000_000;

/// Format a log entry as one output line.
///
/// Returns the number of bytes written.
pub fn format_log_entry(entry: &LogEntry, buf: &mut [u8]) -> usize {
    let mut writer = BufWriter::new(buf);
    let _ = write!(
        writer,
        "[{:10}] {}: {}\n",
        entry.timestamp_us,
        entry.level.as_str(),
        entry.message()
    );
    writer.len()
}

/// A named stream the drain reads from.
pub struct DrainSource<'a> {
    pub name: &'static str,
    pub stream: &'a DiagStream,
}

/// Drains a fixed set of streams in priority order.
pub struct LogDrain<'a, const S: usize> {
    sources: [DrainSource<'a>; S],
    last_dropped_report_us: i64,
}

impl<'a, const S: usize> LogDrain<'a, S> {
    pub fn new(sources: [DrainSource<'a>; S]) -> Self {
        Self {
            sources,
            last_dropped_report_us: 0,
        }
    }

    /// Write every pending entry to `sink`, then report drops if due.
    ///
    /// `sink` receives one complete line per call. Returns the number of
    /// entries written.
    pub fn drain<F: FnMut(&[u8])>(&mut self, now_us: i64, mut sink: F) -> usize {
        let mut line = [0u8; LINE_CAPACITY];
        let mut written = 0;

        for source in self.sources.iter() {
            while let Some(entry) = source.stream.drain() {
                let len = format_log_entry(&entry, &mut line);
                sink(&line[..len]);
                written += 1;
            }
        }

        if now_us - self.last_dropped_report_us >= DROPPED_REPORT_INTERVAL_US {
            self.report_dropped(&mut line, &mut sink);
            self.last_dropped_report_us = now_us;
        }

        written
    }

    fn report_dropped<F: FnMut(&[u8])>(&self, line: &mut [u8], sink: &mut F) {
        if self.sources.iter().all(|s| s.stream.dropped() == 0) {
            return;
        }

        let mut writer = BufWriter::new(line);
        let _ = write!(writer, "[WARN] Dropped:");
        for source in self.sources.iter() {
            let _ = write!(writer, " {}={}", source.name, source.stream.dropped());
            source.stream.reset_dropped();
        }
        let _ = writer.write_str("\n");
        let len = writer.len();
        sink(&line[..len]);
    }
}
