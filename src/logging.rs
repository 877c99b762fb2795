//! Non-blocking diagnostic logging for GpsLoraBeacon.
//!
//! # Architecture
//!
//! ```text
//! Core 0 (acquisition)    DiagStream           Log drain task
//! ────────────────────    ──────────           ──────────────
//!
//! diag_info!() ─────────▶ [L0][L1][L2] ──────▶ stdout (locked per line)
//!                          lock-free
//! Core 1 (transmit)        ring buffer
//! diag_warn!() ─────────▶ [L0][L1] ──────────▶
//! ```
//!
//! - One stream per execution context, one producer per stream
//! - Push never blocks; a full ring drops the message and counts it
//! - The drain side may block on the output transport, producers never do

use core::cell::UnsafeCell;
use core::sync::atomic::{AtomicU32, Ordering};

/// Bytes of message text stored per entry; the rest is cut off.
pub const MAX_MSG_LEN: usize = 96;

/// Entries per stream. Power of two.
pub const LOG_BUFFER_SIZE: usize = 64;

/// Log level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
    Trace = 4,
}

impl LogLevel {
    /// Convert to string for output.
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "ERROR",
            LogLevel::Warn => "WARN",
            LogLevel::Info => "INFO",
            LogLevel::Debug => "DEBUG",
            LogLevel::Trace => "TRACE",
        }
    }
}

/// A single log entry.
#[derive(Clone, Copy)]
#[repr(C)]
pub struct LogEntry {
    /// Timestamp in microseconds.
    pub timestamp_us: i64,
    pub level: LogLevel,
    /// Number of valid bytes in `msg`.
    pub len: u8,
    /// UTF-8 text, `len` bytes valid.
    pub msg: [u8; MAX_MSG_LEN],
}

impl LogEntry {
    pub const EMPTY: Self = Self {
        timestamp_us: 0,
        level: LogLevel::Info,
        len: 0,
        msg: [0; MAX_MSG_LEN],
    };

    /// Message text, or a placeholder if the bytes are not UTF-8.
    pub fn message(&self) -> &str {
        core::str::from_utf8(&self.msg[..self.len as usize]).unwrap_or("<invalid utf8>")
    }
}

impl Default for LogEntry {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Lock-free SPSC diagnostic ring.
///
/// # Safety
///
/// One producer context per stream (the acquisition loop or the transmit
/// loop) and one consumer (the drain task). The producer publishes a slot by
/// storing `write_idx` with `Release` only after the entry is fully written,
/// so the consumer never reads a half-written entry.
pub struct DiagStream<const N: usize = LOG_BUFFER_SIZE> {
    entries: UnsafeCell<[LogEntry; N]>,
    write_idx: AtomicU32,
    read_idx: AtomicU32,
    dropped: AtomicU32,
}

// SAFETY: single producer and single consumer, coordinated through
// write_idx/read_idx with Acquire/Release ordering.
unsafe impl<const N: usize> Sync for DiagStream<N> {}
unsafe impl<const N: usize> Send for DiagStream<N> {}

impl<const N: usize> DiagStream<N> {
    const MASK: usize = N - 1;

    pub const fn new() -> Self {
        assert!(N.is_power_of_two(), "DiagStream capacity must be a power of two");

        Self {
            entries: UnsafeCell::new([LogEntry::EMPTY; N]),
            write_idx: AtomicU32::new(0),
            read_idx: AtomicU32::new(0),
            dropped: AtomicU32::new(0),
        }
    }

    /// Push a log entry. Never blocks.
    ///
    /// Returns `false` if the ring was full and the message was dropped.
    #[inline]
    pub fn push(&self, timestamp_us: i64, level: LogLevel, msg: &[u8]) -> bool {
        let write = self.write_idx.load(Ordering::Relaxed);
        let read = self.read_idx.load(Ordering::Acquire);

        if write.wrapping_sub(read) >= N as u32 {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return false;
        }

        let idx = (write as usize) & Self::MASK;
        let len = msg.len().min(MAX_MSG_LEN);

        // SAFETY: slot idx is outside the consumer's readable range until
        // write_idx is advanced below.
        unsafe {
            let entry = &mut (*self.entries.get())[idx];
            entry.timestamp_us = timestamp_us;
            entry.level = level;
            entry.len = len as u8;
            entry.msg[..len].copy_from_slice(&msg[..len]);
        }

        self.write_idx.store(write.wrapping_add(1), Ordering::Release);
        true
    }

    /// Take the oldest entry, if any.
    #[inline]
    pub fn drain(&self) -> Option<LogEntry> {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);

        if read == write {
            return None;
        }

        let idx = (read as usize) & Self::MASK;

        // SAFETY: single consumer; the producer will not touch this slot
        // until read_idx moves past it.
        let entry = unsafe { (*self.entries.get())[idx] };

        self.read_idx.store(read.wrapping_add(1), Ordering::Release);
        Some(entry)
    }

    #[inline]
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn reset_dropped(&self) {
        self.dropped.store(0, Ordering::Relaxed);
    }

    #[inline]
    pub fn has_entries(&self) -> bool {
        self.pending() != 0
    }

    /// Number of entries waiting to be drained.
    #[inline]
    pub fn pending(&self) -> u32 {
        let read = self.read_idx.load(Ordering::Relaxed);
        let write = self.write_idx.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }
}

impl<const N: usize> Default for DiagStream<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncating `core::fmt::Write` adapter over a byte slice.
pub(crate) struct BufWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BufWriter<'a> {
    pub(crate) fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.pos
    }
}

impl core::fmt::Write for BufWriter<'_> {
    /// Copies as much of `s` as fits, cut on a char boundary so the
    /// buffer always holds valid UTF-8.
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        let mut take = s.len().min(self.buf.len() - self.pos);
        while !s.is_char_boundary(take) {
            take -= 1;
        }
        self.buf[self.pos..][..take].copy_from_slice(&s.as_bytes()[..take]);
        self.pos += take;
        Ok(())
    }
}

/// Render `args` into `buf`, truncating what does not fit. Returns the
/// rendered length.
#[inline]
pub fn format_to_buffer(buf: &mut [u8], args: core::fmt::Arguments<'_>) -> usize {
    let mut writer = BufWriter::new(buf);
    let _ = core::fmt::Write::write_fmt(&mut writer, args);
    writer.len()
}

/// Push a formatted message onto a [`DiagStream`]. Never blocks.
///
/// ```ignore
/// diag_log!(Info, ACQ_LOG_STREAM, now_us, "sats={}", sats);
/// ```
#[macro_export]
macro_rules! diag_log {
    ($level:ident, $stream:expr, $timestamp:expr, $($fmt:tt)+) => {{
        let mut msg = [0u8; $crate::logging::MAX_MSG_LEN];
        let n = $crate::logging::format_to_buffer(&mut msg, format_args!($($fmt)+));
        $stream.push($timestamp, $crate::logging::LogLevel::$level, &msg[..n]);
    }};
}

#[macro_export]
macro_rules! diag_error {
    ($($t:tt)+) => { $crate::diag_log!(Error, $($t)+) };
}

#[macro_export]
macro_rules! diag_warn {
    ($($t:tt)+) => { $crate::diag_log!(Warn, $($t)+) };
}

#[macro_export]
macro_rules! diag_info {
    ($($t:tt)+) => { $crate::diag_log!(Info, $($t)+) };
}

#[macro_export]
macro_rules! diag_debug {
    ($($t:tt)+) => { $crate::diag_log!(Debug, $($t)+) };
}

/// Maximum verbosity.
#[macro_export]
macro_rules! diag_trace {
    ($($t:tt)+) => { $crate::diag_log!(Trace, $($t)+) };
}
