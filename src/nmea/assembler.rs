//! Byte stream to candidate sentence.

/// Line buffer capacity. Longer lines are discarded.
///
/// NMEA limits sentences to 82 characters; the margin covers
/// proprietary sentences some receivers emit regardless of PMTK314.
pub const SENTENCE_CAPACITY: usize = 256;

/// Fixed-capacity line assembler.
///
/// Bytes accumulate until a `\r` or `\n`; the bytes since the previous
/// terminator are then returned as a candidate sentence and the buffer
/// restarts. The terminator itself is never stored, and empty lines
/// (the `\n` of `\r\n`) produce nothing.
///
/// If a byte would exceed capacity the partial line is discarded and the
/// buffer restarts from empty. The tail of the oversized line then forms a
/// candidate that fails validation (no leading `$`), so the next complete
/// sentence is accepted again.
///
/// O(1) per byte, no allocation.
pub struct SentenceAssembler<const N: usize = SENTENCE_CAPACITY> {
    buf: [u8; N],
    len: usize,
    overflows: u32,
}

impl<const N: usize> SentenceAssembler<N> {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; N],
            len: 0,
            overflows: 0,
        }
    }

    /// Feed one byte. Returns a candidate sentence when `byte` ends a line.
    ///
    /// The returned slice borrows the internal buffer and is only valid
    /// until the next call.
    #[inline]
    pub fn feed(&mut self, byte: u8) -> Option<&[u8]> {
        if byte == b'\r' || byte == b'\n' {
            let line_len = self.len;
            self.len = 0;
            if line_len == 0 {
                return None;
            }
            return Some(&self.buf[..line_len]);
        }

        if self.len >= N {
            self.len = 0;
            self.overflows = self.overflows.wrapping_add(1);
            return None;
        }

        self.buf[self.len] = byte;
        self.len += 1;
        None
    }

    /// Bytes currently buffered (never exceeds `N`).
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Lines discarded for exceeding capacity.
    #[inline]
    pub fn overflows(&self) -> u32 {
        self.overflows
    }

    /// Drop any partial line (e.g. after a baud rate change).
    #[inline]
    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<const N: usize> Default for SentenceAssembler<N> {
    fn default() -> Self {
        Self::new()
    }
}
