//! Monotonic millisecond time source.

/// Millisecond clock used by every blocking wait in the crate.
///
/// `now_ms` wraps at `u32::MAX`; callers compare with `wrapping_sub`.
pub trait Clock {
    /// Milliseconds since boot.
    fn now_ms(&self) -> u32;

    /// Block the calling context for `ms` milliseconds.
    fn delay_ms(&mut self, ms: u32);

    /// Timestamp in microseconds for log entries.
    #[inline]
    fn now_us(&self) -> i64 {
        self.now_ms() as i64 * 1000
    }
}

impl<C: Clock + ?Sized> Clock for &mut C {
    #[inline]
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }

    #[inline]
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }

    #[inline]
    fn now_us(&self) -> i64 {
        (**self).now_us()
    }
}
