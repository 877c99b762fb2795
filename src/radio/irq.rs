//! TX_DONE completion flag.
//!
//! Single writer (the radio DIO interrupt handler), single reader (the
//! transmit wait loop). No other state is shared with the ISR.
//!
//! The interrupt is the primary completion path. The wait loop also polls
//! the radio IRQ register, but only as a backstop for a missed edge.

use core::sync::atomic::{AtomicBool, Ordering};

pub struct TxDoneFlag {
    done: AtomicBool,
}

impl TxDoneFlag {
    pub const fn new() -> Self {
        Self {
            done: AtomicBool::new(false),
        }
    }

    /// Mark transmission complete. ISR-safe.
    #[inline]
    pub fn signal(&self) {
        self.done.store(true, Ordering::Release);
    }

    /// Clear before starting a new attempt.
    #[inline]
    pub fn reset(&self) {
        self.done.store(false, Ordering::Release);
    }

    #[inline]
    pub fn is_set(&self) -> bool {
        self.done.load(Ordering::Acquire)
    }
}

impl Default for TxDoneFlag {
    fn default() -> Self {
        Self::new()
    }
}
