//! Link fault record shared between cores.
//!
//! Radio failures never stop the beacon: the attempt is dropped and the
//! next cycle tries again. What survives is this record, read back as a
//! [`FaultSnapshot`] for the periodic link health line.

use core::fmt;
use core::sync::atomic::{AtomicU32, AtomicU8, Ordering};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum TxFault {
    None = 0,
    /// Payload wider than the radio frame; hardware untouched.
    Oversized = 1,
    /// Radio rejected a command. Detail is the failing step code.
    Command = 2,
    /// No TX_DONE in time. Detail is the last IRQ status word.
    Timeout = 3,
}

impl TxFault {
    /// Unknown values read as `None`.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => TxFault::Oversized,
            2 => TxFault::Command,
            3 => TxFault::Timeout,
            _ => TxFault::None,
        }
    }
}

/// Written only by the transmit context; `snapshot` is safe from anywhere.
///
/// The link counts as faulted while `streak` is non-zero, so a success
/// only has to reset one word.
pub struct FaultState {
    last: AtomicU8,
    detail: AtomicU32,
    total: AtomicU32,
    streak: AtomicU32,
}

impl FaultState {
    pub const fn new() -> Self {
        Self {
            last: AtomicU8::new(TxFault::None as u8),
            detail: AtomicU32::new(0),
            total: AtomicU32::new(0),
            streak: AtomicU32::new(0),
        }
    }

    pub fn record_failure(&self, fault: TxFault, detail: u32) {
        self.last.store(fault as u8, Ordering::Relaxed);
        self.detail.store(detail, Ordering::Relaxed);
        self.total.fetch_add(1, Ordering::Relaxed);
        // Publishes last/detail to readers that observe the new streak
        self.streak.fetch_add(1, Ordering::Release);
    }

    /// Ends the current streak. The last fault and the total stay readable.
    pub fn record_success(&self) {
        self.streak.store(0, Ordering::Release);
    }

    pub fn snapshot(&self) -> FaultSnapshot {
        let streak = self.streak.load(Ordering::Acquire);
        FaultSnapshot {
            last: TxFault::from_u8(self.last.load(Ordering::Relaxed)),
            detail: self.detail.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
            streak,
        }
    }
}

impl Default for FaultState {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FaultSnapshot {
    /// Most recent fault, even if a success has since ended the streak.
    pub last: TxFault,
    pub detail: u32,
    /// Failures since boot.
    pub total: u32,
    /// Failures since the last successful transmit.
    pub streak: u32,
}

impl FaultSnapshot {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.streak > 0
    }
}

impl fmt::Display for FaultSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_active() {
            write!(
                f,
                "DOWN {:?} x{} (detail 0x{:X}, {} since boot)",
                self.last, self.streak, self.detail, self.total
            )
        } else {
            write!(f, "ok ({} faults since boot)", self.total)
        }
    }
}
