//! Cross-core fix storage.
//!
//! The acquisition core publishes a whole [`DisplayFix`], the transmit core
//! copies it out. `DisplayFix` is far wider than one atomic access, so both
//! sides go through a critical section that covers exactly one struct copy.
//! `critical_section::with` releases on every exit path; there is no manual
//! unlock to forget.
//!
//! Readers get at-most-latest semantics: fixes published between two
//! snapshots are skipped, never interleaved.

use core::cell::Cell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;

use crate::fix::DisplayFix;

/// Latest fix plus the number of publishes that produced it.
#[derive(Clone, Copy, Debug)]
struct Record {
    fix: DisplayFix,
    generation: u32,
}

/// Single shared fix record.
///
/// Create once (typically `static`), hand the [`FixPublisher`] to the
/// acquisition context and `&SharedFixStore` to readers.
pub struct SharedFixStore {
    record: Mutex<Cell<Record>>,
    publisher_taken: AtomicBool,
}

impl SharedFixStore {
    pub const fn new() -> Self {
        Self {
            record: Mutex::new(Cell::new(Record {
                fix: DisplayFix::EMPTY,
                generation: 0,
            })),
            publisher_taken: AtomicBool::new(false),
        }
    }

    /// Claim the write handle. Succeeds once; later calls return `None`,
    /// so there is never more than one producer.
    pub fn take_publisher(&self) -> Option<FixPublisher<'_>> {
        if self.publisher_taken.swap(true, Ordering::AcqRel) {
            None
        } else {
            Some(FixPublisher { store: self })
        }
    }

    /// Copy of the most recently published fix.
    #[inline]
    pub fn snapshot(&self) -> DisplayFix {
        self.snapshot_with_generation().0
    }

    /// Copy of the latest fix and its publish count (0 = never published).
    #[inline]
    pub fn snapshot_with_generation(&self) -> (DisplayFix, u32) {
        let record = critical_section::with(|cs| self.record.borrow(cs).get());
        (record.fix, record.generation)
    }

    #[inline]
    fn install(&self, fix: DisplayFix) {
        critical_section::with(|cs| {
            let cell = self.record.borrow(cs);
            let generation = cell.get().generation.wrapping_add(1);
            cell.set(Record { fix, generation });
        });
    }
}

impl Default for SharedFixStore {
    fn default() -> Self {
        Self::new()
    }
}

/// Exclusive write handle to a [`SharedFixStore`].
pub struct FixPublisher<'a> {
    store: &'a SharedFixStore,
}

impl<'a> FixPublisher<'a> {
    /// Replace the shared fix in its entirety.
    #[inline]
    pub fn publish(&mut self, fix: DisplayFix) {
        self.store.install(fix);
    }

    #[inline]
    pub fn store(&self) -> &'a SharedFixStore {
        self.store
    }
}
