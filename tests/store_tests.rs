//! Shared fix store tests

use std::sync::atomic::{AtomicBool, Ordering};

use gps_lora_beacon::{DisplayFix, RawFix, SharedFixStore};

fn fix_for(i: u32) -> DisplayFix {
    let v = i as f32;
    DisplayFix {
        raw: RawFix {
            fix_valid: i % 2 == 0,
            latitude: v,
            longitude: -v,
            altitude: v * 2.0,
            speed_kph: v * 3.0,
            course: v * 4.0,
            hdop: v * 5.0,
            satellites: (i % 251) as u8,
        },
        display_latitude: v,
        display_longitude: -v,
        is_moving: i % 2 == 0,
    }
}

/// Every field was written by the same `fix_for` call.
fn is_consistent(fix: &DisplayFix) -> bool {
    let v = fix.raw.latitude;
    let i = v as u32;
    fix.raw.longitude == -v
        && fix.raw.altitude == v * 2.0
        && fix.raw.speed_kph == v * 3.0
        && fix.raw.course == v * 4.0
        && fix.raw.hdop == v * 5.0
        && fix.raw.satellites == (i % 251) as u8
        && fix.raw.fix_valid == (i % 2 == 0)
        && fix.display_latitude == v
        && fix.display_longitude == -v
        && fix.is_moving == (i % 2 == 0)
}

#[test]
fn test_initial_snapshot_is_empty() {
    let store = SharedFixStore::new();
    let (fix, generation) = store.snapshot_with_generation();
    assert_eq!(fix, DisplayFix::EMPTY);
    assert_eq!(generation, 0);
    assert!(!fix.has_fix());
}

#[test]
fn test_publish_replaces_whole_record() {
    let store = SharedFixStore::new();
    let mut publisher = store.take_publisher().unwrap();

    publisher.publish(fix_for(10));
    publisher.publish(fix_for(11));

    let (fix, generation) = store.snapshot_with_generation();
    assert_eq!(fix, fix_for(11));
    assert_eq!(generation, 2);
}

#[test]
fn test_snapshots_never_torn() {
    let store = SharedFixStore::new();
    let mut publisher = store.take_publisher().unwrap();
    let done = AtomicBool::new(false);

    std::thread::scope(|s| {
        s.spawn(|| {
            for i in 1..=20_000 {
                publisher.publish(fix_for(i));
            }
            done.store(true, Ordering::Release);
        });

        for _ in 0..2 {
            s.spawn(|| {
                let mut last_generation = 0;
                while !done.load(Ordering::Acquire) {
                    let (fix, generation) = store.snapshot_with_generation();
                    if generation == 0 {
                        assert_eq!(fix, DisplayFix::EMPTY);
                        continue;
                    }
                    assert!(is_consistent(&fix), "torn snapshot: {:?}", fix);
                    assert!(generation >= last_generation);
                    last_generation = generation;
                }
            });
        }
    });

    assert_eq!(store.snapshot(), fix_for(20_000));
}
