//! Record store tests against real files in a scratch directory.

use std::fs;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use camled::adapters::record_file::{FORMAT_VERSION, FileRecordStore, RECORD_SIZE};
use camled::adapters::utils::RetryPolicy;
use camled::error::StoreError;
use camled::{LedEndpoint, LedError, LedRecord, ResultKind};

use crate::mock_hw::{scratch_dir, scratch_store};

#[test]
fn created_records_are_fixed_size_and_versioned() {
    let dir = scratch_dir("size");
    let store = scratch_store(&dir);
    for ep in LedEndpoint::ALL {
        store.create_if_absent(ep).unwrap();
        let bytes = fs::read(store.path_for(ep)).unwrap();
        assert_eq!(bytes.len(), RECORD_SIZE);
        assert_eq!(bytes[0], FORMAT_VERSION);
        assert_eq!(store.read(ep).unwrap(), LedRecord::defaults_for(ep));
    }
}

#[cfg(unix)]
#[test]
fn records_are_world_writable() {
    use std::os::unix::fs::PermissionsExt;

    let dir = scratch_dir("mode");
    let store = scratch_store(&dir);
    store.create_if_absent(LedEndpoint::XwFrontPanel).unwrap();
    let mode = fs::metadata(store.path_for(LedEndpoint::XwFrontPanel))
        .unwrap()
        .permissions()
        .mode();
    assert_eq!(mode & 0o777, 0o666);
}

#[test]
fn existing_record_survives_init() {
    let dir = scratch_dir("keep");
    let store = scratch_store(&dir);
    store.create_if_absent(LedEndpoint::CameraIr).unwrap();
    store
        .update(LedEndpoint::CameraIr, |r| {
            r.ir_brightness = 7;
            Ok(())
        })
        .unwrap();
    store.create_if_absent(LedEndpoint::CameraIr).unwrap();
    assert_eq!(store.read(LedEndpoint::CameraIr).unwrap().ir_brightness, 7);
}

#[test]
fn wrong_size_is_recreated_by_init_and_rejected_by_load() {
    let dir = scratch_dir("trunc");
    let store = scratch_store(&dir);
    let path = store.path_for(LedEndpoint::CameraFrontPanel);
    fs::write(&path, [1u8; 10]).unwrap();

    let r = store.read(LedEndpoint::CameraFrontPanel);
    assert!(matches!(
        r,
        Err(LedError::Storage(StoreError::SizeMismatch { actual: 10, .. }))
    ));
    assert_eq!(ResultKind::of(&r), ResultKind::Unknown);

    store.create_if_absent(LedEndpoint::CameraFrontPanel).unwrap();
    assert_eq!(fs::metadata(&path).unwrap().len(), RECORD_SIZE as u64);
}

#[test]
fn unknown_version_is_corrupt() {
    let dir = scratch_dir("ver");
    let store = scratch_store(&dir);
    store.create_if_absent(LedEndpoint::CameraFrontPanel).unwrap();
    let path = store.path_for(LedEndpoint::CameraFrontPanel);
    let mut bytes = fs::read(&path).unwrap();
    bytes[0] = 0xEE;
    fs::write(&path, &bytes).unwrap();
    assert!(store.read(LedEndpoint::CameraFrontPanel).is_err());
}

#[test]
fn missing_record_is_an_error_not_a_default() {
    let dir = scratch_dir("missing");
    let store = scratch_store(&dir);
    let r = store.read(LedEndpoint::XwFrontPanel);
    assert_eq!(ResultKind::of(&r), ResultKind::Unknown);
    assert!(!store.path_for(LedEndpoint::XwFrontPanel).exists());
}

#[test]
fn concurrent_updates_are_not_lost() {
    const PER_THREAD: u8 = 50;
    let dir = scratch_dir("race");
    let store = Arc::new(scratch_store(&dir).with_lock_policy(RetryPolicy::ONCE));
    store.create_if_absent(LedEndpoint::CameraIr).unwrap();
    let start = store.read(LedEndpoint::CameraIr).unwrap().ir_brightness;

    let barrier = Arc::new(Barrier::new(2));
    let workers: Vec<_> = (0..2)
        .map(|_| {
            let store = Arc::clone(&store);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                let mut contended = 0u32;
                let mut done = 0;
                while done < PER_THREAD {
                    let r = store.update(LedEndpoint::CameraIr, |rec| {
                        rec.ir_brightness += 1;
                        Ok(())
                    });
                    match r {
                        Ok(_) => done += 1,
                        Err(LedError::Storage(StoreError::LockContended { .. })) => {
                            contended += 1;
                            thread::yield_now();
                        }
                        Err(e) => panic!("update failed: {e}"),
                    }
                }
                contended
            })
        })
        .collect();
    for w in workers {
        w.join().unwrap();
    }

    let end = store.read(LedEndpoint::CameraIr).unwrap().ir_brightness;
    assert_eq!(end, start + 2 * PER_THREAD);
}

/// Caller A holds the lock between its load and store for `hold`, then
/// writes `value`. Returns once A has the lock.
fn hold_then_write(
    store: &Arc<FileRecordStore>,
    hold: Duration,
    value: u8,
) -> thread::JoinHandle<()> {
    let barrier = Arc::new(Barrier::new(2));
    let worker = {
        let store = Arc::clone(store);
        let barrier = Arc::clone(&barrier);
        thread::spawn(move || {
            let (mut handle, mut rec) = store.load(LedEndpoint::CameraIr).unwrap();
            barrier.wait();
            thread::sleep(hold);
            rec.ir_brightness = value;
            handle.store(&rec).unwrap();
        })
    };
    barrier.wait();
    worker
}

#[test]
fn short_hold_is_waited_out_by_lock_retry() {
    let dir = scratch_dir("hold-short");
    let store = Arc::new(scratch_store(&dir));
    store.create_if_absent(LedEndpoint::CameraIr).unwrap();

    let a = hold_then_write(&store, Duration::from_millis(4), 200);
    // default schedule: 3 tries, 5 ms apart
    let (mut handle, mut rec) = store.load(LedEndpoint::CameraIr).unwrap();
    assert_eq!(rec.ir_brightness, 200, "second caller read before the first stored");
    rec.ir_brightness += 1;
    handle.store(&rec).unwrap();
    drop(handle);
    a.join().unwrap();

    assert_eq!(store.read(LedEndpoint::CameraIr).unwrap().ir_brightness, 201);
}

#[test]
fn long_hold_exhausts_lock_retry() {
    let dir = scratch_dir("hold-long");
    let store = Arc::new(scratch_store(&dir));
    store.create_if_absent(LedEndpoint::CameraIr).unwrap();

    let a = hold_then_write(&store, Duration::from_millis(30), 200);
    let r = store.update(LedEndpoint::CameraIr, |rec| {
        rec.ir_brightness = 1;
        Ok(())
    });
    assert!(matches!(
        r,
        Err(LedError::Storage(StoreError::LockContended { .. }))
    ));
    assert_eq!(ResultKind::of(&r), ResultKind::Unknown);
    a.join().unwrap();

    assert_eq!(store.read(LedEndpoint::CameraIr).unwrap().ir_brightness, 200);
}
