//! Mock hardware for integration tests.
//!
//! Records every attribute write and I2C transfer so tests can assert on
//! the full command history without touching sysfs or `/dev/i2c-*`.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use camled::adapters::record_file::FileRecordStore;
use camled::app::ports::{AttributeWriter, I2cProvider};
use camled::config::PathsConfig;
use camled::error::ApplyError;
use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation};

// ── Attribute writes ──────────────────────────────────────────

/// Shared log of `(path, value)` writes; clones record into the same log.
#[derive(Debug, Clone, Default)]
pub struct RecordingWriter {
    pub writes: Arc<Mutex<Vec<(PathBuf, String)>>>,
}

#[allow(dead_code)]
impl RecordingWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn take(&self) -> Vec<(PathBuf, String)> {
        std::mem::take(&mut *self.writes.lock().unwrap())
    }

    pub fn values_for(&self, path: &Path) -> Vec<String> {
        self.writes
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, v)| v.clone())
            .collect()
    }
}

impl AttributeWriter for RecordingWriter {
    fn write_attr(&mut self, path: &Path, value: &str) -> Result<(), ApplyError> {
        self.writes
            .lock()
            .unwrap()
            .push((path.to_path_buf(), value.to_owned()));
        Ok(())
    }
}

// ── I2C ───────────────────────────────────────────────────────

#[derive(Debug)]
pub struct MockBusError;

impl embedded_hal::i2c::Error for MockBusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// Bus handed out by [`MockI2c`]; writes land in the provider's log.
pub struct MockBus {
    log: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
}

impl ErrorType for MockBus {
    type Error = MockBusError;
}

impl I2c for MockBus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut log = self.log.lock().unwrap();
        for op in operations {
            match op {
                Operation::Write(bytes) => log.push((address, bytes.to_vec())),
                Operation::Read(buf) => buf.fill(0),
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MockI2c {
    pub transfers: Arc<Mutex<Vec<(u8, Vec<u8>)>>>,
    pub opens: Arc<AtomicU32>,
    pub fail_open: bool,
}

#[allow(dead_code)]
impl MockI2c {
    pub fn transfers(&self) -> Vec<(u8, Vec<u8>)> {
        self.transfers.lock().unwrap().clone()
    }

    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::Relaxed)
    }
}

impl I2cProvider for MockI2c {
    type Bus = MockBus;

    fn open(&mut self) -> Result<Self::Bus, ApplyError> {
        self.opens.fetch_add(1, Ordering::Relaxed);
        if self.fail_open {
            return Err(ApplyError::Open {
                path: "/dev/i2c-mock".into(),
                source: std::io::Error::from(std::io::ErrorKind::NotFound),
            });
        }
        Ok(MockBus {
            log: Arc::clone(&self.transfers),
        })
    }
}

// ── Scratch directories ───────────────────────────────────────

static SEQ: AtomicU32 = AtomicU32::new(0);

/// Fresh, empty directory under the system temp dir.
pub fn scratch_dir(tag: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "camled-it-{}-{}-{}",
        tag,
        std::process::id(),
        SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Paths config with every file rooted in `dir`.
#[allow(dead_code)]
pub fn scratch_paths(dir: &Path) -> PathsConfig {
    PathsConfig {
        record_dir: dir.join("records"),
        record_prefix: ".LED_config_id_".into(),
        lp5562_sysfs_dir: dir.join("lp5562"),
        i2c_device: dir.join("i2c-2"),
        i2c_address: 0x30,
        aw210xx_marker: dir.join(".led_aw210xx"),
        aw210xx_rgbcolor: dir.join("rgbcolor"),
        aw210xx_helper: dir.join("led_functions.sh"),
        aw210xx_pid_file: dir.join("blink.pid"),
        xw_panel_local: false,
        ir_brightness: dir.join("ir_brightness"),
        attribute_helper: None,
    }
}

#[allow(dead_code)]
pub fn scratch_store(dir: &Path) -> FileRecordStore {
    let records = dir.join("records");
    std::fs::create_dir_all(&records).unwrap();
    FileRecordStore::new(records, ".LED_config_id_")
}
