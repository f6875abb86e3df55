//! File-backed LED record store.
//!
//! One fixed-size file per endpoint, `<dir>/<prefix><id>`. Every access takes
//! an exclusive advisory lock on the file, so separate processes driving the
//! same endpoint never interleave a read-modify-write.
//!
//! ## On-disk format (version 1)
//!
//! ```text
//! byte 0      format version (1)
//! byte 1..    postcard encoding of LedRecord
//! ...64       zero padding
//! ```
//!
//! A file of any other length is treated as absent by
//! [`FileRecordStore::create_if_absent`] and as corrupt by
//! [`FileRecordStore::load`].

use std::fs::{self, File, OpenOptions, TryLockError};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use log::{debug, warn};

use crate::adapters::utils::{RetryPolicy, retry};
use crate::app::record::{LedEndpoint, LedRecord};
use crate::config::PathsConfig;
use crate::error::{Result, StoreError};

/// Exact length of every record file.
pub const RECORD_SIZE: usize = 64;
/// Current format version byte.
pub const FORMAT_VERSION: u8 = 1;

const RECORD_MODE: u32 = 0o666;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Serialize `record` into its fixed-size on-disk image.
pub fn encode_record(record: &LedRecord) -> core::result::Result<[u8; RECORD_SIZE], postcard::Error> {
    let mut buf = [0u8; RECORD_SIZE];
    buf[0] = FORMAT_VERSION;
    postcard::to_slice(record, &mut buf[1..])?;
    Ok(buf)
}

/// Parse a fixed-size on-disk image.
pub fn decode_record(buf: &[u8; RECORD_SIZE], path: &Path) -> core::result::Result<LedRecord, StoreError> {
    if buf[0] != FORMAT_VERSION {
        return Err(StoreError::UnsupportedFormat {
            path: path.display().to_string(),
            version: buf[0],
        });
    }
    postcard::take_from_bytes::<LedRecord>(&buf[1..])
        .map(|(record, _padding)| record)
        .map_err(|_| StoreError::Corrupt {
            path: path.display().to_string(),
        })
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

/// Record store rooted at one runtime directory.
#[derive(Debug, Clone)]
pub struct FileRecordStore {
    dir: PathBuf,
    prefix: String,
    lock_policy: RetryPolicy,
}

impl FileRecordStore {
    pub fn new(dir: impl Into<PathBuf>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            prefix: prefix.into(),
            lock_policy: RetryPolicy::DEFAULT,
        }
    }

    pub fn from_config(paths: &PathsConfig) -> Self {
        Self::new(paths.record_dir.clone(), paths.record_prefix.clone())
    }

    /// Override the lock retry schedule.
    #[must_use]
    pub fn with_lock_policy(mut self, policy: RetryPolicy) -> Self {
        self.lock_policy = policy;
        self
    }

    pub fn path_for(&self, endpoint: LedEndpoint) -> PathBuf {
        self.dir.join(format!("{}{}", self.prefix, endpoint.id()))
    }

    /// Create the record with factory defaults unless a correctly sized
    /// one already exists.
    pub fn create_if_absent(&self, endpoint: LedEndpoint) -> Result<()> {
        let path = self.path_for(endpoint);
        match fs::metadata(&path) {
            Ok(meta) if meta.len() == RECORD_SIZE as u64 => {
                debug!("record {} present", path.display());
                return Ok(());
            }
            Ok(meta) => warn!(
                "record {} has size {}, recreating",
                path.display(),
                meta.len()
            ),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(StoreError::io("stat", &path, e).into()),
        }
        self.write_defaults(endpoint, &path)
    }

    /// Overwrite the record with factory defaults.
    pub fn reset(&self, endpoint: LedEndpoint) -> Result<()> {
        let path = self.path_for(endpoint);
        self.write_defaults(endpoint, &path)
    }

    /// Lock and read the record. The returned handle keeps the lock until
    /// it is dropped, so the caller can [`LockedRecord::store`] a modified
    /// copy without another writer slipping in.
    pub fn load(&self, endpoint: LedEndpoint) -> Result<(LockedRecord, LedRecord)> {
        let path = self.path_for(endpoint);
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|e| StoreError::io("open", &path, e))?;
        let mut handle = LockedRecord::acquire(file, path, self.lock_policy)?;
        let record = handle.read()?;
        Ok((handle, record))
    }

    /// Load, let `f` modify, store. `f` returning an error leaves the file
    /// untouched.
    pub fn update<F>(&self, endpoint: LedEndpoint, f: F) -> Result<LedRecord>
    where
        F: FnOnce(&mut LedRecord) -> Result<()>,
    {
        let (mut handle, mut record) = self.load(endpoint)?;
        f(&mut record)?;
        handle.store(&record)?;
        Ok(record)
    }

    /// Locked read with no write-back.
    pub fn read(&self, endpoint: LedEndpoint) -> Result<LedRecord> {
        self.load(endpoint).map(|(_handle, record)| record)
    }

    fn write_defaults(&self, endpoint: LedEndpoint, path: &Path) -> Result<()> {
        let file = open_for_create(path)?;
        let mut handle = LockedRecord::acquire(file, path.to_path_buf(), self.lock_policy)?;
        handle.store(&LedRecord::defaults_for(endpoint))?;
        debug!("record {} written with defaults", path.display());
        Ok(())
    }
}

#[cfg(unix)]
fn open_for_create(path: &Path) -> Result<File> {
    use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

    let file = OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .mode(RECORD_MODE)
        .open(path)
        .map_err(|e| StoreError::io("create", path, e))?;
    // umask may have stripped group/other bits
    file.set_permissions(fs::Permissions::from_mode(RECORD_MODE))
        .map_err(|e| StoreError::io("chmod", path, e))?;
    Ok(file)
}

#[cfg(not(unix))]
fn open_for_create(path: &Path) -> Result<File> {
    let _ = RECORD_MODE;
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| StoreError::io("create", path, e).into())
}

// ---------------------------------------------------------------------------
// Locked handle
// ---------------------------------------------------------------------------

/// Open record file holding the exclusive lock. Unlocks on drop.
#[derive(Debug)]
pub struct LockedRecord {
    file: File,
    path: PathBuf,
}

impl LockedRecord {
    fn acquire(file: File, path: PathBuf, policy: RetryPolicy) -> core::result::Result<Self, StoreError> {
        retry(
            policy,
            || file.try_lock(),
            |e| matches!(e, TryLockError::WouldBlock),
        )
        .map_err(|e| match e {
            TryLockError::WouldBlock => StoreError::LockContended {
                path: path.display().to_string(),
            },
            TryLockError::Error(source) => StoreError::io("lock", &path, source),
        })?;
        Ok(Self { file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&mut self) -> core::result::Result<LedRecord, StoreError> {
        let len = self
            .file
            .metadata()
            .map_err(|e| StoreError::io("stat", &self.path, e))?
            .len();
        if len != RECORD_SIZE as u64 {
            return Err(StoreError::SizeMismatch {
                path: self.path.display().to_string(),
                expected: RECORD_SIZE,
                actual: len,
            });
        }

        let mut buf = [0u8; RECORD_SIZE];
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| StoreError::io("seek", &self.path, e))?;
        // read_exact loops over short reads and retries EINTR
        self.file.read_exact(&mut buf).map_err(|e| {
            if e.kind() == io::ErrorKind::UnexpectedEof {
                StoreError::Corrupt {
                    path: self.path.display().to_string(),
                }
            } else {
                StoreError::io("read", &self.path, e)
            }
        })?;
        decode_record(&buf, &self.path)
    }

    /// Write `record` over the whole file.
    pub fn store(&mut self, record: &LedRecord) -> Result<()> {
        let image = encode_record(record).map_err(|_| StoreError::Corrupt {
            path: self.path.display().to_string(),
        })?;
        self.file
            .seek(SeekFrom::Start(0))
            .map_err(|e| StoreError::io("seek", &self.path, e))?;
        self.file
            .write_all(&image)
            .map_err(|e| StoreError::io("write", &self.path, e))?;
        self.file
            .set_len(RECORD_SIZE as u64)
            .map_err(|e| StoreError::io("truncate", &self.path, e))?;
        Ok(())
    }
}

impl Drop for LockedRecord {
    fn drop(&mut self) {
        if let Err(e) = self.file.unlock() {
            warn!("unlock {}: {}", self.path.display(), e);
        }
    }
}
