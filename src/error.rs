//! Unified error types for the LED controller.
//!
//! Every public operation returns [`Result`]. Storage and hardware failures
//! keep their own enums so the message carries the failing path and call
//! site, while [`LedError::kind`] collapses them into the four result kinds
//! reported to callers.

use core::fmt;
use std::io;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible LED operation funnels into this type.
#[derive(Debug)]
pub enum LedError {
    /// Bad endpoint id, enable flag, timing, count or on/off string.
    InvalidParam(&'static str),
    /// Disabled LED, or an action the endpoint does not support.
    OperationNotSupported(&'static str),
    /// Record store failure.
    Storage(StoreError),
    /// Hardware push failure.
    Apply(ApplyError),
    /// Another configuration request is in progress.
    Busy,
}

/// Result kinds visible at the command surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    Ok,
    InvalidParam,
    OperationNotSupported,
    Unknown,
    Busy,
}

impl ResultKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "OK",
            Self::InvalidParam => "INVALID_PARAM",
            Self::OperationNotSupported => "OPERATION_NOT_SUPPORTED",
            Self::Unknown => "UNKNOWN",
            Self::Busy => "BUSY",
        }
    }

    /// Kind of an arbitrary operation result.
    pub fn of<T>(result: &Result<T>) -> Self {
        match result {
            Ok(_) => Self::Ok,
            Err(e) => e.kind(),
        }
    }
}

impl fmt::Display for ResultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl LedError {
    pub fn kind(&self) -> ResultKind {
        match self {
            Self::InvalidParam(_) => ResultKind::InvalidParam,
            Self::OperationNotSupported(_) => ResultKind::OperationNotSupported,
            Self::Storage(_) | Self::Apply(_) => ResultKind::Unknown,
            Self::Busy => ResultKind::Busy,
        }
    }
}

impl fmt::Display for LedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidParam(msg) => write!(f, "invalid parameter: {msg}"),
            Self::OperationNotSupported(msg) => write!(f, "operation not supported: {msg}"),
            Self::Storage(e) => write!(f, "storage: {e}"),
            Self::Apply(e) => write!(f, "apply: {e}"),
            Self::Busy => write!(f, "LED controller busy"),
        }
    }
}

impl std::error::Error for LedError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Storage(e) => Some(e),
            Self::Apply(e) => Some(e),
            _ => None,
        }
    }
}

impl From<StoreError> for LedError {
    fn from(e: StoreError) -> Self {
        Self::Storage(e)
    }
}

impl From<ApplyError> for LedError {
    fn from(e: ApplyError) -> Self {
        Self::Apply(e)
    }
}

// ---------------------------------------------------------------------------
// Record store errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum StoreError {
    /// An OS call on the record file failed.
    Io {
        context: &'static str,
        path: String,
        source: io::Error,
    },
    /// The exclusive lock stayed held by someone else through every retry.
    LockContended { path: String },
    /// The file exists but is not exactly one record long.
    SizeMismatch {
        path: String,
        expected: usize,
        actual: u64,
    },
    /// The file ended early or its payload does not decode.
    Corrupt { path: String },
    /// Leading format byte is not one this build understands.
    UnsupportedFormat { path: String, version: u8 },
}

impl StoreError {
    pub(crate) fn io(context: &'static str, path: &std::path::Path, source: io::Error) -> Self {
        Self::Io {
            context,
            path: path.display().to_string(),
            source,
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io {
                context,
                path,
                source,
            } => write!(f, "{context} {path}: {source}"),
            Self::LockContended { path } => write!(f, "lock on {path} still held after retries"),
            Self::SizeMismatch {
                path,
                expected,
                actual,
            } => write!(f, "{path} is {actual} bytes, expected {expected}"),
            Self::Corrupt { path } => write!(f, "{path} is corrupt"),
            Self::UnsupportedFormat { path, version } => {
                write!(f, "{path} has unsupported format version {version}")
            }
        }
    }
}

impl std::error::Error for StoreError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Apply errors
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum ApplyError {
    /// Device or attribute file could not be opened after retries.
    Open { path: String, source: io::Error },
    /// An I2C transaction failed.
    Bus { op: &'static str, detail: String },
    /// Writing a sysfs attribute failed.
    Attribute { path: String, source: io::Error },
    /// An external helper could not be run or exited unsuccessfully.
    Helper { program: String, detail: String },
    /// Engine program text is not upper-case hex of even length.
    InvalidProgram,
    /// Engine program does not fit in the chip's instruction memory.
    ProgramOverflow { len: usize },
    /// The operation has no implementation on this platform.
    Unsupported(&'static str),
}

impl fmt::Display for ApplyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { path, source } => write!(f, "open {path}: {source}"),
            Self::Bus { op, detail } => write!(f, "i2c {op}: {detail}"),
            Self::Attribute { path, source } => write!(f, "write {path}: {source}"),
            Self::Helper { program, detail } => write!(f, "helper {program}: {detail}"),
            Self::InvalidProgram => write!(f, "engine program is not valid hex"),
            Self::ProgramOverflow { len } => {
                write!(f, "engine program of {len} hex chars exceeds instruction memory")
            }
            Self::Unsupported(what) => write!(f, "{what} is not supported on this platform"),
        }
    }
}

impl std::error::Error for ApplyError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Open { source, .. } | Self::Attribute { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, LedError>;
