//! Linux I2C bus implementing `embedded_hal::i2c::I2c`.
//!
//! ## Dual-target design
//!
//! On Linux: wraps an `/dev/i2c-N` character device via `i2cdev`, one
//! combined `I2C_RDWR` transfer per transaction with the target address on
//! every message.
//! Elsewhere: opening the bus fails with `Unsupported`, so the rest of the
//! crate still builds and tests on a development host.

use std::path::{Path, PathBuf};

use embedded_hal::i2c::{ErrorKind, ErrorType, I2c, Operation, SevenBitAddress};
use log::debug;

use crate::adapters::utils::{RetryPolicy, retry};
use crate::app::ports::I2cProvider;
use crate::error::ApplyError;

/// Failure of a bus transfer.
#[derive(Debug)]
pub struct I2cBusError(pub String);

impl embedded_hal::i2c::Error for I2cBusError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

impl core::fmt::Display for I2cBusError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

// ── Bus ───────────────────────────────────────────────────────

pub struct LinuxI2cBus {
    #[cfg(target_os = "linux")]
    bus: i2cdev::linux::LinuxI2CBus,
}

impl LinuxI2cBus {
    #[cfg(target_os = "linux")]
    pub fn open(path: &Path) -> Result<Self, std::io::Error> {
        use i2cdev::linux::LinuxI2CError;

        let bus = i2cdev::linux::LinuxI2CBus::new(path).map_err(|e| match e {
            LinuxI2CError::Io(io) => io,
            other => std::io::Error::other(other.to_string()),
        })?;
        Ok(Self { bus })
    }

    #[cfg(not(target_os = "linux"))]
    pub fn open(path: &Path) -> Result<Self, std::io::Error> {
        Err(std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("{} requires Linux i2c-dev", path.display()),
        ))
    }
}

impl ErrorType for LinuxI2cBus {
    type Error = I2cBusError;
}

#[cfg(target_os = "linux")]
impl I2c<SevenBitAddress> for LinuxI2cBus {
    fn transaction(
        &mut self,
        address: SevenBitAddress,
        operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        use i2cdev::core::{I2CMessage, I2CTransfer};
        use i2cdev::linux::LinuxI2CMessage;

        let mut messages: Vec<LinuxI2CMessage<'_>> = operations
            .iter_mut()
            .map(|op| match op {
                Operation::Write(w) => LinuxI2CMessage::write(w),
                Operation::Read(r) => LinuxI2CMessage::read(r),
            })
            .map(|m| m.with_address(u16::from(address)))
            .collect();
        self.bus
            .transfer(&mut messages)
            .map(drop)
            .map_err(|e| I2cBusError(e.to_string()))
    }
}

#[cfg(not(target_os = "linux"))]
impl I2c<SevenBitAddress> for LinuxI2cBus {
    fn transaction(
        &mut self,
        _address: SevenBitAddress,
        _operations: &mut [Operation<'_>],
    ) -> Result<(), Self::Error> {
        Err(I2cBusError("i2c-dev not available".into()))
    }
}

// ── Provider ──────────────────────────────────────────────────

/// Opens the configured bus device with bounded retries.
#[derive(Debug, Clone)]
pub struct LinuxI2cProvider {
    device: PathBuf,
    policy: RetryPolicy,
}

impl LinuxI2cProvider {
    pub fn new(device: impl Into<PathBuf>) -> Self {
        Self {
            device: device.into(),
            policy: RetryPolicy::DEFAULT,
        }
    }
}

impl I2cProvider for LinuxI2cProvider {
    type Bus = LinuxI2cBus;

    fn open(&mut self) -> Result<Self::Bus, ApplyError> {
        let bus = retry(self.policy, || LinuxI2cBus::open(&self.device), |e| {
            e.kind() != std::io::ErrorKind::Unsupported
        })
        .map_err(|source| ApplyError::Open {
            path: self.device.display().to_string(),
            source,
        })?;
        debug!("opened {}", self.device.display());
        Ok(bus)
    }
}
