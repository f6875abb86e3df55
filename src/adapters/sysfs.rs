//! Kernel attribute writers.
//!
//! | Writer                 | How the value reaches the attribute        |
//! |------------------------|--------------------------------------------|
//! | `SysfsWriter`          | open (bounded retry) + single full write   |
//! | `HelperWriter`         | `<helper> <path> <value>` as argv, no shell|
//!
//! The helper variant exists for deployments where the daemon lacks write
//! permission on the LP5562 firmware attributes and a privileged wrapper
//! performs the write on its behalf.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use log::{debug, warn};

use crate::adapters::utils::{RetryPolicy, retry};
use crate::app::ports::AttributeWriter;
use crate::config::PathsConfig;
use crate::error::ApplyError;

/// Direct attribute writes.
#[derive(Debug, Clone, Default)]
pub struct SysfsWriter {
    policy: RetryPolicy,
}

impl SysfsWriter {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AttributeWriter for SysfsWriter {
    fn write_attr(&mut self, path: &Path, value: &str) -> Result<(), ApplyError> {
        let mut file = retry(
            self.policy,
            || OpenOptions::new().write(true).open(path),
            |_| true,
        )
        .map_err(|source| ApplyError::Open {
            path: path.display().to_string(),
            source,
        })?;
        file.write_all(value.as_bytes())
            .map_err(|source| ApplyError::Attribute {
                path: path.display().to_string(),
                source,
            })?;
        debug!("{} <- {}", path.display(), value);
        Ok(())
    }
}

/// Attribute writes delegated to a privileged helper program.
#[derive(Debug, Clone)]
pub struct HelperWriter {
    helper: PathBuf,
}

impl HelperWriter {
    pub fn new(helper: impl Into<PathBuf>) -> Self {
        Self {
            helper: helper.into(),
        }
    }
}

impl AttributeWriter for HelperWriter {
    fn write_attr(&mut self, path: &Path, value: &str) -> Result<(), ApplyError> {
        let program = self.helper.display().to_string();
        let status = Command::new(&self.helper)
            .arg(path)
            .arg(value)
            .stdin(Stdio::null())
            .status()
            .map_err(|e| ApplyError::Helper {
                program: program.clone(),
                detail: e.to_string(),
            })?;
        if !status.success() {
            warn!("{} {} {} exited with {}", program, path.display(), value, status);
            return Err(ApplyError::Helper {
                program,
                detail: format!("exited with {status}"),
            });
        }
        Ok(())
    }
}

/// Either writer, chosen from configuration.
#[derive(Debug, Clone)]
pub enum AnyWriter {
    Direct(SysfsWriter),
    Helper(HelperWriter),
}

impl AnyWriter {
    pub fn from_config(paths: &PathsConfig) -> Self {
        match &paths.attribute_helper {
            Some(helper) => Self::Helper(HelperWriter::new(helper)),
            None => Self::Direct(SysfsWriter::new()),
        }
    }
}

impl AttributeWriter for AnyWriter {
    fn write_attr(&mut self, path: &Path, value: &str) -> Result<(), ApplyError> {
        match self {
            Self::Direct(w) => w.write_attr(path, value),
            Self::Helper(w) => w.write_attr(path, value),
        }
    }
}
