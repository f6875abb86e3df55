//! `log` backend setup on top of `env_logger`.
//!
//! Level names and destinations match the `--log-level` / `--logger`
//! switches of the binaries. `CRITICAL` has no `log` counterpart and is
//! treated as `error`.

use std::fmt;
use std::str::FromStr;

use env_logger::{Builder, Target};
use log::LevelFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Critical,
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    pub fn filter(self) -> LevelFilter {
        match self {
            LogLevel::Critical | LogLevel::Error => LevelFilter::Error,
            LogLevel::Warning => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogDestination {
    Stdout,
    Stderr,
}

/// Unrecognised `--log-level` or `--logger` value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownLogSetting(pub String);

impl fmt::Display for UnknownLogSetting {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log setting: {}", self.0)
    }
}

impl std::error::Error for UnknownLogSetting {}

impl FromStr for LogLevel {
    type Err = UnknownLogSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "CRITICAL" => Ok(Self::Critical),
            "ERROR" => Ok(Self::Error),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "INFO" => Ok(Self::Info),
            "DEBUG" => Ok(Self::Debug),
            _ => Err(UnknownLogSetting(s.to_owned())),
        }
    }
}

impl FromStr for LogDestination {
    type Err = UnknownLogSetting;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "STDOUT" => Ok(Self::Stdout),
            "STDERR" => Ok(Self::Stderr),
            _ => Err(UnknownLogSetting(s.to_owned())),
        }
    }
}

impl From<LogDestination> for Target {
    fn from(dest: LogDestination) -> Self {
        match dest {
            LogDestination::Stdout => Target::Stdout,
            LogDestination::Stderr => Target::Stderr,
        }
    }
}

/// `env_logger` builder for the given switches.
pub fn builder(level: LogLevel, dest: LogDestination) -> Builder {
    let mut builder = Builder::new();
    builder
        .filter_level(level.filter())
        .target(dest.into())
        .format_timestamp_millis();
    builder
}

/// Install the global `log` backend.
pub fn init(level: LogLevel, dest: LogDestination) -> Result<(), log::SetLoggerError> {
    builder(level, dest).try_init()
}
