//! Daemon configuration.
//!
//! All device paths, status markers, colour tables and blink timings live
//! here. Loaded once at startup from an optional JSON file and passed by
//! reference into the record store, hardware router and manager.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::app::commands::{LedColor, LedOp};
use crate::app::record::{ActionDescriptor, ChannelConfig};

/// Device paths and addresses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Directory holding the per-endpoint record files
    pub record_dir: PathBuf,
    /// Record file name prefix, followed by the endpoint id
    pub record_prefix: String,
    /// LP5562 sysfs device directory (engine control attributes)
    pub lp5562_sysfs_dir: PathBuf,
    /// I2C character device the LP5562 sits on
    pub i2c_device: PathBuf,
    /// LP5562 7-bit address
    pub i2c_address: u8,
    /// Presence of this file selects the AW210xx driver
    pub aw210xx_marker: PathBuf,
    /// AW210xx packed colour/brightness attribute
    pub aw210xx_rgbcolor: PathBuf,
    /// AW210xx blink pattern helper script
    pub aw210xx_helper: PathBuf,
    /// Pid of the running blink helper, shared by every process that
    /// applies to the AW210xx
    pub aw210xx_pid_file: PathBuf,
    /// Drive the XW front panel from the local chip. Off on the camera,
    /// where the XW record is persisted only and the XW unit lights itself
    pub xw_panel_local: bool,
    /// IR backlight brightness attribute
    pub ir_brightness: PathBuf,
    /// Privileged helper invoked as `<helper> <path> <value>` for sysfs
    /// writes; direct writes when unset
    pub attribute_helper: Option<PathBuf>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            record_dir: PathBuf::from("/mnt/ramdisk/tmp"),
            record_prefix: ".LED_config_id_".into(),
            lp5562_sysfs_dir: PathBuf::from("/sys/devices/e8000000.apb/e8007000.i2c/i2c-2/2-0030"),
            i2c_device: PathBuf::from("/dev/i2c-2"),
            i2c_address: 0x30,
            aw210xx_marker: PathBuf::from("/tmp/.led_aw210xx"),
            aw210xx_rgbcolor: PathBuf::from(
                "/sys/devices/e8000000.apb/e8007000.i2c/i2c-2/2-0020/leds/aw210xx_led/rgbcolor",
            ),
            aw210xx_helper: PathBuf::from("/etc/led_functions.sh"),
            aw210xx_pid_file: PathBuf::from("/mnt/ramdisk/tmp/.led_aw210xx_blink.pid"),
            xw_panel_local: false,
            ir_brightness: PathBuf::from("/sys/class/backlight/0.pwm_bl/brightness"),
            attribute_helper: None,
        }
    }
}

/// Status probe inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusConfig {
    pub wps_marker: PathBuf,
    pub ble_pairing_marker: PathBuf,
    pub provisioned_markers: Vec<PathBuf>,
    pub bootup_marker: PathBuf,
    pub incorrect_hardware_marker: PathBuf,
    /// Kernel routing table used to find the default gateway
    pub route_table: PathBuf,
    pub ping_count: u32,
    pub ping_timeout_secs: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            wps_marker: PathBuf::from("/tmp/.wps_state_working"),
            ble_pairing_marker: PathBuf::from("/tmp/.prvn_ble_pairing"),
            provisioned_markers: vec![
                PathBuf::from("/opt/.prvn_complete"),
                PathBuf::from("/opt/.prvn_icontrol_complete"),
            ],
            bootup_marker: PathBuf::from("/tmp/.bootup_complete"),
            incorrect_hardware_marker: PathBuf::from("/tmp/.incorrect_hardware"),
            route_table: PathBuf::from("/proc/net/route"),
            ping_count: 3,
            ping_timeout_secs: 5,
        }
    }
}

// ---------------------------------------------------------------------------
// Colour and operation tables
// ---------------------------------------------------------------------------

/// Current and pwm for red, green, blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorSetting {
    pub current: [u8; 3],
    pub pwm: [u8; 3],
}

impl ColorSetting {
    pub const fn new(current: [u8; 3], pwm: [u8; 3]) -> Self {
        Self { current, pwm }
    }

    pub fn channels(&self) -> [ChannelConfig; 3] {
        core::array::from_fn(|i| ChannelConfig::new(self.current[i], self.pwm[i]))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorTable {
    pub amber: ColorSetting,
    pub white: ColorSetting,
    pub red: ColorSetting,
    pub green: ColorSetting,
    pub blue: ColorSetting,
}

impl Default for ColorTable {
    fn default() -> Self {
        Self {
            amber: ColorSetting::new([63, 63, 0], [255, 153, 0]),
            white: ColorSetting::new([65, 85, 85], [255, 233, 181]),
            red: ColorSetting::new([255, 0, 0], [115, 0, 0]),
            green: ColorSetting::new([0, 255, 0], [0, 122, 0]),
            blue: ColorSetting::new([0, 0, 255], [0, 0, 150]),
        }
    }
}

impl ColorTable {
    pub fn get(&self, color: LedColor) -> ColorSetting {
        match color {
            LedColor::Amber => self.amber,
            LedColor::White => self.white,
            LedColor::Red => self.red,
            LedColor::Green => self.green,
            LedColor::Blue => self.blue,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlinkTiming {
    pub on_time_ms: u32,
    pub off_time_ms: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SequenceTiming {
    pub on_time_ms: u32,
    pub off1_time_ms: u32,
    pub repeat_count: u32,
    pub off2_time_ms: u32,
}

/// Timings behind each blinking [`LedOp`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OperationTable {
    pub blink: BlinkTiming,
    pub slow_blink: BlinkTiming,
    pub fast_blink: BlinkTiming,
    pub double_blink: SequenceTiming,
}

impl Default for OperationTable {
    fn default() -> Self {
        Self {
            blink: BlinkTiming {
                on_time_ms: 500,
                off_time_ms: 1000,
            },
            slow_blink: BlinkTiming {
                on_time_ms: 200,
                off_time_ms: 400,
            },
            fast_blink: BlinkTiming {
                on_time_ms: 100,
                off_time_ms: 100,
            },
            double_blink: SequenceTiming {
                on_time_ms: 200,
                off1_time_ms: 100,
                repeat_count: 2,
                off2_time_ms: 1000,
            },
        }
    }
}

impl OperationTable {
    /// Action an operation programs; `None` for solid and off.
    pub fn action_for(&self, op: LedOp) -> Option<ActionDescriptor> {
        let blink = |t: BlinkTiming| ActionDescriptor::Blink {
            on_time_ms: t.on_time_ms,
            off_time_ms: t.off_time_ms,
        };
        match op {
            LedOp::SolidLight | LedOp::NoLight => None,
            LedOp::Blink => Some(blink(self.blink)),
            LedOp::SlowBlink => Some(blink(self.slow_blink)),
            LedOp::FastBlink => Some(blink(self.fast_blink)),
            LedOp::DoubleBlink => {
                let t = self.double_blink;
                Some(ActionDescriptor::SequenceBlink {
                    on_time_ms: t.on_time_ms,
                    off1_time_ms: t.off1_time_ms,
                    repeat_count: t.repeat_count,
                    off2_time_ms: t.off2_time_ms,
                })
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    pub paths: PathsConfig,
    pub status: StatusConfig,
    /// Status polling period (milliseconds)
    pub poll_interval_ms: u32,
    /// FIFO carrying `key=value` status notifications
    pub notify_fifo: Option<PathBuf>,
    pub camera_colors: ColorTable,
    pub xw_colors: ColorTable,
    pub operations: OperationTable,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            paths: PathsConfig::default(),
            status: StatusConfig::default(),
            poll_interval_ms: 1000,
            notify_fifo: None,
            camera_colors: ColorTable::default(),
            xw_colors: ColorTable::default(),
            operations: OperationTable::default(),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "read config: {e}"),
            Self::Parse(e) => write!(f, "parse config: {e}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Parse(e) => Some(e),
            Self::ValidationFailed(_) => None,
        }
    }
}

impl DaemonConfig {
    /// Read and validate `path`, or validated defaults when `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let cfg = match path {
            Some(p) => {
                let text = fs::read_to_string(p).map_err(ConfigError::Io)?;
                serde_json::from_str(&text).map_err(ConfigError::Parse)?
            }
            None => Self::default(),
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject out-of-range values instead of clamping them.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(100..=10_000).contains(&self.poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "poll_interval_ms must be 100–10000",
            ));
        }
        if self.paths.record_prefix.is_empty() || self.paths.record_prefix.contains('/') {
            return Err(ConfigError::ValidationFailed(
                "record_prefix must be a non-empty file name",
            ));
        }
        if self.paths.i2c_address > 0x7F {
            return Err(ConfigError::ValidationFailed(
                "i2c_address must be a 7-bit address",
            ));
        }
        if !(1..=10).contains(&self.status.ping_count) {
            return Err(ConfigError::ValidationFailed("ping_count must be 1–10"));
        }
        if !(1..=30).contains(&self.status.ping_timeout_secs) {
            return Err(ConfigError::ValidationFailed(
                "ping_timeout_secs must be 1–30",
            ));
        }
        for op in LedOp::ALL {
            if let Some(action) = self.operations.action_for(op) {
                action.validate().map_err(|_| {
                    ConfigError::ValidationFailed("operation timing exceeds engine limits")
                })?;
            }
        }
        Ok(())
    }
}
