//! LED record data model.
//!
//! One [`LedRecord`] exists per [`LedEndpoint`]. It holds the desired
//! hardware state between a configuration call and the apply that pushes
//! it to the chip.

use serde::{Deserialize, Serialize};

use crate::error::{LedError, Result};

// ---------------------------------------------------------------------------
// Engine timing limits
// ---------------------------------------------------------------------------

/// Largest step count a single wait instruction can hold.
pub const MAX_STEP: u32 = 63;
/// Engine step clock in tenths of a millisecond (15.6 ms).
pub const STEP_TIME: u32 = 156;
/// Largest repeat count the branch instruction can encode.
pub const MAX_LOOP: u32 = 63;
/// Longest accepted duration in tenths of a millisecond (about 61.47 s).
///
/// Stays below the `MAX_STEP * STEP_TIME * MAX_LOOP` product (619,164), so
/// every accepted duration quantizes to at most 62 full waits plus a
/// remainder.
pub const MAX_DURATION_TENTHS: u64 = 614_754;
/// Largest sequence repeat count: the first pass plus `MAX_LOOP` repeats.
pub const MAX_REPEAT: u32 = MAX_LOOP + 1;

/// Reject durations the engine cannot encode.
pub fn validate_duration_ms(ms: u32) -> Result<()> {
    if u64::from(ms) * 10 > MAX_DURATION_TENTHS {
        return Err(LedError::InvalidParam("duration exceeds engine limit"));
    }
    Ok(())
}

/// Reject sequence repeat counts the engine cannot encode.
pub fn validate_repeat_count(count: u32) -> Result<()> {
    if count > MAX_REPEAT {
        return Err(LedError::InvalidParam("repeat count exceeds engine limit"));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Endpoints
// ---------------------------------------------------------------------------

/// The three controllable LED groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum LedEndpoint {
    CameraFrontPanel = 1,
    XwFrontPanel = 2,
    CameraIr = 3,
}

impl LedEndpoint {
    pub const ALL: [Self; 3] = [Self::CameraFrontPanel, Self::XwFrontPanel, Self::CameraIr];

    /// Numeric id used in record file names and at the command surface.
    pub const fn id(self) -> u8 {
        self as u8
    }

    /// Map a raw id from the command surface; unknown ids never reach storage.
    pub fn from_id(id: u8) -> Result<Self> {
        match id {
            1 => Ok(Self::CameraFrontPanel),
            2 => Ok(Self::XwFrontPanel),
            3 => Ok(Self::CameraIr),
            _ => Err(LedError::InvalidParam("unknown LED endpoint")),
        }
    }

    /// Front panels have an RGB chip; the IR illuminator is single channel.
    pub const fn supports_color(self) -> bool {
        matches!(self, Self::CameraFrontPanel | Self::XwFrontPanel)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::CameraFrontPanel => "CAMERA_FRONT_PANEL",
            Self::XwFrontPanel => "XW_FRONT_PANEL",
            Self::CameraIr => "CAMERA_IR",
        }
    }
}

// ---------------------------------------------------------------------------
// Channels and actions
// ---------------------------------------------------------------------------

/// Colour channel index into [`LedRecord::channels`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red = 0,
    Green = 1,
    Blue = 2,
}

impl Channel {
    pub const ALL: [Self; 3] = [Self::Red, Self::Green, Self::Blue];
}

/// Drive settings for one colour channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Constant-current register value (colour mixing).
    pub current: u8,
    /// Level used while the channel is lit.
    pub pwm: u8,
}

impl ChannelConfig {
    pub const fn new(current: u8, pwm: u8) -> Self {
        Self { current, pwm }
    }
}

/// Latest requested light behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionDescriptor {
    On,
    Off,
    Blink {
        on_time_ms: u32,
        off_time_ms: u32,
    },
    /// `repeat_count` blinks, a long `off2` pause, then start over.
    SequenceBlink {
        on_time_ms: u32,
        off1_time_ms: u32,
        repeat_count: u32,
        off2_time_ms: u32,
    },
}

impl ActionDescriptor {
    /// Check every duration and count against the engine limits.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::On | Self::Off => Ok(()),
            Self::Blink {
                on_time_ms,
                off_time_ms,
            } => {
                validate_duration_ms(on_time_ms)?;
                validate_duration_ms(off_time_ms)
            }
            Self::SequenceBlink {
                on_time_ms,
                off1_time_ms,
                repeat_count,
                off2_time_ms,
            } => {
                validate_duration_ms(on_time_ms)?;
                validate_duration_ms(off1_time_ms)?;
                validate_repeat_count(repeat_count)?;
                validate_duration_ms(off2_time_ms)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// Persisted configuration of one endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedRecord {
    pub enabled: bool,
    /// Red, green, blue. Carried but unused by the IR endpoint.
    pub channels: [ChannelConfig; 3],
    pub ir_brightness: u8,
    pub action: ActionDescriptor,
}

/// Power-on colour of both front panels.
const FRONT_PANEL_DEFAULT: [ChannelConfig; 3] = [
    ChannelConfig::new(255, 53),
    ChannelConfig::new(198, 80),
    ChannelConfig::new(160, 60),
];

const IR_DEFAULT_BRIGHTNESS: u8 = 80;

impl LedRecord {
    /// Hard-coded factory state for `endpoint`.
    pub fn defaults_for(endpoint: LedEndpoint) -> Self {
        match endpoint {
            LedEndpoint::CameraFrontPanel | LedEndpoint::XwFrontPanel => Self {
                enabled: true,
                channels: FRONT_PANEL_DEFAULT,
                ir_brightness: 0,
                action: ActionDescriptor::On,
            },
            LedEndpoint::CameraIr => Self {
                enabled: true,
                channels: [ChannelConfig::default(); 3],
                ir_brightness: IR_DEFAULT_BRIGHTNESS,
                action: ActionDescriptor::On,
            },
        }
    }

    pub fn channel(&self, ch: Channel) -> ChannelConfig {
        self.channels[ch as usize]
    }
}
