//! Inbound commands to the LED manager.
//!
//! These are the high-level requests the state machine and the command-line
//! harness send to [`LedManager`](super::manager::LedManager).

use core::fmt;
use core::str::FromStr;

use crate::app::record::LedEndpoint;
use crate::fsm::LedState;

/// Light pattern the manager programs onto an endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedOp {
    SolidLight,
    Blink,
    SlowBlink,
    DoubleBlink,
    FastBlink,
    NoLight,
}

impl LedOp {
    pub const ALL: [Self; 6] = [
        Self::SolidLight,
        Self::Blink,
        Self::SlowBlink,
        Self::DoubleBlink,
        Self::FastBlink,
        Self::NoLight,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::SolidLight => "SOLID_LIGHT",
            Self::Blink => "BLINK",
            Self::SlowBlink => "SLOW_BLINK",
            Self::DoubleBlink => "DOUBLE_BLINK",
            Self::FastBlink => "FAST_BLINK",
            Self::NoLight => "NO_LIGHT",
        }
    }
}

/// Named colour from the per-panel colour tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedColor {
    Amber,
    White,
    Red,
    Green,
    Blue,
}

impl LedColor {
    pub const ALL: [Self; 5] = [Self::Amber, Self::White, Self::Red, Self::Green, Self::Blue];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Amber => "AMBER",
            Self::White => "WHITE",
            Self::Red => "RED",
            Self::Green => "GREEN",
            Self::Blue => "BLUE",
        }
    }
}

/// Unrecognised name at the command surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownName {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for UnknownName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for UnknownName {}

fn lookup<T: Copy>(
    kind: &'static str,
    s: &str,
    all: &[T],
    name: impl Fn(T) -> &'static str,
) -> Result<T, UnknownName> {
    all.iter()
        .copied()
        .find(|v| name(*v).eq_ignore_ascii_case(s))
        .ok_or_else(|| UnknownName {
            kind,
            value: s.to_owned(),
        })
}

impl FromStr for LedOp {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("operation", s, &Self::ALL, Self::name)
    }
}

impl FromStr for LedColor {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("color", s, &Self::ALL, Self::name)
    }
}

impl FromStr for LedEndpoint {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("LED", s, &Self::ALL, Self::name)
    }
}

impl FromStr for LedState {
    type Err = UnknownName;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        lookup("state", s, &Self::ALL, Self::name)
    }
}

/// Requests the manager can execute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManagerCommand {
    /// Program one endpoint with an operation and colour, then apply.
    SetOp {
        endpoint: LedEndpoint,
        op: LedOp,
        color: LedColor,
    },
    /// Show the pattern for a device state on both front panels.
    SetState(LedState),
}
