//! Device-state machine driving the indicator LEDs.
//!
//! ```text
//!            ┌──────────────┐ incompatible ┌──────────────┐
//!            │   BOOT_UP    ├─────────────▶│ INCORRECT_XW │ (terminal)
//!            └──┬────┬────┬─┘              └──────────────┘
//!      pairing  │    │    │ connected ∧ provisioned
//!               ▼    │    ▼
//!   ┌───────────────┐│ ┌──────────────────┐ voice ┌─────────────┐
//!   │ READY_TO_PAIR ││ │ WORKING_NORMALLY ├──────▶│ 2_WAY_VOICE │
//!   └───────────────┘│ └──────────────────┘◀──────┴─────────────┘
//!                    ▼
//!         ┌────────────────────┐
//!         │ TROUBLE_CONNECTING │
//!         └────────────────────┘
//! ```
//!
//! Every state has exactly one successor function, selected by a `match`
//! over the closed [`LedState`] enum, so the table is total by construction.
//! Successors are pure functions of a [`StatusSnapshot`].

pub mod context;
pub mod daemon;

use context::StatusSnapshot;
use log::info;

// ---------------------------------------------------------------------------
// State identity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LedState {
    BootUp,
    IncorrectXw,
    ReadyToPair,
    TroubleConnecting,
    NotProvisioned,
    WorkingNormally,
    TwoWayVoice,
    FactoryDownloadMode,
}

impl LedState {
    pub const ALL: [Self; 8] = [
        Self::BootUp,
        Self::IncorrectXw,
        Self::ReadyToPair,
        Self::TroubleConnecting,
        Self::NotProvisioned,
        Self::WorkingNormally,
        Self::TwoWayVoice,
        Self::FactoryDownloadMode,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::BootUp => "BOOT_UP",
            Self::IncorrectXw => "INCORRECT_XW",
            Self::ReadyToPair => "READY_TO_PAIR",
            Self::TroubleConnecting => "TROUBLE_CONNECTING",
            Self::NotProvisioned => "NOT_PROVISIONED",
            Self::WorkingNormally => "WORKING_NORMALLY",
            Self::TwoWayVoice => "2_WAY_VOICE",
            Self::FactoryDownloadMode => "FACTORY_DOWNLOAD_MODE",
        }
    }

    /// Successor of `self` given the current device status.
    pub fn next(self, s: &StatusSnapshot) -> Self {
        match self {
            Self::BootUp => from_boot_up(s),
            Self::IncorrectXw | Self::FactoryDownloadMode => self,
            Self::ReadyToPair => from_ready_to_pair(s),
            Self::NotProvisioned => from_not_provisioned(s),
            Self::TroubleConnecting => from_trouble_connecting(s),
            Self::WorkingNormally => from_working_normally(s),
            Self::TwoWayVoice => from_two_way_voice(s),
        }
    }
}

fn from_boot_up(s: &StatusSnapshot) -> LedState {
    if s.incompatible_hw {
        LedState::IncorrectXw
    } else if s.booting {
        LedState::BootUp
    } else if s.pairing && !s.provisioned {
        LedState::ReadyToPair
    } else if s.provisioned && !s.connected {
        LedState::TroubleConnecting
    } else if s.connected && s.provisioned {
        LedState::WorkingNormally
    } else {
        LedState::BootUp
    }
}

fn from_ready_to_pair(s: &StatusSnapshot) -> LedState {
    if s.ble_pairing || (s.pairing && !s.provisioned) {
        LedState::ReadyToPair
    } else if s.provisioned && !s.connected {
        LedState::TroubleConnecting
    } else if s.connected && s.provisioned {
        LedState::WorkingNormally
    } else {
        LedState::ReadyToPair
    }
}

fn from_not_provisioned(s: &StatusSnapshot) -> LedState {
    if s.pairing {
        LedState::ReadyToPair
    } else if s.connected && !s.provisioned {
        LedState::NotProvisioned
    } else if s.connected {
        LedState::WorkingNormally
    } else {
        LedState::TroubleConnecting
    }
}

fn from_trouble_connecting(s: &StatusSnapshot) -> LedState {
    if s.ble_pairing {
        LedState::ReadyToPair
    } else if s.connected {
        LedState::WorkingNormally
    } else {
        LedState::TroubleConnecting
    }
}

fn from_working_normally(s: &StatusSnapshot) -> LedState {
    if s.ble_pairing {
        LedState::ReadyToPair
    } else if !s.connected && !s.voice_active {
        LedState::TroubleConnecting
    } else if s.voice_active {
        LedState::TwoWayVoice
    } else {
        LedState::WorkingNormally
    }
}

fn from_two_way_voice(s: &StatusSnapshot) -> LedState {
    if s.connected && !s.voice_active {
        LedState::WorkingNormally
    } else if s.provisioned && !s.connected {
        LedState::TroubleConnecting
    } else {
        LedState::TwoWayVoice
    }
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

/// Tracks the current state across polling cycles.
#[derive(Debug)]
pub struct LedFsm {
    current: LedState,
    tick_count: u64,
    state_entry_tick: u64,
}

impl LedFsm {
    pub fn new(initial: LedState) -> Self {
        Self {
            current: initial,
            tick_count: 0,
            state_entry_tick: 0,
        }
    }

    pub fn current_state(&self) -> LedState {
        self.current
    }

    pub fn ticks_in_current_state(&self) -> u64 {
        self.tick_count - self.state_entry_tick
    }

    /// Advance one cycle. Returns the new state when it changed.
    pub fn tick(&mut self, status: &StatusSnapshot) -> Option<LedState> {
        self.tick_count += 1;
        let next = self.current.next(status);
        if next == self.current {
            return None;
        }
        info!("LED state: {} -> {}", self.current.name(), next.name());
        self.current = next;
        self.state_entry_tick = self.tick_count;
        Some(next)
    }
}
