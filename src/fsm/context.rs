//! Status inputs the state machine runs on.
//!
//! `StatusSnapshot` is sampled once per polling cycle. The three flags fed by
//! asynchronous notifications live in [`StatusFlags`], shared between the
//! listener thread and the polling loop through atomics.

use std::sync::atomic::{AtomicBool, Ordering};

/// Device predicates for one polling cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Default gateway answers ping.
    pub connected: bool,
    /// WPS or BLE pairing mode is active.
    pub pairing: bool,
    /// BLE pairing session reported by the notification channel.
    pub ble_pairing: bool,
    /// Provisioning has completed.
    pub provisioned: bool,
    /// Boot-complete marker not yet written.
    pub booting: bool,
    /// Two-way audio session in progress.
    pub voice_active: bool,
    /// Attached hardware is not a supported model.
    pub incompatible_hw: bool,
    /// Secondary (XW) device link is up.
    pub xw_connected: bool,
}

/// Flags written by the notification listener.
#[derive(Debug, Default)]
pub struct StatusFlags {
    ble_pairing: AtomicBool,
    voice_active: AtomicBool,
    xw_connected: AtomicBool,
}

impl StatusFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_ble_pairing(&self, on: bool) {
        self.ble_pairing.store(on, Ordering::Release);
    }

    pub fn set_voice_active(&self, on: bool) {
        self.voice_active.store(on, Ordering::Release);
    }

    pub fn set_xw_connected(&self, on: bool) {
        self.xw_connected.store(on, Ordering::Release);
    }

    pub fn ble_pairing(&self) -> bool {
        self.ble_pairing.load(Ordering::Acquire)
    }

    pub fn voice_active(&self) -> bool {
        self.voice_active.load(Ordering::Acquire)
    }

    pub fn xw_connected(&self) -> bool {
        self.xw_connected.load(Ordering::Acquire)
    }
}
