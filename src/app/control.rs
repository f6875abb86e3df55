//! LED configuration API.
//!
//! Each mutator is one transaction on the endpoint's record:
//! open, lock, read, check, modify, write, unlock. Parameters are validated
//! before any file is touched. There is no atomicity across calls.
//!
//! A disabled record is frozen: every mutator other than
//! [`LedControl::set_enabled`] fails with `OperationNotSupported` until the
//! endpoint is enabled again.

use log::{debug, info};

use crate::adapters::record_file::FileRecordStore;
use crate::app::ports::LedHardware;
use crate::app::record::{ActionDescriptor, LedEndpoint, LedRecord, validate_duration_ms, validate_repeat_count};
use crate::error::{LedError, Result};

/// Version string reported by the command surface.
pub const API_VERSION: &str = "V1.0.01";

pub fn version() -> &'static str {
    API_VERSION
}

/// Raw enable flag from the command surface; only 0 and 1 are accepted.
pub fn parse_enable(value: i64) -> Result<bool> {
    match value {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(LedError::InvalidParam("enable must be 0 or 1")),
    }
}

/// Exact `"on"` / `"off"`; anything else is rejected.
pub fn parse_on_off(value: &str) -> Result<bool> {
    match value {
        "on" => Ok(true),
        "off" => Ok(false),
        _ => Err(LedError::InvalidParam("on/off must be \"on\" or \"off\"")),
    }
}

fn require_color(endpoint: LedEndpoint, what: &'static str) -> Result<()> {
    if endpoint.supports_color() {
        Ok(())
    } else {
        Err(LedError::OperationNotSupported(what))
    }
}

fn require_enabled(record: &LedRecord) -> Result<()> {
    if record.enabled {
        Ok(())
    } else {
        Err(LedError::OperationNotSupported(
            "LED is disabled, configuration is frozen",
        ))
    }
}

/// Record store plus the hardware that applies it.
pub struct LedControl<H> {
    store: FileRecordStore,
    hardware: H,
}

impl<H: LedHardware> LedControl<H> {
    pub fn new(store: FileRecordStore, hardware: H) -> Self {
        Self { store, hardware }
    }

    pub fn store(&self) -> &FileRecordStore {
        &self.store
    }

    pub fn hardware(&self) -> &H {
        &self.hardware
    }

    pub fn hardware_mut(&mut self) -> &mut H {
        &mut self.hardware
    }

    /// Create the endpoint's record with defaults if it is missing.
    pub fn init(&self, endpoint: LedEndpoint) -> Result<()> {
        debug!("init {}", endpoint.name());
        self.store.create_if_absent(endpoint)
    }

    pub fn reset(&self, endpoint: LedEndpoint) -> Result<()> {
        debug!("reset {}", endpoint.name());
        self.store.reset(endpoint)
    }

    /// Reset every endpoint, stopping at the first failure.
    pub fn reset_all(&self) -> Result<()> {
        LedEndpoint::ALL.into_iter().try_for_each(|ep| self.reset(ep))
    }

    /// Locked read of the current record.
    pub fn record(&self, endpoint: LedEndpoint) -> Result<LedRecord> {
        self.store.read(endpoint)
    }

    pub fn set_enabled(&self, endpoint: LedEndpoint, enabled: bool) -> Result<()> {
        debug!("set_enabled {} {}", endpoint.name(), enabled);
        self.store
            .update(endpoint, |rec| {
                rec.enabled = enabled;
                Ok(())
            })
            .map(drop)
    }

    /// Set the current registers of a front panel.
    pub fn set_color(&self, endpoint: LedEndpoint, r: u8, g: u8, b: u8) -> Result<()> {
        debug!("set_color {} r={} g={} b={}", endpoint.name(), r, g, b);
        require_color(endpoint, "endpoint has no colour channels")?;
        self.store
            .update(endpoint, |rec| {
                require_enabled(rec)?;
                for (ch, current) in rec.channels.iter_mut().zip([r, g, b]) {
                    ch.current = current;
                }
                Ok(())
            })
            .map(drop)
    }

    /// Front panels take one pwm level per channel. The IR endpoint takes
    /// its brightness from `r` and ignores `g` and `b`.
    pub fn set_brightness(&self, endpoint: LedEndpoint, r: u8, g: u8, b: u8) -> Result<()> {
        debug!("set_brightness {} r={} g={} b={}", endpoint.name(), r, g, b);
        self.store
            .update(endpoint, |rec| {
                require_enabled(rec)?;
                if endpoint.supports_color() {
                    for (ch, pwm) in rec.channels.iter_mut().zip([r, g, b]) {
                        ch.pwm = pwm;
                    }
                } else {
                    rec.ir_brightness = r;
                }
                Ok(())
            })
            .map(drop)
    }

    pub fn set_blink(&self, endpoint: LedEndpoint, on_time_ms: u32, off_time_ms: u32) -> Result<()> {
        debug!(
            "set_blink {} on={}ms off={}ms",
            endpoint.name(),
            on_time_ms,
            off_time_ms
        );
        require_color(endpoint, "endpoint does not support blink")?;
        validate_duration_ms(on_time_ms)?;
        validate_duration_ms(off_time_ms)?;
        self.set_action(
            endpoint,
            ActionDescriptor::Blink {
                on_time_ms,
                off_time_ms,
            },
        )
    }

    pub fn set_blink_sequence(
        &self,
        endpoint: LedEndpoint,
        on_time_ms: u32,
        off1_time_ms: u32,
        repeat_count: u32,
        off2_time_ms: u32,
    ) -> Result<()> {
        debug!(
            "set_blink_sequence {} on={}ms off1={}ms count={} off2={}ms",
            endpoint.name(),
            on_time_ms,
            off1_time_ms,
            repeat_count,
            off2_time_ms
        );
        require_color(endpoint, "endpoint does not support blink sequence")?;
        validate_duration_ms(on_time_ms)?;
        validate_duration_ms(off1_time_ms)?;
        validate_repeat_count(repeat_count)?;
        validate_duration_ms(off2_time_ms)?;
        self.set_action(
            endpoint,
            ActionDescriptor::SequenceBlink {
                on_time_ms,
                off1_time_ms,
                repeat_count,
                off2_time_ms,
            },
        )
    }

    /// `"on"` or `"off"`, valid for every endpoint.
    pub fn set_on_off(&self, endpoint: LedEndpoint, on_off: &str) -> Result<()> {
        debug!("set_on_off {} {}", endpoint.name(), on_off);
        let on = parse_on_off(on_off)?;
        self.set_action(
            endpoint,
            if on {
                ActionDescriptor::On
            } else {
                ActionDescriptor::Off
            },
        )
    }

    fn set_action(&self, endpoint: LedEndpoint, action: ActionDescriptor) -> Result<()> {
        self.store
            .update(endpoint, |rec| {
                require_enabled(rec)?;
                rec.action = action;
                Ok(())
            })
            .map(drop)
    }

    /// Push the persisted record to the hardware.
    pub fn apply(&mut self, endpoint: LedEndpoint) -> Result<()> {
        // lock is released before touching the hardware
        let record = self.store.read(endpoint)?;
        debug!("apply {} {:?}", endpoint.name(), record.action);
        self.hardware.apply(endpoint, &record)?;
        info!("applied {} {:?}", endpoint.name(), record.action);
        Ok(())
    }

    /// Apply every endpoint, stopping at the first failure.
    pub fn apply_all(&mut self) -> Result<()> {
        LedEndpoint::ALL.into_iter().try_for_each(|ep| self.apply(ep))
    }
}
