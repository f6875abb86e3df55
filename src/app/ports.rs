//! Port traits: the boundary between LED domain logic and the device.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ LedControl / LedManager (domain)
//! ```
//!
//! Hardware adapters (sysfs attributes, I2C bus, status probes) implement
//! these traits. The configuration API and the manager consume them via
//! generics, so the domain core is testable against recording mocks.

use std::path::Path;

use crate::app::record::{LedEndpoint, LedRecord};
use crate::error::ApplyError;
use crate::fsm::context::StatusSnapshot;

// ───────────────────────────────────────────────────────────────
// Hardware port (domain → LED chips)
// ───────────────────────────────────────────────────────────────

/// Pushes a persisted record to the physical LEDs.
pub trait LedHardware {
    fn apply(&mut self, endpoint: LedEndpoint, record: &LedRecord) -> Result<(), ApplyError>;
}

impl<T: LedHardware + ?Sized> LedHardware for &mut T {
    fn apply(&mut self, endpoint: LedEndpoint, record: &LedRecord) -> Result<(), ApplyError> {
        (**self).apply(endpoint, record)
    }
}

// ───────────────────────────────────────────────────────────────
// Attribute port (drivers → sysfs)
// ───────────────────────────────────────────────────────────────

/// Writes one value into a kernel attribute file.
///
/// Implementations receive the value as a separate argument and must never
/// splice it into a shell command line.
pub trait AttributeWriter {
    fn write_attr(&mut self, path: &Path, value: &str) -> Result<(), ApplyError>;
}

impl<T: AttributeWriter + ?Sized> AttributeWriter for &mut T {
    fn write_attr(&mut self, path: &Path, value: &str) -> Result<(), ApplyError> {
        (**self).write_attr(path, value)
    }
}

// ───────────────────────────────────────────────────────────────
// I2C port (drivers → bus)
// ───────────────────────────────────────────────────────────────

/// Opens the bus the LP5562 sits on, once per apply.
pub trait I2cProvider {
    type Bus: embedded_hal::i2c::I2c;

    fn open(&mut self) -> Result<Self::Bus, ApplyError>;
}

// ───────────────────────────────────────────────────────────────
// Status port (device → state machine)
// ───────────────────────────────────────────────────────────────

/// Samples the device predicates the state machine runs on.
pub trait StatusOracle {
    fn sample(&mut self) -> StatusSnapshot;
}
