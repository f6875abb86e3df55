//! Application core: the record model, the configuration API and the
//! manager that sequences it.
//!
//! All hardware access goes through the **port traits** in [`ports`], so
//! this layer is testable against a scratch record directory and recording
//! hardware.

pub mod commands;
pub mod control;
pub mod manager;
pub mod ports;
pub mod record;
