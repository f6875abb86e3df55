//! Camera LED indicator controller.
//!
//! Persists per-LED configuration records, compiles them into LP5562 engine
//! programs or AW210xx commands, and drives the front-panel and IR LEDs from
//! a device-state machine. The binaries in `src/main.rs` (daemon) and
//! `src/bin/camledctl.rs` (command-line harness) are thin shells over this
//! library.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fsm;

pub use app::commands::{LedColor, LedOp, ManagerCommand};
pub use app::control::LedControl;
pub use app::manager::LedManager;
pub use app::record::{ActionDescriptor, ChannelConfig, LedEndpoint, LedRecord};
pub use error::{LedError, ResultKind};
pub use fsm::LedState;
