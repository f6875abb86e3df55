//! Integration test driver for the `tests/integration/` submodules.
//!
//! Each `mod` below exercises one subsystem against mock adapters and a
//! scratch record directory. No LED hardware or root access is required.

mod hardware_tests;
mod manager_flow_tests;
mod mock_hw;
mod record_store_tests;
