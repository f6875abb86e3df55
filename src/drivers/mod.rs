//! LED chip drivers and the Linux bus they sit on.

pub mod aw210xx;
pub mod i2c_bus;
pub mod ir_led;
pub mod lp5562;
