//! LP5562 RGB lighting-engine driver.
//!
//! Two halves: colour-mixing currents go straight to the chip registers over
//! I2C, and the per-channel engine programs are loaded through the kernel
//! driver's sysfs firmware interface.
//!
//! Load sequence, for engines 1..=3 (red, green, blue):
//!
//! ```text
//! run_engine = 0
//!   select_engine = <n>
//!   engine_mux = RGB
//!   firmware/lp5562/loading = 1
//!   firmware/lp5562/data = <program hex>
//!   firmware/lp5562/loading = 0
//! run_engine = 1
//! ```

pub mod program;

use std::path::{Path, PathBuf};

use embedded_hal::i2c::I2c;
use log::debug;

use crate::app::ports::{AttributeWriter, I2cProvider};
use crate::app::record::{ChannelConfig, LedRecord};
use crate::error::{ApplyError, LedError};
use program::{EngineProgram, compile_channels, validate_program_text};

/// LP5562 I2C address (ADDR pins low).
pub const DEFAULT_ADDR: u8 = 0x30;

/// Register addresses
pub mod reg {
    pub const B_CURRENT: u8 = 0x05;
    pub const G_CURRENT: u8 = 0x06;
    pub const R_CURRENT: u8 = 0x07;
}

const CURRENT_REGS: [u8; 3] = [reg::R_CURRENT, reg::G_CURRENT, reg::B_CURRENT];

/// Register-level access over any `embedded-hal` bus.
pub struct Lp5562<I2C> {
    i2c: I2C,
    addr: u8,
}

impl<I2C: I2c> Lp5562<I2C> {
    pub fn new(i2c: I2C, addr: u8) -> Self {
        Self { i2c, addr }
    }

    pub fn write_reg(&mut self, reg: u8, value: u8) -> Result<(), I2C::Error> {
        self.i2c.write(self.addr, &[reg, value])
    }

    /// Write the red, green and blue current registers.
    pub fn set_currents(&mut self, channels: &[ChannelConfig; 3]) -> Result<(), I2C::Error> {
        for (reg, ch) in CURRENT_REGS.into_iter().zip(channels) {
            self.write_reg(reg, ch.current)?;
        }
        Ok(())
    }

    pub fn release(self) -> I2C {
        self.i2c
    }
}

/// Loads engine programs through the kernel driver's attributes.
pub struct EngineLoader<'a, W> {
    dir: &'a Path,
    writer: &'a mut W,
}

impl<'a, W: AttributeWriter> EngineLoader<'a, W> {
    pub fn new(dir: &'a Path, writer: &'a mut W) -> Self {
        Self { dir, writer }
    }

    fn set(&mut self, attr: &str, value: &str) -> Result<(), ApplyError> {
        self.writer.write_attr(&self.dir.join(attr), value)
    }

    /// Stop, load all three engines, start.
    pub fn load(&mut self, programs: &[&str; 3]) -> Result<(), ApplyError> {
        for text in programs {
            validate_program_text(text)?;
        }
        self.set("run_engine", "0")?;
        for (i, text) in programs.iter().enumerate() {
            self.set("select_engine", &(i + 1).to_string())?;
            self.set("engine_mux", "RGB")?;
            self.set("firmware/lp5562/loading", "1")?;
            self.set("firmware/lp5562/data", text)?;
            self.set("firmware/lp5562/loading", "0")?;
        }
        self.set("run_engine", "1")
    }
}

fn compile_error(e: LedError) -> ApplyError {
    match e {
        LedError::Apply(inner) => inner,
        _ => ApplyError::InvalidProgram,
    }
}

/// Full LP5562 apply path: currents over I2C, programs over sysfs.
pub struct Lp5562Driver<P, W> {
    provider: P,
    writer: W,
    sysfs_dir: PathBuf,
    addr: u8,
}

impl<P: I2cProvider, W: AttributeWriter> Lp5562Driver<P, W> {
    pub fn new(provider: P, writer: W, sysfs_dir: impl Into<PathBuf>, addr: u8) -> Self {
        Self {
            provider,
            writer,
            sysfs_dir: sysfs_dir.into(),
            addr,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn apply(&mut self, record: &LedRecord) -> Result<(), ApplyError> {
        let programs: [EngineProgram; 3] =
            compile_channels(&record.action, &record.channels).map_err(compile_error)?;
        let hex = [
            programs[0].to_hex().map_err(compile_error)?,
            programs[1].to_hex().map_err(compile_error)?,
            programs[2].to_hex().map_err(compile_error)?,
        ];
        debug!("lp5562 programs r={} g={} b={}", hex[0], hex[1], hex[2]);

        let bus = self.provider.open()?;
        let mut chip = Lp5562::new(bus, self.addr);
        chip.set_currents(&record.channels)
            .map_err(|e| ApplyError::Bus {
                op: "write current",
                detail: format!("{e:?}"),
            })?;

        // bus stays open until the engines are running again
        let _bus = chip.release();
        EngineLoader::new(&self.sysfs_dir, &mut self.writer)
            .load(&[hex[0].as_str(), hex[1].as_str(), hex[2].as_str()])
    }
}
