//! Hardware adapter: routes an apply to the chip behind each endpoint.
//!
//! Front panels go to the AW210xx driver when its marker file exists and
//! to the LP5562 otherwise; the IR endpoint always goes to the backlight
//! attribute. The XW front panel belongs to the XW unit: on the camera its
//! record is persisted but never pushed to the local chip, unless
//! `xw_panel_local` says this device is the XW unit. This is the only
//! module that decides which physical path a record takes.

use std::path::PathBuf;

use log::debug;

use crate::app::ports::{AttributeWriter, I2cProvider, LedHardware};
use crate::app::record::{LedEndpoint, LedRecord};
use crate::config::PathsConfig;
use crate::adapters::sysfs::AnyWriter;
use crate::drivers::aw210xx::Aw210xx;
use crate::drivers::i2c_bus::LinuxI2cProvider;
use crate::drivers::ir_led::IrLed;
use crate::drivers::lp5562::Lp5562Driver;

/// Which front-panel chip is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelChip {
    Lp5562,
    Aw210xx,
}

/// Concrete adapter combining all LED drivers behind [`LedHardware`].
pub struct HardwareRouter<P, W> {
    aw_marker: PathBuf,
    xw_panel_local: bool,
    lp5562: Lp5562Driver<P, W>,
    aw210xx: Aw210xx<W>,
    ir: IrLed<W>,
}

impl HardwareRouter<LinuxI2cProvider, AnyWriter> {
    pub fn from_config(paths: &PathsConfig) -> Self {
        Self::new(paths, LinuxI2cProvider::new(&paths.i2c_device), AnyWriter::from_config(paths))
    }
}

impl<P: I2cProvider, W: AttributeWriter + Clone> HardwareRouter<P, W> {
    pub fn new(paths: &PathsConfig, provider: P, writer: W) -> Self {
        Self {
            aw_marker: paths.aw210xx_marker.clone(),
            xw_panel_local: paths.xw_panel_local,
            lp5562: Lp5562Driver::new(
                provider,
                writer.clone(),
                &paths.lp5562_sysfs_dir,
                paths.i2c_address,
            ),
            aw210xx: Aw210xx::new(
                &paths.aw210xx_rgbcolor,
                &paths.aw210xx_helper,
                &paths.aw210xx_pid_file,
                writer.clone(),
            ),
            ir: IrLed::new(&paths.ir_brightness, writer),
        }
    }

    /// Probe the marker file on every call; it can appear after boot.
    pub fn panel_chip(&self) -> PanelChip {
        if self.aw_marker.exists() {
            PanelChip::Aw210xx
        } else {
            PanelChip::Lp5562
        }
    }

    pub fn lp5562(&self) -> &Lp5562Driver<P, W> {
        &self.lp5562
    }

    pub fn aw210xx(&self) -> &Aw210xx<W> {
        &self.aw210xx
    }
}

impl<P: I2cProvider, W: AttributeWriter + Clone> LedHardware for HardwareRouter<P, W> {
    fn apply(
        &mut self,
        endpoint: LedEndpoint,
        record: &LedRecord,
    ) -> Result<(), crate::error::ApplyError> {
        match endpoint {
            LedEndpoint::CameraIr => return self.ir.apply(record),
            LedEndpoint::XwFrontPanel if !self.xw_panel_local => {
                debug!("{} not local, record kept", endpoint.name());
                return Ok(());
            }
            _ => {}
        }
        match self.panel_chip() {
            PanelChip::Aw210xx => {
                debug!("{} via aw210xx", endpoint.name());
                self.aw210xx.apply(record)
            }
            PanelChip::Lp5562 => {
                debug!("{} via lp5562", endpoint.name());
                self.lp5562.apply(record)
            }
        }
    }
}
