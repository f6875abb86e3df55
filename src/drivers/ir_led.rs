//! IR illuminator driver: a backlight-class brightness attribute.

use std::path::PathBuf;

use crate::app::ports::AttributeWriter;
use crate::app::record::{ActionDescriptor, LedRecord};
use crate::error::ApplyError;

pub struct IrLed<W> {
    brightness: PathBuf,
    writer: W,
}

impl<W: AttributeWriter> IrLed<W> {
    pub fn new(brightness: impl Into<PathBuf>, writer: W) -> Self {
        Self {
            brightness: brightness.into(),
            writer,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Configured brightness when the action is `On`, otherwise 0.
    pub fn apply(&mut self, record: &LedRecord) -> Result<(), ApplyError> {
        let level = match record.action {
            ActionDescriptor::On => record.ir_brightness,
            _ => 0,
        };
        self.writer
            .write_attr(&self.brightness, &level.to_string())
    }
}
