//! AW210xx front-panel driver.
//!
//! Steady states are a single write to the chip's `rgbcolor` attribute:
//! `0x00 0x<currents> 0x<pwms>`, each packed as `rrggbb`. Blinking is done
//! by a helper script that toggles the attribute in the background.
//!
//! The helper outlives the process that started it, so a short-lived
//! `camledctl` can leave a pattern running. Its pid is recorded in a file
//! shared by every caller; each apply stops whatever helper that file
//! names before writing the new pattern.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

use log::{debug, warn};

use crate::app::ports::AttributeWriter;
use crate::app::record::{ActionDescriptor, ChannelConfig, LedRecord};
use crate::error::ApplyError;

/// `rgbcolor` value that turns every channel off.
pub const OFF_COMMAND: &str = "0x00 0x000000 0x000000";

/// `rgbcolor` value for steady light at the configured currents and levels.
pub fn color_command(channels: &[ChannelConfig; 3]) -> String {
    let [r, g, b] = channels;
    format!(
        "0x00 0x{:02x}{:02x}{:02x} 0x{:02x}{:02x}{:02x}",
        r.current, g.current, b.current, r.pwm, g.pwm, b.pwm
    )
}

/// Helper script arguments for a blinking action; `None` for steady ones.
///
/// Times are handed over in microseconds.
pub fn helper_args(record: &LedRecord) -> Option<Vec<String>> {
    let pairs = record
        .channels
        .iter()
        .map(|c| format!("{}:{}", c.current, c.pwm))
        .collect::<Vec<_>>()
        .join(",");
    let us = |ms: u32| (u64::from(ms) * 1000).to_string();
    match record.action {
        ActionDescriptor::On | ActionDescriptor::Off => None,
        ActionDescriptor::Blink {
            on_time_ms,
            off_time_ms,
        } => Some(vec![
            "brightness_blink".into(),
            pairs,
            us(on_time_ms),
            us(off_time_ms),
        ]),
        ActionDescriptor::SequenceBlink {
            on_time_ms,
            off1_time_ms,
            repeat_count,
            off2_time_ms,
        } => Some(vec![
            "sequence_blink".into(),
            pairs,
            us(on_time_ms),
            us(off1_time_ms),
            repeat_count.to_string(),
            us(off2_time_ms),
        ]),
    }
}

/// Pid recorded in `pid_file`, if the file holds one.
pub fn recorded_pid(pid_file: &Path) -> Option<u32> {
    fs::read_to_string(pid_file).ok()?.trim().parse().ok()
}

/// Whether `pid` is a live instance of `helper`.
///
/// Checked against `/proc/<pid>/cmdline` so a recycled pid is never
/// signalled. Zombies have an empty command line and count as stopped.
pub fn helper_running(pid: u32, helper: &Path) -> bool {
    let Ok(cmdline) = fs::read(format!("/proc/{pid}/cmdline")) else {
        return false;
    };
    let name = helper.file_name();
    cmdline
        .split(|&b| b == 0)
        .filter(|arg| !arg.is_empty())
        .map(|arg| Path::new(std::str::from_utf8(arg).unwrap_or_default()))
        .any(|arg| arg == helper || (name.is_some() && arg.file_name() == name))
}

fn kill_pid(pid: u32) {
    let status = Command::new("kill")
        .arg("-9")
        .arg(pid.to_string())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(s) if s.success() => debug!("stopped blink helper {pid}"),
        Ok(s) => warn!("kill blink helper {pid}: {s}"),
        Err(e) => warn!("kill blink helper {pid}: {e}"),
    }
}

pub struct Aw210xx<W> {
    rgbcolor: PathBuf,
    helper: PathBuf,
    pid_file: PathBuf,
    writer: W,
    /// Helper started by this instance; kept so it can be reaped.
    blink_task: Option<Child>,
}

impl<W: AttributeWriter> Aw210xx<W> {
    pub fn new(
        rgbcolor: impl Into<PathBuf>,
        helper: impl Into<PathBuf>,
        pid_file: impl Into<PathBuf>,
        writer: W,
    ) -> Self {
        Self {
            rgbcolor: rgbcolor.into(),
            helper: helper.into(),
            pid_file: pid_file.into(),
            writer,
            blink_task: None,
        }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    /// Process id of the blink helper this instance started, if any.
    pub fn blink_task_id(&self) -> Option<u32> {
        self.blink_task.as_ref().map(Child::id)
    }

    pub fn apply(&mut self, record: &LedRecord) -> Result<(), ApplyError> {
        self.stop_blink();
        match record.action {
            ActionDescriptor::On => self
                .writer
                .write_attr(&self.rgbcolor, &color_command(&record.channels)),
            ActionDescriptor::Off => self.writer.write_attr(&self.rgbcolor, OFF_COMMAND),
            ActionDescriptor::Blink { .. } | ActionDescriptor::SequenceBlink { .. } => {
                let args = helper_args(record).unwrap_or_default();
                self.spawn_blink(&args)
            }
        }
    }

    fn spawn_blink(&mut self, args: &[String]) -> Result<(), ApplyError> {
        let child = Command::new(&self.helper)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ApplyError::Helper {
                program: self.helper.display().to_string(),
                detail: e.to_string(),
            })?;
        debug!("aw210xx blink helper pid {} {:?}", child.id(), args);
        if let Err(e) = fs::write(&self.pid_file, child.id().to_string()) {
            warn!("record blink helper pid in {}: {}", self.pid_file.display(), e);
        }
        self.blink_task = Some(child);
        Ok(())
    }

    /// Stop the blink helper named in the pid file, whoever started it,
    /// and reap the one this instance started.
    pub fn stop_blink(&mut self) {
        let own = self.blink_task.take();
        if let Some(pid) = recorded_pid(&self.pid_file)
            && own.as_ref().map(Child::id) != Some(pid)
            && helper_running(pid, &self.helper)
        {
            kill_pid(pid);
        }
        if let Some(mut child) = own {
            match child.try_wait() {
                Ok(Some(_)) => {}
                _ => {
                    if let Err(e) = child.kill() {
                        warn!("kill blink helper {}: {}", child.id(), e);
                    }
                    if let Err(e) = child.wait() {
                        warn!("reap blink helper {}: {}", child.id(), e);
                    }
                }
            }
        }
        match fs::remove_file(&self.pid_file) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("remove {}: {}", self.pid_file.display(), e),
        }
    }
}
