//! camledctl: exercise the LED manager and configuration API by hand.
//!
//! Every subcommand prints the result kind (`OK`, `INVALID_PARAM`,
//! `OPERATION_NOT_SUPPORTED`, `UNKNOWN`, `BUSY`) and exits non-zero on
//! failure.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::error;

use camled::adapters::hardware::HardwareRouter;
use camled::adapters::log_sink::{self, LogDestination, LogLevel};
use camled::adapters::record_file::FileRecordStore;
use camled::app::control::{self, parse_enable};
use camled::config::DaemonConfig;
use camled::error::Result;
use camled::{LedColor, LedControl, LedEndpoint, LedManager, LedOp, LedState, ResultKind};

#[derive(Debug, Parser)]
#[command(name = "camledctl", version, about = "Camera LED manager test harness")]
struct Cli {
    /// JSON configuration file; built-in defaults when omitted
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CRITICAL, ERROR, WARNING, INFO or DEBUG
    #[arg(long, global = true, default_value = "WARNING")]
    log_level: LogLevel,

    /// STDOUT or STDERR
    #[arg(long, global = true, default_value = "STDERR")]
    logger: LogDestination,

    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Debug, Subcommand)]
enum Cmd {
    /// Show the pattern for a device state on both front panels
    State { state: LedState },
    /// Program one LED with an operation and colour
    Op {
        #[arg(value_parser = parse_led)]
        led: LedEndpoint,
        op: LedOp,
        color: LedColor,
    },
    /// Create the LED's record if missing
    Init {
        #[arg(value_parser = parse_led)]
        led: LedEndpoint,
    },
    /// Restore the LED's default record
    Reset {
        #[arg(value_parser = parse_led)]
        led: LedEndpoint,
    },
    ResetAll,
    /// Enable (1) or disable (0) configuration of the LED
    Enable {
        #[arg(value_parser = parse_led)]
        led: LedEndpoint,
        #[arg(allow_negative_numbers = true)]
        value: i64,
    },
    /// Per-channel current (front panels only)
    Color {
        #[arg(value_parser = parse_led)]
        led: LedEndpoint,
        r: u8,
        g: u8,
        b: u8,
    },
    /// Per-channel pwm; the IR LED takes its level from R
    Brightness {
        #[arg(value_parser = parse_led)]
        led: LedEndpoint,
        r: u8,
        g: u8,
        b: u8,
    },
    /// Blink with on/off times in milliseconds
    Blink {
        #[arg(value_parser = parse_led)]
        led: LedEndpoint,
        on_ms: u32,
        off_ms: u32,
    },
    /// `count` short blinks, then a long pause
    BlinkSeq {
        #[arg(value_parser = parse_led)]
        led: LedEndpoint,
        on_ms: u32,
        off1_ms: u32,
        count: u32,
        off2_ms: u32,
    },
    /// Steady "on" or "off"
    Onoff {
        #[arg(value_parser = parse_led)]
        led: LedEndpoint,
        value: String,
    },
    /// Push the stored record to the hardware
    Apply {
        #[arg(value_parser = parse_led)]
        led: LedEndpoint,
    },
    ApplyAll,
    Version,
}

/// LED by name (`CAMERA_FRONT_PANEL`) or numeric id (`1`).
fn parse_led(s: &str) -> std::result::Result<LedEndpoint, String> {
    if let Ok(id) = s.parse::<u8>() {
        return LedEndpoint::from_id(id).map_err(|e| e.to_string());
    }
    s.parse::<LedEndpoint>().map_err(|e| e.to_string())
}

fn run(cmd: Cmd, cfg: &DaemonConfig) -> Result<()> {
    let store = FileRecordStore::from_config(&cfg.paths);
    let mut ctl = LedControl::new(store, HardwareRouter::from_config(&cfg.paths));
    match cmd {
        Cmd::State { state } => LedManager::from_config(ctl, cfg).set_state(state),
        Cmd::Op { led, op, color } => LedManager::from_config(ctl, cfg).set_op(led, op, color),
        Cmd::Init { led } => ctl.init(led),
        Cmd::Reset { led } => ctl.reset(led),
        Cmd::ResetAll => ctl.reset_all(),
        Cmd::Enable { led, value } => ctl.set_enabled(led, parse_enable(value)?),
        Cmd::Color { led, r, g, b } => ctl.set_color(led, r, g, b),
        Cmd::Brightness { led, r, g, b } => ctl.set_brightness(led, r, g, b),
        Cmd::Blink { led, on_ms, off_ms } => ctl.set_blink(led, on_ms, off_ms),
        Cmd::BlinkSeq {
            led,
            on_ms,
            off1_ms,
            count,
            off2_ms,
        } => ctl.set_blink_sequence(led, on_ms, off1_ms, count, off2_ms),
        Cmd::Onoff { led, value } => ctl.set_on_off(led, &value),
        Cmd::Apply { led } => ctl.apply(led),
        Cmd::ApplyAll => ctl.apply_all(),
        Cmd::Version => {
            println!("{}", control::version());
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    if let Err(e) = log_sink::init(cli.log_level, cli.logger) {
        eprintln!("logger: {e}");
    }
    let cfg = match DaemonConfig::load(cli.config.as_deref()) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("config: {e}");
            return ExitCode::FAILURE;
        }
    };

    let result = run(cli.cmd, &cfg);
    if let Err(e) = &result {
        error!("{e}");
    }
    let kind = ResultKind::of(&result);
    println!("{kind}");
    if kind == ResultKind::Ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
