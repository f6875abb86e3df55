//! camledd: LED indicator daemon.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     Adapters (outer ring)                    │
//! │                                                              │
//! │  FsStatusProbe     notify listener    env_logger             │
//! │  (StatusOracle)    (StatusFlags)      (log backend)          │
//! │  HardwareRouter ── LP5562 · AW210xx · IR                     │
//! │  (LedHardware)                                               │
//! │                                                              │
//! │  ──────────────── Port Trait Boundary ─────────────────      │
//! │                                                              │
//! │  ┌────────────────────────────────────────────────────┐      │
//! │  │  Daemon loop: LedFsm · LedManager · LedControl     │      │
//! │  └────────────────────────────────────────────────────┘      │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};

use camled::adapters::hardware::HardwareRouter;
use camled::adapters::log_sink::{self, LogDestination, LogLevel};
use camled::adapters::notify;
use camled::adapters::record_file::FileRecordStore;
use camled::adapters::status_probe::FsStatusProbe;
use camled::config::DaemonConfig;
use camled::fsm::context::StatusFlags;
use camled::fsm::daemon::Daemon;
use camled::{LedControl, LedManager};

#[derive(Debug, Parser)]
#[command(name = "camledd", version, about = "Camera LED indicator daemon")]
struct Args {
    /// JSON configuration file; built-in defaults when omitted
    #[arg(long)]
    config: Option<PathBuf>,

    /// CRITICAL, ERROR, WARNING, INFO or DEBUG
    #[arg(long, default_value = "INFO")]
    log_level: LogLevel,

    /// STDOUT or STDERR
    #[arg(long, default_value = "STDERR")]
    logger: LogDestination,
}

fn main() -> Result<()> {
    let args = Args::parse();
    log_sink::init(args.log_level, args.logger).context("installing logger")?;

    info!("camledd v{}", env!("CARGO_PKG_VERSION"));

    let cfg = DaemonConfig::load(args.config.as_deref()).context("loading configuration")?;

    let stop = Arc::new(AtomicBool::new(false));
    {
        let stop = Arc::clone(&stop);
        ctrlc::set_handler(move || stop.store(true, Ordering::Release))
            .context("installing signal handler")?;
    }

    let flags = Arc::new(StatusFlags::new());
    if let Some(fifo) = cfg.notify_fifo.clone() {
        // detached; it blocks in open() until a writer appears
        if let Err(e) = notify::spawn_listener(fifo, Arc::clone(&flags), Arc::clone(&stop)) {
            warn!("notification listener not started: {}", e);
        }
    }

    let store = FileRecordStore::from_config(&cfg.paths);
    let hardware = HardwareRouter::from_config(&cfg.paths);
    let manager = LedManager::from_config(LedControl::new(store, hardware), &cfg);
    let oracle = FsStatusProbe::new(cfg.status.clone(), flags);

    let mut daemon = Daemon::new(
        oracle,
        manager,
        Duration::from_millis(u64::from(cfg.poll_interval_ms)),
    );
    daemon.run(&stop);
    Ok(())
}
