//! Status oracle backed by marker files, the routing table and `ping`.
//!
//! | Predicate        | Source                                        |
//! |------------------|-----------------------------------------------|
//! | `pairing`        | WPS or BLE pairing marker exists              |
//! | `provisioned`    | any provisioning marker exists                |
//! | `booting`        | boot-complete marker absent                   |
//! | `incompatible_hw`| incorrect-hardware marker exists              |
//! | `connected`      | default gateway answers `ping`                |
//! | `ble_pairing`    | [`StatusFlags`] (notification channel)        |
//! | `voice_active`   | [`StatusFlags`]                               |
//! | `xw_connected`   | [`StatusFlags`]                               |

use std::fs;
use std::net::Ipv4Addr;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use log::{debug, warn};

use crate::app::ports::StatusOracle;
use crate::config::StatusConfig;
use crate::fsm::context::{StatusFlags, StatusSnapshot};

/// Default gateway from `/proc/net/route` text.
///
/// Each gateway column is the raw network-order address printed as host-order hex.
pub fn parse_default_gateway(route_table: &str) -> Option<Ipv4Addr> {
    route_table.lines().skip(1).find_map(|line| {
        let mut cols = line.split_whitespace();
        let _iface = cols.next()?;
        let destination = cols.next()?;
        let gateway = cols.next()?;
        if destination != "00000000" {
            return None;
        }
        let raw = u32::from_str_radix(gateway, 16).ok()?;
        if raw == 0 {
            return None;
        }
        Some(Ipv4Addr::from(raw.to_ne_bytes()))
    })
}

pub struct FsStatusProbe {
    cfg: StatusConfig,
    flags: Arc<StatusFlags>,
}

impl FsStatusProbe {
    pub fn new(cfg: StatusConfig, flags: Arc<StatusFlags>) -> Self {
        Self { cfg, flags }
    }

    pub fn pairing(&self) -> bool {
        self.cfg.wps_marker.exists() || self.cfg.ble_pairing_marker.exists()
    }

    pub fn provisioned(&self) -> bool {
        self.cfg.provisioned_markers.iter().any(|p| p.exists())
    }

    pub fn booting(&self) -> bool {
        !self.cfg.bootup_marker.exists()
    }

    pub fn incompatible_hw(&self) -> bool {
        self.cfg.incorrect_hardware_marker.exists()
    }

    pub fn connected(&self) -> bool {
        let Some(gateway) = read_gateway(&self.cfg.route_table) else {
            debug!("no default gateway");
            return false;
        };
        let status = Command::new("ping")
            .arg("-c")
            .arg(self.cfg.ping_count.to_string())
            .arg("-W")
            .arg(self.cfg.ping_timeout_secs.to_string())
            .arg(gateway.to_string())
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        match status {
            Ok(s) => {
                debug!("ping {gateway}: {s}");
                s.success()
            }
            Err(e) => {
                warn!("ping {gateway}: {e}");
                false
            }
        }
    }
}

fn read_gateway(route_table: &Path) -> Option<Ipv4Addr> {
    match fs::read_to_string(route_table) {
        Ok(text) => parse_default_gateway(&text),
        Err(e) => {
            warn!("read {}: {}", route_table.display(), e);
            None
        }
    }
}

impl StatusOracle for FsStatusProbe {
    fn sample(&mut self) -> StatusSnapshot {
        StatusSnapshot {
            connected: self.connected(),
            pairing: self.pairing(),
            ble_pairing: self.flags.ble_pairing(),
            provisioned: self.provisioned(),
            booting: self.booting(),
            voice_active: self.flags.voice_active(),
            incompatible_hw: self.incompatible_hw(),
            xw_connected: self.flags.xw_connected(),
        }
    }
}
