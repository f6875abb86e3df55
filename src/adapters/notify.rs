//! Asynchronous status notifications.
//!
//! Other services report Bluetooth pairing, two-way audio and the XW link as
//! `key=value` lines written to a FIFO. A listener thread parses each line
//! and stores the value into the shared [`StatusFlags`]; the polling loop
//! picks it up on its next sample.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, info, warn};

use crate::fsm::context::StatusFlags;

/// One parsed notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    BtStatus(bool),
    AudioStatus(bool),
    XwConnected(bool),
}

/// Parse `bt_status=1`, `audio_status=0`, `xw_connected=1`.
///
/// Any non-zero integer value counts as set. Unknown keys and malformed
/// values yield `None`.
pub fn parse_notification(line: &str) -> Option<Notification> {
    let (key, value) = line.trim().split_once('=')?;
    let on = value.trim().parse::<i32>().ok()? != 0;
    match key.trim() {
        "bt_status" => Some(Notification::BtStatus(on)),
        "audio_status" => Some(Notification::AudioStatus(on)),
        "xw_connected" => Some(Notification::XwConnected(on)),
        _ => None,
    }
}

/// Apply one line to the flags. Returns whether it was understood.
pub fn apply_line(flags: &StatusFlags, line: &str) -> bool {
    match parse_notification(line) {
        Some(n) => {
            info!("notification {n:?}");
            match n {
                Notification::BtStatus(on) => flags.set_ble_pairing(on),
                Notification::AudioStatus(on) => flags.set_voice_active(on),
                Notification::XwConnected(on) => flags.set_xw_connected(on),
            }
            true
        }
        None => {
            if !line.trim().is_empty() {
                warn!("ignoring notification {:?}", line.trim());
            }
            false
        }
    }
}

/// Read lines until EOF, returning how many were applied.
pub fn pump_lines<R: BufRead>(reader: R, flags: &StatusFlags) -> usize {
    reader
        .lines()
        .map_while(Result::ok)
        .filter(|line| apply_line(flags, line))
        .count()
}

/// Spawn the FIFO listener.
///
/// Opening a FIFO blocks until a writer appears and reads return EOF once
/// the last writer closes, so the thread reopens it in a loop until `stop`
/// is set.
pub fn spawn_listener(
    fifo: PathBuf,
    flags: Arc<StatusFlags>,
    stop: Arc<AtomicBool>,
) -> std::io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("camled-notify".into())
        .spawn(move || {
            info!("listening for notifications on {}", fifo.display());
            while !stop.load(Ordering::Acquire) {
                match File::open(&fifo) {
                    Ok(f) => {
                        let n = pump_lines(BufReader::new(f), &flags);
                        debug!("notification writer closed after {n} updates");
                    }
                    Err(e) => {
                        warn!("open {}: {}", fifo.display(), e);
                        thread::sleep(Duration::from_secs(1));
                    }
                }
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_keys_parse() {
        assert_eq!(parse_notification("bt_status=1"), Some(Notification::BtStatus(true)));
        assert_eq!(
            parse_notification(" audio_status = 0\n"),
            Some(Notification::AudioStatus(false))
        );
        assert_eq!(
            parse_notification("xw_connected=2"),
            Some(Notification::XwConnected(true))
        );
    }

    #[test]
    fn junk_is_rejected() {
        assert_eq!(parse_notification("bt_status"), None);
        assert_eq!(parse_notification("bt_status=on"), None);
        assert_eq!(parse_notification("wifi=1"), None);
        assert_eq!(parse_notification(""), None);
    }

    #[test]
    fn pump_updates_flags() {
        let flags = StatusFlags::new();
        let input = "bt_status=1\naudio_status=1\nnoise\nxw_connected=1\naudio_status=0\n";
        let applied = pump_lines(input.as_bytes(), &flags);
        assert_eq!(applied, 4);
        assert!(flags.ble_pairing());
        assert!(!flags.voice_active());
        assert!(flags.xw_connected());
    }
}
