//! Polling loop that turns device status into LED patterns.
//!
//! Each cycle samples the status oracle once, shows the pattern for the
//! current state when it (or the XW link) changed, computes the successor
//! state and sleeps for the polling period. LED failures are logged and the
//! loop carries on.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use log::{debug, info, warn};

use crate::app::manager::LedManager;
use crate::app::ports::{LedHardware, StatusOracle};
use crate::fsm::{LedFsm, LedState};

/// State carried between cycles.
pub struct Daemon<O, H> {
    oracle: O,
    manager: LedManager<H>,
    fsm: LedFsm,
    shown: Option<LedState>,
    xw_connected: bool,
    poll_interval: Duration,
}

impl<O: StatusOracle, H: LedHardware> Daemon<O, H> {
    pub fn new(oracle: O, manager: LedManager<H>, poll_interval: Duration) -> Self {
        Self {
            oracle,
            manager,
            fsm: LedFsm::new(LedState::BootUp),
            shown: None,
            xw_connected: false,
            poll_interval,
        }
    }

    pub fn state(&self) -> LedState {
        self.fsm.current_state()
    }

    pub fn manager(&self) -> &LedManager<H> {
        &self.manager
    }

    /// One polling cycle without the sleep.
    pub fn run_cycle(&mut self) {
        let status = self.oracle.sample();
        let state = self.fsm.current_state();
        debug!("cycle state={} status={:?}", state.name(), status);

        let xw_changed = status.xw_connected != self.xw_connected;
        if xw_changed {
            info!("XW link {}", if status.xw_connected { "up" } else { "down" });
            self.xw_connected = status.xw_connected;
        }

        if state == LedState::IncorrectXw && self.shown == Some(state) {
            if let Err(e) = self.manager.advance_frame() {
                warn!("advance frame: {e}");
            }
            self.show(state);
        } else if self.shown != Some(state) || xw_changed {
            self.show(state);
        }

        self.fsm.tick(&status);
    }

    fn show(&mut self, state: LedState) {
        match self.manager.set_state(state) {
            Ok(()) => self.shown = Some(state),
            Err(e) => warn!("set state {}: {}", state.name(), e),
        }
    }

    /// Cycle until `stop` is set.
    pub fn run(&mut self, stop: &Arc<AtomicBool>) {
        info!(
            "LED daemon running, poll every {} ms",
            self.poll_interval.as_millis()
        );
        while !stop.load(Ordering::Acquire) {
            self.run_cycle();
            thread::sleep(self.poll_interval);
        }
        info!("LED daemon stopping in state {}", self.state().name());
    }
}
