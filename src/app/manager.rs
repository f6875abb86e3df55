//! LED manager: named operations and device states on top of [`LedControl`].
//!
//! One operation is a fixed sequence of configuration calls followed by an
//! apply. Only one sequence runs at a time; a caller arriving while another
//! is in progress gets [`LedError::Busy`] immediately instead of waiting.

use std::sync::{Mutex, MutexGuard, TryLockError};

use log::{debug, error, info};

use crate::app::commands::{LedColor, LedOp, ManagerCommand};
use crate::app::control::LedControl;
use crate::app::ports::LedHardware;
use crate::app::record::{ActionDescriptor, LedEndpoint};
use crate::config::{ColorTable, DaemonConfig, OperationTable};
use crate::error::{LedError, Result};
use crate::fsm::LedState;

/// Whether an endpoint's record has been created this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitState {
    #[default]
    Unknown,
    Ready,
}

struct Inner<H> {
    control: LedControl<H>,
    init: [InitState; 3],
    incorrect_xw_frame: u64,
}

impl<H: LedHardware> Inner<H> {
    fn ensure_init(&mut self, endpoint: LedEndpoint) -> Result<()> {
        let slot = &mut self.init[usize::from(endpoint.id() - 1)];
        if *slot == InitState::Unknown {
            self.control.init(endpoint)?;
            *slot = InitState::Ready;
        }
        Ok(())
    }
}

pub struct LedManager<H> {
    inner: Mutex<Inner<H>>,
    camera_colors: ColorTable,
    xw_colors: ColorTable,
    operations: OperationTable,
}

impl<H: LedHardware> LedManager<H> {
    pub fn new(
        control: LedControl<H>,
        camera_colors: ColorTable,
        xw_colors: ColorTable,
        operations: OperationTable,
    ) -> Self {
        Self {
            inner: Mutex::new(Inner {
                control,
                init: [InitState::Unknown; 3],
                incorrect_xw_frame: 0,
            }),
            camera_colors,
            xw_colors,
            operations,
        }
    }

    pub fn from_config(control: LedControl<H>, cfg: &DaemonConfig) -> Self {
        Self::new(
            control,
            cfg.camera_colors.clone(),
            cfg.xw_colors.clone(),
            cfg.operations.clone(),
        )
    }

    /// Non-blocking acquire of the manager.
    fn try_enter(&self) -> Result<MutexGuard<'_, Inner<H>>> {
        match self.inner.try_lock() {
            Ok(guard) => Ok(guard),
            Err(TryLockError::WouldBlock) => {
                error!("LED manager is busy, try again later");
                Err(LedError::Busy)
            }
            Err(TryLockError::Poisoned(p)) => Ok(p.into_inner()),
        }
    }

    pub fn init_state(&self, endpoint: LedEndpoint) -> Result<InitState> {
        let inner = self.try_enter()?;
        Ok(inner.init[usize::from(endpoint.id() - 1)])
    }

    /// Run `f` with exclusive access to the configuration API.
    pub fn with_control<R>(&self, f: impl FnOnce(&mut LedControl<H>) -> R) -> Result<R> {
        let mut inner = self.try_enter()?;
        Ok(f(&mut inner.control))
    }

    pub fn set_op(&self, endpoint: LedEndpoint, op: LedOp, color: LedColor) -> Result<()> {
        let mut inner = self.try_enter()?;
        self.run_op(&mut inner, endpoint, op, color)
    }

    fn run_op(
        &self,
        inner: &mut Inner<H>,
        endpoint: LedEndpoint,
        op: LedOp,
        color: LedColor,
    ) -> Result<()> {
        debug!("set_op {} {} {}", endpoint.name(), op.name(), color.name());
        let table = match endpoint {
            LedEndpoint::XwFrontPanel => &self.xw_colors,
            LedEndpoint::CameraFrontPanel | LedEndpoint::CameraIr => &self.camera_colors,
        };
        let setting = table.get(color);
        let action = self.operations.action_for(op);
        if action.is_some() && !endpoint.supports_color() {
            return Err(LedError::OperationNotSupported("IR LED cannot blink"));
        }

        inner.ensure_init(endpoint)?;
        let control = &mut inner.control;
        if op != LedOp::NoLight {
            control.reset(endpoint)?;
            let [r, g, b] = setting.pwm;
            control.set_brightness(endpoint, r, g, b)?;
            if endpoint.supports_color() {
                let [r, g, b] = setting.current;
                control.set_color(endpoint, r, g, b)?;
            }
        }
        match action {
            None if op == LedOp::NoLight => control.set_on_off(endpoint, "off")?,
            None => control.set_on_off(endpoint, "on")?,
            Some(ActionDescriptor::Blink {
                on_time_ms,
                off_time_ms,
            }) => control.set_blink(endpoint, on_time_ms, off_time_ms)?,
            Some(ActionDescriptor::SequenceBlink {
                on_time_ms,
                off1_time_ms,
                repeat_count,
                off2_time_ms,
            }) => control.set_blink_sequence(
                endpoint,
                on_time_ms,
                off1_time_ms,
                repeat_count,
                off2_time_ms,
            )?,
            Some(ActionDescriptor::On | ActionDescriptor::Off) => {}
        }
        control.apply(endpoint)
    }

    /// Show `state` on both front panels. The hardware decides whether the
    /// XW record reaches a local chip.
    ///
    /// `INCORRECT_XW` alternates solid amber and solid red; each call shows
    /// the colour of the current frame (see [`Self::advance_frame`]).
    pub fn set_state(&self, state: LedState) -> Result<()> {
        let mut inner = self.try_enter()?;
        let pattern = match state {
            LedState::BootUp => {
                info!("LED state {}", state.name());
                return Ok(());
            }
            LedState::IncorrectXw => {
                let color = if inner.incorrect_xw_frame % 2 == 0 {
                    LedColor::Amber
                } else {
                    LedColor::Red
                };
                (LedOp::SolidLight, color)
            }
            LedState::ReadyToPair => (LedOp::Blink, LedColor::White),
            LedState::TroubleConnecting | LedState::NotProvisioned => {
                (LedOp::Blink, LedColor::Amber)
            }
            LedState::WorkingNormally => (LedOp::SolidLight, LedColor::Blue),
            LedState::TwoWayVoice => (LedOp::Blink, LedColor::Blue),
            LedState::FactoryDownloadMode => (LedOp::Blink, LedColor::Green),
        };
        let (op, color) = pattern;
        let camera = self.run_op(&mut inner, LedEndpoint::CameraFrontPanel, op, color);
        let xw = self.run_op(&mut inner, LedEndpoint::XwFrontPanel, op, color);
        if let Err(e) = &camera {
            error!("{} on camera panel: {}", state.name(), e);
        }
        if let Err(e) = &xw {
            error!("{} on XW panel: {}", state.name(), e);
        }
        info!("LED state {}", state.name());
        camera.and(xw)
    }

    /// Move the `INCORRECT_XW` alternation to its next colour.
    pub fn advance_frame(&self) -> Result<()> {
        let mut inner = self.try_enter()?;
        inner.incorrect_xw_frame = inner.incorrect_xw_frame.wrapping_add(1);
        Ok(())
    }

    pub fn execute(&self, cmd: ManagerCommand) -> Result<()> {
        match cmd {
            ManagerCommand::SetOp {
                endpoint,
                op,
                color,
            } => self.set_op(endpoint, op, color),
            ManagerCommand::SetState(state) => self.set_state(state),
        }
    }
}
