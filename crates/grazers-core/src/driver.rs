//! Tick loop gated by operator control signals.

use std::thread;
use std::time::Duration;

use tracing::info;

use crate::WorldError;
use crate::sink::ControlSignal;
use crate::world::WorldState;

/// How long a paused driver waits before polling again.
const PAUSE_POLL: Duration = Duration::from_millis(50);

/// Pause and slow-mode flags toggled by control signals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ControlState {
    pub paused: bool,
    pub slow_mode: bool,
    pub stop_requested: bool,
}

impl ControlState {
    pub fn apply(&mut self, signal: ControlSignal) {
        match signal {
            ControlSignal::Pause => self.paused = true,
            ControlSignal::Resume => self.paused = false,
            ControlSignal::ToggleSlowMode => self.slow_mode = !self.slow_mode,
            ControlSignal::Stop => self.stop_requested = true,
        }
    }
}

/// Optional bounds on a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunLimits {
    /// Stop after this many calls to `step`, rollovers included.
    pub max_steps: Option<u64>,
    /// Stop after this many epoch rollovers.
    pub max_epochs: Option<u64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    Requested,
    StepLimit,
    EpochLimit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunReport {
    pub steps: u64,
    pub epochs_rolled: u64,
    pub reason: StopReason,
}

/// Step `world` until a stop signal, a limit, or a fatal error.
///
/// Signals are drained once per loop iteration, so a request only ever
/// gates the next step and never interrupts one in progress.
pub fn run(world: &mut WorldState, limits: RunLimits) -> Result<RunReport, WorldError> {
    let mut control = ControlState::default();
    let mut steps = 0;
    let mut epochs_rolled = 0;
    let slow_delay = Duration::from_millis(world.config().slow_mode_delay_ms);

    let reason = loop {
        while let Some(signal) = world.poll_control() {
            control.apply(signal);
        }
        if control.stop_requested {
            break StopReason::Requested;
        }
        if limits.max_steps.is_some_and(|max| steps >= max) {
            break StopReason::StepLimit;
        }
        if limits.max_epochs.is_some_and(|max| epochs_rolled >= max) {
            break StopReason::EpochLimit;
        }
        if control.paused {
            thread::sleep(PAUSE_POLL);
            continue;
        }

        let events = world.step()?;
        steps += 1;
        if events.epoch_rolled {
            epochs_rolled += 1;
        }
        if control.slow_mode {
            thread::sleep(slow_delay);
        }
    };

    info!(steps, epochs_rolled, ?reason, "run finished");
    Ok(RunReport {
        steps,
        epochs_rolled,
        reason,
    })
}
