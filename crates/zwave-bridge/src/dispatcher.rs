//! Controller command dispatcher.
//!
//! Controller commands (inclusion, exclusion, route maintenance, ...) run for
//! seconds or minutes on the controller, and the controller accepts only one
//! at a time. The dispatcher validates names against the command table,
//! tracks the single in-flight command and clears it when the driver reports
//! a terminal state.
//!
//! A cancel clears the marker at once, but the cancelled command's own
//! terminal state still arrives later through the queue. Each cancel that
//! cleared a command is counted, and the next terminal state settles that
//! count instead of clearing whatever command was started in the meantime.
//!
//! ```text
//! begin("AddDevice") ──► parse ──► mark in flight ──► driver
//!                                         ▲              │
//!                      observe(terminal) ─┘◄── queue ◄───┘
//! ```

use parking_lot::Mutex;
use tracing::{debug, info, warn};
use zwave_core::{ControllerCommand, ControllerState, Error, NodeId, Result};
use zwave_driver::NetworkDriver;

#[derive(Debug, Default)]
struct DispatchState {
    active: Option<ControllerCommand>,
    /// Cancelled commands whose terminal state has not been observed yet.
    pending_cancels: u32,
}

#[derive(Debug, Default)]
pub struct CommandDispatcher {
    state: Mutex<DispatchState>,
}

impl CommandDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a controller command by name.
    ///
    /// # Errors
    ///
    /// - `Error::UnknownCommand` if the name is not in the command table; no
    ///   state changes and nothing is sent to the driver.
    /// - `Error::CommandInProgress` if another command is in flight.
    /// - Any driver error; the in-flight marker is rolled back.
    pub async fn begin<D: NetworkDriver>(
        &self,
        driver: &D,
        name: &str,
        node_id: NodeId,
        high_power: bool,
    ) -> Result<ControllerCommand> {
        let command = ControllerCommand::parse(name)?;

        {
            let mut state = self.state.lock();
            if let Some(active) = state.active {
                return Err(Error::CommandInProgress { active });
            }
            state.active = Some(command);
        }

        debug!(%command, code = command.code(), %node_id, high_power, "forwarding controller command");
        if let Err(error) = driver
            .begin_controller_command(command, node_id, high_power)
            .await
        {
            let mut state = self.state.lock();
            if state.active == Some(command) {
                state.active = None;
            }
            warn!(%command, %error, "controller command refused");
            return Err(error.into());
        }

        info!(%command, %node_id, "controller command started");
        Ok(command)
    }

    /// Cancel the in-flight command.
    ///
    /// The marker is cleared and a cancel request is forwarded whether or
    /// not a command was in flight. Returns the command that was cleared.
    ///
    /// When a command was cleared, its terminal state is still expected from
    /// the driver and is attributed to it rather than to a later command.
    pub async fn cancel<D: NetworkDriver>(&self, driver: &D) -> Result<Option<ControllerCommand>> {
        let cleared = {
            let mut state = self.state.lock();
            let cleared = state.active.take();
            if cleared.is_some() {
                state.pending_cancels += 1;
            }
            cleared
        };
        if let Err(error) = driver.cancel_controller_command().await {
            if cleared.is_some() {
                let mut state = self.state.lock();
                state.pending_cancels = state.pending_cancels.saturating_sub(1);
            }
            return Err(error.into());
        }

        if let Some(command) = cleared {
            info!(%command, "controller command cancelled");
        }
        Ok(cleared)
    }

    /// Feed a controller state reported by the driver.
    ///
    /// Returns the command that finished if the state is terminal and
    /// belongs to the command currently in flight.
    pub fn observe(&self, controller_state: ControllerState) -> Option<ControllerCommand> {
        if !controller_state.is_terminal() {
            return None;
        }
        let mut state = self.state.lock();
        if state.pending_cancels > 0 {
            state.pending_cancels -= 1;
            debug!(
                state = %controller_state,
                pending = state.pending_cancels,
                "terminal state settled a cancelled command"
            );
            return None;
        }
        let finished = state.active.take();
        if let Some(command) = finished {
            info!(%command, state = %controller_state, "controller command finished");
        }
        finished
    }

    pub fn active(&self) -> Option<ControllerCommand> {
        self.state.lock().active
    }

    /// Forget the in-flight command and any outstanding cancels.
    pub fn clear(&self) {
        *self.state.lock() = DispatchState::default();
    }
}
