//! Controller command table.
//!
//! Controller commands are long-running administrative operations performed
//! by the network controller, such as including a new device. Callers name
//! them by string; the driver wants the numeric code. The table is a
//! compile-time enum so name, code and variant can never drift apart.
//!
//! # Examples
//!
//! ```
//! use zwave_core::ControllerCommand;
//!
//! let cmd = ControllerCommand::parse("AddDevice").unwrap();
//! assert_eq!(cmd.code(), 1);
//! assert_eq!(cmd.as_str(), "AddDevice");
//!
//! assert!(ControllerCommand::parse("NotARealCommand").is_err());
//! ```
//!
//! Progress of a running command is reported back through the notification
//! pipeline as [`ControllerState`] transitions, optionally with a
//! [`ControllerError`].

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::CONTROLLER_COMMAND_COUNT;
use crate::{Error, Result};

/// Controller commands accepted by the driver.
///
/// Discriminants are the driver's command codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControllerCommand {
    AddDevice = 1,
    CreateNewPrimary = 2,
    ReceiveConfiguration = 3,
    RemoveDevice = 4,
    RemoveFailedNode = 5,
    HasNodeFailed = 6,
    ReplaceFailedNode = 7,
    TransferPrimaryRole = 8,
    RequestNetworkUpdate = 9,
    RequestNodeNeighborUpdate = 10,
    AssignReturnRoute = 11,
    DeleteAllReturnRoutes = 12,
    SendNodeInformation = 13,
    ReplicationSend = 14,
    CreateButton = 15,
    DeleteButton = 16,
}

impl ControllerCommand {
    /// Every command, in code order.
    pub const ALL: [ControllerCommand; CONTROLLER_COMMAND_COUNT] = [
        ControllerCommand::AddDevice,
        ControllerCommand::CreateNewPrimary,
        ControllerCommand::ReceiveConfiguration,
        ControllerCommand::RemoveDevice,
        ControllerCommand::RemoveFailedNode,
        ControllerCommand::HasNodeFailed,
        ControllerCommand::ReplaceFailedNode,
        ControllerCommand::TransferPrimaryRole,
        ControllerCommand::RequestNetworkUpdate,
        ControllerCommand::RequestNodeNeighborUpdate,
        ControllerCommand::AssignReturnRoute,
        ControllerCommand::DeleteAllReturnRoutes,
        ControllerCommand::SendNodeInformation,
        ControllerCommand::ReplicationSend,
        ControllerCommand::CreateButton,
        ControllerCommand::DeleteButton,
    ];

    /// Look up a command by its name.
    ///
    /// # Errors
    /// Returns `Error::UnknownCommand` if the name is not in the table.
    pub fn parse(name: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|cmd| cmd.as_str() == name)
            .ok_or_else(|| Error::UnknownCommand(name.to_string()))
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ControllerCommand::AddDevice => "AddDevice",
            ControllerCommand::CreateNewPrimary => "CreateNewPrimary",
            ControllerCommand::ReceiveConfiguration => "ReceiveConfiguration",
            ControllerCommand::RemoveDevice => "RemoveDevice",
            ControllerCommand::RemoveFailedNode => "RemoveFailedNode",
            ControllerCommand::HasNodeFailed => "HasNodeFailed",
            ControllerCommand::ReplaceFailedNode => "ReplaceFailedNode",
            ControllerCommand::TransferPrimaryRole => "TransferPrimaryRole",
            ControllerCommand::RequestNetworkUpdate => "RequestNetworkUpdate",
            ControllerCommand::RequestNodeNeighborUpdate => "RequestNodeNeighborUpdate",
            ControllerCommand::AssignReturnRoute => "AssignReturnRoute",
            ControllerCommand::DeleteAllReturnRoutes => "DeleteAllReturnRoutes",
            ControllerCommand::SendNodeInformation => "SendNodeInformation",
            ControllerCommand::ReplicationSend => "ReplicationSend",
            ControllerCommand::CreateButton => "CreateButton",
            ControllerCommand::DeleteButton => "DeleteButton",
        }
    }

    /// Driver command code.
    #[inline]
    #[must_use]
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl fmt::Display for ControllerCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ControllerCommand {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ControllerCommand::parse(s)
    }
}

/// Progress state of the running controller command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControllerState {
    Normal = 0,
    Starting = 1,
    Cancel = 2,
    Error = 3,
    Waiting = 4,
    Sleeping = 5,
    InProgress = 6,
    Completed = 7,
    Failed = 8,
    NodeOk = 9,
    NodeFailed = 10,
}

impl ControllerState {
    /// Returns `true` once the command has finished, successfully or not.
    ///
    /// A terminal state frees the controller for the next command.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ControllerState::Cancel
                | ControllerState::Error
                | ControllerState::Completed
                | ControllerState::Failed
                | ControllerState::NodeOk
                | ControllerState::NodeFailed
        )
    }
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Error detail attached to a failed controller command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ControllerError {
    #[default]
    None = 0,
    ButtonNotFound = 1,
    NodeNotFound = 2,
    NotBridge = 3,
    NotSuc = 4,
    NotSecondary = 5,
    NotPrimary = 6,
    IsPrimary = 7,
    NotFound = 8,
    Busy = 9,
    Failed = 10,
    Disabled = 11,
    Overflow = 12,
}
