//! Error types for driver operations.
//!
//! This module defines the errors a network driver can report when the
//! bridge forwards a request to it: the driver not being connected, the
//! controller refusing a request, communication failures and so on.

/// Result type alias for driver operations.
pub type Result<T> = std::result::Result<T, DriverError>;

/// Errors that can occur while talking to the network driver.
#[derive(Debug, thiserror::Error)]
pub enum DriverError {
    /// Driver is not connected to a controller.
    #[error("Driver not connected")]
    NotConnected,

    /// Driver is already connected to a controller.
    #[error("Driver already connected to {port}")]
    AlreadyConnected { port: String },

    /// Controller communication error.
    #[error("Communication error: {message}")]
    CommunicationError { message: String },

    /// The controller refused the request.
    #[error("Request rejected: {message}")]
    Rejected { message: String },

    /// Driver initialization failed.
    #[error("Initialization failed: {message}")]
    InitializationFailed { message: String },

    /// The driver's event thread could not be started.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DriverError {
    /// Create a new already-connected error.
    pub fn already_connected(port: impl Into<String>) -> Self {
        Self::AlreadyConnected { port: port.into() }
    }

    /// Create a new communication error.
    pub fn communication(message: impl Into<String>) -> Self {
        Self::CommunicationError {
            message: message.into(),
        }
    }

    /// Create a new rejected-request error.
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Create a new initialization failed error.
    pub fn initialization_failed(message: impl Into<String>) -> Self {
        Self::InitializationFailed {
            message: message.into(),
        }
    }
}

impl From<DriverError> for zwave_core::Error {
    fn from(error: DriverError) -> Self {
        match error {
            DriverError::NotConnected => zwave_core::Error::NotConnected,
            DriverError::AlreadyConnected { .. } => zwave_core::Error::AlreadyConnected,
            other => zwave_core::Error::Driver(other.to_string()),
        }
    }
}
