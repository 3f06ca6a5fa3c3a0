//! Mock driver implementation for testing and development.
//!
//! This module provides a simulated controller that can be scripted
//! programmatically without requiring a Z-Wave stick.

pub mod network;

// Re-export commonly used types
pub use network::{DEFAULT_MOCK_NETWORK_ID, DriverCall, MockDriver, MockDriverHandle};
