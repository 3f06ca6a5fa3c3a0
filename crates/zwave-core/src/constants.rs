//! Network-level constants shared across the workspace.
//!
//! These values mirror the limits of a Z-Wave network and the defaults used by
//! the driver library when no option overrides them.
//!
//! # Usage
//!
//! ```
//! use zwave_core::constants::*;
//!
//! fn is_addressable(id: u8) -> bool {
//!     (MIN_NODE_ID..=MAX_NODE_ID).contains(&id)
//! }
//!
//! assert!(is_addressable(1));
//! assert!(!is_addressable(0));
//! ```

// ============================================================================
// Addressing
// ============================================================================

/// Lowest node id a device can be assigned on a Z-Wave network.
pub const MIN_NODE_ID: u8 = 1;

/// Highest node id a device can be assigned on a Z-Wave network.
pub const MAX_NODE_ID: u8 = 232;

/// Node id used on driver-level records that are not about a single node.
pub const NO_NODE_ID: u8 = 0;

// ============================================================================
// Polling
// ============================================================================

/// Default interval between two complete polling passes, in milliseconds.
///
/// Matches the driver library's `PollInterval` default.
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 30_000;

/// Default poll intensity: the value is polled once per polling pass.
pub const DEFAULT_POLL_INTENSITY: u8 = 1;

// ============================================================================
// Controller commands
// ============================================================================

/// Number of controller commands callers can start.
///
/// Code 0 (`None`) is reserved by the driver and never accepted.
pub const CONTROLLER_COMMAND_COUNT: usize = 16;
