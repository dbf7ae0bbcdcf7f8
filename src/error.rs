//! Error types for the driver
//!
//! This module defines error types for configuration building ([`BuilderError`])
//! and panel operations ([`Error`]).
//!
//! ## Error Types
//!
//! - [`BuilderError`] - Errors during configuration construction
//! - [`Error`] - Runtime errors during panel operations
//! - [`InterfaceError`](crate::interface::InterfaceError) - Low-level hardware communication errors
//!
//! ## Example
//!
//! ```
//! use epd_13in3e::{Builder, BuilderError};
//!
//! let result = Builder::new().busy_poll_interval_ms(0).build();
//! assert!(matches!(result, Err(BuilderError::ZeroPollInterval)));
//! ```

use crate::state::{Controller, Operation, PanelState};

/// Errors that can occur when driving the panel
///
/// Generic over the interface error type so callers can match on the
/// underlying hardware error.
#[derive(Debug, thiserror::Error)]
pub enum Error<E> {
    /// Interface error (SPI/GPIO)
    ///
    /// Wraps the underlying hardware error from the
    /// [`PanelInterface`](crate::interface::PanelInterface) implementation.
    #[error("interface error: {0:?}")]
    Interface(E),
    /// The busy line did not report ready in time
    ///
    /// Raised only between polls, never in the middle of a command.
    #[error("panel still busy after {waited_ms} ms")]
    BusyTimeout {
        /// Time spent polling before giving up
        waited_ms: u32,
    },
    /// The line source ran dry before a half-frame was complete
    ///
    /// The frame was still closed and all chip-selects released.
    #[error("{controller} half-frame truncated after {lines_written} of {expected} lines")]
    StreamTruncated {
        /// Controller whose half-frame was being written
        controller: Controller,
        /// Lines written before the source failed
        lines_written: u16,
        /// Lines a complete half-frame needs
        expected: u16,
    },
    /// Operation invoked out of the power sequence order
    ///
    /// Nothing was sent to the panel.
    #[error("cannot {operation} while panel is {state}")]
    InvalidState {
        /// Rejected operation
        operation: Operation,
        /// State the panel was in
        state: PanelState,
    },
}

/// Errors that can occur when building configuration
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum BuilderError {
    /// Busy poll interval must be at least 1 ms
    #[error("busy poll interval must be non-zero")]
    ZeroPollInterval,
    /// A bounded timeout must allow at least one poll
    #[error("busy timeout {timeout_ms} ms is shorter than the {poll_ms} ms poll interval")]
    TimeoutShorterThanPoll {
        /// Requested timeout
        timeout_ms: u32,
        /// Requested poll interval
        poll_ms: u32,
    },
}
