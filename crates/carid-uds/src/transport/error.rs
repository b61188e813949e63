//! Transport layer errors

use thiserror::Error;

use super::ProbeTarget;

/// Failures of the bus itself
///
/// An ECU that does not answer is not an error; transports report that as
/// `Ok(None)` from `receive`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Connection closed")]
    ConnectionClosed,

    #[error("Send to {target} failed: {reason}")]
    SendFailed { target: ProbeTarget, reason: String },

    #[error("Receive on {target} failed: {reason}")]
    ReceiveFailed { target: ProbeTarget, reason: String },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
