//! Device exchange errors.

use std::io;

use thiserror::Error;

/// Coarse classification of a failed exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    /// A bounded wait expired while connecting or waiting for the reply.
    Timeout,
    /// The TCP connection could not be established or broke mid-exchange.
    Transport,
    /// Bytes arrived but did not form a valid response.
    Protocol,
}

/// Errors raised by a single register read.
#[derive(Debug, Error)]
pub enum DeviceError {
    /// Connection establishment did not finish in time.
    #[error("Connection to {address} timed out after {timeout_ms}ms")]
    ConnectTimeout { address: String, timeout_ms: u64 },

    /// Connection establishment failed (refused, unreachable, unresolvable).
    #[error("Failed to connect to {address}: {source}")]
    Connect {
        address: String,
        #[source]
        source: io::Error,
    },

    /// The device did not answer in time.
    #[error("No response within {timeout_ms}ms")]
    ReadTimeout { timeout_ms: u64 },

    /// I/O failure on an established connection.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Fewer bytes than the smallest valid response.
    #[error("Invalid response length: {received}")]
    ShortResponse { received: usize },

    /// Trailing checksum disagrees with the frame contents.
    #[error("Checksum mismatch: computed {computed:#06x}, received {received:#06x}")]
    ChecksumMismatch { computed: u16, received: u16 },
}

impl DeviceError {
    /// Classify this error.
    pub fn kind(&self) -> FaultKind {
        match self {
            DeviceError::ConnectTimeout { .. } | DeviceError::ReadTimeout { .. } => {
                FaultKind::Timeout
            }
            DeviceError::Connect { .. } | DeviceError::Io(_) => FaultKind::Transport,
            DeviceError::ShortResponse { .. } | DeviceError::ChecksumMismatch { .. } => {
                FaultKind::Protocol
            }
        }
    }
}

/// Result type for wire operations.
pub type WireResult<T> = Result<T, DeviceError>;
