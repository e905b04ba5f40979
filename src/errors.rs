//! Definition of errors.

use bincode::error::{DecodeError, EncodeError};
use thiserror::Error;

/// The error type for arcbeam.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ParserError {
    /// Error used when an argument or an input is invalid.
    #[error("InvalidArgumentError: {msg}")]
    InvalidArgument {
        /// Error message.
        msg: String,
    },

    /// A scoring worker died before delivering the candidates of its beam slot.
    #[error("WorkerError: scoring of beam slot {slot} failed")]
    Worker {
        /// Beam slot the worker was processing.
        slot: usize,
    },

    /// Model serialization failed.
    #[error("EncodeError: {0}")]
    Encode(#[from] EncodeError),

    /// Model deserialization failed.
    #[error("DecodeError: {0}")]
    Decode(#[from] DecodeError),

    /// I/O error.
    #[error("IoError: {0}")]
    Io(#[from] std::io::Error),
}

impl ParserError {
    /// Creates a new [`ParserError::InvalidArgument`].
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument { msg: msg.into() }
    }

    /// Creates a new [`ParserError::Worker`].
    pub const fn worker(slot: usize) -> Self {
        Self::Worker { slot }
    }
}

/// A specialized Result type.
pub type Result<T, E = ParserError> = core::result::Result<T, E>;
