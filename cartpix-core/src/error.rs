//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug, PartialEq)]
pub enum CartpixError {
    /// A batch was requested from a buffer holding fewer transitions.
    #[error("Insufficient data: requested {requested} transitions, {available} available")]
    InsufficientData {
        /// Requested batch size.
        requested: usize,

        /// Number of transitions in the buffer.
        available: usize,
    },

    /// A configuration parameter is out of its valid range.
    #[error("Invalid configuration of {param}: {message}")]
    InvalidConfig {
        /// Name of the parameter.
        param: String,

        /// What is wrong with it.
        message: String,
    },

    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),
}

impl CartpixError {
    /// Shorthand for [`CartpixError::InvalidConfig`].
    pub fn invalid_config(param: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            param: param.into(),
            message: message.into(),
        }
    }
}
