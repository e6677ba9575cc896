//! Configuration error types for the Varda client.
//!
//! All configuration constructors return `Result<T, ConfigError>` so that a
//! bad API root or an unreadable configuration file fails before any
//! request is sent.
//!
//! # Example
//!
//! ```rust
//! use varda_client::{ApiToken, ConfigError};
//!
//! let result = ApiToken::new("");
//! assert!(matches!(result, Err(ConfigError::EmptyToken)));
//! ```

use thiserror::Error;

/// Errors that can occur while building a [`ClientConfig`](crate::ClientConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The API root is not an absolute HTTP(S) URL.
    #[error("Invalid API root '{url}'. Expected an absolute URL such as 'https://varda.example.org/api'.")]
    InvalidApiRoot {
        /// The rejected value.
        url: String,
    },

    /// An authentication token was configured but is empty.
    #[error("Authentication token cannot be empty.")]
    EmptyToken,

    /// A size setting must be strictly positive.
    #[error("Configuration value '{field}' must be greater than zero.")]
    ZeroSize {
        /// The offending setting.
        field: &'static str,
    },

    /// A poll wait was negative or not finite.
    #[error("Invalid task poll wait {seconds}; expected a non-negative number of seconds.")]
    InvalidPollWait {
        /// The rejected value.
        seconds: String,
    },

    /// The configuration file could not be read.
    #[error("Could not open configuration file '{path}': {reason}")]
    Unreadable {
        /// Path of the file.
        path: String,
        /// Underlying I/O error message.
        reason: String,
    },

    /// The configuration document could not be parsed.
    #[error("Could not parse configuration: {reason}")]
    Unparseable {
        /// Parser error message.
        reason: String,
    },
}
