//! Error types for resource operations.
//!
//! # Error Handling
//!
//! - [`FieldError`]: A field was read or written in a way its descriptor
//!   does not allow (unknown name, immutable field, wrong value type,
//!   malformed wire value).
//! - [`ResourceError`]: Returned by every operation that talks to the
//!   server. Transport adapter failures are flattened into it so callers can
//!   match on [`ApiError`] variants directly.
//!
//! # Example
//!
//! ```rust,ignore
//! use varda_client::clients::ApiError;
//! use varda_client::rest::ResourceError;
//!
//! match session.get_sample("/samples/12") {
//!     Ok(sample) => println!("{}", sample.name()?.unwrap_or_default()),
//!     Err(ResourceError::Api(ApiError::NotFound { message, .. })) => eprintln!("{message}"),
//!     Err(e) => eprintln!("Error: {e}"),
//! }
//! ```

use thiserror::Error;

use crate::clients::{
    ApiError, BodyError, HttpError, InvalidHttpRequestError, TransportError,
};
use crate::error::ConfigError;

/// Error type for field access on a resource.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FieldError {
    /// The resource kind declares no visible field with this name.
    #[error("{kind} has no field '{field}'")]
    Unknown {
        /// Resource kind key.
        kind: &'static str,
        /// The requested field name.
        field: String,
    },

    /// The field cannot be modified.
    #[error("Field '{field}' of {kind} is immutable")]
    Immutable {
        /// Resource kind key.
        kind: &'static str,
        /// The field name.
        field: String,
    },

    /// The value does not match the field's type.
    #[error("Field '{field}' expects {expected}")]
    WrongType {
        /// The field name.
        field: String,
        /// Description of the expected type.
        expected: &'static str,
    },

    /// The server sent a value that cannot be converted.
    #[error("Field '{field}' has an invalid value: {reason}")]
    InvalidWireValue {
        /// The field name.
        field: String,
        /// Why conversion failed.
        reason: String,
    },

    /// The field can be read but has no wire representation to write.
    #[error("Field '{field}' cannot be written")]
    NotWritable {
        /// The field name.
        field: String,
    },

    /// A set operation was used on a field that is not a set.
    #[error("Field '{field}' is not a set")]
    NotASet {
        /// The field name.
        field: String,
    },
}

/// Error type for resource, collection, and session operations.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// The server answered with an unsuccessful status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request never reached the server.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The request failed validation before it was sent.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),

    /// A field was used incorrectly.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// The session configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The server's response does not have the expected shape.
    #[error("Unexpected response from server: {reason}")]
    InvalidResponse {
        /// What was missing or malformed.
        reason: String,
    },

    /// The server root does not list this endpoint.
    #[error("Server does not provide endpoint '{key}'")]
    MissingEndpoint {
        /// The endpoint key.
        key: String,
    },

    /// A server-side task finished unsuccessfully.
    #[error("Task failed ({code}): {message}")]
    TaskFailed {
        /// Error code reported for the task.
        code: String,
        /// Human readable message.
        message: String,
    },
}

impl ResourceError {
    /// Creates an [`InvalidResponse`](Self::InvalidResponse) error.
    pub(crate) fn invalid_response(reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            reason: reason.into(),
        }
    }

    /// Returns the API error, if this is one.
    #[must_use]
    pub const fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl From<HttpError> for ResourceError {
    fn from(error: HttpError) -> Self {
        match error {
            HttpError::Api(e) => Self::Api(e),
            HttpError::Transport(e) => Self::Transport(e),
            HttpError::InvalidRequest(e) => Self::InvalidRequest(e),
        }
    }
}

impl From<BodyError> for ResourceError {
    fn from(error: BodyError) -> Self {
        match error {
            BodyError::Io(e) => Self::Transport(TransportError::Io(e)),
            BodyError::Json(e) => Self::invalid_response(format!("body is not JSON: {e}")),
        }
    }
}

// Verify ResourceError is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ResourceError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_is_flattened() {
        let error = ResourceError::from(HttpError::from(ApiError::from_status(
            403,
            "forbidden",
            "no",
        )));
        assert!(matches!(
            error,
            ResourceError::Api(ApiError::Forbidden { .. })
        ));

        let error = ResourceError::from(HttpError::from(InvalidHttpRequestError::MissingBody {
            method: "POST".to_string(),
        }));
        assert!(matches!(error, ResourceError::InvalidRequest(_)));
    }

    #[test]
    fn test_body_error_mapping() {
        let json_error = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert!(matches!(
            ResourceError::from(BodyError::Json(json_error)),
            ResourceError::InvalidResponse { .. }
        ));

        let io_error = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert!(matches!(
            ResourceError::from(BodyError::Io(io_error)),
            ResourceError::Transport(TransportError::Io(_))
        ));
    }

    #[test]
    fn test_field_error_messages() {
        let error = FieldError::Immutable {
            kind: "sample",
            field: "added".to_string(),
        };
        assert_eq!(error.to_string(), "Field 'added' of sample is immutable");

        let error = FieldError::Unknown {
            kind: "user",
            field: "age".to_string(),
        };
        assert_eq!(error.to_string(), "user has no field 'age'");
    }

    #[test]
    fn test_as_api() {
        let error = ResourceError::from(ApiError::from_status(404, "not_found", "x"));
        assert_eq!(error.as_api().map(ApiError::code), Some("not_found"));
        assert!(ResourceError::invalid_response("x").as_api().is_none());
    }
}
