//! Error types for the transport adapter.
//!
//! # Error Handling
//!
//! - [`ApiError`]: The server answered with an unsuccessful status. The
//!   variant is chosen from the status code; every variant carries the
//!   `code` and `message` the server reported.
//! - [`TransportError`]: The request never reached the server (connection
//!   refused, timeout, unreadable upload). These are never translated into
//!   [`ApiError`].
//! - [`InvalidHttpRequestError`]: A request failed validation before sending.
//! - [`HttpError`]: Union of the above returned by
//!   [`HttpClient::request`](crate::clients::HttpClient::request).
//!
//! # Example
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use varda_client::clients::{ApiError, HttpError};
//!
//! match client.get("/samples/3", None, HashMap::new()) {
//!     Ok(response) => println!("status {}", response.code),
//!     Err(HttpError::Api(ApiError::NotFound { message, .. })) => println!("gone: {message}"),
//!     Err(HttpError::Api(e)) => println!("API error {}: {}", e.code(), e.message()),
//!     Err(HttpError::Transport(e)) => println!("could not reach server: {e}"),
//!     Err(HttpError::InvalidRequest(e)) => println!("bad request: {e}"),
//! }
//! ```

use thiserror::Error;

use crate::clients::http_response::ContentRange;

/// An unsuccessful response from the server.
///
/// Mapping from status code:
///
/// | Status | Variant |
/// |--------|---------|
/// | 400 | [`BadRequest`](Self::BadRequest) |
/// | 401 | [`Unauthorized`](Self::Unauthorized) |
/// | 403 | [`Forbidden`](Self::Forbidden) |
/// | 404 | [`NotFound`](Self::NotFound) |
/// | 406 | [`NotAcceptable`](Self::NotAcceptable) |
/// | 416 | [`UnsatisfiableRange`](Self::UnsatisfiableRange) |
/// | other | [`Other`](Self::Other) |
///
/// # Example
///
/// ```rust
/// use varda_client::clients::ApiError;
///
/// let error = ApiError::from_status(404, "not_found", "The requested entity could not be found");
/// assert!(matches!(error, ApiError::NotFound { .. }));
/// assert_eq!(error.code(), "not_found");
/// assert_eq!(error.status(), 404);
/// ```
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// Malformed input (HTTP 400).
    #[error("Bad request ({code}): {message}")]
    BadRequest {
        /// Error code reported by the server.
        code: String,
        /// Human readable message.
        message: String,
    },

    /// Missing or invalid credentials (HTTP 401).
    #[error("Unauthorized ({code}): {message}")]
    Unauthorized {
        /// Error code reported by the server.
        code: String,
        /// Human readable message.
        message: String,
    },

    /// Authenticated but not permitted (HTTP 403).
    #[error("Forbidden ({code}): {message}")]
    Forbidden {
        /// Error code reported by the server.
        code: String,
        /// Human readable message.
        message: String,
    },

    /// The URI does not resolve to an existing resource (HTTP 404).
    #[error("Not found ({code}): {message}")]
    NotFound {
        /// Error code reported by the server.
        code: String,
        /// Human readable message.
        message: String,
    },

    /// Content negotiation failed (HTTP 406).
    #[error("Not acceptable ({code}): {message}")]
    NotAcceptable {
        /// Error code reported by the server.
        code: String,
        /// Human readable message.
        message: String,
    },

    /// The requested item range lies beyond the collection (HTTP 416).
    #[error("Unsatisfiable range ({code}): {message}")]
    UnsatisfiableRange {
        /// Error code reported by the server.
        code: String,
        /// Human readable message.
        message: String,
        /// The `Content-Range` the server sent along, if any.
        content_range: Option<ContentRange>,
    },

    /// Any other unsuccessful status.
    #[error("API error {status} ({code}): {message}")]
    Other {
        /// The HTTP status code.
        status: u16,
        /// Error code reported by the server.
        code: String,
        /// Human readable message.
        message: String,
    },
}

impl ApiError {
    /// Builds the variant matching `status`.
    ///
    /// The mapping is total: unknown statuses produce [`ApiError::Other`].
    #[must_use]
    pub fn from_status(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        let code = code.into();
        let message = message.into();
        match status {
            400 => Self::BadRequest { code, message },
            401 => Self::Unauthorized { code, message },
            403 => Self::Forbidden { code, message },
            404 => Self::NotFound { code, message },
            406 => Self::NotAcceptable { code, message },
            416 => Self::UnsatisfiableRange {
                code,
                message,
                content_range: None,
            },
            _ => Self::Other {
                status,
                code,
                message,
            },
        }
    }

    /// Attaches the `Content-Range` of the response to an unsatisfiable
    /// range error. Other variants are returned unchanged.
    #[must_use]
    pub fn with_content_range(self, range: Option<ContentRange>) -> Self {
        match self {
            Self::UnsatisfiableRange { code, message, .. } => Self::UnsatisfiableRange {
                code,
                message,
                content_range: range,
            },
            other => other,
        }
    }

    /// Returns the error code reported by the server.
    #[must_use]
    pub fn code(&self) -> &str {
        match self {
            Self::BadRequest { code, .. }
            | Self::Unauthorized { code, .. }
            | Self::Forbidden { code, .. }
            | Self::NotFound { code, .. }
            | Self::NotAcceptable { code, .. }
            | Self::UnsatisfiableRange { code, .. }
            | Self::Other { code, .. } => code,
        }
    }

    /// Returns the human readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest { message, .. }
            | Self::Unauthorized { message, .. }
            | Self::Forbidden { message, .. }
            | Self::NotFound { message, .. }
            | Self::NotAcceptable { message, .. }
            | Self::UnsatisfiableRange { message, .. }
            | Self::Other { message, .. } => message,
        }
    }

    /// Returns the HTTP status code this error was built from.
    #[must_use]
    pub const fn status(&self) -> u16 {
        match self {
            Self::BadRequest { .. } => 400,
            Self::Unauthorized { .. } => 401,
            Self::Forbidden { .. } => 403,
            Self::NotFound { .. } => 404,
            Self::NotAcceptable { .. } => 406,
            Self::UnsatisfiableRange { .. } => 416,
            Self::Other { status, .. } => *status,
        }
    }
}

/// The request could not be exchanged with the server.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Connection, TLS, or timeout failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Reading an upload or a response body failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The underlying HTTP client could not be set up.
    #[error("Could not set up HTTP transport: {reason}")]
    Setup {
        /// Why construction failed.
        reason: String,
    },
}

/// Error returned when a request fails validation before it is sent.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum InvalidHttpRequestError {
    /// A POST or PATCH request was made without a body.
    #[error("Cannot use {method} without specifying data.")]
    MissingBody {
        /// The HTTP method that requires a body.
        method: String,
    },

    /// A header name or value is not valid HTTP.
    #[error("Invalid header '{name}'.")]
    InvalidHeader {
        /// The header name.
        name: String,
    },
}

/// Unified error type returned by the transport adapter.
#[derive(Debug, Error)]
pub enum HttpError {
    /// The server answered with an unsuccessful status.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The request never reached the server.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// Request validation failed.
    #[error(transparent)]
    InvalidRequest(#[from] InvalidHttpRequestError),
}

impl HttpError {
    /// Returns the API error, if this is one.
    #[must_use]
    pub const fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

// Verify the error types are Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpError>();
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping_is_total() {
        assert!(matches!(
            ApiError::from_status(400, "c", "m"),
            ApiError::BadRequest { .. }
        ));
        assert!(matches!(
            ApiError::from_status(401, "c", "m"),
            ApiError::Unauthorized { .. }
        ));
        assert!(matches!(
            ApiError::from_status(403, "c", "m"),
            ApiError::Forbidden { .. }
        ));
        assert!(matches!(
            ApiError::from_status(404, "c", "m"),
            ApiError::NotFound { .. }
        ));
        assert!(matches!(
            ApiError::from_status(406, "c", "m"),
            ApiError::NotAcceptable { .. }
        ));
        assert!(matches!(
            ApiError::from_status(416, "c", "m"),
            ApiError::UnsatisfiableRange { .. }
        ));
        assert!(matches!(
            ApiError::from_status(500, "c", "m"),
            ApiError::Other { status: 500, .. }
        ));
        assert!(matches!(
            ApiError::from_status(409, "c", "m"),
            ApiError::Other { status: 409, .. }
        ));
    }

    #[test]
    fn test_accessors_return_code_message_and_status() {
        let error = ApiError::from_status(403, "forbidden", "No access");
        assert_eq!(error.code(), "forbidden");
        assert_eq!(error.message(), "No access");
        assert_eq!(error.status(), 403);

        let error = ApiError::from_status(502, "Bad Gateway", "upstream");
        assert_eq!(error.status(), 502);
    }

    #[test]
    fn test_display_includes_code_and_message() {
        let error = ApiError::from_status(404, "not_found", "x");
        let text = error.to_string();
        assert!(text.contains("not_found"));
        assert!(text.contains('x'));
    }

    #[test]
    fn test_with_content_range_only_touches_unsatisfiable_range() {
        let range = ContentRange::parse("items */42");
        let error = ApiError::from_status(416, "c", "m").with_content_range(range);
        assert!(matches!(
            error,
            ApiError::UnsatisfiableRange {
                content_range: Some(ContentRange { length: 42, .. }),
                ..
            }
        ));

        let error = ApiError::from_status(404, "c", "m").with_content_range(range);
        assert!(matches!(error, ApiError::NotFound { .. }));
    }

    #[test]
    fn test_invalid_request_error_missing_body() {
        let error = InvalidHttpRequestError::MissingBody {
            method: "PATCH".to_string(),
        };
        assert_eq!(error.to_string(), "Cannot use PATCH without specifying data.");
    }

    #[test]
    fn test_http_error_as_api() {
        let error = HttpError::from(ApiError::from_status(401, "c", "m"));
        assert_eq!(error.as_api().map(ApiError::status), Some(401));

        let error = HttpError::from(InvalidHttpRequestError::MissingBody {
            method: "POST".to_string(),
        });
        assert!(error.as_api().is_none());
    }
}
