//! HTTP client for Varda API communication.
//!
//! This module provides the [`HttpClient`] type: it qualifies URIs against
//! the API root, adds the default headers, encodes the payload, hands the
//! request to a [`Transport`], and translates unsuccessful statuses into
//! [`ApiError`].

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::clients::errors::{ApiError, HttpError};
use crate::clients::http_request::{HttpMethod, HttpRequest, Upload};
use crate::clients::http_response::HttpResponse;
use crate::clients::transport::{ReqwestTransport, Transport};
use crate::clients::TransportError;
use crate::config::{ApiRoot, ClientConfig};

/// API versions this client speaks, sent as `Accept-Version`.
pub const ACCEPT_VERSION: &str = ">=3.0.0,<4.0.0";

/// SDK version from Cargo.toml.
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Length of the raw body excerpt used as message for unstructured errors.
const ERROR_EXCERPT_LEN: usize = 78;

/// HTTP client for making requests to the Varda API.
///
/// The client handles:
/// - URI qualification against the configured API root
/// - Default headers (`Accept-Version`, `Accept`, `User-Agent`, and
///   `Authorization` when a token is configured)
/// - JSON or multipart payload encoding
/// - Status code translation into [`ApiError`]
///
/// # Thread Safety
///
/// `HttpClient` is `Send + Sync`.
///
/// # Example
///
/// ```rust,ignore
/// use varda_client::clients::{HttpClient, HttpMethod};
/// use varda_client::ClientConfig;
///
/// let client = HttpClient::from_config(&ClientConfig::default())?;
/// let response = client.get("/", None, Vec::new())?;
/// println!("{:?}", response.into_json()?);
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    api_root: ApiRoot,
    default_headers: HashMap<String, String>,
    transport: Arc<dyn Transport>,
}

// Verify HttpClient is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<HttpClient>();
};

impl HttpClient {
    /// Creates a client sending through `transport`.
    #[must_use]
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Self {
        let user_agent_prefix = config
            .user_agent_prefix()
            .map_or(String::new(), |prefix| format!("{prefix} | "));
        let user_agent = format!("{user_agent_prefix}varda-client v{SDK_VERSION}");

        let mut default_headers = HashMap::new();
        default_headers.insert("Accept-Version".to_string(), ACCEPT_VERSION.to_string());
        default_headers.insert("Accept".to_string(), "application/json".to_string());
        default_headers.insert("User-Agent".to_string(), user_agent);

        if let Some(token) = config.token() {
            default_headers.insert(
                "Authorization".to_string(),
                format!("Token {}", token.as_ref()),
            );
        }

        Self {
            api_root: config.api_root().clone(),
            default_headers,
            transport,
        }
    }

    /// Creates a client backed by a [`ReqwestTransport`].
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Setup`] if the transport cannot be built.
    pub fn from_config(config: &ClientConfig) -> Result<Self, TransportError> {
        let transport = ReqwestTransport::new(config)?;
        Ok(Self::new(config, Arc::new(transport)))
    }

    /// Returns the API root requests are resolved against.
    #[must_use]
    pub const fn api_root(&self) -> &ApiRoot {
        &self.api_root
    }

    /// Returns the default headers for this client.
    #[must_use]
    pub const fn default_headers(&self) -> &HashMap<String, String> {
        &self.default_headers
    }

    /// Sends a request to the Varda API.
    ///
    /// `uri` may be relative to the API root or absolute. With `files`, the
    /// payload is sent as `multipart/form-data` with `data` stringified per
    /// field; otherwise `data`, if any, is sent as a JSON body. Extra
    /// `headers` override the defaults.
    ///
    /// Responses with status 200, 201, 202, or 206 are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`HttpError`] if:
    /// - Request validation fails (`InvalidRequest`)
    /// - The transport fails (`Transport`, logged and returned unchanged)
    /// - Any other status is received (`Api`)
    pub fn request(
        &self,
        method: HttpMethod,
        uri: &str,
        data: Option<Value>,
        files: Vec<(String, Upload)>,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse, HttpError> {
        let url = self.api_root.join(uri);

        let mut builder = HttpRequest::builder(method, url.as_str())
            .headers(self.default_headers.clone())
            .headers(headers);

        if files.is_empty() {
            if let Some(data) = data {
                builder = builder.json(data);
            }
        } else {
            let fields = match data {
                Some(Value::Object(map)) => map,
                _ => Map::new(),
            };
            builder = builder.multipart(&fields, files);
        }

        let request = builder.build()?;

        tracing::debug!(method = %method, url = %url, "Sending request");

        let response = match self.transport.send(request) {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!(method = %method, url = %url, error = %e, "Request failed");
                return Err(e.into());
            }
        };

        if response.is_ok() {
            return Ok(response);
        }

        let error = Self::response_error(response);
        tracing::debug!(
            status = error.status(),
            code = error.code(),
            "Request returned an error status"
        );
        Err(error.into())
    }

    /// Sends a GET request, optionally with a JSON body and extra headers.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub fn get(
        &self,
        uri: &str,
        data: Option<Value>,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Get, uri, data, Vec::new(), headers)
    }

    /// Sends a POST request with a JSON or multipart body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub fn post(
        &self,
        uri: &str,
        data: Value,
        files: Vec<(String, Upload)>,
    ) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Post, uri, Some(data), files, HashMap::new())
    }

    /// Sends a PATCH request with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`request`](Self::request).
    pub fn patch(&self, uri: &str, data: Value) -> Result<HttpResponse, HttpError> {
        self.request(HttpMethod::Patch, uri, Some(data), Vec::new(), HashMap::new())
    }

    /// Builds the [`ApiError`] for an unsuccessful response.
    ///
    /// The code and message come from an `{"error": {"code", "message"}}`
    /// body; otherwise the reason phrase and the start of the raw body are
    /// used.
    fn response_error(response: HttpResponse) -> ApiError {
        let status = response.code;
        let reason = response.reason();
        let content_range = response.content_range();
        let text = response.into_text().unwrap_or_default();

        let (code, message) = Self::parse_error_body(&text)
            .unwrap_or_else(|| (reason.to_string(), excerpt(&text, ERROR_EXCERPT_LEN)));

        ApiError::from_status(status, code, message).with_content_range(content_range)
    }

    fn parse_error_body(text: &str) -> Option<(String, String)> {
        let body: Value = serde_json::from_str(text).ok()?;
        let error = body.get("error")?;
        let code = error.get("code")?.as_str()?;
        let message = error.get("message")?.as_str()?;
        Some((code.to_string(), message.to_string()))
    }
}

/// Returns at most `max_chars` characters of `text`.
fn excerpt(text: &str, max_chars: usize) -> String {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(index, _)| &text[..index])
        .to_string()
}
