//! HTTP response types for the transport adapter.
//!
//! This module provides the [`HttpResponse`] type and the [`ContentRange`]
//! parser used by collection pagination.

use std::collections::HashMap;
use std::fmt;
use std::io::{Cursor, Read};

use serde_json::Value;
use thiserror::Error;

/// Statuses the adapter treats as success.
pub const SUCCESS_STATUSES: [u16; 4] = [200, 201, 202, 206];

/// An item range reported in a `Content-Range` response header.
///
/// The header format is `items <first>-<last>/<total>` (both bounds
/// inclusive) or `items */<total>` when no items were returned. `stop` is
/// exclusive, so a page of 20 items starting at 0 has `start == 0` and
/// `stop == 20`.
///
/// # Example
///
/// ```rust
/// use varda_client::clients::ContentRange;
///
/// let range = ContentRange::parse("items 0-19/45").unwrap();
/// assert_eq!(range.start, Some(0));
/// assert_eq!(range.stop, Some(20));
/// assert_eq!(range.length, 45);
///
/// let range = ContentRange::parse("items */0").unwrap();
/// assert_eq!(range.start, None);
/// assert_eq!(range.length, 0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ContentRange {
    /// Index of the first item in this response.
    pub start: Option<u64>,
    /// One past the index of the last item in this response.
    pub stop: Option<u64>,
    /// Total number of items in the collection.
    pub length: u64,
}

impl ContentRange {
    /// Parses a `Content-Range` header value.
    ///
    /// Returns `None` for other units, unknown totals, or malformed values.
    #[must_use]
    pub fn parse(header_value: &str) -> Option<Self> {
        let rest = header_value.trim().strip_prefix("items")?;
        if !rest.starts_with(char::is_whitespace) {
            return None;
        }
        let (range, length) = rest.trim_start().split_once('/')?;
        let length = length.trim().parse().ok()?;

        if range.trim() == "*" {
            return Some(Self {
                start: None,
                stop: None,
                length,
            });
        }

        let (first, last) = range.split_once('-')?;
        let first: u64 = first.trim().parse().ok()?;
        let last: u64 = last.trim().parse().ok()?;
        if last < first {
            return None;
        }

        Some(Self {
            start: Some(first),
            stop: Some(last + 1),
            length,
        })
    }
}

impl fmt::Display for ContentRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.start, self.stop) {
            (Some(start), Some(stop)) => {
                write!(f, "items {start}-{}/{}", stop.saturating_sub(1), self.length)
            }
            _ => write!(f, "items */{}", self.length),
        }
    }
}

/// Failure to consume a response body.
#[derive(Debug, Error)]
pub enum BodyError {
    /// The body could not be read.
    #[error("Could not read response body: {0}")]
    Io(#[from] std::io::Error),

    /// The body is not a JSON document.
    #[error("Response body is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// A response from the server.
///
/// Header names are stored lowercase. The body is a stream so large blobs
/// can be consumed in chunks.
pub struct HttpResponse {
    /// The HTTP status code.
    pub code: u16,
    /// Response headers, keyed by lowercase name.
    pub headers: HashMap<String, Vec<String>>,
    body: Box<dyn Read + Send>,
}

impl HttpResponse {
    /// Creates a response from its parts.
    #[must_use]
    pub fn new(
        code: u16,
        headers: HashMap<String, Vec<String>>,
        body: impl Read + Send + 'static,
    ) -> Self {
        let headers = headers
            .into_iter()
            .map(|(name, values)| (name.to_lowercase(), values))
            .collect();
        Self {
            code,
            headers,
            body: Box::new(body),
        }
    }

    /// Creates a response carrying `body` serialized as JSON.
    #[must_use]
    pub fn json(code: u16, body: &Value) -> Self {
        Self::new(code, HashMap::new(), Cursor::new(body.to_string().into_bytes()))
            .with_header("content-type", "application/json")
    }

    /// Creates a response with a raw text body.
    #[must_use]
    pub fn text(code: u16, body: impl Into<String>) -> Self {
        Self::new(code, HashMap::new(), Cursor::new(body.into().into_bytes()))
    }

    /// Adds a header value.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.to_lowercase())
            .or_default()
            .push(value.into());
        self
    }

    /// Returns `true` if the status is one of [`SUCCESS_STATUSES`].
    #[must_use]
    pub fn is_ok(&self) -> bool {
        SUCCESS_STATUSES.contains(&self.code)
    }

    /// Returns the canonical reason phrase for the status code.
    #[must_use]
    pub fn reason(&self) -> &'static str {
        reqwest::StatusCode::from_u16(self.code)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown Status")
    }

    /// Returns the first value of a header, matching case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    /// Returns the `Location` header.
    #[must_use]
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Returns the parsed `Content-Range` header.
    #[must_use]
    pub fn content_range(&self) -> Option<ContentRange> {
        self.header("content-range").and_then(ContentRange::parse)
    }

    /// Reads the whole body.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if reading fails.
    pub fn into_bytes(mut self) -> std::io::Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.body.read_to_end(&mut buffer)?;
        Ok(buffer)
    }

    /// Reads the whole body as text, replacing invalid UTF-8.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if reading fails.
    pub fn into_text(self) -> std::io::Result<String> {
        self.into_bytes()
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Reads and parses the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`BodyError`] if reading or parsing fails.
    pub fn into_json(self) -> Result<Value, BodyError> {
        let bytes = self.into_bytes()?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Consumes the response and returns the body stream.
    #[must_use]
    pub fn into_body(self) -> Box<dyn Read + Send> {
        self.body
    }
}

impl fmt::Debug for HttpResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpResponse")
            .field("code", &self.code)
            .field("headers", &self.headers)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_content_range_parses_page() {
        let range = ContentRange::parse("items 20-39/43").unwrap();
        assert_eq!(range.start, Some(20));
        assert_eq!(range.stop, Some(40));
        assert_eq!(range.length, 43);
    }

    #[test]
    fn test_content_range_parses_unsatisfied_form() {
        let range = ContentRange::parse("items */12").unwrap();
        assert_eq!(range.start, None);
        assert_eq!(range.stop, None);
        assert_eq!(range.length, 12);
    }

    #[test]
    fn test_content_range_rejects_malformed_values() {
        assert!(ContentRange::parse("bytes 0-19/45").is_none());
        assert!(ContentRange::parse("items0-19/45").is_none());
        assert!(ContentRange::parse("items 0-19").is_none());
        assert!(ContentRange::parse("items 0-19/*").is_none());
        assert!(ContentRange::parse("items 19-0/45").is_none());
        assert!(ContentRange::parse("").is_none());
    }

    #[test]
    fn test_content_range_display_round_trips() {
        for header in ["items 0-19/45", "items */0"] {
            assert_eq!(ContentRange::parse(header).unwrap().to_string(), header);
        }
    }

    #[test]
    fn test_success_statuses() {
        for code in [200, 201, 202, 206] {
            assert!(HttpResponse::text(code, "").is_ok());
        }
        for code in [204, 301, 400, 416, 500] {
            assert!(!HttpResponse::text(code, "").is_ok());
        }
    }

    #[test]
    fn test_headers_are_case_insensitive() {
        let response = HttpResponse::text(201, "")
            .with_header("Location", "http://varda.test/samples/1");
        assert_eq!(response.location(), Some("http://varda.test/samples/1"));
        assert_eq!(response.header("LOCATION"), Some("http://varda.test/samples/1"));
    }

    #[test]
    fn test_new_lowercases_header_names() {
        let mut headers = HashMap::new();
        headers.insert("Content-Range".to_string(), vec!["items 0-0/1".to_string()]);
        let response = HttpResponse::new(206, headers, std::io::empty());
        assert_eq!(response.content_range().map(|r| r.length), Some(1));
    }

    #[test]
    fn test_reason_phrase() {
        assert_eq!(HttpResponse::text(404, "").reason(), "Not Found");
        assert_eq!(HttpResponse::text(599, "").reason(), "Unknown Status");
    }

    #[test]
    fn test_into_json() {
        let response = HttpResponse::json(200, &json!({"sample": {"uri": "/samples/1"}}));
        let body = response.into_json().unwrap();
        assert_eq!(body["sample"]["uri"], "/samples/1");

        let response = HttpResponse::text(200, "<html>");
        assert!(matches!(response.into_json(), Err(BodyError::Json(_))));
    }
}
