//! HTTP request types for the transport adapter.
//!
//! This module provides the [`HttpRequest`] type and its builder, the
//! [`RequestBody`] encodings the server accepts, and [`Upload`] for file
//! payloads.

use std::collections::HashMap;
use std::fmt;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;

use serde_json::{Map, Value};

use crate::clients::errors::InvalidHttpRequestError;

/// HTTP methods used by the Varda API.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    /// Retrieve a resource or collection page.
    Get,
    /// Create a resource.
    Post,
    /// Partially update a resource.
    Patch,
}

impl HttpMethod {
    /// Returns the method name as sent on the wire.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A file payload for a multipart request.
///
/// The multipart part carries the file's own name when one is known, and
/// falls back to the field name otherwise (for example when reading from
/// standard input).
pub struct Upload {
    filename: Option<String>,
    reader: Box<dyn Read + Send>,
}

impl Upload {
    /// Opens the file at `path` for upload under its own file name.
    ///
    /// # Errors
    ///
    /// Returns the I/O error if the file cannot be opened.
    pub fn from_path(path: impl AsRef<Path>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        Ok(Self {
            filename: path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned()),
            reader: Box::new(file),
        })
    }

    /// Uploads whatever `reader` produces, without a file name.
    #[must_use]
    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self {
            filename: None,
            reader: Box::new(reader),
        }
    }

    /// Uploads an in-memory buffer.
    #[must_use]
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::from_reader(Cursor::new(bytes.into()))
    }

    /// Sets the file name reported in the multipart part.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Returns the file name, if known.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Consumes the upload and returns its reader.
    #[must_use]
    pub fn into_reader(self) -> Box<dyn Read + Send> {
        self.reader
    }
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("filename", &self.filename)
            .finish_non_exhaustive()
    }
}

/// One file part of a multipart body.
#[derive(Debug)]
pub struct FilePart {
    /// The form field name.
    pub field: String,
    /// The file name reported for this part.
    pub filename: String,
    /// The file contents.
    pub upload: Upload,
}

/// The body of an [`HttpRequest`].
#[derive(Debug, Default)]
pub enum RequestBody {
    /// No body.
    #[default]
    Empty,
    /// A JSON document (`Content-Type: application/json`).
    Json(Value),
    /// A `multipart/form-data` body of text fields and files.
    Multipart {
        /// Stringified form fields.
        fields: Vec<(String, String)>,
        /// File parts.
        files: Vec<FilePart>,
    },
}

impl RequestBody {
    /// Returns `true` if there is no body.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }

    /// Returns the JSON document, if this is a JSON body.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// An HTTP request ready to be handed to a [`Transport`](crate::clients::Transport).
///
/// The URL is fully qualified; headers include everything the client adds.
///
/// # Example
///
/// ```rust
/// use varda_client::clients::{HttpMethod, HttpRequest};
/// use serde_json::json;
///
/// let request = HttpRequest::builder(HttpMethod::Patch, "http://varda.test/samples/3")
///     .json(json!({"name": "renamed"}))
///     .build()
///     .unwrap();
///
/// assert_eq!(request.body.as_json(), Some(&json!({"name": "renamed"})));
/// ```
#[derive(Debug)]
pub struct HttpRequest {
    /// The HTTP method for this request.
    pub http_method: HttpMethod,
    /// The absolute URL.
    pub url: String,
    /// Request headers.
    pub headers: HashMap<String, String>,
    /// The request body.
    pub body: RequestBody,
}

impl HttpRequest {
    /// Creates a new builder for constructing an `HttpRequest`.
    #[must_use]
    pub fn builder(method: HttpMethod, url: impl Into<String>) -> HttpRequestBuilder {
        HttpRequestBuilder::new(method, url)
    }

    /// Validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError::MissingBody`] for a POST or PATCH
    /// request without a body, and [`InvalidHttpRequestError::InvalidHeader`]
    /// for a header with an empty name.
    pub fn verify(&self) -> Result<(), InvalidHttpRequestError> {
        if matches!(self.http_method, HttpMethod::Post | HttpMethod::Patch) && self.body.is_empty()
        {
            return Err(InvalidHttpRequestError::MissingBody {
                method: self.http_method.to_string(),
            });
        }

        if let Some(name) = self.headers.keys().find(|name| name.trim().is_empty()) {
            return Err(InvalidHttpRequestError::InvalidHeader { name: name.clone() });
        }

        Ok(())
    }

    /// Returns a header value, matching the name case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Builder for [`HttpRequest`].
#[derive(Debug)]
pub struct HttpRequestBuilder {
    http_method: HttpMethod,
    url: String,
    headers: HashMap<String, String>,
    body: RequestBody,
}

impl HttpRequestBuilder {
    /// Creates a new builder.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            http_method: method,
            url: url.into(),
            headers: HashMap::new(),
            body: RequestBody::Empty,
        }
    }

    /// Adds a header, replacing any previous value under the same name.
    #[must_use]
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// Adds every header in `headers`.
    #[must_use]
    pub fn headers(mut self, headers: impl IntoIterator<Item = (String, String)>) -> Self {
        self.headers.extend(headers);
        self
    }

    /// Sets a JSON body.
    #[must_use]
    pub fn json(mut self, body: Value) -> Self {
        self.body = RequestBody::Json(body);
        self
    }

    /// Sets a multipart body from a JSON object and a set of uploads.
    ///
    /// Each top-level value is stringified with [`stringify_form_value`];
    /// `null` values are left out. Uploads are named after their file name,
    /// or after their field when they have none.
    #[must_use]
    pub fn multipart(
        mut self,
        data: &Map<String, Value>,
        files: impl IntoIterator<Item = (String, Upload)>,
    ) -> Self {
        let fields = data
            .iter()
            .filter_map(|(key, value)| stringify_form_value(value).map(|s| (key.clone(), s)))
            .collect();

        let files = files
            .into_iter()
            .map(|(field, upload)| FilePart {
                filename: upload.filename().map_or_else(|| field.clone(), str::to_string),
                field,
                upload,
            })
            .collect();

        self.body = RequestBody::Multipart { fields, files };
        self
    }

    /// Builds and validates the request.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidHttpRequestError`] if validation fails.
    pub fn build(self) -> Result<HttpRequest, InvalidHttpRequestError> {
        let request = HttpRequest {
            http_method: self.http_method,
            url: self.url,
            headers: self.headers,
            body: self.body,
        };
        request.verify()?;
        Ok(request)
    }
}

/// Stringifies a JSON value for a form field.
///
/// The conversion is single-level: booleans become `"true"`/`"false"`,
/// arrays are comma-joined, objects become comma-joined `key:value` pairs,
/// and nested containers inside those are written as compact JSON.
/// `null` produces `None`.
///
/// # Example
///
/// ```rust
/// use varda_client::clients::stringify_form_value;
/// use serde_json::json;
///
/// assert_eq!(stringify_form_value(&json!(true)).as_deref(), Some("true"));
/// assert_eq!(stringify_form_value(&json!(["a", "b"])).as_deref(), Some("a,b"));
/// assert_eq!(stringify_form_value(&json!({"k": "v"})).as_deref(), Some("k:v"));
/// assert_eq!(stringify_form_value(&json!(null)), None);
/// ```
#[must_use]
pub fn stringify_form_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Array(items) => Some(
            items
                .iter()
                .map(stringify_scalar)
                .collect::<Vec<_>>()
                .join(","),
        ),
        Value::Object(map) => Some(
            map.iter()
                .map(|(k, v)| format!("{k}:{}", stringify_scalar(v)))
                .collect::<Vec<_>>()
                .join(","),
        ),
        scalar => Some(stringify_scalar(scalar)),
    }
}

fn stringify_scalar(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        nested => nested.to_string(),
    }
}
