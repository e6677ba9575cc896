//! Field descriptors.
//!
//! Every resource kind declares a static table of [`Field`]s. A descriptor
//! names the attribute, says whether it may be modified or is only a
//! creation input, and knows how to convert between the wire value (JSON)
//! and the local value ([`LocalValue`]).
//!
//! | Kind | Wire | Local |
//! |------|------|-------|
//! | [`FieldKind::Boolean`] | `true` | [`LocalValue::Boolean`] |
//! | [`FieldKind::Integer`] | `5` | [`LocalValue::Integer`] |
//! | [`FieldKind::String`] | `"exome"` | [`LocalValue::String`] |
//! | [`FieldKind::DateTime`] | `"2012-11-23T10:55:12"` | [`LocalValue::DateTime`] |
//! | [`FieldKind::Link`] | `"/users/1"` or `{"uri": "/users/1"}` | [`LocalValue::Link`] |
//! | [`FieldKind::Blob`] | `{"uri": "/data_sources/1/data"}` | [`LocalValue::Blob`] (read only) |
//! | [`FieldKind::Set`] | `[...]` | [`LocalValue::Set`] |
//! | [`FieldKind::Queries`] | `[{"name", "expression"}]` | [`LocalValue::Queries`] |
//! | [`FieldKind::Task`] | `{"waiting", "running", ...}` | [`LocalValue::Task`] |
//!
//! `null` always converts to [`LocalValue::Null`] and back.

use std::collections::{BTreeMap, BTreeSet};
use std::io::Read;

use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::clients::TransportError;
use crate::rest::errors::{FieldError, ResourceError};
use crate::rest::resource::RestResource;
use crate::rest::resources::ResourceKind;
use crate::session::Session;

/// Format used for timestamps on the wire.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// The type of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKind {
    /// A boolean.
    Boolean,
    /// A signed integer.
    Integer,
    /// A string.
    String,
    /// A timestamp without time zone.
    DateTime,
    /// A link to a resource of the given kind.
    Link(ResourceKind),
    /// Binary data, streamed on demand.
    Blob,
    /// A set of values of the member kind.
    Set(&'static FieldKind),
    /// Annotation queries, keyed by name.
    Queries,
    /// The state of a server-side task.
    Task,
}

impl FieldKind {
    /// Converts a wire value to its local representation.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::InvalidWireValue`] if `value` does not have the
    /// shape this kind expects.
    pub fn to_local(&self, field: &str, value: &Value) -> Result<LocalValue, FieldError> {
        if value.is_null() {
            return Ok(LocalValue::Null);
        }

        let invalid = |reason: &str| FieldError::InvalidWireValue {
            field: field.to_string(),
            reason: reason.to_string(),
        };

        match self {
            Self::Boolean => value
                .as_bool()
                .map(LocalValue::Boolean)
                .ok_or_else(|| invalid("expected a boolean")),
            Self::Integer => value
                .as_i64()
                .map(LocalValue::Integer)
                .ok_or_else(|| invalid("expected an integer")),
            Self::String => value
                .as_str()
                .map(|s| LocalValue::String(s.to_string()))
                .ok_or_else(|| invalid("expected a string")),
            Self::DateTime => {
                let text = value.as_str().ok_or_else(|| invalid("expected a timestamp"))?;
                parse_datetime(text)
                    .map(LocalValue::DateTime)
                    .ok_or_else(|| invalid("unrecognized timestamp format"))
            }
            Self::Link(kind) => link_uri(value)
                .map(|uri| LocalValue::Link(ResourceRef::new(*kind, uri)))
                .ok_or_else(|| invalid("expected a URI or an object with a URI")),
            Self::Blob => link_uri(value)
                .map(|uri| LocalValue::Blob(BlobRef::new(uri)))
                .ok_or_else(|| invalid("expected an object with a URI")),
            Self::Set(member) => {
                let items = value.as_array().ok_or_else(|| invalid("expected a list"))?;
                items
                    .iter()
                    .map(|item| member.to_local(field, item))
                    .collect::<Result<BTreeSet<_>, _>>()
                    .map(LocalValue::Set)
            }
            Self::Queries => {
                let items = value.as_array().ok_or_else(|| invalid("expected a list"))?;
                items
                    .iter()
                    .map(|item| {
                        let name = item.get("name").and_then(Value::as_str);
                        let expression = item.get("expression").and_then(Value::as_str);
                        match (name, expression) {
                            (Some(name), Some(expression)) => {
                                Ok((name.to_string(), expression.to_string()))
                            }
                            _ => Err(invalid("expected objects with name and expression")),
                        }
                    })
                    .collect::<Result<BTreeMap<_, _>, _>>()
                    .map(LocalValue::Queries)
            }
            Self::Task => serde_json::from_value(value.clone())
                .map(LocalValue::Task)
                .map_err(|e| invalid(&e.to_string())),
        }
    }

    /// Converts a local value to its wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::WrongType`] if `value` does not match this kind,
    /// and [`FieldError::NotWritable`] for blobs.
    pub fn to_wire(&self, field: &str, value: &LocalValue) -> Result<Value, FieldError> {
        if matches!(value, LocalValue::Null) {
            return Ok(Value::Null);
        }

        let wrong_type = || FieldError::WrongType {
            field: field.to_string(),
            expected: self.description(),
        };

        match (self, value) {
            (Self::Blob, _) => Err(FieldError::NotWritable {
                field: field.to_string(),
            }),
            (Self::Boolean, LocalValue::Boolean(b)) => Ok(Value::Bool(*b)),
            (Self::Integer, LocalValue::Integer(i)) => Ok(json!(i)),
            (Self::String, LocalValue::String(s)) => Ok(Value::String(s.clone())),
            (Self::DateTime, LocalValue::DateTime(dt)) => {
                Ok(Value::String(dt.format(DATETIME_FORMAT).to_string()))
            }
            (Self::Link(kind), LocalValue::Link(link)) if link.kind() == *kind => {
                Ok(Value::String(link.uri().to_string()))
            }
            (Self::Set(member), LocalValue::Set(items)) => items
                .iter()
                .map(|item| member.to_wire(field, item))
                .collect::<Result<Vec<_>, _>>()
                .map(Value::Array),
            (Self::Queries, LocalValue::Queries(queries)) => Ok(Value::Array(
                queries
                    .iter()
                    .map(|(name, expression)| json!({"name": name, "expression": expression}))
                    .collect(),
            )),
            (Self::Task, LocalValue::Task(task)) => {
                serde_json::to_value(task).map_err(|_| wrong_type())
            }
            _ => Err(wrong_type()),
        }
    }

    /// Returns a short description of the local type, used in errors.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Boolean => "a boolean",
            Self::Integer => "an integer",
            Self::String => "a string",
            Self::DateTime => "a timestamp",
            Self::Link(kind) => kind.link_description(),
            Self::Blob => "a blob",
            Self::Set(_) => "a set",
            Self::Queries => "a query map",
            Self::Task => "a task state",
        }
    }
}

/// A wire default for a field, used when the server omits the key.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WireDefault {
    /// `null`.
    Null,
    /// A boolean.
    Boolean(bool),
    /// An integer.
    Integer(i64),
    /// A string.
    String(&'static str),
}

impl WireDefault {
    /// Returns the default as a wire value.
    #[must_use]
    pub fn to_value(self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Boolean(b) => Value::Bool(b),
            Self::Integer(i) => json!(i),
            Self::String(s) => Value::String(s.to_string()),
        }
    }
}

/// A field descriptor.
///
/// Descriptors are built in `const` context:
///
/// ```rust
/// use varda_client::rest::{Field, FieldKind};
///
/// const NAME: Field = Field::new("name", FieldKind::String).mutable();
/// assert_eq!(NAME.key, "name");
/// assert!(NAME.mutable);
/// assert!(!NAME.hidden);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Field {
    /// Local name.
    pub name: &'static str,
    /// Key on the wire. Defaults to the local name.
    pub key: &'static str,
    /// Field type.
    pub kind: FieldKind,
    /// Whether the field may be modified after creation.
    pub mutable: bool,
    /// Whether the field is only a creation input.
    pub hidden: bool,
    /// Value used when the server omits the key.
    pub default: WireDefault,
}

impl Field {
    /// Creates an immutable, visible field with a `null` default.
    #[must_use]
    pub const fn new(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            key: name,
            kind,
            mutable: false,
            hidden: false,
            default: WireDefault::Null,
        }
    }

    /// Marks the field as mutable.
    #[must_use]
    pub const fn mutable(mut self) -> Self {
        self.mutable = true;
        self
    }

    /// Marks the field as a creation-only input.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    /// Sets the wire key.
    #[must_use]
    pub const fn key(mut self, key: &'static str) -> Self {
        self.key = key;
        self
    }

    /// Sets the default.
    #[must_use]
    pub const fn default(mut self, default: WireDefault) -> Self {
        self.default = default;
        self
    }

    /// Converts a wire value of this field to its local value.
    ///
    /// # Errors
    ///
    /// See [`FieldKind::to_local`].
    pub fn to_local(&self, value: &Value) -> Result<LocalValue, FieldError> {
        self.kind.to_local(self.name, value)
    }

    /// Converts a local value of this field to its wire value.
    ///
    /// # Errors
    ///
    /// See [`FieldKind::to_wire`].
    pub fn to_wire(&self, value: &LocalValue) -> Result<Value, FieldError> {
        self.kind.to_wire(self.name, value)
    }
}

/// The `uri` field every resource kind declares.
pub const URI_FIELD: Field = Field::new("uri", FieldKind::String);

/// Finds a field by name in a descriptor table.
#[must_use]
pub fn find_field(fields: &'static [Field], name: &str) -> Option<&'static Field> {
    fields.iter().find(|field| field.name == name)
}

/// The local representation of a field value.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LocalValue {
    /// No value.
    Null,
    /// A boolean.
    Boolean(bool),
    /// An integer.
    Integer(i64),
    /// A string.
    String(String),
    /// A timestamp.
    DateTime(NaiveDateTime),
    /// A link to another resource.
    Link(ResourceRef),
    /// A reference to binary data.
    Blob(BlobRef),
    /// A set of values. This is always a copy of the stored value.
    Set(BTreeSet<LocalValue>),
    /// Annotation queries, name to expression.
    Queries(BTreeMap<String, String>),
    /// Task state.
    Task(TaskState),
}

impl LocalValue {
    /// Returns `true` for [`LocalValue::Null`].
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<bool> for LocalValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for LocalValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<&str> for LocalValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for LocalValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<NaiveDateTime> for LocalValue {
    fn from(value: NaiveDateTime) -> Self {
        Self::DateTime(value)
    }
}

impl From<ResourceRef> for LocalValue {
    fn from(value: ResourceRef) -> Self {
        Self::Link(value)
    }
}

impl From<BTreeMap<String, String>> for LocalValue {
    fn from(value: BTreeMap<String, String>) -> Self {
        Self::Queries(value)
    }
}

impl<T: Into<Self>> From<BTreeSet<T>> for LocalValue {
    fn from(value: BTreeSet<T>) -> Self {
        Self::Set(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Self>> From<Option<T>> for LocalValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

/// Conversion from a [`LocalValue`] into a concrete Rust type.
///
/// `Option<T>` maps [`LocalValue::Null`] to `None`; every other target type
/// rejects it.
pub trait FromLocal: Sized {
    /// Short description of the expected type, used in errors.
    const EXPECTED: &'static str;

    /// Extracts `Self` from `value`, or returns `None` on a type mismatch.
    fn from_local(value: LocalValue) -> Option<Self>;
}

impl FromLocal for LocalValue {
    const EXPECTED: &'static str = "any value";

    fn from_local(value: LocalValue) -> Option<Self> {
        Some(value)
    }
}

impl FromLocal for bool {
    const EXPECTED: &'static str = "a boolean";

    fn from_local(value: LocalValue) -> Option<Self> {
        match value {
            LocalValue::Boolean(b) => Some(b),
            _ => None,
        }
    }
}

impl FromLocal for i64 {
    const EXPECTED: &'static str = "an integer";

    fn from_local(value: LocalValue) -> Option<Self> {
        match value {
            LocalValue::Integer(i) => Some(i),
            _ => None,
        }
    }
}

impl FromLocal for String {
    const EXPECTED: &'static str = "a string";

    fn from_local(value: LocalValue) -> Option<Self> {
        match value {
            LocalValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl FromLocal for NaiveDateTime {
    const EXPECTED: &'static str = "a timestamp";

    fn from_local(value: LocalValue) -> Option<Self> {
        match value {
            LocalValue::DateTime(dt) => Some(dt),
            _ => None,
        }
    }
}

impl FromLocal for ResourceRef {
    const EXPECTED: &'static str = "a resource link";

    fn from_local(value: LocalValue) -> Option<Self> {
        match value {
            LocalValue::Link(link) => Some(link),
            _ => None,
        }
    }
}

impl FromLocal for BlobRef {
    const EXPECTED: &'static str = "a blob";

    fn from_local(value: LocalValue) -> Option<Self> {
        match value {
            LocalValue::Blob(blob) => Some(blob),
            _ => None,
        }
    }
}

impl FromLocal for BTreeMap<String, String> {
    const EXPECTED: &'static str = "a query map";

    fn from_local(value: LocalValue) -> Option<Self> {
        match value {
            LocalValue::Queries(queries) => Some(queries),
            _ => None,
        }
    }
}

impl FromLocal for TaskState {
    const EXPECTED: &'static str = "a task state";

    fn from_local(value: LocalValue) -> Option<Self> {
        match value {
            LocalValue::Task(task) => Some(task),
            _ => None,
        }
    }
}

impl<T: FromLocal + Ord> FromLocal for BTreeSet<T> {
    const EXPECTED: &'static str = "a set";

    fn from_local(value: LocalValue) -> Option<Self> {
        match value {
            LocalValue::Set(items) => items.into_iter().map(T::from_local).collect(),
            _ => None,
        }
    }
}

impl<T: FromLocal> FromLocal for Option<T> {
    const EXPECTED: &'static str = T::EXPECTED;

    fn from_local(value: LocalValue) -> Option<Self> {
        match value {
            LocalValue::Null => Some(None),
            other => T::from_local(other).map(Some),
        }
    }
}

/// A link to a remote resource of a known kind.
///
/// The link itself holds no data; [`fetch`](Self::fetch) retrieves the
/// resource through a session.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceRef {
    kind: ResourceKind,
    uri: String,
}

impl ResourceRef {
    /// Creates a link to the resource of `kind` at `uri`.
    #[must_use]
    pub fn new(kind: ResourceKind, uri: impl Into<String>) -> Self {
        Self {
            kind,
            uri: uri.into(),
        }
    }

    /// Returns the kind of the linked resource.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Returns the URI of the linked resource.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Fetches the linked resource.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::WrongType`] if `R` is not of the linked kind,
    /// and any error of [`RestResource::get`].
    pub fn fetch<R: RestResource>(&self, session: &Session) -> Result<R, ResourceError> {
        if R::KIND != self.kind {
            return Err(FieldError::WrongType {
                field: format!("link to {}", self.uri),
                expected: R::KIND.link_description(),
            }
            .into());
        }
        R::get(session, &self.uri)
    }
}

impl Serialize for ResourceRef {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.uri)
    }
}

/// A reference to binary data stored on the server.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlobRef {
    uri: String,
}

impl BlobRef {
    /// Creates a reference to the data at `uri`.
    #[must_use]
    pub fn new(uri: impl Into<String>) -> Self {
        Self { uri: uri.into() }
    }

    /// Returns the URI of the data.
    #[must_use]
    pub fn uri(&self) -> &str {
        &self.uri
    }

    /// Requests the data and returns an iterator over its chunks.
    ///
    /// Chunks are at most `data_buffer_size` bytes, as configured on the
    /// session.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError`] if the request fails.
    pub fn chunks(&self, session: &Session) -> Result<BlobChunks, ResourceError> {
        let response = session.get(&self.uri, None, Default::default())?;
        Ok(BlobChunks::new(
            response.into_body(),
            session.config().data_buffer_size(),
        ))
    }
}

/// Iterator over the chunks of a streamed blob.
pub struct BlobChunks {
    reader: Box<dyn Read + Send>,
    chunk_size: usize,
    done: bool,
}

impl BlobChunks {
    /// Creates an iterator reading `reader` in chunks of `chunk_size` bytes.
    #[must_use]
    pub fn new(reader: Box<dyn Read + Send>, chunk_size: usize) -> Self {
        Self {
            reader,
            chunk_size: chunk_size.max(1),
            done: false,
        }
    }
}

impl Iterator for BlobChunks {
    type Item = Result<Vec<u8>, TransportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut chunk = vec![0; self.chunk_size];
        let mut filled = 0;
        while filled < chunk.len() {
            match self.reader.read(&mut chunk[filled..]) {
                Ok(0) => {
                    self.done = true;
                    break;
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
                Err(e) => {
                    self.done = true;
                    return Some(Err(e.into()));
                }
            }
        }

        if filled == 0 {
            return None;
        }
        chunk.truncate(filled);
        Some(Ok(chunk))
    }
}

impl std::fmt::Debug for BlobChunks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobChunks")
            .field("chunk_size", &self.chunk_size)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

/// State of a server-side task.
#[derive(Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskState {
    /// The task is queued.
    #[serde(default)]
    pub waiting: bool,
    /// The task is being processed.
    #[serde(default)]
    pub running: bool,
    /// The task finished successfully.
    #[serde(default)]
    pub success: bool,
    /// The task finished unsuccessfully.
    #[serde(default)]
    pub failure: bool,
    /// Percentage done, if reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    /// Why the task failed, if it did.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<TaskError>,
}

impl TaskState {
    /// Returns `true` once the task has succeeded or failed.
    #[must_use]
    pub const fn is_done(&self) -> bool {
        self.success || self.failure
    }
}

/// The error reported for a failed task.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TaskError {
    /// Error code.
    pub code: String,
    /// Human readable message.
    pub message: String,
}

/// Extracts the URI from a link's wire value.
///
/// Request payloads carry links as URI strings; responses embed an object
/// with a `uri` key.
pub(crate) fn link_uri(value: &Value) -> Option<&str> {
    match value {
        Value::String(uri) => Some(uri),
        Value::Object(object) => object.get("uri").and_then(Value::as_str),
        _ => None,
    }
}

/// Parses a wire timestamp.
///
/// Naive ISO-8601 values are taken as is; values with an offset are
/// converted to UTC.
fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.naive_utc())
        })
}
