//! Generic resources and the [`RestResource`] trait.
//!
//! A [`Resource`] is the local proxy for one remote entity. Its kind selects
//! the field descriptor table; its values are kept in wire form in a
//! [`TrackedValues`] store, converted on access.
//!
//! Typed resources ([`Sample`](crate::rest::resources::Sample),
//! [`User`](crate::rest::resources::User), ...) wrap a `Resource` and
//! implement [`RestResource`], which provides `get()`, `create()`,
//! `collection()`, `save()`, and `refresh()`.
//!
//! # Lifecycle
//!
//! Resources are never built from local state. They are either fetched by
//! URI, or created on the server with [`RestResource::create`], which posts
//! the creation values and then fetches the resource at the returned
//! `Location`.
//!
//! # Example
//!
//! ```rust,ignore
//! use varda_client::rest::resources::{NewSample, Sample};
//! use varda_client::rest::RestResource;
//!
//! let mut sample = Sample::create(&session, NewSample::new("exome batch 1").pool_size(5))?;
//! sample.set_notes("Sequenced in March")?;
//! assert!(sample.is_dirty());
//!
//! sample.save()?;                // PATCH {"notes": "Sequenced in March"}
//! assert!(!sample.is_dirty());
//! ```

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use serde::{Serialize, Serializer};
use serde_json::{Map, Value};

use crate::clients::Upload;
use crate::rest::collection::{CollectionFilters, ResourceCollection};
use crate::rest::errors::{FieldError, ResourceError};
use crate::rest::fields::{find_field, Field, FieldKind, FromLocal, LocalValue, ResourceRef};
use crate::rest::resources::ResourceKind;
use crate::rest::tracking::TrackedValues;
use crate::session::Session;

/// A local representation of one remote resource.
///
/// Equality compares URIs: two resources are equal only if both have a
/// non-empty URI and the URIs match. Serializing a resource produces its
/// URI string, so resources can be embedded in request payloads.
#[derive(Clone)]
pub struct Resource {
    kind: ResourceKind,
    session: Session,
    values: TrackedValues,
}

impl Resource {
    /// Builds a resource from its wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidResponse`] if `wire` is not an object.
    pub fn from_wire(
        session: &Session,
        kind: ResourceKind,
        wire: &Value,
    ) -> Result<Self, ResourceError> {
        if !wire.is_object() {
            return Err(ResourceError::invalid_response(format!(
                "{} representation is not an object",
                kind.key()
            )));
        }
        Ok(Self {
            kind,
            session: session.clone(),
            values: TrackedValues::load(kind.fields(), wire),
        })
    }

    /// Fetches the resource of `kind` at `uri`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Api`] with [`ApiError::NotFound`] if the
    /// server reports no such resource, and other [`ResourceError`]s for
    /// transport failures or malformed responses.
    ///
    /// [`ApiError::NotFound`]: crate::clients::ApiError::NotFound
    pub fn get(session: &Session, kind: ResourceKind, uri: &str) -> Result<Self, ResourceError> {
        let response = session.get(uri, None, HashMap::new())?;
        let wire = take_key(response.into_json()?, kind.key())?;
        Self::from_wire(session, kind, &wire)
    }

    /// Creates a resource on the server and fetches it.
    ///
    /// `values` are local values keyed by field name; hidden fields are
    /// accepted here. With `files`, the request is sent as multipart form
    /// data.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] for unknown fields or values of the wrong
    /// type, [`ResourceError::MissingEndpoint`] if the server root lists no
    /// collection for `kind`, [`ResourceError::InvalidResponse`] if the
    /// response has no `Location` header, and request errors.
    pub fn create(
        session: &Session,
        kind: ResourceKind,
        values: Vec<(&str, LocalValue)>,
        files: Vec<(String, Upload)>,
    ) -> Result<Self, ResourceError> {
        let mut data = Map::new();
        for (name, value) in values {
            let field = find_field(kind.fields(), name).ok_or_else(|| FieldError::Unknown {
                kind: kind.key(),
                field: name.to_string(),
            })?;
            data.insert(field.key.to_string(), field.to_wire(&value)?);
        }

        let endpoint = session.endpoint(kind.collection_key())?.to_string();
        let response = session.post(&endpoint, Value::Object(data), files)?;
        let location = response
            .location()
            .ok_or_else(|| ResourceError::invalid_response("no Location header after create"))?
            .to_string();

        tracing::debug!(kind = kind.key(), location = %location, "Created resource");

        Self::get(session, kind, &location)
    }

    /// Returns the resource kind.
    #[must_use]
    pub const fn kind(&self) -> ResourceKind {
        self.kind
    }

    /// Returns the session this resource belongs to.
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the resource URI, or `""` if the server reported none.
    #[must_use]
    pub fn uri(&self) -> &str {
        self.values
            .read("uri")
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    /// Returns a link to this resource.
    #[must_use]
    pub fn to_ref(&self) -> ResourceRef {
        ResourceRef::new(self.kind, self.uri())
    }

    /// Returns the visible field descriptors of this resource's kind.
    pub fn fields(&self) -> impl Iterator<Item = &'static Field> {
        self.kind.fields().iter().filter(|field| !field.hidden)
    }

    /// Returns `true` if there are unsaved changes.
    #[must_use]
    pub fn is_dirty(&self) -> bool {
        self.values.is_dirty()
    }

    /// Returns the names of fields with unsaved changes.
    #[must_use]
    pub fn dirty_fields(&self) -> Vec<&'static str> {
        self.values.dirty_fields()
    }

    /// Returns all field values in wire form.
    #[must_use]
    pub fn to_wire(&self) -> Value {
        self.values.to_wire()
    }

    /// Returns the local value of a field.
    ///
    /// Set values are returned as a copy; changing the copy does not change
    /// the resource.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Unknown`] for undeclared and hidden fields, and
    /// [`FieldError::InvalidWireValue`] if the stored value cannot be
    /// converted.
    pub fn field(&self, name: &str) -> Result<LocalValue, FieldError> {
        let field = self.visible_field(name)?;
        let wire = self.values.read(field.name).unwrap_or(&Value::Null);
        field.to_local(wire)
    }

    /// Returns the value of a field as a concrete type.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`field`](Self::field), and
    /// [`FieldError::WrongType`] if the value is not a `T`.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let pool_size: Option<i64> = sample.resource().value("pool_size")?;
    /// ```
    pub fn value<T: FromLocal>(&self, name: &str) -> Result<T, FieldError> {
        let value = self.field(name)?;
        T::from_local(value).ok_or_else(|| FieldError::WrongType {
            field: name.to_string(),
            expected: T::EXPECTED,
        })
    }

    /// Sets a mutable field and marks it dirty.
    ///
    /// The field is marked dirty even if the value is unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::Unknown`] for undeclared and hidden fields,
    /// [`FieldError::Immutable`] for immutable fields, and
    /// [`FieldError::WrongType`] if the value does not match the field. The
    /// resource is unchanged on error.
    pub fn set_field(&mut self, name: &str, value: impl Into<LocalValue>) -> Result<(), FieldError> {
        let field = self.mutable_field(name)?;
        let wire = field.to_wire(&value.into())?;
        self.values.write(field.name, wire);
        Ok(())
    }

    /// Adds a member to a mutable set field and marks it dirty.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::NotASet`] if the field is not a set, and the
    /// errors of [`set_field`](Self::set_field).
    pub fn add_to_set(&mut self, name: &str, member: impl Into<LocalValue>) -> Result<(), FieldError> {
        let member = member.into();
        self.update_set(name, |items| {
            items.insert(member);
        })
    }

    /// Removes a member from a mutable set field and marks it dirty.
    ///
    /// # Errors
    ///
    /// See [`add_to_set`](Self::add_to_set).
    pub fn remove_from_set(
        &mut self,
        name: &str,
        member: impl Into<LocalValue>,
    ) -> Result<(), FieldError> {
        let member = member.into();
        self.update_set(name, |items| {
            items.remove(&member);
        })
    }

    /// Sends unsaved changes to the server.
    ///
    /// Only dirty fields are sent, as a PATCH to the resource URI. Fields
    /// that were not modified are not refreshed afterwards. Does nothing if
    /// the resource is not dirty.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError`] if the request fails; the resource stays
    /// dirty in that case.
    pub fn save(&mut self) -> Result<(), ResourceError> {
        if !self.values.is_dirty() {
            return Ok(());
        }

        let changes = self.values.changed_fields();
        tracing::debug!(
            uri = self.uri(),
            fields = ?self.values.dirty_fields(),
            "Saving resource"
        );
        self.session.patch(self.uri(), changes)?;
        self.values.mark_clean();
        Ok(())
    }

    /// Reloads field values from the server.
    ///
    /// With `skip_dirty`, fields with unsaved changes keep their local value
    /// and remain dirty.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError`] if the request fails or the response is
    /// malformed.
    pub fn refresh(&mut self, skip_dirty: bool) -> Result<(), ResourceError> {
        let response = self.session.get(self.uri(), None, HashMap::new())?;
        let wire = take_key(response.into_json()?, self.kind.key())?;
        self.values.reload(&wire, skip_dirty);
        Ok(())
    }

    /// Converts into a typed resource.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::WrongType`] if this resource is not of kind
    /// `R::KIND`.
    pub fn into_typed<R: RestResource>(self) -> Result<R, FieldError> {
        if self.kind != R::KIND {
            return Err(FieldError::WrongType {
                field: self.uri().to_string(),
                expected: R::KIND.link_description(),
            });
        }
        Ok(R::from_resource(self))
    }

    fn visible_field(&self, name: &str) -> Result<&'static Field, FieldError> {
        find_field(self.kind.fields(), name)
            .filter(|field| !field.hidden)
            .ok_or_else(|| FieldError::Unknown {
                kind: self.kind.key(),
                field: name.to_string(),
            })
    }

    fn mutable_field(&self, name: &str) -> Result<&'static Field, FieldError> {
        let field = self.visible_field(name)?;
        if !field.mutable {
            return Err(FieldError::Immutable {
                kind: self.kind.key(),
                field: name.to_string(),
            });
        }
        Ok(field)
    }

    fn update_set(
        &mut self,
        name: &str,
        update: impl FnOnce(&mut BTreeSet<LocalValue>),
    ) -> Result<(), FieldError> {
        let field = self.visible_field(name)?;
        if !matches!(field.kind, FieldKind::Set(_)) {
            return Err(FieldError::NotASet {
                field: name.to_string(),
            });
        }
        let field = self.mutable_field(name)?;

        let mut items = match self.field(name)? {
            LocalValue::Set(items) => items,
            _ => BTreeSet::new(),
        };
        update(&mut items);

        let wire = field.to_wire(&LocalValue::Set(items))?;
        self.values.write(field.name, wire);
        Ok(())
    }
}

impl PartialEq for Resource {
    fn eq(&self, other: &Self) -> bool {
        let uri = self.uri();
        !uri.is_empty() && uri == other.uri()
    }
}

impl Serialize for Resource {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.uri())
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("kind", &self.kind.key())
            .field("values", &self.values.to_wire())
            .field("dirty", &self.values.dirty_fields())
            .finish()
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.uri())
    }
}

impl From<&Resource> for LocalValue {
    fn from(resource: &Resource) -> Self {
        Self::Link(resource.to_ref())
    }
}

/// Values and files sent when creating a resource.
///
/// # Example
///
/// ```rust
/// use varda_client::rest::CreatePayload;
///
/// let payload = CreatePayload::new()
///     .value("name", "lab members")
///     .optional("notes", None::<String>);
/// assert_eq!(payload.values.len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct CreatePayload {
    /// Local values keyed by field name.
    pub values: Vec<(&'static str, LocalValue)>,
    /// Uploads keyed by form field.
    pub files: Vec<(String, Upload)>,
}

impl CreatePayload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value.
    #[must_use]
    pub fn value(mut self, name: &'static str, value: impl Into<LocalValue>) -> Self {
        self.values.push((name, value.into()));
        self
    }

    /// Adds a value if it is `Some`.
    #[must_use]
    pub fn optional<T: Into<LocalValue>>(self, name: &'static str, value: Option<T>) -> Self {
        match value {
            Some(value) => self.value(name, value),
            None => self,
        }
    }

    /// Adds an upload.
    #[must_use]
    pub fn file(mut self, field: impl Into<String>, upload: Upload) -> Self {
        self.files.push((field.into(), upload));
        self
    }
}

/// Creation parameters of a resource kind.
pub trait CreateParams {
    /// Converts the parameters into the values and files to send.
    fn into_payload(self) -> CreatePayload;
}

/// A typed resource.
///
/// Implementors wrap a [`Resource`] of kind [`KIND`](Self::KIND) and gain
/// default implementations for fetching, creating, listing, saving, and
/// refreshing.
///
/// # Example
///
/// ```rust,ignore
/// use varda_client::rest::resources::{Sample, SampleFilters};
/// use varda_client::rest::RestResource;
///
/// let sample = Sample::get(&session, "/samples/3")?;
/// for sample in Sample::collection(&session, SampleFilters::default().public(true))? {
///     println!("{}", sample?.uri());
/// }
/// ```
pub trait RestResource: Clone + Sized {
    /// The resource kind.
    const KIND: ResourceKind;

    /// Collection filters for this kind.
    type Filters: CollectionFilters;

    /// Creation parameters for this kind.
    type Create: CreateParams;

    /// Wraps a resource. The resource must be of kind [`KIND`](Self::KIND);
    /// use [`Resource::into_typed`] for a checked conversion.
    fn from_resource(resource: Resource) -> Self;

    /// Returns the wrapped resource.
    fn resource(&self) -> &Resource;

    /// Returns the wrapped resource mutably.
    fn resource_mut(&mut self) -> &mut Resource;

    /// Unwraps the resource.
    fn into_resource(self) -> Resource;

    /// Fetches the resource at `uri`.
    ///
    /// # Errors
    ///
    /// See [`Resource::get`].
    fn get(session: &Session, uri: &str) -> Result<Self, ResourceError> {
        Resource::get(session, Self::KIND, uri).map(Self::from_resource)
    }

    /// Creates a resource on the server.
    ///
    /// # Errors
    ///
    /// See [`Resource::create`].
    fn create(session: &Session, params: Self::Create) -> Result<Self, ResourceError> {
        let payload = params.into_payload();
        Resource::create(session, Self::KIND, payload.values, payload.files)
            .map(Self::from_resource)
    }

    /// Opens a collection of resources of this kind.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError`] if the first page cannot be fetched.
    fn collection(
        session: &Session,
        filters: Self::Filters,
    ) -> Result<ResourceCollection<Self>, ResourceError> {
        ResourceCollection::new(session, filters)
    }

    /// Returns the resource URI.
    fn uri(&self) -> &str {
        self.resource().uri()
    }

    /// Returns a link to this resource.
    fn to_ref(&self) -> ResourceRef {
        self.resource().to_ref()
    }

    /// Returns `true` if there are unsaved changes.
    fn is_dirty(&self) -> bool {
        self.resource().is_dirty()
    }

    /// Sends unsaved changes to the server.
    ///
    /// # Errors
    ///
    /// See [`Resource::save`].
    fn save(&mut self) -> Result<(), ResourceError> {
        self.resource_mut().save()
    }

    /// Reloads field values from the server.
    ///
    /// # Errors
    ///
    /// See [`Resource::refresh`].
    fn refresh(&mut self, skip_dirty: bool) -> Result<(), ResourceError> {
        self.resource_mut().refresh(skip_dirty)
    }
}

/// Takes the object stored under `key` out of a response body.
pub(crate) fn take_key(mut body: Value, key: &str) -> Result<Value, ResourceError> {
    match body.get_mut(key).map(Value::take) {
        Some(value) if value.is_object() => Ok(value),
        _ => Err(ResourceError::invalid_response(format!(
            "response has no '{key}' object"
        ))),
    }
}
