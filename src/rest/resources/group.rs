//! Group resource.

use crate::rest::collection::NoFilters;
use crate::rest::errors::FieldError;
use crate::rest::fields::{Field, FieldKind, URI_FIELD};
use crate::rest::resource::{CreateParams, CreatePayload};

pub(super) const FIELDS: &[Field] = &[
    URI_FIELD,
    Field::new("name", FieldKind::String).mutable(),
];

typed_resource!(
    /// A named group of samples.
    Group,
    Group,
    NoFilters,
    NewGroup
);

impl Group {
    /// Human readable group name.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn name(&self) -> Result<Option<String>, FieldError> {
        self.0.value("name")
    }

    /// Renames the group.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), FieldError> {
        self.0.set_field("name", name.into())
    }
}

/// Parameters for creating a [`Group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    name: String,
}

impl NewGroup {
    /// Creates parameters for a group called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl CreateParams for NewGroup {
    fn into_payload(self) -> CreatePayload {
        CreatePayload::new().value("name", self.name)
    }
}
