//! Annotation resource.

use std::collections::BTreeMap;

use crate::rest::collection::NoFilters;
use crate::rest::errors::FieldError;
use crate::rest::fields::{Field, FieldKind, ResourceRef, URI_FIELD};
use crate::rest::resource::{CreateParams, CreatePayload};
use crate::rest::resources::ResourceKind;
use crate::rest::task::{TaskedResource, TASK_FIELD};

const DATA_SOURCE_LINK: FieldKind = FieldKind::Link(ResourceKind::DataSource);

pub(super) const FIELDS: &[Field] = &[
    URI_FIELD,
    TASK_FIELD,
    Field::new("original_data_source", DATA_SOURCE_LINK),
    Field::new("annotated_data_source", DATA_SOURCE_LINK),
    Field::new("data_source", DATA_SOURCE_LINK).hidden(),
    Field::new("name", FieldKind::String).hidden(),
    Field::new("queries", FieldKind::Queries).hidden(),
];

typed_resource!(
    /// A data source annotated with variant frequencies.
    Annotation,
    Annotation,
    NoFilters,
    NewAnnotation
);

impl TaskedResource for Annotation {}

impl Annotation {
    /// The data source that was annotated.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn original_data_source(&self) -> Result<Option<ResourceRef>, FieldError> {
        self.0.value("original_data_source")
    }

    /// The data source holding the annotated data.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn annotated_data_source(&self) -> Result<Option<ResourceRef>, FieldError> {
        self.0.value("annotated_data_source")
    }
}

/// Parameters for creating an [`Annotation`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAnnotation {
    data_source: ResourceRef,
    name: Option<String>,
    queries: BTreeMap<String, String>,
}

impl NewAnnotation {
    /// Creates parameters for annotating `data_source`.
    #[must_use]
    pub fn new(data_source: impl Into<ResourceRef>) -> Self {
        Self {
            data_source: data_source.into(),
            name: None,
            queries: BTreeMap::new(),
        }
    }

    /// Sets the annotation name.
    #[must_use]
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a sample query to calculate frequencies over.
    #[must_use]
    pub fn query(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        self.queries.insert(name.into(), expression.into());
        self
    }
}

impl CreateParams for NewAnnotation {
    fn into_payload(self) -> CreatePayload {
        CreatePayload::new()
            .value("data_source", self.data_source)
            .value("queries", self.queries)
            .optional("name", self.name)
    }
}
