//! Coverage resource.

use serde::Serialize;

use crate::rest::collection::{check_filter_link, CollectionFilters};
use crate::rest::errors::FieldError;
use crate::rest::fields::{Field, FieldKind, ResourceRef, URI_FIELD};
use crate::rest::resource::{CreateParams, CreatePayload};
use crate::rest::resources::ResourceKind;
use crate::rest::task::{TaskedResource, TASK_FIELD};

pub(super) const FIELDS: &[Field] = &[
    URI_FIELD,
    TASK_FIELD,
    Field::new("sample", FieldKind::Link(ResourceKind::Sample)),
    Field::new("data_source", FieldKind::Link(ResourceKind::DataSource)),
];

typed_resource!(
    /// The covered regions of a sample, imported from a BED data source.
    Coverage,
    Coverage,
    CoverageFilters,
    NewCoverage
);

impl TaskedResource for Coverage {}

impl Coverage {
    /// The sample this coverage is part of.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn sample(&self) -> Result<Option<ResourceRef>, FieldError> {
        self.0.value("sample")
    }

    /// The data source the coverage was imported from.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn data_source(&self) -> Result<Option<ResourceRef>, FieldError> {
        self.0.value("data_source")
    }
}

/// Parameters for creating a [`Coverage`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCoverage {
    sample: ResourceRef,
    data_source: ResourceRef,
}

impl NewCoverage {
    /// Creates parameters for importing `data_source` as coverage of `sample`.
    #[must_use]
    pub fn new(sample: impl Into<ResourceRef>, data_source: impl Into<ResourceRef>) -> Self {
        Self {
            sample: sample.into(),
            data_source: data_source.into(),
        }
    }
}

impl CreateParams for NewCoverage {
    fn into_payload(self) -> CreatePayload {
        CreatePayload::new()
            .value("sample", self.sample)
            .value("data_source", self.data_source)
    }
}

/// Filters for coverage collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CoverageFilters {
    /// Only coverages of this sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<ResourceRef>,
}

impl CoverageFilters {
    /// Filters by sample.
    #[must_use]
    pub fn sample(mut self, sample: impl Into<ResourceRef>) -> Self {
        self.sample = Some(sample.into());
        self
    }
}

impl CollectionFilters for CoverageFilters {
    fn validate(&self) -> Result<(), FieldError> {
        check_filter_link("sample", &self.sample, ResourceKind::Sample)
    }
}
