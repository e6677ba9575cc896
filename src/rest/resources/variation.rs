//! Variation resource.

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
    Field::new("skip_filtered", FieldKind::Boolean).hidden(),
    Field::new("use_genotypes", FieldKind::Boolean).hidden(),
    Field::new("prefer_genotype_likelihoods", FieldKind::Boolean).hidden(),
];

typed_resource!(
    /// The observed variants of a sample, imported from a VCF data source.
    Variation,
    Variation,
    VariationFilters,
    NewVariation
);

impl TaskedResource for Variation {}

impl Variation {
    /// The sample this variation is part of.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn sample(&self) -> Result<Option<ResourceRef>, FieldError> {
        self.0.value("sample")
    }

    /// The data source the variation was imported from.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn data_source(&self) -> Result<Option<ResourceRef>, FieldError> {
        self.0.value("data_source")
    }
}

/// Parameters for creating a [`Variation`].
///
/// By default filtered entries are skipped and concrete genotypes are used.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVariation {
    sample: ResourceRef,
    data_source: ResourceRef,
    skip_filtered: bool,
    use_genotypes: bool,
    prefer_genotype_likelihoods: bool,
}

impl NewVariation {
    /// Creates parameters for importing `data_source` as variation of
    /// `sample`.
    #[must_use]
    pub fn new(sample: impl Into<ResourceRef>, data_source: impl Into<ResourceRef>) -> Self {
        Self {
            sample: sample.into(),
            data_source: data_source.into(),
            skip_filtered: true,
            use_genotypes: true,
            prefer_genotype_likelihoods: false,
        }
    }

    /// Whether to discard entries marked as filtered.
    #[must_use]
    pub const fn skip_filtered(mut self, skip: bool) -> Self {
        self.skip_filtered = skip;
        self
    }

    /// Whether to use per-sample genotype information.
    #[must_use]
    pub const fn use_genotypes(mut self, use_genotypes: bool) -> Self {
        self.use_genotypes = use_genotypes;
        self
    }

    /// Whether to prefer genotype likelihoods over concrete genotypes.
    #[must_use]
    pub const fn prefer_genotype_likelihoods(mut self, prefer: bool) -> Self {
        self.prefer_genotype_likelihoods = prefer;
        self
    }
}

impl CreateParams for NewVariation {
    fn into_payload(self) -> CreatePayload {
        CreatePayload::new()
            .value("sample", self.sample)
            .value("data_source", self.data_source)
            .value("skip_filtered", self.skip_filtered)
            .value("use_genotypes", self.use_genotypes)
            .value("prefer_genotype_likelihoods", self.prefer_genotype_likelihoods)
    }
}

/// Filters for variation collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VariationFilters {
    /// Only variations of this sample.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sample: Option<ResourceRef>,
}

impl VariationFilters {
    /// Filters by sample.
    #[must_use]
    pub fn sample(mut self, sample: impl Into<ResourceRef>) -> Self {
        self.sample = Some(sample.into());
        self
    }
}

impl CollectionFilters for VariationFilters {
    fn validate(&self) -> Result<(), FieldError> {
        check_filter_link("sample", &self.sample, ResourceKind::Sample)
    }
}
