//! Variant resource.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::rest::collection::NoFilters;
use crate::rest::errors::{FieldError, ResourceError};
use crate::rest::fields::{Field, FieldKind, LocalValue, URI_FIELD};
use crate::rest::resource::{take_key, CreateParams, CreatePayload};

pub(super) const FIELDS: &[Field] = &[
    URI_FIELD,
    Field::new("chromosome", FieldKind::String),
    Field::new("position", FieldKind::Integer),
    Field::new("reference", FieldKind::String),
    Field::new("observed", FieldKind::String),
];

typed_resource!(
    /// A genomic variant: a reference allele replaced by an observed allele
    /// at a position on a chromosome.
    Variant,
    Variant,
    NoFilters,
    NewVariant
);

/// Observed frequency of a variant over the samples selected by a query.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VariantFrequency {
    /// Number of individuals with coverage at the variant position.
    pub coverage: u64,
    /// Frequency of the variant.
    pub frequency: f64,
    /// Heterozygous frequency of the variant.
    pub frequency_het: f64,
    /// Homozygous frequency of the variant.
    pub frequency_hom: f64,
}

impl Variant {
    /// Chromosome name.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn chromosome(&self) -> Result<Option<String>, FieldError> {
        self.0.value("chromosome")
    }

    /// Position on the chromosome.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn position(&self) -> Result<Option<i64>, FieldError> {
        self.0.value("position")
    }

    /// Reference allele.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn reference(&self) -> Result<Option<String>, FieldError> {
        self.0.value("reference")
    }

    /// Observed allele.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn observed(&self) -> Result<Option<String>, FieldError> {
        self.0.value("observed")
    }

    /// Calculates the frequency of this variant over sets of samples.
    ///
    /// `queries` maps query names to sample query expressions. The result
    /// maps the same names to frequencies.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidResponse`] if the response has no
    /// annotations, and request errors.
    ///
    /// # Example
    ///
    /// ```rust,ignore
    /// let queries = BTreeMap::from([("everything".to_string(), "*".to_string())]);
    /// let frequencies = variant.annotate(&queries)?;
    /// println!("{}", frequencies["everything"].frequency);
    /// ```
    pub fn annotate(
        &self,
        queries: &BTreeMap<String, String>,
    ) -> Result<BTreeMap<String, VariantFrequency>, ResourceError> {
        let queries = FieldKind::Queries.to_wire("queries", &LocalValue::Queries(queries.clone()))?;
        let response = self.0.session().get(
            self.0.uri(),
            Some(json!({ "queries": queries })),
            HashMap::new(),
        )?;

        let mut variant = take_key(response.into_json()?, "variant")?;
        let annotations = variant
            .get_mut("annotations")
            .map(serde_json::Value::take)
            .ok_or_else(|| ResourceError::invalid_response("variant has no annotations"))?;

        serde_json::from_value(annotations)
            .map_err(|e| ResourceError::invalid_response(format!("malformed annotations: {e}")))
    }
}

/// Parameters for creating a [`Variant`].
///
/// Reference and observed alleles default to empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewVariant {
    chromosome: String,
    position: i64,
    reference: String,
    observed: String,
}

impl NewVariant {
    /// Creates parameters for a variant at `position` on `chromosome`.
    #[must_use]
    pub fn new(chromosome: impl Into<String>, position: i64) -> Self {
        Self {
            chromosome: chromosome.into(),
            position,
            reference: String::new(),
            observed: String::new(),
        }
    }

    /// Sets the reference allele.
    #[must_use]
    pub fn reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = reference.into();
        self
    }

    /// Sets the observed allele.
    #[must_use]
    pub fn observed(mut self, observed: impl Into<String>) -> Self {
        self.observed = observed.into();
        self
    }
}

impl CreateParams for NewVariant {
    fn into_payload(self) -> CreatePayload {
        CreatePayload::new()
            .value("chromosome", self.chromosome)
            .value("position", self.position)
            .value("reference", self.reference)
            .value("observed", self.observed)
    }
}
