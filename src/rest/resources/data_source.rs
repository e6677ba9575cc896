//! Data source resource.

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::clients::Upload;
use crate::rest::collection::{check_filter_link, CollectionFilters};
use crate::rest::errors::{FieldError, ResourceError};
use crate::rest::fields::{BlobChunks, BlobRef, Field, FieldKind, ResourceRef, WireDefault, URI_FIELD};
use crate::rest::resource::{CreateParams, CreatePayload};
use crate::rest::resources::ResourceKind;

pub(super) const FIELDS: &[Field] = &[
    URI_FIELD,
    Field::new("name", FieldKind::String).mutable(),
    Field::new("user", FieldKind::Link(ResourceKind::User)),
    Field::new("data", FieldKind::Blob),
    Field::new("filetype", FieldKind::String),
    Field::new("gzipped", FieldKind::Boolean).default(WireDefault::Boolean(false)),
    Field::new("added", FieldKind::DateTime),
    Field::new("local_file", FieldKind::String).hidden(),
];

typed_resource!(
    /// An uploaded data file (BED, VCF, or CSV).
    DataSource,
    DataSource,
    DataSourceFilters,
    NewDataSource
);

impl DataSource {
    /// Human readable name.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn name(&self) -> Result<Option<String>, FieldError> {
        self.0.value("name")
    }

    /// The user owning the data source.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn user(&self) -> Result<Option<ResourceRef>, FieldError> {
        self.0.value("user")
    }

    /// Reference to the data.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn data(&self) -> Result<Option<BlobRef>, FieldError> {
        self.0.value("data")
    }

    /// Streams the data in chunks of the configured buffer size.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::InvalidResponse`] if the server reported no
    /// data, and request errors.
    pub fn data_chunks(&self) -> Result<BlobChunks, ResourceError> {
        let blob = self
            .data()?
            .ok_or_else(|| ResourceError::invalid_response("data source has no data"))?;
        blob.chunks(self.0.session())
    }

    /// Data file type, such as `bed`, `vcf`, or `csv`.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn filetype(&self) -> Result<Option<String>, FieldError> {
        self.0.value("filetype")
    }

    /// Whether the data is compressed with gzip.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn gzipped(&self) -> Result<bool, FieldError> {
        self.0
            .value::<Option<bool>>("gzipped")
            .map(Option::unwrap_or_default)
    }

    /// When the data source was added.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn added(&self) -> Result<Option<NaiveDateTime>, FieldError> {
        self.0.value("added")
    }

    /// Renames the data source.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), FieldError> {
        self.0.set_field("name", name.into())
    }
}

/// Parameters for creating a [`DataSource`].
///
/// The data is either uploaded with [`data`](Self::data) or read by the
/// server from [`local_file`](Self::local_file).
#[derive(Debug)]
pub struct NewDataSource {
    name: String,
    filetype: String,
    gzipped: bool,
    local_file: Option<String>,
    data: Option<Upload>,
}

impl NewDataSource {
    /// Creates parameters for a data source called `name` of `filetype`.
    #[must_use]
    pub fn new(name: impl Into<String>, filetype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            filetype: filetype.into(),
            gzipped: false,
            local_file: None,
            data: None,
        }
    }

    /// Marks the data as gzip compressed.
    #[must_use]
    pub const fn gzipped(mut self, gzipped: bool) -> Self {
        self.gzipped = gzipped;
        self
    }

    /// Names a file on the server's filesystem to read the data from.
    #[must_use]
    pub fn local_file(mut self, path: impl Into<String>) -> Self {
        self.local_file = Some(path.into());
        self
    }

    /// Uploads the data.
    #[must_use]
    pub fn data(mut self, upload: Upload) -> Self {
        self.data = Some(upload);
        self
    }
}

impl CreateParams for NewDataSource {
    fn into_payload(self) -> CreatePayload {
        let payload = CreatePayload::new()
            .value("name", self.name)
            .value("filetype", self.filetype)
            .value("gzipped", self.gzipped)
            .optional("local_file", self.local_file);
        match self.data {
            Some(upload) => payload.file("data", upload),
            None => payload,
        }
    }
}

/// Filters for data source collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DataSourceFilters {
    /// Only data sources owned by this user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ResourceRef>,
}

impl DataSourceFilters {
    /// Filters by owning user.
    #[must_use]
    pub fn user(mut self, user: impl Into<ResourceRef>) -> Self {
        self.user = Some(user.into());
        self
    }
}

impl CollectionFilters for DataSourceFilters {
    fn validate(&self) -> Result<(), FieldError> {
        check_filter_link("user", &self.user, ResourceKind::User)
    }
}
