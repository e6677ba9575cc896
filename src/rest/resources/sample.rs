//! Sample resource.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::rest::collection::{check_filter_link, CollectionFilters};
use crate::rest::errors::FieldError;
use crate::rest::fields::{Field, FieldKind, ResourceRef, WireDefault, URI_FIELD};
use crate::rest::resource::{CreateParams, CreatePayload};
use crate::rest::resources::ResourceKind;

const GROUP_LINK: FieldKind = FieldKind::Link(ResourceKind::Group);

pub(super) const FIELDS: &[Field] = &[
    URI_FIELD,
    Field::new("user", FieldKind::Link(ResourceKind::User)),
    Field::new("name", FieldKind::String).mutable(),
    Field::new("pool_size", FieldKind::Integer).mutable(),
    Field::new("coverage_profile", FieldKind::Boolean).mutable(),
    Field::new("public", FieldKind::Boolean).mutable(),
    Field::new("notes", FieldKind::String).mutable(),
    Field::new("groups", FieldKind::Set(&GROUP_LINK)).mutable(),
    Field::new("active", FieldKind::Boolean)
        .mutable()
        .default(WireDefault::Boolean(false)),
    Field::new("added", FieldKind::DateTime),
];

typed_resource!(
    /// A sample: one or more individuals whose variants were imported
    /// together.
    Sample,
    Sample,
    SampleFilters,
    NewSample
);

impl Sample {
    /// The user owning the sample.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn user(&self) -> Result<Option<ResourceRef>, FieldError> {
        self.0.value("user")
    }

    /// Human readable sample name.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn name(&self) -> Result<Option<String>, FieldError> {
        self.0.value("name")
    }

    /// Number of individuals in the sample.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn pool_size(&self) -> Result<Option<i64>, FieldError> {
        self.0.value("pool_size")
    }

    /// Whether the sample has a coverage profile.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn coverage_profile(&self) -> Result<Option<bool>, FieldError> {
        self.0.value("coverage_profile")
    }

    /// Whether the sample is public.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn public(&self) -> Result<Option<bool>, FieldError> {
        self.0.value("public")
    }

    /// Notes in Markdown format.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn notes(&self) -> Result<Option<String>, FieldError> {
        self.0.value("notes")
    }

    /// The groups the sample is part of.
    ///
    /// This is a copy; use [`add_group`](Self::add_group),
    /// [`remove_group`](Self::remove_group), or
    /// [`set_groups`](Self::set_groups) to change membership.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn groups(&self) -> Result<BTreeSet<ResourceRef>, FieldError> {
        self.0
            .value::<Option<BTreeSet<ResourceRef>>>("groups")
            .map(Option::unwrap_or_default)
    }

    /// Whether the sample is active, i.e. its variations count in
    /// frequency calculations.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn active(&self) -> Result<bool, FieldError> {
        self.0
            .value::<Option<bool>>("active")
            .map(Option::unwrap_or_default)
    }

    /// When the sample was added.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn added(&self) -> Result<Option<NaiveDateTime>, FieldError> {
        self.0.value("added")
    }

    /// Renames the sample.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_name(&mut self, name: impl Into<String>) -> Result<(), FieldError> {
        self.0.set_field("name", name.into())
    }

    /// Sets the number of individuals.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_pool_size(&mut self, pool_size: i64) -> Result<(), FieldError> {
        self.0.set_field("pool_size", pool_size)
    }

    /// Sets whether the sample has a coverage profile.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_coverage_profile(&mut self, coverage_profile: bool) -> Result<(), FieldError> {
        self.0.set_field("coverage_profile", coverage_profile)
    }

    /// Makes the sample public or private.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_public(&mut self, public: bool) -> Result<(), FieldError> {
        self.0.set_field("public", public)
    }

    /// Sets or clears the notes.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_notes(&mut self, notes: Option<String>) -> Result<(), FieldError> {
        self.0.set_field("notes", notes)
    }

    /// Activates or deactivates the sample.
    ///
    /// # Errors
    ///
    /// Never fails for a well-formed field table.
    pub fn set_active(&mut self, active: bool) -> Result<(), FieldError> {
        self.0.set_field("active", active)
    }

    /// Replaces the group memberships.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::WrongType`] if a link is not a group link.
    pub fn set_groups(
        &mut self,
        groups: impl IntoIterator<Item = ResourceRef>,
    ) -> Result<(), FieldError> {
        self.0
            .set_field("groups", groups.into_iter().collect::<BTreeSet<_>>())
    }

    /// Adds the sample to a group.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError::WrongType`] if the link is not a group link.
    pub fn add_group(&mut self, group: impl Into<ResourceRef>) -> Result<(), FieldError> {
        self.0.add_to_set("groups", group.into())
    }

    /// Removes the sample from a group.
    ///
    /// # Errors
    ///
    /// Returns [`FieldError`] if the stored value is malformed.
    pub fn remove_group(&mut self, group: impl Into<ResourceRef>) -> Result<(), FieldError> {
        self.0.remove_from_set("groups", group.into())
    }
}

/// Parameters for creating a [`Sample`].
///
/// Defaults: pool size 1, with coverage profile, not public, no notes, no
/// groups.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewSample {
    name: String,
    pool_size: i64,
    coverage_profile: bool,
    public: bool,
    notes: Option<String>,
    groups: BTreeSet<ResourceRef>,
}

impl NewSample {
    /// Creates parameters for a sample called `name`.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pool_size: 1,
            coverage_profile: true,
            public: false,
            notes: None,
            groups: BTreeSet::new(),
        }
    }

    /// Sets the number of individuals.
    #[must_use]
    pub const fn pool_size(mut self, pool_size: i64) -> Self {
        self.pool_size = pool_size;
        self
    }

    /// Sets whether the sample has a coverage profile.
    #[must_use]
    pub const fn coverage_profile(mut self, coverage_profile: bool) -> Self {
        self.coverage_profile = coverage_profile;
        self
    }

    /// Makes the sample public.
    #[must_use]
    pub const fn public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    /// Sets notes in Markdown format.
    #[must_use]
    pub fn notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Adds the sample to a group.
    #[must_use]
    pub fn group(mut self, group: impl Into<ResourceRef>) -> Self {
        self.groups.insert(group.into());
        self
    }
}

impl CreateParams for NewSample {
    fn into_payload(self) -> CreatePayload {
        let payload = CreatePayload::new()
            .value("name", self.name)
            .value("pool_size", self.pool_size)
            .value("coverage_profile", self.coverage_profile)
            .value("public", self.public)
            .optional("notes", self.notes);
        if self.groups.is_empty() {
            payload
        } else {
            payload.value("groups", self.groups)
        }
    }
}

/// Filters for sample collections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SampleFilters {
    /// Only samples in all of these groups.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<BTreeSet<ResourceRef>>,
    /// Only public or only private samples.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    /// Only samples owned by this user.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ResourceRef>,
}

impl SampleFilters {
    /// Adds a group to filter by.
    #[must_use]
    pub fn group(mut self, group: impl Into<ResourceRef>) -> Self {
        self.groups.get_or_insert_with(BTreeSet::new).insert(group.into());
        self
    }

    /// Filters by public state.
    #[must_use]
    pub const fn public(mut self, public: bool) -> Self {
        self.public = Some(public);
        self
    }

    /// Filters by owning user. Opening a collection with a link of
    /// another kind fails with [`FieldError::WrongType`].
    #[must_use]
    pub fn user(mut self, user: impl Into<ResourceRef>) -> Self {
        self.user = Some(user.into());
        self
    }
}

impl CollectionFilters for SampleFilters {
    fn validate(&self) -> Result<(), FieldError> {
        check_filter_link("groups", self.groups.iter().flatten(), ResourceKind::Group)?;
        check_filter_link("user", &self.user, ResourceKind::User)
    }
}
