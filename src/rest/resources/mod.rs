//! Resource kinds and their typed wrappers.
//!
//! Each kind declares a static field table and a typed wrapper around
//! [`Resource`](crate::rest::Resource) with getters and setters for its
//! fields, creation parameters, and collection filters:
//!
//! | Kind | Wrapper | Create | Filters | Tasked |
//! |------|---------|--------|---------|--------|
//! | `annotation` | [`Annotation`] | [`NewAnnotation`] | [`NoFilters`](crate::rest::NoFilters) | yes |
//! | `coverage` | [`Coverage`] | [`NewCoverage`] | [`CoverageFilters`] | yes |
//! | `data_source` | [`DataSource`] | [`NewDataSource`] | [`DataSourceFilters`] | no |
//! | `group` | [`Group`] | [`NewGroup`] | [`NoFilters`](crate::rest::NoFilters) | no |
//! | `sample` | [`Sample`] | [`NewSample`] | [`SampleFilters`] | no |
//! | `user` | [`User`] | [`NewUser`] | [`NoFilters`](crate::rest::NoFilters) | no |
//! | `variant` | [`Variant`] | [`NewVariant`] | [`NoFilters`](crate::rest::NoFilters) | no |
//! | `variation` | [`Variation`] | [`NewVariation`] | [`VariationFilters`] | yes |
//!
//! # Example
//!
//! ```rust,ignore
//! use varda_client::rest::resources::{NewGroup, NewSample, Sample};
//! use varda_client::rest::RestResource;
//!
//! let group = session.create_group(NewGroup::new("lab members"))?;
//! let mut sample = session.create_sample(NewSample::new("exome batch 1"))?;
//! sample.add_group(&group)?;
//! sample.save()?;
//! ```

use std::fmt;

use crate::rest::fields::Field;

/// Generates a typed wrapper around [`Resource`](crate::rest::Resource).
macro_rules! typed_resource {
    ($(#[$meta:meta])* $name:ident, $kind:ident, $filters:ty, $create:ty) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, serde::Serialize)]
        #[serde(transparent)]
        pub struct $name($crate::rest::Resource);

        impl $crate::rest::RestResource for $name {
            const KIND: $crate::rest::resources::ResourceKind =
                $crate::rest::resources::ResourceKind::$kind;

            type Filters = $filters;
            type Create = $create;

            fn from_resource(resource: $crate::rest::Resource) -> Self {
                Self(resource)
            }

            fn resource(&self) -> &$crate::rest::Resource {
                &self.0
            }

            fn resource_mut(&mut self) -> &mut $crate::rest::Resource {
                &mut self.0
            }

            fn into_resource(self) -> $crate::rest::Resource {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }

        impl From<&$name> for $crate::rest::ResourceRef {
            fn from(resource: &$name) -> Self {
                resource.0.to_ref()
            }
        }

        impl From<&$name> for $crate::rest::LocalValue {
            fn from(resource: &$name) -> Self {
                Self::Link(resource.0.to_ref())
            }
        }
    };
}

mod annotation;
mod coverage;
mod data_source;
mod group;
mod sample;
mod user;
mod variant;
mod variation;

pub use annotation::{Annotation, NewAnnotation};
pub use coverage::{Coverage, CoverageFilters, NewCoverage};
pub use data_source::{DataSource, DataSourceFilters, NewDataSource};
pub use group::{Group, NewGroup};
pub use sample::{NewSample, Sample, SampleFilters};
pub use user::{NewUser, ParseRoleError, Role, User, USER_ROLES};
pub use variant::{NewVariant, Variant, VariantFrequency};
pub use variation::{NewVariation, Variation, VariationFilters};

/// The kinds of resources the server provides.
///
/// The kind key names the resource in response bodies (`{"sample": {...}}`);
/// with a `_collection` suffix it names the collection endpoint and the
/// collection in list responses.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ResourceKind {
    /// Annotated data sources.
    Annotation,
    /// Coverage tracks of samples.
    Coverage,
    /// Uploaded data files.
    DataSource,
    /// Sample groups.
    Group,
    /// Samples.
    Sample,
    /// Users.
    User,
    /// Variants.
    Variant,
    /// Variant observations of samples.
    Variation,
}

impl ResourceKind {
    /// Every kind, in key order.
    pub const ALL: [Self; 8] = [
        Self::Annotation,
        Self::Coverage,
        Self::DataSource,
        Self::Group,
        Self::Sample,
        Self::User,
        Self::Variant,
        Self::Variation,
    ];

    /// Returns the kind key.
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Annotation => "annotation",
            Self::Coverage => "coverage",
            Self::DataSource => "data_source",
            Self::Group => "group",
            Self::Sample => "sample",
            Self::User => "user",
            Self::Variant => "variant",
            Self::Variation => "variation",
        }
    }

    /// Returns the key of the kind's collection endpoint.
    #[must_use]
    pub const fn collection_key(self) -> &'static str {
        match self {
            Self::Annotation => "annotation_collection",
            Self::Coverage => "coverage_collection",
            Self::DataSource => "data_source_collection",
            Self::Group => "group_collection",
            Self::Sample => "sample_collection",
            Self::User => "user_collection",
            Self::Variant => "variant_collection",
            Self::Variation => "variation_collection",
        }
    }

    /// Looks up a kind by key.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.key() == key)
    }

    /// Returns the field table of the kind, hidden fields included.
    #[must_use]
    pub const fn fields(self) -> &'static [Field] {
        match self {
            Self::Annotation => annotation::FIELDS,
            Self::Coverage => coverage::FIELDS,
            Self::DataSource => data_source::FIELDS,
            Self::Group => group::FIELDS,
            Self::Sample => sample::FIELDS,
            Self::User => user::FIELDS,
            Self::Variant => variant::FIELDS,
            Self::Variation => variation::FIELDS,
        }
    }

    /// Returns `true` for kinds processed by server-side tasks.
    #[must_use]
    pub const fn is_tasked(self) -> bool {
        matches!(self, Self::Annotation | Self::Coverage | Self::Variation)
    }

    /// Describes a link to this kind, for error messages.
    #[must_use]
    pub const fn link_description(self) -> &'static str {
        match self {
            Self::Annotation => "an annotation link",
            Self::Coverage => "a coverage link",
            Self::DataSource => "a data source link",
            Self::Group => "a group link",
            Self::Sample => "a sample link",
            Self::User => "a user link",
            Self::Variant => "a variant link",
            Self::Variation => "a variation link",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}
