//! Resource infrastructure for the Varda API.
//!
//! This module provides the resource layer on top of the HTTP client:
//!
//! - **Field descriptors** ([`Field`], [`FieldKind`]): Static per-kind tables
//!   describing each attribute and its wire conversion
//! - **[`TrackedValues`]**: Wire values with dirty tracking for partial updates
//! - **[`Resource`]** and the **[`RestResource`] trait**: Fetch, create,
//!   modify, save, and refresh remote resources
//! - **[`ResourceCollection`]**: Lazily paginated, filterable listings
//! - **[`TaskedResource`]**: Polling of server-side tasks
//! - **[`ResourceError`]** and **[`FieldError`]**: Error types for resource
//!   operations
//!
//! Individual kinds (Sample, User, ...) live in the [`resources`] submodule.
//!
//! # Example: Working with a Resource
//!
//! ```rust,ignore
//! use varda_client::rest::resources::{SampleFilters, Sample};
//! use varda_client::rest::RestResource;
//! use varda_client::Session;
//!
//! let session = Session::builder().token(token).build()?;
//!
//! // Fetch a sample by URI
//! let mut sample: Sample = session.get_sample("/samples/3")?;
//! println!("{:?}", sample.name()?);
//!
//! // Modify and save; only `public` is sent
//! sample.set_public(true)?;
//! sample.save()?;
//!
//! // Iterate over the samples of the logged-in user
//! if let Some(user) = session.authenticated_user()? {
//!     for sample in session.samples(SampleFilters::default().user(&user))? {
//!         println!("{}", sample?);
//!     }
//! }
//! ```
//!
//! # Key Types
//!
//! - [`LocalValue`]: The local representation of any field value
//! - [`ResourceRef`]: A link to another resource, resolved on demand
//! - [`BlobRef`] and [`BlobChunks`]: Binary data streamed in chunks
//! - [`TaskState`]: The state of a server-side task

mod collection;
mod errors;
pub(crate) mod fields;
mod resource;
mod task;
mod tracking;

pub mod resources;

// Public exports
pub use collection::{CollectionFilters, NoFilters, ResourceCollection};
pub use errors::{FieldError, ResourceError};
pub use fields::{
    find_field, BlobChunks, BlobRef, Field, FieldKind, FromLocal, LocalValue, ResourceRef,
    TaskError, TaskState, WireDefault, DATETIME_FORMAT, URI_FIELD,
};
pub use resource::{CreateParams, CreatePayload, Resource, RestResource};
pub use task::{TaskMonitor, TaskedResource, TASK_FIELD};
pub use tracking::TrackedValues;
