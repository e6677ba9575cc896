//! # Varda API Rust Client
//!
//! A Rust client for the Varda genomic variation frequency database,
//! providing typed configuration, a blocking HTTP transport, and a resource
//! layer for samples, users, data sources, and the other server resources.
//!
//! ## Overview
//!
//! This crate provides:
//! - Type-safe configuration via [`ClientConfig`] and [`ClientConfigBuilder`]
//! - Validated newtypes for the API root and authentication token
//! - A [`Session`] that resolves the server's endpoints and exposes
//!   `get_<kind>`, `<kind>s`, and `create_<kind>` accessors for every
//!   resource kind
//! - Local resource proxies with dirty tracking, so saving sends only the
//!   fields that changed
//! - Lazily paginated, filterable collections
//! - Polling of server-side import and annotation tasks
//! - A typed error taxonomy for unsuccessful HTTP statuses
//!
//! ## Quick Start
//!
//! ```rust
//! use varda_client::{ApiRoot, ApiToken, ClientConfig};
//!
//! let config = ClientConfig::builder()
//!     .api_root(ApiRoot::new("https://varda.example.org/api").unwrap())
//!     .token(ApiToken::new("d2e3f4a5b6").unwrap())
//!     .collection_cache_size(50)
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.collection_cache_size(), 50);
//! ```
//!
//! ## Working with Resources
//!
//! ```rust,ignore
//! use varda_client::rest::resources::{NewSample, SampleFilters};
//! use varda_client::rest::RestResource;
//! use varda_client::Session;
//!
//! let session = Session::from_config_file("varda.toml")?;
//!
//! // Create a sample; the client POSTs and then fetches the new resource
//! let mut sample = session.create_sample(NewSample::new("exome batch 1").pool_size(5))?;
//!
//! // Modify it; only the modified fields are sent on save
//! sample.set_active(true)?;
//! sample.save()?;
//!
//! // List public samples, fetched page by page
//! for sample in session.samples(SampleFilters::default().public(true))? {
//!     println!("{}", sample?);
//! }
//! ```
//!
//! ## Importing Data
//!
//! ```rust,ignore
//! use varda_client::clients::Upload;
//! use varda_client::rest::resources::{NewDataSource, NewVariation};
//! use varda_client::rest::TaskedResource;
//!
//! let data_source = session.create_data_source(
//!     NewDataSource::new("exome.vcf", "vcf").data(Upload::from_path("exome.vcf")?),
//! )?;
//! let mut variation = session.create_variation(NewVariation::new(&sample, &data_source))?;
//! variation.wait()?;
//! ```
//!
//! ## Error Handling
//!
//! Operations that talk to the server return
//! [`ResourceError`](rest::ResourceError). Unsuccessful statuses arrive as
//! [`ApiError`](clients::ApiError) variants carrying the server's error code
//! and message; failures to reach the server arrive as
//! [`TransportError`](clients::TransportError) and are never retried.
//!
//! ## Design Principles
//!
//! - **No global state**: Configuration is instance-based and passed explicitly
//! - **Fail-fast validation**: All newtypes validate on construction
//! - **Thread-safe**: Sessions and configuration are `Send + Sync`
//! - **Blocking**: Every request blocks the calling thread until it completes

pub mod clients;
pub mod config;
pub mod error;
pub mod rest;
pub mod session;

// Re-export public types at crate root for convenience
pub use config::{ApiRoot, ApiToken, CertificateVerification, ClientConfig, ClientConfigBuilder};
pub use error::ConfigError;
pub use session::{Session, SessionBuilder};

// Re-export HTTP client types
pub use clients::{
    ApiError, ContentRange, HttpClient, HttpError, HttpMethod, HttpRequest, HttpResponse,
    InvalidHttpRequestError, Transport, TransportError, Upload,
};

// Re-export resource types
pub use rest::{FieldError, ResourceError, RestResource, TaskedResource};
