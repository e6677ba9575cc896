//! HTTP client types for Varda API communication.
//!
//! This module is the transport adapter of the crate: everything the
//! resource layer sends to the server goes through [`HttpClient::request`].
//!
//! # Overview
//!
//! The main types in this module are:
//!
//! - [`HttpClient`]: Resolves URIs, adds default headers, translates errors
//! - [`Transport`]: The capability of sending one request over the wire
//! - [`ReqwestTransport`]: The blocking `reqwest` implementation of [`Transport`]
//! - [`HttpRequest`]: A request ready to be sent
//! - [`HttpResponse`]: A response with a streaming body
//! - [`ContentRange`]: The parsed `Content-Range` of a collection page
//! - [`ApiError`]: Typed unsuccessful statuses
//!
//! # Example
//!
//! ```rust,ignore
//! use std::collections::HashMap;
//! use varda_client::clients::HttpClient;
//! use varda_client::ClientConfig;
//!
//! let client = HttpClient::from_config(&ClientConfig::default())?;
//!
//! let mut headers = HashMap::new();
//! headers.insert("Range".to_string(), "items=0-19".to_string());
//! let response = client.get("/samples/", None, headers)?;
//! println!("{:?}", response.content_range());
//! ```
//!
//! # Status Handling
//!
//! - **200, 201, 202, 206**: Returned to the caller unchanged
//! - **Any other status**: Translated into an [`ApiError`] variant
//! - **No response at all**: Returned as [`TransportError`], never retried

mod errors;
mod http_client;
mod http_request;
mod http_response;
mod transport;

pub use errors::{ApiError, HttpError, InvalidHttpRequestError, TransportError};
pub use http_client::{HttpClient, ACCEPT_VERSION, SDK_VERSION};
pub use http_request::{
    stringify_form_value, FilePart, HttpMethod, HttpRequest, HttpRequestBuilder, RequestBody,
    Upload,
};
pub use http_response::{BodyError, ContentRange, HttpResponse, SUCCESS_STATUSES};
pub use transport::{ReqwestTransport, Transport};
