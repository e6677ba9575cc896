//! Shared fixtures for integration tests.
//!
//! [`MockTransport`] answers requests with a scripted handler and records
//! every request it receives, so tests can assert on exactly what the
//! client sent.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde_json::{json, Value};
use varda_client::clients::{
    HttpMethod, HttpRequest, HttpResponse, RequestBody, Transport, TransportError,
};
use varda_client::{ApiRoot, ApiToken, ClientConfig, Session};

pub const API_ROOT: &str = "http://varda.test";

type Handler = dyn Fn(&HttpRequest) -> HttpResponse + Send + Sync;

/// A transport answering with a handler closure.
pub struct MockTransport {
    handler: Box<Handler>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    /// Creates a transport that serves the API root document and delegates
    /// every other request to `handler`.
    pub fn new(
        handler: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(move |request| {
                if request.http_method == HttpMethod::Get && path(request) == "/" {
                    HttpResponse::json(200, &root_document())
                } else {
                    handler(request)
                }
            }),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Creates a transport delegating every request, the API root included,
    /// to `handler`.
    pub fn without_root(
        handler: impl Fn(&HttpRequest) -> HttpResponse + Send + Sync + 'static,
    ) -> Arc<Self> {
        Arc::new(Self {
            handler: Box::new(handler),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// Returns the form fields and (field, file name) pairs of the last
    /// multipart request.
    pub fn last_multipart(&self) -> Option<(Vec<(String, String)>, Vec<(String, String)>)> {
        let requests = self.requests.lock().unwrap();
        requests.iter().rev().find_map(|request| match &request.body {
            RequestBody::Multipart { fields, files } => Some((
                fields.clone(),
                files
                    .iter()
                    .map(|file| (file.field.clone(), file.filename.clone()))
                    .collect(),
            )),
            _ => None,
        })
    }

    /// Returns (method, path, JSON body) of every request received so far.
    pub fn requests(&self) -> Vec<(HttpMethod, String, Option<Value>)> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .map(|r| (r.http_method, path(r).to_string(), r.body.as_json().cloned()))
            .collect()
    }

    /// Returns the `Range` headers of the GET requests to `path`.
    pub fn ranges(&self, target: &str) -> Vec<String> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.http_method == HttpMethod::Get && path(r) == target)
            .filter_map(|r| r.header("range").map(str::to_string))
            .collect()
    }

    /// Forgets the requests received so far.
    pub fn clear(&self) {
        self.requests.lock().unwrap().clear();
    }
}

impl fmt::Debug for MockTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockTransport").finish_non_exhaustive()
    }
}

impl Transport for MockTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = (self.handler)(&request);
        self.requests.lock().unwrap().push(request);
        Ok(response)
    }
}

/// Returns the request URL relative to [`API_ROOT`].
pub fn path(request: &HttpRequest) -> &str {
    request
        .url
        .strip_prefix(API_ROOT)
        .unwrap_or(request.url.as_str())
}

/// The API root document listing every endpoint.
pub fn root_document() -> Value {
    json!({
        "root": {
            "status": "ok",
            "annotation_collection": {"uri": "/annotations/"},
            "coverage_collection": {"uri": "/coverages/"},
            "data_source_collection": {"uri": "/data_sources/"},
            "group_collection": {"uri": "/groups/"},
            "sample_collection": {"uri": "/samples/"},
            "user_collection": {"uri": "/users/"},
            "variant_collection": {"uri": "/variants/"},
            "variation_collection": {"uri": "/variations/"},
            "authentication": {"uri": "/authentication"},
            "genome": {"uri": "/genome"}
        }
    })
}

/// Builds a session on `transport` with a zero task poll wait, and forgets
/// the root document request.
pub fn session(transport: &Arc<MockTransport>) -> Session {
    session_with(transport, ClientConfig::builder())
}

/// Builds a session from `builder` on `transport`.
pub fn session_with(
    transport: &Arc<MockTransport>,
    builder: varda_client::ClientConfigBuilder,
) -> Session {
    let config = builder
        .api_root(ApiRoot::new(API_ROOT).unwrap())
        .token(ApiToken::new("test-token").unwrap())
        .task_poll_wait(Duration::ZERO)
        .build()
        .unwrap();
    let session = Session::builder()
        .config(config)
        .transport(transport.clone())
        .build()
        .unwrap();
    transport.clear();
    session
}

/// A successful JSON response wrapping `value` under `key`.
pub fn wrapped(key: &str, value: Value) -> HttpResponse {
    HttpResponse::json(200, &json!({ key: value }))
}

/// A sample representation as the server sends it.
pub fn sample_json(id: u64, name: &str) -> Value {
    json!({
        "uri": format!("/samples/{id}"),
        "user": {"uri": "/users/1"},
        "name": name,
        "pool_size": 1,
        "coverage_profile": true,
        "public": false,
        "notes": null,
        "groups": [],
        "active": false,
        "added": "2012-11-23T10:55:12"
    })
}

/// An error response in the server's error format.
pub fn error_response(status: u16, code: &str, message: &str) -> HttpResponse {
    HttpResponse::json(status, &json!({"error": {"code": code, "message": message}}))
}

/// Extra headers, for readability at call sites.
pub fn no_headers() -> HashMap<String, String> {
    HashMap::new()
}
