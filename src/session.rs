//! Sessions: the entry point for talking to a Varda server.
//!
//! A [`Session`] binds a [`ClientConfig`], an [`HttpClient`], and the
//! endpoint map of the server. The endpoint map is resolved once, when the
//! session is built, by fetching the API root document:
//!
//! ```json
//! {"root": {"sample_collection": {"uri": "/samples/"},
//!           "authentication": {"uri": "/authentication"},
//!           "genome": {"uri": "/genome"}}}
//! ```
//!
//! Resolution is not retried; if the root cannot be fetched the session
//! cannot be built.
//!
//! For every resource kind the session has three accessors: `get_<kind>`,
//! `<kind>s`, and `create_<kind>`, such as [`Session::get_sample`],
//! [`Session::samples`], and [`Session::create_sample`]. The generic
//! [`fetch`](Session::fetch), [`collection`](Session::collection), and
//! [`create`](Session::create) work for any [`RestResource`].
//!
//! # Example
//!
//! ```rust,ignore
//! use varda_client::rest::resources::NewSample;
//! use varda_client::{ApiToken, Session};
//!
//! let session = Session::builder()
//!     .token(ApiToken::new("d2e3f4...")?)
//!     .build()?;
//!
//! let sample = session.create_sample(NewSample::new("exome batch 1").pool_size(5))?;
//! println!("created {sample}");
//! ```

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use crate::clients::{HttpClient, HttpMethod, HttpResponse, Transport, Upload};
use crate::config::{ApiRoot, ApiToken, ClientConfig};
use crate::rest::resources::{
    Annotation, Coverage, DataSource, Group, Sample, User, Variant, Variation,
};
use crate::rest::fields::link_uri;
use crate::rest::{ResourceCollection, ResourceError, RestResource};

/// A connection to a Varda server.
///
/// Cloning a session is cheap; clones share the configuration, the HTTP
/// client, and the endpoint map.
///
/// # Thread Safety
///
/// `Session` is `Send + Sync`.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

#[derive(Debug)]
struct SessionInner {
    config: ClientConfig,
    client: HttpClient,
    endpoints: HashMap<String, String>,
}

impl Session {
    /// Creates a session for `config` and resolves the server endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError`] if the transport cannot be set up or the
    /// API root cannot be fetched.
    pub fn new(config: ClientConfig) -> Result<Self, ResourceError> {
        Self::builder().config(config).build()
    }

    /// Creates a session from a TOML configuration file.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Config`] if the file cannot be loaded, and
    /// the errors of [`Session::new`].
    pub fn from_config_file(path: impl AsRef<Path>) -> Result<Self, ResourceError> {
        Self::new(ClientConfig::load(path)?)
    }

    /// Creates a builder for a session.
    #[must_use]
    pub fn builder() -> SessionBuilder {
        SessionBuilder::new()
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    /// Returns the HTTP client.
    #[must_use]
    pub fn client(&self) -> &HttpClient {
        &self.inner.client
    }

    /// Returns the resolved endpoint map.
    #[must_use]
    pub fn endpoints(&self) -> &HashMap<String, String> {
        &self.inner.endpoints
    }

    /// Returns the URI of an endpoint, such as `sample_collection` or
    /// `genome`.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingEndpoint`] if the server root does not
    /// list `key`.
    pub fn endpoint(&self, key: &str) -> Result<&str, ResourceError> {
        self.inner
            .endpoints
            .get(key)
            .map(String::as_str)
            .ok_or_else(|| ResourceError::MissingEndpoint {
                key: key.to_string(),
            })
    }

    /// Sends a request through the HTTP client.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Api`] for unsuccessful statuses and
    /// [`ResourceError::Transport`] if the server could not be reached.
    pub fn request(
        &self,
        method: HttpMethod,
        uri: &str,
        data: Option<Value>,
        files: Vec<(String, Upload)>,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse, ResourceError> {
        Ok(self.inner.client.request(method, uri, data, files, headers)?)
    }

    /// Sends a GET request.
    ///
    /// # Errors
    ///
    /// See [`Session::request`].
    pub fn get(
        &self,
        uri: &str,
        data: Option<Value>,
        headers: HashMap<String, String>,
    ) -> Result<HttpResponse, ResourceError> {
        Ok(self.inner.client.get(uri, data, headers)?)
    }

    /// Sends a POST request, as multipart form data if `files` is not empty.
    ///
    /// # Errors
    ///
    /// See [`Session::request`].
    pub fn post(
        &self,
        uri: &str,
        data: Value,
        files: Vec<(String, Upload)>,
    ) -> Result<HttpResponse, ResourceError> {
        Ok(self.inner.client.post(uri, data, files)?)
    }

    /// Sends a PATCH request.
    ///
    /// # Errors
    ///
    /// See [`Session::request`].
    pub fn patch(&self, uri: &str, data: Value) -> Result<HttpResponse, ResourceError> {
        Ok(self.inner.client.patch(uri, data)?)
    }

    /// Fetches the resource at `uri`.
    ///
    /// # Errors
    ///
    /// See [`RestResource::get`].
    pub fn fetch<R: RestResource>(&self, uri: &str) -> Result<R, ResourceError> {
        R::get(self, uri)
    }

    /// Opens a collection of resources.
    ///
    /// # Errors
    ///
    /// See [`RestResource::collection`].
    pub fn collection<R: RestResource>(
        &self,
        filters: R::Filters,
    ) -> Result<ResourceCollection<R>, ResourceError> {
        R::collection(self, filters)
    }

    /// Creates a resource on the server.
    ///
    /// # Errors
    ///
    /// See [`RestResource::create`].
    pub fn create<R: RestResource>(&self, params: R::Create) -> Result<R, ResourceError> {
        R::create(self, params)
    }

    /// Returns the user the session is authenticated as, or `None` for an
    /// anonymous session.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::MissingEndpoint`] if the server has no
    /// authentication endpoint, and request errors.
    pub fn authenticated_user(&self) -> Result<Option<User>, ResourceError> {
        let endpoint = self.endpoint("authentication")?;
        let body = self.get(endpoint, None, HashMap::new())?.into_json()?;

        let user = body
            .get("authentication")
            .and_then(|authentication| authentication.get("user"))
            .unwrap_or(&Value::Null);
        if user.is_null() {
            return Ok(None);
        }
        let uri = link_uri(user)
            .ok_or_else(|| ResourceError::invalid_response("malformed authenticated user"))?;
        self.fetch(uri).map(Some)
    }
}

macro_rules! kind_accessors {
    ($($resource:ident: $get:ident, $list:ident, $create:ident;)*) => {
        impl Session {
            $(
                #[doc = concat!("Fetches the [`", stringify!($resource), "`] at `uri`.")]
                ///
                /// # Errors
                ///
                /// See [`RestResource::get`].
                pub fn $get(&self, uri: &str) -> Result<$resource, ResourceError> {
                    self.fetch(uri)
                }

                #[doc = concat!("Opens a collection of [`", stringify!($resource), "`] resources.")]
                ///
                /// # Errors
                ///
                /// See [`RestResource::collection`].
                pub fn $list(
                    &self,
                    filters: <$resource as RestResource>::Filters,
                ) -> Result<ResourceCollection<$resource>, ResourceError> {
                    self.collection(filters)
                }

                #[doc = concat!("Creates a [`", stringify!($resource), "`] on the server.")]
                ///
                /// # Errors
                ///
                /// See [`RestResource::create`].
                pub fn $create(
                    &self,
                    params: <$resource as RestResource>::Create,
                ) -> Result<$resource, ResourceError> {
                    self.create(params)
                }
            )*
        }
    };
}

kind_accessors! {
    Annotation: get_annotation, annotations, create_annotation;
    Coverage: get_coverage, coverages, create_coverage;
    DataSource: get_data_source, data_sources, create_data_source;
    Group: get_group, groups, create_group;
    Sample: get_sample, samples, create_sample;
    User: get_user, users, create_user;
    Variant: get_variant, variants, create_variant;
    Variation: get_variation, variations, create_variation;
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("api_root", &self.inner.config.api_root().as_ref())
            .field("endpoints", &self.inner.endpoints)
            .finish_non_exhaustive()
    }
}

// Verify Session is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Session>();
};

/// Builder for [`Session`].
///
/// Explicit API root and token settings override those of the supplied
/// configuration, which defaults to [`ClientConfig::default`].
///
/// # Example
///
/// ```rust,ignore
/// use varda_client::{ApiRoot, ClientConfig, Session};
///
/// let session = Session::builder()
///     .config(ClientConfig::load("varda.toml")?)
///     .api_root(ApiRoot::new("https://varda.example.org/api")?)
///     .build()?;
/// ```
#[derive(Default)]
pub struct SessionBuilder {
    config: Option<ClientConfig>,
    api_root: Option<ApiRoot>,
    token: Option<ApiToken>,
    transport: Option<Arc<dyn Transport>>,
}

impl SessionBuilder {
    /// Creates a builder with no settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the base configuration.
    #[must_use]
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Overrides the API root.
    #[must_use]
    pub fn api_root(mut self, api_root: ApiRoot) -> Self {
        self.api_root = Some(api_root);
        self
    }

    /// Overrides the authentication token.
    #[must_use]
    pub fn token(mut self, token: ApiToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Uses `transport` instead of a [`ReqwestTransport`](crate::clients::ReqwestTransport).
    #[must_use]
    pub fn transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    /// Builds the session and resolves the server endpoints.
    ///
    /// # Errors
    ///
    /// Returns [`ResourceError::Config`] if the merged configuration is
    /// invalid, [`ResourceError::Transport`] if the transport cannot be set
    /// up or the server cannot be reached, and
    /// [`ResourceError::InvalidResponse`] if the root document is malformed.
    pub fn build(self) -> Result<Session, ResourceError> {
        let mut config = self.config.unwrap_or_default();
        if self.api_root.is_some() || self.token.is_some() {
            let mut builder = config.to_builder();
            if let Some(api_root) = self.api_root {
                builder = builder.api_root(api_root);
            }
            if let Some(token) = self.token {
                builder = builder.token(token);
            }
            config = builder.build()?;
        }

        let client = match self.transport {
            Some(transport) => HttpClient::new(&config, transport),
            None => HttpClient::from_config(&config)?,
        };

        let endpoints = resolve_endpoints(&client)?;
        tracing::info!(
            api_root = config.api_root().as_ref(),
            endpoints = endpoints.len(),
            "Resolved server endpoints"
        );

        Ok(Session {
            inner: Arc::new(SessionInner {
                config,
                client,
                endpoints,
            }),
        })
    }
}

impl fmt::Debug for SessionBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionBuilder")
            .field("config", &self.config)
            .field("api_root", &self.api_root)
            .field("token", &self.token)
            .field("transport", &self.transport)
            .finish()
    }
}

/// Fetches the API root document and builds the endpoint map.
fn resolve_endpoints(client: &HttpClient) -> Result<HashMap<String, String>, ResourceError> {
    let body = client.get("/", None, HashMap::new())?.into_json()?;
    let root = body
        .get("root")
        .and_then(Value::as_object)
        .ok_or_else(|| ResourceError::invalid_response("API root has no 'root' object"))?;

    Ok(root
        .iter()
        .filter_map(|(key, value)| endpoint_uri(value).map(|uri| (key.clone(), uri.to_string())))
        .collect())
}

/// An endpoint is either `{"uri": ...}` or a string that looks like a URI.
/// Other scalars in the root document, such as `"status": "ok"`, are not.
fn endpoint_uri(value: &Value) -> Option<&str> {
    match value {
        Value::String(uri) if uri.starts_with('/') || uri.contains("://") => Some(uri),
        Value::Object(_) => link_uri(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_link_uri_forms() {
        assert_eq!(link_uri(&json!("/samples/")), Some("/samples/"));
        assert_eq!(link_uri(&json!({"uri": "/genome"})), Some("/genome"));
        assert_eq!(link_uri(&json!({"status": "ok"})), None);
        assert_eq!(link_uri(&json!(3)), None);
    }

    #[test]
    fn test_endpoint_uri_skips_plain_scalars() {
        assert_eq!(endpoint_uri(&json!({"uri": "/samples/"})), Some("/samples/"));
        assert_eq!(endpoint_uri(&json!("/genome")), Some("/genome"));
        assert_eq!(
            endpoint_uri(&json!("https://varda.test/users/")),
            Some("https://varda.test/users/")
        );
        assert_eq!(endpoint_uri(&json!("ok")), None);
        assert_eq!(endpoint_uri(&json!(true)), None);
    }

    #[test]
    fn test_builder_debug_masks_token() {
        let builder = Session::builder().token(ApiToken::new("secret-token").unwrap());
        let debug = format!("{builder:?}");
        assert!(!debug.contains("secret-token"));
    }
}
