//! Configuration types for the Varda client.
//!
//! The main types in this module are:
//!
//! - [`ClientConfig`]: All settings a [`Session`](crate::Session) needs
//! - [`ClientConfigBuilder`]: A builder for constructing [`ClientConfig`] instances
//! - [`ApiRoot`]: A validated API root URL
//! - [`ApiToken`]: An authentication token with masked debug output
//! - [`CertificateVerification`]: How TLS certificates are checked
//!
//! # Example
//!
//! ```rust
//! use std::time::Duration;
//! use varda_client::{ApiRoot, ApiToken, ClientConfig};
//!
//! let config = ClientConfig::builder()
//!     .api_root(ApiRoot::new("https://varda.example.org/api").unwrap())
//!     .token(ApiToken::new("my-token").unwrap())
//!     .collection_cache_size(50)
//!     .task_poll_wait(Duration::from_millis(500))
//!     .build()
//!     .unwrap();
//!
//! assert_eq!(config.collection_cache_size(), 50);
//! ```

mod newtypes;

pub use newtypes::{ApiRoot, ApiToken};

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// API root used when none is configured.
pub const DEFAULT_API_ROOT: &str = "http://127.0.0.1:5000";

/// Number of resources requested per collection page.
pub const DEFAULT_COLLECTION_CACHE_SIZE: usize = 20;

/// Size of the chunks yielded when streaming blob data, in bytes.
pub const DEFAULT_DATA_BUFFER_SIZE: usize = 1024 * 1024;

/// Time to wait between task state polls.
pub const DEFAULT_TASK_POLL_WAIT: Duration = Duration::from_secs(2);

/// How the server's TLS certificate is verified.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum CertificateVerification {
    /// Verify against the built-in root store.
    #[default]
    Enabled,
    /// Accept any certificate.
    Disabled,
    /// Verify against the PEM certificate(s) in this file, in addition to
    /// the built-in roots.
    CaBundle(PathBuf),
}

/// Configuration for a [`Session`](crate::Session).
///
/// `ClientConfig` is `Clone`, `Send`, and `Sync`.
///
/// # Example
///
/// ```rust
/// use varda_client::ClientConfig;
///
/// let config = ClientConfig::default();
/// assert_eq!(config.api_root().as_ref(), "http://127.0.0.1:5000");
/// assert!(config.token().is_none());
/// assert_eq!(config.collection_cache_size(), 20);
/// ```
#[derive(Clone, Debug)]
pub struct ClientConfig {
    api_root: ApiRoot,
    token: Option<ApiToken>,
    collection_cache_size: usize,
    data_buffer_size: usize,
    task_poll_wait: Duration,
    verify_certificate: CertificateVerification,
    user_agent_prefix: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_root: ApiRoot::default(),
            token: None,
            collection_cache_size: DEFAULT_COLLECTION_CACHE_SIZE,
            data_buffer_size: DEFAULT_DATA_BUFFER_SIZE,
            task_poll_wait: DEFAULT_TASK_POLL_WAIT,
            verify_certificate: CertificateVerification::Enabled,
            user_agent_prefix: None,
        }
    }
}

impl ClientConfig {
    /// Creates a new builder for constructing a `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::new()
    }

    /// Parses a configuration from a TOML document.
    ///
    /// Recognized keys are `api_root`, `token`, `collection_cache_size`,
    /// `data_buffer_size`, `task_poll_wait` (seconds), and
    /// `verify_certificate` (a boolean or the path of a CA bundle). Missing
    /// keys keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unparseable`] if the document is not valid TOML
    /// or holds invalid values.
    ///
    /// # Example
    ///
    /// ```rust
    /// use varda_client::ClientConfig;
    ///
    /// let config = ClientConfig::from_toml_str(r#"
    ///     api_root = "https://varda.example.org/api"
    ///     task_poll_wait = 0.5
    /// "#).unwrap();
    ///
    /// assert_eq!(config.api_root().as_ref(), "https://varda.example.org/api");
    /// assert_eq!(config.task_poll_wait().as_millis(), 500);
    /// ```
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let file: ConfigFile = toml::from_str(document).map_err(|e| ConfigError::Unparseable {
            reason: e.to_string(),
        })?;
        file.into_builder()?.build()
    }

    /// Reads a configuration file in the format accepted by
    /// [`from_toml_str`](Self::from_toml_str).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Unreadable`] if the file cannot be read and
    /// [`ConfigError::Unparseable`] if its contents are invalid.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Unreadable {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Returns the API root.
    #[must_use]
    pub const fn api_root(&self) -> &ApiRoot {
        &self.api_root
    }

    /// Returns the authentication token, if configured.
    #[must_use]
    pub const fn token(&self) -> Option<&ApiToken> {
        self.token.as_ref()
    }

    /// Returns the number of resources requested per collection page.
    #[must_use]
    pub const fn collection_cache_size(&self) -> usize {
        self.collection_cache_size
    }

    /// Returns the chunk size used when streaming blob data.
    #[must_use]
    pub const fn data_buffer_size(&self) -> usize {
        self.data_buffer_size
    }

    /// Returns the time to wait between task state polls.
    #[must_use]
    pub const fn task_poll_wait(&self) -> Duration {
        self.task_poll_wait
    }

    /// Returns the certificate verification mode.
    #[must_use]
    pub const fn verify_certificate(&self) -> &CertificateVerification {
        &self.verify_certificate
    }

    /// Returns the user agent prefix, if configured.
    #[must_use]
    pub fn user_agent_prefix(&self) -> Option<&str> {
        self.user_agent_prefix.as_deref()
    }

    /// Returns a builder initialised with this configuration's values.
    #[must_use]
    pub fn to_builder(&self) -> ClientConfigBuilder {
        ClientConfigBuilder {
            api_root: Some(self.api_root.clone()),
            token: self.token.clone(),
            collection_cache_size: Some(self.collection_cache_size),
            data_buffer_size: Some(self.data_buffer_size),
            task_poll_wait: Some(self.task_poll_wait),
            verify_certificate: Some(self.verify_certificate.clone()),
            user_agent_prefix: self.user_agent_prefix.clone(),
        }
    }
}

// Verify ClientConfig is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ClientConfig>();
};

/// Builder for constructing [`ClientConfig`] instances.
///
/// Every field is optional; unset fields take the defaults listed on the
/// `DEFAULT_*` constants.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    api_root: Option<ApiRoot>,
    token: Option<ApiToken>,
    collection_cache_size: Option<usize>,
    data_buffer_size: Option<usize>,
    task_poll_wait: Option<Duration>,
    verify_certificate: Option<CertificateVerification>,
    user_agent_prefix: Option<String>,
}

impl ClientConfigBuilder {
    /// Creates a new builder with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the API root.
    #[must_use]
    pub fn api_root(mut self, root: ApiRoot) -> Self {
        self.api_root = Some(root);
        self
    }

    /// Sets the authentication token.
    #[must_use]
    pub fn token(mut self, token: ApiToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Sets the number of resources requested per collection page.
    #[must_use]
    pub const fn collection_cache_size(mut self, size: usize) -> Self {
        self.collection_cache_size = Some(size);
        self
    }

    /// Sets the chunk size used when streaming blob data.
    #[must_use]
    pub const fn data_buffer_size(mut self, size: usize) -> Self {
        self.data_buffer_size = Some(size);
        self
    }

    /// Sets the time to wait between task state polls.
    #[must_use]
    pub const fn task_poll_wait(mut self, wait: Duration) -> Self {
        self.task_poll_wait = Some(wait);
        self
    }

    /// Sets the certificate verification mode.
    #[must_use]
    pub fn verify_certificate(mut self, verification: CertificateVerification) -> Self {
        self.verify_certificate = Some(verification);
        self
    }

    /// Sets the user agent prefix for HTTP requests.
    #[must_use]
    pub fn user_agent_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.user_agent_prefix = Some(prefix.into());
        self
    }

    /// Builds the [`ClientConfig`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ZeroSize`] if the page size or chunk size is zero.
    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let collection_cache_size = self
            .collection_cache_size
            .unwrap_or(DEFAULT_COLLECTION_CACHE_SIZE);
        if collection_cache_size == 0 {
            return Err(ConfigError::ZeroSize {
                field: "collection_cache_size",
            });
        }

        let data_buffer_size = self.data_buffer_size.unwrap_or(DEFAULT_DATA_BUFFER_SIZE);
        if data_buffer_size == 0 {
            return Err(ConfigError::ZeroSize {
                field: "data_buffer_size",
            });
        }

        Ok(ClientConfig {
            api_root: self.api_root.unwrap_or_default(),
            token: self.token,
            collection_cache_size,
            data_buffer_size,
            task_poll_wait: self.task_poll_wait.unwrap_or(DEFAULT_TASK_POLL_WAIT),
            verify_certificate: self.verify_certificate.unwrap_or_default(),
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}

/// On-disk configuration document.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_root: Option<ApiRoot>,
    token: Option<ApiToken>,
    collection_cache_size: Option<usize>,
    data_buffer_size: Option<usize>,
    task_poll_wait: Option<f64>,
    verify_certificate: Option<VerifySetting>,
    user_agent_prefix: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum VerifySetting {
    Flag(bool),
    CaBundle(PathBuf),
}

impl ConfigFile {
    fn into_builder(self) -> Result<ClientConfigBuilder, ConfigError> {
        let task_poll_wait = self
            .task_poll_wait
            .map(|seconds| {
                Duration::try_from_secs_f64(seconds).map_err(|_| ConfigError::InvalidPollWait {
                    seconds: seconds.to_string(),
                })
            })
            .transpose()?;

        let verify_certificate = self.verify_certificate.map(|setting| match setting {
            VerifySetting::Flag(true) => CertificateVerification::Enabled,
            VerifySetting::Flag(false) => CertificateVerification::Disabled,
            VerifySetting::CaBundle(path) => CertificateVerification::CaBundle(path),
        });

        Ok(ClientConfigBuilder {
            api_root: self.api_root,
            token: self.token,
            collection_cache_size: self.collection_cache_size,
            data_buffer_size: self.data_buffer_size,
            task_poll_wait,
            verify_certificate,
            user_agent_prefix: self.user_agent_prefix,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_provides_sensible_defaults() {
        let config = ClientConfig::builder().build().unwrap();

        assert_eq!(config.api_root().as_ref(), DEFAULT_API_ROOT);
        assert!(config.token().is_none());
        assert_eq!(config.collection_cache_size(), 20);
        assert_eq!(config.data_buffer_size(), 1024 * 1024);
        assert_eq!(config.task_poll_wait(), Duration::from_secs(2));
        assert_eq!(
            config.verify_certificate(),
            &CertificateVerification::Enabled
        );
        assert!(config.user_agent_prefix().is_none());
    }

    #[test]
    fn test_builder_rejects_zero_page_size() {
        let result = ClientConfig::builder().collection_cache_size(0).build();
        assert!(matches!(
            result,
            Err(ConfigError::ZeroSize {
                field: "collection_cache_size"
            })
        ));
    }

    #[test]
    fn test_builder_rejects_zero_chunk_size() {
        let result = ClientConfig::builder().data_buffer_size(0).build();
        assert!(matches!(
            result,
            Err(ConfigError::ZeroSize {
                field: "data_buffer_size"
            })
        ));
    }

    #[test]
    fn test_to_builder_preserves_values() {
        let config = ClientConfig::builder()
            .token(ApiToken::new("abc").unwrap())
            .collection_cache_size(7)
            .user_agent_prefix("cli/1.0")
            .build()
            .unwrap();

        let copy = config
            .to_builder()
            .api_root(ApiRoot::new("http://other.test").unwrap())
            .build()
            .unwrap();

        assert_eq!(copy.api_root().as_ref(), "http://other.test");
        assert_eq!(copy.token().map(AsRef::as_ref), Some("abc"));
        assert_eq!(copy.collection_cache_size(), 7);
        assert_eq!(copy.user_agent_prefix(), Some("cli/1.0"));
    }

    #[test]
    fn test_from_toml_str_reads_all_keys() {
        let config = ClientConfig::from_toml_str(
            r#"
            api_root = "https://varda.test/api/"
            token = "secret-token"
            collection_cache_size = 5
            data_buffer_size = 4096
            task_poll_wait = 0.25
            verify_certificate = "/etc/ssl/varda.pem"
            "#,
        )
        .unwrap();

        assert_eq!(config.api_root().as_ref(), "https://varda.test/api");
        assert_eq!(config.token().map(AsRef::as_ref), Some("secret-token"));
        assert_eq!(config.collection_cache_size(), 5);
        assert_eq!(config.data_buffer_size(), 4096);
        assert_eq!(config.task_poll_wait(), Duration::from_millis(250));
        assert_eq!(
            config.verify_certificate(),
            &CertificateVerification::CaBundle(PathBuf::from("/etc/ssl/varda.pem"))
        );
    }

    #[test]
    fn test_from_toml_str_verify_flag() {
        let config = ClientConfig::from_toml_str("verify_certificate = false").unwrap();
        assert_eq!(
            config.verify_certificate(),
            &CertificateVerification::Disabled
        );
    }

    #[test]
    fn test_from_toml_str_empty_document_uses_defaults() {
        let config = ClientConfig::from_toml_str("").unwrap();
        assert_eq!(config.api_root().as_ref(), DEFAULT_API_ROOT);
    }

    #[test]
    fn test_from_toml_str_rejects_bad_values() {
        assert!(matches!(
            ClientConfig::from_toml_str(r#"api_root = "nope""#),
            Err(ConfigError::Unparseable { .. })
        ));
        assert!(matches!(
            ClientConfig::from_toml_str("task_poll_wait = -1.0"),
            Err(ConfigError::InvalidPollWait { .. })
        ));
        assert!(matches!(
            ClientConfig::from_toml_str("task_poll_wait = 1e30"),
            Err(ConfigError::InvalidPollWait { .. })
        ));
        assert!(matches!(
            ClientConfig::from_toml_str("task_poll_wait = nan"),
            Err(ConfigError::InvalidPollWait { .. })
        ));
        assert!(matches!(
            ClientConfig::from_toml_str("unknown_key = 1"),
            Err(ConfigError::Unparseable { .. })
        ));
    }

    #[test]
    fn test_load_reports_missing_file() {
        let result = ClientConfig::load("/nonexistent/varda/config.toml");
        assert!(matches!(result, Err(ConfigError::Unreadable { .. })));
    }

    #[test]
    fn test_config_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientConfig>();
    }
}
