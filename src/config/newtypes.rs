//! Validated newtype wrappers for configuration values.

use crate::error::ConfigError;
use serde::{de, Deserialize, Deserializer};
use std::fmt;

/// The root URL of the Varda API.
///
/// The value is trimmed and stored without a trailing slash so relative
/// resource URIs can be appended directly.
///
/// # Example
///
/// ```rust
/// use varda_client::ApiRoot;
///
/// let root = ApiRoot::new("https://varda.example.org/api/").unwrap();
/// assert_eq!(root.as_ref(), "https://varda.example.org/api");
/// assert_eq!(root.join("/samples/3"), "https://varda.example.org/api/samples/3");
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiRoot(String);

impl ApiRoot {
    /// Creates a validated API root.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidApiRoot`] unless the value starts with
    /// `http://` or `https://` followed by a non-empty host.
    pub fn new(url: impl Into<String>) -> Result<Self, ConfigError> {
        let url = url.into();
        let trimmed = url.trim().trim_end_matches('/');

        let rest = trimmed
            .strip_prefix("https://")
            .or_else(|| trimmed.strip_prefix("http://"))
            .ok_or_else(|| ConfigError::InvalidApiRoot { url: url.clone() })?;

        let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
        if host.is_empty() || host.contains(char::is_whitespace) {
            return Err(ConfigError::InvalidApiRoot { url });
        }

        Ok(Self(trimmed.to_string()))
    }

    /// Qualifies `uri` against this root.
    ///
    /// Absolute URIs are returned unchanged; anything else is treated as a
    /// path below the root.
    #[must_use]
    pub fn join(&self, uri: &str) -> String {
        if uri.contains("://") {
            return uri.to_string();
        }
        format!("{}/{}", self.0, uri.trim_start_matches('/'))
    }
}

impl Default for ApiRoot {
    fn default() -> Self {
        Self(super::DEFAULT_API_ROOT.to_string())
    }
}

impl AsRef<str> for ApiRoot {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl<'de> Deserialize<'de> for ApiRoot {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}

/// An API authentication token.
///
/// The `Debug` implementation masks the value so tokens don't leak into logs.
///
/// ```rust
/// use varda_client::ApiToken;
///
/// let token = ApiToken::new("8c3ab4").unwrap();
/// assert_eq!(format!("{:?}", token), "ApiToken(*****)");
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    /// Creates a validated token.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EmptyToken`] if the token is empty.
    pub fn new(token: impl Into<String>) -> Result<Self, ConfigError> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(ConfigError::EmptyToken);
        }
        Ok(Self(token))
    }
}

impl AsRef<str> for ApiToken {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(*****)")
    }
}

impl<'de> Deserialize<'de> for ApiToken {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::new(s).map_err(de::Error::custom)
    }
}
