//! The wire boundary of the client.
//!
//! [`Transport`] is the single capability the rest of the crate needs from an
//! HTTP stack: send one [`HttpRequest`], get back an [`HttpResponse`] or a
//! [`TransportError`]. [`ReqwestTransport`] is the production implementation;
//! tests substitute scripted transports.

use std::collections::HashMap;
use std::fmt;

use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::{Client, RequestBuilder};

use crate::clients::errors::TransportError;
use crate::clients::http_request::{HttpMethod, HttpRequest, RequestBody};
use crate::clients::http_response::HttpResponse;
use crate::config::{CertificateVerification, ClientConfig};

/// Sends fully prepared requests over the wire.
///
/// Implementations must not interpret status codes: every response that was
/// received, successful or not, is returned as `Ok`.
pub trait Transport: Send + Sync + fmt::Debug {
    /// Sends `request` and returns the raw response.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError`] if the exchange with the server failed.
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError>;
}

/// A [`Transport`] backed by a blocking `reqwest` client using rustls.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

// Verify ReqwestTransport is Send + Sync at compile time
const _: fn() = || {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<ReqwestTransport>();
};

impl ReqwestTransport {
    /// Creates a transport honoring the certificate settings of `config`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Setup`] if the CA bundle cannot be read or
    /// parsed, or the TLS backend fails to initialize.
    pub fn new(config: &ClientConfig) -> Result<Self, TransportError> {
        let mut builder = Client::builder().use_rustls_tls();

        match config.verify_certificate() {
            CertificateVerification::Enabled => {}
            CertificateVerification::Disabled => {
                builder = builder.danger_accept_invalid_certs(true);
            }
            CertificateVerification::CaBundle(path) => {
                let pem = std::fs::read(path).map_err(|e| TransportError::Setup {
                    reason: format!("cannot read CA bundle {}: {e}", path.display()),
                })?;
                let certificate =
                    reqwest::Certificate::from_pem(&pem).map_err(|e| TransportError::Setup {
                        reason: format!("invalid CA bundle {}: {e}", path.display()),
                    })?;
                builder = builder.add_root_certificate(certificate);
            }
        }

        let client = builder.build().map_err(|e| TransportError::Setup {
            reason: e.to_string(),
        })?;

        Ok(Self { client })
    }

    fn prepare(&self, request: HttpRequest) -> RequestBuilder {
        let method = match request.http_method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Patch => reqwest::Method::PATCH,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart { fields, files } => {
                let mut form = Form::new();
                for (name, value) in fields {
                    form = form.text(name, value);
                }
                for file in files {
                    let part = Part::reader(file.upload.into_reader()).file_name(file.filename);
                    form = form.part(file.field, part);
                }
                builder.multipart(form)
            }
        }
    }

    /// Parses response headers into a `HashMap` keyed by lowercase name.
    fn parse_response_headers(
        headers: &reqwest::header::HeaderMap,
    ) -> HashMap<String, Vec<String>> {
        let mut result: HashMap<String, Vec<String>> = HashMap::new();
        for (name, value) in headers {
            let key = name.as_str().to_lowercase();
            let value = value.to_str().unwrap_or_default().to_string();
            result.entry(key).or_default().push(value);
        }
        result
    }
}

impl Transport for ReqwestTransport {
    fn send(&self, request: HttpRequest) -> Result<HttpResponse, TransportError> {
        let response = self.prepare(request).send()?;
        let code = response.status().as_u16();
        let headers = Self::parse_response_headers(response.headers());
        Ok(HttpResponse::new(code, headers, response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_transport_builds_with_default_config() {
        assert!(ReqwestTransport::new(&ClientConfig::default()).is_ok());
    }

    #[test]
    fn test_transport_builds_without_verification() {
        let config = ClientConfig::builder()
            .verify_certificate(CertificateVerification::Disabled)
            .build()
            .unwrap();
        assert!(ReqwestTransport::new(&config).is_ok());
    }

    #[test]
    fn test_missing_ca_bundle_is_a_setup_error() {
        let config = ClientConfig::builder()
            .verify_certificate(CertificateVerification::CaBundle(PathBuf::from(
                "/nonexistent/varda-ca.pem",
            )))
            .build()
            .unwrap();
        assert!(matches!(
            ReqwestTransport::new(&config),
            Err(TransportError::Setup { .. })
        ));
    }

    #[test]
    fn test_transport_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ReqwestTransport>();
    }
}
