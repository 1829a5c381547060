//! Shared HTTP plumbing for the remote adapters.
//!
//! Every adapter issues a single `GET` per call, expects JSON, and maps
//! transport errors, HTTP statuses and undecodable bodies onto
//! [`ErrorKind`] so the resolver can decide between retry and fallback
//! without looking at messages.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;
use wayfinder_core::{ErrorKind, ProviderError};

/// Default user agent for outbound requests.
///
/// Nominatim's usage policy rejects requests without an identifying agent.
pub const DEFAULT_USER_AGENT: &str = "wayfinder-geo/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Errors raised while constructing an HTTP-backed provider.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// The configured base URL does not parse or cannot carry a path.
    #[error("invalid base URL {url:?}: {reason}")]
    InvalidBaseUrl {
        /// URL as configured.
        url: String,
        /// Why it was rejected.
        reason: String,
    },
    /// The provider requires a credential and none was configured.
    #[error("{provider} requires a credential")]
    MissingCredential {
        /// Provider name.
        provider: &'static str,
    },
}

/// Configuration shared by the HTTP adapters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpProviderConfig {
    /// Base URL of the service (e.g., `"https://router.project-osrm.org"`).
    pub base_url: String,
    /// Request timeout, including connection setup.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// API key, for services that take one.
    pub credential: Option<String>,
}

impl HttpProviderConfig {
    /// Create a configuration for the given base URL with default settings.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
            credential: None,
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the API key. Blank keys are treated as absent.
    #[must_use]
    pub fn with_credential(mut self, credential: impl Into<String>) -> Self {
        let key: String = credential.into();
        self.credential = (!key.trim().is_empty()).then_some(key);
        self
    }
}

/// A configured `reqwest` client plus the validated base URL.
#[derive(Debug, Clone)]
pub(crate) struct HttpClient {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl HttpClient {
    pub(crate) fn new(config: &HttpProviderConfig) -> Result<Self, ProviderBuildError> {
        let base_url = validate_base_url(&config.base_url)?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self {
            client,
            base_url,
            timeout: config.timeout,
        })
    }

    /// Base URL without a trailing slash.
    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch `url` and decode its JSON body.
    pub(crate) async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, ProviderError> {
        let shown = redact(url);
        log::debug!("GET {shown}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(err, &shown))?;

        let status = response.status();
        if let Some(kind) = classify_status(status) {
            return Err(ProviderError::new(
                kind,
                format!("HTTP {} from {shown}", status.as_u16()),
            ));
        }

        let body = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(err, &shown))?;
        decode_json(&body, &shown)
    }

    /// Convert a reqwest error to a classified provider error.
    ///
    /// The URL reqwest attaches to its errors carries the query string, and
    /// with it any credential, so it is dropped in favour of the redacted one.
    fn convert_reqwest_error(&self, error: reqwest::Error, url: &str) -> ProviderError {
        if error.is_timeout() {
            return ProviderError::unavailable(format!(
                "request to {url} timed out after {}s",
                self.timeout.as_secs()
            ));
        }
        if let Some(status) = error.status() {
            let kind = classify_status(status).unwrap_or(ErrorKind::Unavailable);
            return ProviderError::new(kind, format!("HTTP {} from {url}", status.as_u16()));
        }
        let detail = error.without_url();
        ProviderError::unavailable(format!("request to {url} failed: {detail}"))
    }
}

/// Map an HTTP status onto an error kind, or `None` for success.
pub(crate) fn classify_status(status: StatusCode) -> Option<ErrorKind> {
    if status.is_success() {
        return None;
    }
    let kind = match status {
        StatusCode::TOO_MANY_REQUESTS => ErrorKind::RateLimited,
        StatusCode::REQUEST_TIMEOUT | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            ErrorKind::Unavailable
        }
        s if s.is_client_error() => ErrorKind::NotFound,
        _ => ErrorKind::Unavailable,
    };
    Some(kind)
}

/// Decode a JSON body, treating malformed payloads as an unusable answer.
pub(crate) fn decode_json<T: DeserializeOwned>(body: &str, url: &str) -> Result<T, ProviderError> {
    serde_json::from_str(body)
        .map_err(|err| ProviderError::unavailable(format!("malformed response from {url}: {err}")))
}

/// Encode query parameters as an `application/x-www-form-urlencoded` string.
pub(crate) fn encode_query<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> String {
    url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish()
}

fn validate_base_url(raw: &str) -> Result<String, ProviderBuildError> {
    let parsed = Url::parse(raw).map_err(|err| ProviderBuildError::InvalidBaseUrl {
        url: raw.to_owned(),
        reason: err.to_string(),
    })?;
    if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
        return Err(ProviderBuildError::InvalidBaseUrl {
            url: raw.to_owned(),
            reason: "expected an http(s) URL".to_owned(),
        });
    }
    Ok(raw.trim_end_matches('/').to_owned())
}

/// Strip the query string so API keys never reach logs or diagnostics.
fn redact(url: &str) -> String {
    url.split_once('?')
        .map_or_else(|| url.to_owned(), |(path, _)| format!("{path}?…"))
}
