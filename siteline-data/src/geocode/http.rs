//! HTTP-based [`Geocoder`] against a Nominatim-style search endpoint.
//!
//! The [`Geocoder`] trait is callback-based so the engine can treat
//! synchronous and deferred clients alike; this client resolves over HTTP
//! before invoking the callback. The async HTTP call is bridged to the
//! synchronous interface by blocking on a Tokio runtime owned by the
//! client, reused across requests.

use std::time::Duration;

use geo::Coord;
use log::debug;
use reqwest::{Client, StatusCode};
use thiserror::Error;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use url::Url;

use siteline_core::{GeocodeCallback, GeocodeFailure, Geocoder};

use super::response::SearchHit;

/// Default user agent for geocoding requests.
pub const DEFAULT_USER_AGENT: &str = "siteline-geocode/0.1";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Errors raised while constructing an [`HttpGeocoder`].
#[derive(Debug, Error)]
pub enum GeocoderBuildError {
    /// The base URL did not parse.
    #[error("invalid geocoding base URL {url:?}: {source}")]
    BaseUrl {
        /// The offending URL text.
        url: String,
        /// Parse error from the `url` crate.
        #[source]
        source: url::ParseError,
    },
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    /// Failed to build the Tokio runtime.
    #[error("failed to build Tokio runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

/// Configuration for [`HttpGeocoder`].
#[derive(Debug, Clone)]
pub struct HttpGeocoderConfig {
    /// Base URL of the geocoding service.
    pub base_url: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
    /// Optional API key sent as the `key` query parameter.
    pub api_key: Option<String>,
}

impl Default for HttpGeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org".to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            api_key: None,
        }
    }
}

impl HttpGeocoderConfig {
    /// Create a configuration with the given base URL.
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the API key sent with every request.
    #[must_use]
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

/// Forward geocoder over a Nominatim-style HTTP search endpoint.
///
/// # Runtime behaviour
///
/// When called from outside any Tokio runtime, the client blocks on its own
/// stored runtime. When called from within a multi-threaded Tokio runtime
/// (detected via [`Handle::try_current`]), it uses that runtime's handle
/// with [`tokio::task::block_in_place`] to avoid nested-runtime panics.
/// From within a `current_thread` runtime it falls back to its own runtime.
pub struct HttpGeocoder {
    client: Client,
    base: Url,
    config: HttpGeocoderConfig,
    runtime: Runtime,
}

impl std::fmt::Debug for HttpGeocoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpGeocoder")
            .field("base", &self.base.as_str())
            .field("config", &self.config)
            .field("runtime", &"<tokio::runtime::Runtime>")
            .finish()
    }
}

impl HttpGeocoder {
    /// Create a geocoder with default configuration for `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// or Tokio runtime fails to build.
    pub fn new(base_url: impl Into<String>) -> Result<Self, GeocoderBuildError> {
        Self::with_config(HttpGeocoderConfig::new(base_url))
    }

    /// Create a geocoder with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL does not parse or the HTTP client
    /// or Tokio runtime fails to build.
    pub fn with_config(config: HttpGeocoderConfig) -> Result<Self, GeocoderBuildError> {
        let base = Url::parse(&config.base_url).map_err(|source| GeocoderBuildError::BaseUrl {
            url: config.base_url.clone(),
            source,
        })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(Self {
            client,
            base,
            config,
            runtime,
        })
    }

    /// Build the search URL for one address.
    fn search_url(&self, address: &str) -> Url {
        let mut url = self.base.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("search");
        }
        {
            let mut pairs = url.query_pairs_mut();
            pairs
                .append_pair("q", address)
                .append_pair("format", "jsonv2")
                .append_pair("limit", "1");
            if let Some(key) = &self.config.api_key {
                pairs.append_pair("key", key);
            }
        }
        url
    }

    /// Resolve one address, blocking on the internal runtime as needed.
    ///
    /// # Errors
    ///
    /// Returns the [`GeocodeFailure`] describing why no position was
    /// produced.
    pub fn resolve(&self, address: &str) -> Result<Coord<f64>, GeocodeFailure> {
        let future = self.fetch_async(address);
        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(future))
            }
            // No runtime detected, or current_thread runtime: use our own.
            _ => self.runtime.block_on(future),
        }
    }

    async fn fetch_async(&self, address: &str) -> Result<Coord<f64>, GeocodeFailure> {
        let url = self.search_url(address);
        debug!("geocoding {address:?} via {}", url.host_str().unwrap_or("?"));

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| convert_reqwest_error(&err))?;
        let response = response
            .error_for_status()
            .map_err(|err| convert_reqwest_error(&err))?;

        let hits: Vec<SearchHit> =
            response.json().await.map_err(|err| GeocodeFailure::Service {
                message: format!("unreadable geocoding response: {err}"),
            })?;

        match hits.first() {
            Some(hit) => hit.position(),
            None => Err(GeocodeFailure::NoResults),
        }
    }
}

/// Map transport and status errors onto the engine's failure taxonomy.
fn convert_reqwest_error(error: &reqwest::Error) -> GeocodeFailure {
    match error.status() {
        Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) => GeocodeFailure::Denied,
        Some(status) => GeocodeFailure::Service {
            message: format!("geocoding service returned {status}"),
        },
        None if error.is_timeout() => GeocodeFailure::Service {
            message: "geocoding request timed out".to_string(),
        },
        None => GeocodeFailure::Service {
            message: error.to_string(),
        },
    }
}

impl Geocoder for HttpGeocoder {
    /// Resolve `address` over HTTP and deliver the outcome.
    ///
    /// Delivery happens before this method returns; the trait's contract
    /// permits that, and the engine copes with either style.
    fn geocode(&self, address: &str, deliver: GeocodeCallback) {
        deliver(self.resolve(address));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn geocoder() -> HttpGeocoder {
        HttpGeocoder::new("http://geocode.example.com").expect("geocoder should build")
    }

    #[rstest]
    fn search_url_escapes_the_address(geocoder: HttpGeocoder) {
        let url = geocoder.search_url("1 Quay St, Bristol");
        assert_eq!(url.path(), "/search");
        assert!(url.as_str().contains("q=1+Quay+St%2C+Bristol"));
        assert!(url.as_str().contains("format=jsonv2"));
        assert!(url.as_str().contains("limit=1"));
    }

    #[rstest]
    fn search_url_appends_to_a_base_path() {
        let geocoder =
            HttpGeocoder::new("http://geocode.example.com/v1/").expect("geocoder should build");
        let url = geocoder.search_url("somewhere");
        assert_eq!(url.path(), "/v1/search");
    }

    #[rstest]
    fn api_key_is_sent_when_configured() {
        let config = HttpGeocoderConfig::new("http://geocode.example.com").with_api_key("secret");
        let geocoder = HttpGeocoder::with_config(config).expect("geocoder should build");
        assert!(geocoder.search_url("x").as_str().contains("key=secret"));
    }

    #[rstest]
    fn invalid_base_url_is_rejected() {
        let err = HttpGeocoder::new("not a url").expect_err("should fail");
        assert!(matches!(err, GeocoderBuildError::BaseUrl { .. }));
    }

    #[rstest]
    fn config_builder_pattern() {
        let config = HttpGeocoderConfig::new("http://example.com")
            .with_timeout(Duration::from_secs(60))
            .with_user_agent("test-agent/1.0")
            .with_api_key("key");
        assert_eq!(config.base_url, "http://example.com");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.user_agent, "test-agent/1.0");
        assert_eq!(config.api_key.as_deref(), Some("key"));
    }
}
