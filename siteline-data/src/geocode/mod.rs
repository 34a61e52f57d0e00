//! HTTP geocoding client.
//!
//! [`HttpGeocoder`] implements [`siteline_core::Geocoder`] against a
//! Nominatim-style forward-geocoding endpoint. The callback-based trait is
//! satisfied by resolving over HTTP and delivering the outcome before
//! returning; async HTTP is bridged to the synchronous call with an
//! internally owned Tokio runtime.
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use siteline_data::geocode::{HttpGeocoder, HttpGeocoderConfig};
//! use siteline_core::Geocoder;
//!
//! let config = HttpGeocoderConfig::new("https://nominatim.openstreetmap.org")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("my-app/1.0");
//! let geocoder = HttpGeocoder::with_config(config)?;
//!
//! geocoder.geocode("1 Quay St, Bristol", Box::new(|outcome| {
//!     println!("resolved: {outcome:?}");
//! }));
//! # Ok::<(), siteline_data::geocode::GeocoderBuildError>(())
//! ```

mod http;
mod response;

pub use http::{DEFAULT_USER_AGENT, GeocoderBuildError, HttpGeocoder, HttpGeocoderConfig};
pub use response::SearchHit;
