//! Response types for the forward-geocoding search endpoint.
//!
//! The search endpoint returns a JSON array of hits ordered by relevance.
//! Latitude and longitude arrive as strings and must parse as finite
//! floats before they are trusted.

use geo::Coord;
use serde::Deserialize;
use siteline_core::GeocodeFailure;

/// One hit from the search endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchHit {
    /// Latitude as a decimal string.
    pub lat: String,
    /// Longitude as a decimal string.
    pub lon: String,
    /// Resolved display name, when the service provides one.
    #[serde(default)]
    pub display_name: Option<String>,
}

impl SearchHit {
    /// Parse the hit's coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeFailure::Service`] when either component is not a
    /// finite decimal number.
    pub fn position(&self) -> Result<Coord<f64>, GeocodeFailure> {
        let y = parse_component("lat", &self.lat)?;
        let x = parse_component("lon", &self.lon)?;
        Ok(Coord { x, y })
    }
}

fn parse_component(name: &str, value: &str) -> Result<f64, GeocodeFailure> {
    value
        .parse::<f64>()
        .ok()
        .filter(|parsed| parsed.is_finite())
        .ok_or_else(|| GeocodeFailure::Service {
            message: format!("unparseable {name} {value:?} in geocoding response"),
        })
}
