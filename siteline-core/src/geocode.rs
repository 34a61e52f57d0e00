//! Resolve free-text addresses to coordinates.
//!
//! The [`Geocoder`] trait abstracts the external address-to-coordinate
//! service. Requests are one per address and results are delivered through
//! a one-shot callback: an implementation may invoke the callback before
//! `geocode` returns (a synchronous client) or hold it and deliver later
//! (a deferred client). Callers must not rely on any ordering between the
//! callbacks of separate requests.
//!
//! Coordinates are WGS84 with `x = longitude` and `y = latitude`, as
//! elsewhere in the workspace.

use geo::Coord;
use thiserror::Error;

/// Why a single geocode request produced no position.
///
/// A failure never aborts a sync pass; it is logged, counted, and the
/// record is simply absent from the map.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeocodeFailure {
    /// The service resolved nothing for the address.
    #[error("no results for address")]
    NoResults,
    /// The service rejected the request (bad key, quota, permissions).
    #[error("geocoding request was denied")]
    Denied,
    /// Any other service-side or transport problem.
    #[error("geocoding service error: {message}")]
    Service {
        /// Human-readable description from the client.
        message: String,
    },
}

/// Result of one geocode request.
pub type GeocodeOutcome = Result<Coord<f64>, GeocodeFailure>;

/// One-shot delivery of a [`GeocodeOutcome`].
///
/// Callbacks are not `Send`: the engine's execution model is a single
/// logical thread of cooperative callbacks.
pub type GeocodeCallback = Box<dyn FnOnce(GeocodeOutcome)>;

/// An external address-to-coordinate service.
///
/// # Examples
///
/// ```
/// use std::cell::RefCell;
/// use std::rc::Rc;
///
/// use geo::Coord;
/// use siteline_core::{GeocodeCallback, Geocoder};
///
/// /// Resolves every address to the origin.
/// struct OriginGeocoder;
///
/// impl Geocoder for OriginGeocoder {
///     fn geocode(&self, _address: &str, deliver: GeocodeCallback) {
///         deliver(Ok(Coord { x: 0.0, y: 0.0 }));
///     }
/// }
///
/// let seen = Rc::new(RefCell::new(None));
/// let sink = Rc::clone(&seen);
/// OriginGeocoder.geocode("anywhere", Box::new(move |outcome| *sink.borrow_mut() = Some(outcome)));
/// assert_eq!(*seen.borrow(), Some(Ok(Coord { x: 0.0, y: 0.0 })));
/// ```
pub trait Geocoder {
    /// Issue one request for `address`, delivering the outcome exactly once
    /// through `deliver`, immediately or later.
    fn geocode(&self, address: &str, deliver: GeocodeCallback);
}
