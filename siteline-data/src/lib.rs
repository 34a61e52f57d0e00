//! Concrete collaborators for the Siteline engine.
//!
//! Responsibilities:
//! - Provide an HTTP implementation of the engine's `Geocoder` seam.
//! - Provide a JSON-backed implementation of the `RecordSource` seam.
//!
//! Boundaries:
//! - Do not encode sync semantics (those live in `siteline-core`).
//! - Keep blocking I/O off async executors; the HTTP client bridges
//!   explicitly through its own runtime.
//!
//! Invariants:
//! - No global mutable state.

#![forbid(unsafe_code)]

pub mod geocode;
pub mod source;

pub use geocode::{HttpGeocoder, HttpGeocoderConfig};
pub use source::{JsonRecordSource, JsonSourceError};
