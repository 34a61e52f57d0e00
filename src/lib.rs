//! Facade crate for the Siteline map-synchronization engine.
//!
//! Re-exports the core domain types, collaborator seams, and the sync
//! engine, plus the concrete HTTP geocoder and JSON record source behind
//! the `data` feature.

#![forbid(unsafe_code)]

pub use siteline_core::{
    AddressRecord, Bounds, CircleSpec, FieldMapping, GeocodeCallback, GeocodeFailure,
    GeocodeOutcome, Geocoder, MapSurface, MappingError, MarkerSpec, OverlayHandle, PassHandle,
    REQUIREMENT_RADIUS_METERS, RecordDetails, RecordKind, RecordSets, RecordSource, RecordTable,
    ResolveError, Role, SyncEngine, render_popup, resolve_records,
};

#[cfg(feature = "data")]
pub use siteline_data::{
    geocode::{HttpGeocoder, HttpGeocoderConfig},
    source::{JsonRecordSource, JsonSourceError},
};
