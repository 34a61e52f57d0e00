//! Core domain types and the map-synchronization engine for Siteline.
//!
//! Siteline renders two linked record collections, requirements (desired
//! service areas) and listings (candidate properties), onto an interactive
//! map: free-text addresses are geocoded, requirements gain a fixed-radius
//! coverage circle, and each marker carries a pre-rendered detail popup.
//!
//! This crate owns the domain model and the seams to the three external
//! collaborators (record source, geocoder, map surface), plus the
//! [`SyncEngine`] that keeps the surface consistent with the records. The
//! engine holds no durable state: every pass re-derives everything from its
//! inputs. Concrete collaborators (an HTTP geocoder, a JSON record source)
//! live in `siteline-data`.

#![forbid(unsafe_code)]

pub mod geocode;
pub mod mapping;
pub mod popup;
pub mod record;
pub mod resolve;
pub mod source;
pub mod surface;
pub mod sync;

#[doc(hidden)]
pub mod test_support;

pub use geocode::{GeocodeCallback, GeocodeFailure, GeocodeOutcome, Geocoder};
pub use mapping::{FieldMapping, MappingError, Role};
pub use popup::render_popup;
pub use record::{AddressRecord, RecordDetails, RecordKind};
pub use resolve::{RecordSets, ResolveError, resolve_records};
pub use source::{RecordSource, RecordTable};
pub use surface::{
    Bounds, CircleSpec, MapSurface, MarkerSpec, OverlayHandle, REQUIREMENT_RADIUS_METERS,
};
pub use sync::{PassHandle, SyncEngine};
