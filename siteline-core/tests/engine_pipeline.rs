//! End-to-end pipeline: memory source through field mapping, resolution,
//! and a sync pass, checking the engine's externally visible properties.

use geo::Coord;
use rstest::{fixture, rstest};

use siteline_core::test_support::{MemoryRecord, MemorySource, MemoryTable, RecordingSurface, StaticGeocoder};
use siteline_core::{
    FieldMapping, MappingError, ResolveError, Role, SyncEngine, resolve_records,
};

#[fixture]
fn mapping() -> FieldMapping {
    FieldMapping {
        api_key: Some("key".into()),
        requirements_table: Some("Requirements".into()),
        listings_table: Some("Listings".into()),
        requirement_address_field: Some("Address".into()),
        listing_address_field: Some("Address".into()),
        category_field: Some("Category".into()),
        ..FieldMapping::default()
    }
}

#[fixture]
fn source() -> MemorySource {
    MemorySource::default()
        .with_table(
            "Requirements",
            MemoryTable::with_records([
                MemoryRecord::new("req1", "Coffee chain").text("Address", "1 Corn St"),
                MemoryRecord::new("req2", "Bakery group").text("Address", "2 Park Row"),
            ]),
        )
        .with_table(
            "Listings",
            MemoryTable::with_records([
                MemoryRecord::new("lst1", "Harbour Works").links("Category", ["Retail"]),
            ]),
        )
}

#[fixture]
fn geocoder() -> StaticGeocoder {
    StaticGeocoder::default()
        .with_position("1 Corn St", Coord { x: -2.594, y: 51.454 })
        .with_position("2 Park Row", Coord { x: -2.602, y: 51.455 })
}

#[rstest]
fn worked_example_counts_and_overlays(
    mapping: FieldMapping,
    source: MemorySource,
    geocoder: StaticGeocoder,
) {
    let sets = resolve_records(&source, &mapping).expect("mapping is complete");
    let engine = SyncEngine::new(RecordingSurface::default());
    let pass = engine.sync(&geocoder, &sets);

    // Two requirements resolve; the listing has no address but still counts.
    assert_eq!(pass.expected(), 3);
    assert_eq!(pass.completed(), 3);
    assert_eq!(pass.resolved(), 2);
    assert_eq!(pass.missing_address(), 1);

    let surface = engine.surface();
    let surface = surface.borrow();
    assert_eq!(surface.live_markers().len(), 2);
    assert_eq!(surface.live_circles().len(), 2);
    assert_eq!(surface.fit_count(), 1);

    let fitted = surface.fits[0];
    assert_eq!(fitted.min(), Coord { x: -2.602, y: 51.454 });
    assert_eq!(fitted.max(), Coord { x: -2.594, y: 51.455 });
}

#[rstest]
fn resync_with_identical_inputs_is_idempotent(
    mapping: FieldMapping,
    source: MemorySource,
    geocoder: StaticGeocoder,
) {
    let sets = resolve_records(&source, &mapping).expect("mapping is complete");
    let engine = SyncEngine::new(RecordingSurface::default());
    engine.sync(&geocoder, &sets);

    let first: Vec<_> = {
        let surface = engine.surface();
        let surface = surface.borrow();
        surface.live_markers().into_iter().cloned().collect()
    };

    engine.sync(&geocoder, &sets);
    let surface = engine.surface();
    let surface = surface.borrow();
    let second: Vec<_> = surface.live_markers().into_iter().cloned().collect();

    // Handles differ across passes; overlay content does not.
    assert_eq!(first, second);
}

#[rstest]
fn unready_mapping_reports_the_exact_role(source: MemorySource, mut mapping: FieldMapping) {
    mapping.listing_address_field = None;
    let err = resolve_records(&source, &mapping).expect_err("mapping not ready");
    assert_eq!(
        err,
        ResolveError::Mapping(MappingError::Incomplete {
            missing: vec![Role::ListingAddressField],
        })
    );
    assert!(err.to_string().contains("listing-address-field"));
}
