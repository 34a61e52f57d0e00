//! The map-synchronization engine.
//!
//! One sync pass takes the resolved record sets and makes the map surface
//! reflect them: clear every overlay from the previous pass, fire one
//! geocode request per addressed record, place a marker (plus a coverage
//! circle for requirements) as each success arrives, and fit the viewport
//! exactly once after every callback has settled.
//!
//! Execution is single-threaded and cooperative. All geocode requests for
//! a pass are issued up front; their callbacks may arrive in any order, so
//! pass state is carried in a per-pass value shared with the callbacks via
//! `Rc<RefCell<_>>` rather than anything process-wide. Each pass carries a
//! generation token: a callback whose pass has been superseded still ticks
//! its own counters but no longer touches the surface, so a stale result
//! can neither leave a stray overlay behind nor move the viewport.

use std::cell::RefCell;
use std::rc::Rc;

use geo::Rect;
use log::{debug, warn};

use crate::geocode::{GeocodeOutcome, Geocoder};
use crate::popup::render_popup;
use crate::record::{AddressRecord, RecordKind};
use crate::resolve::RecordSets;
use crate::surface::{
    Bounds, CircleSpec, MapSurface, MarkerSpec, OverlayHandle, REQUIREMENT_RADIUS_METERS,
};

/// State owned by the engine across passes: the active generation and the
/// handles of every overlay the active pass has placed.
#[derive(Debug, Default)]
struct EngineState {
    generation: u64,
    overlays: Vec<OverlayHandle>,
}

/// Bookkeeping for one sync pass.
#[derive(Debug, Default)]
struct PassState {
    generation: u64,
    expected: usize,
    completed: usize,
    resolved: usize,
    failed: usize,
    missing_address: usize,
    bounds: Bounds,
    fitted: bool,
}

/// Read-only view of a pass's progress.
///
/// The handle stays valid after the pass settles and after later passes
/// supersede it; it observes only its own pass.
#[derive(Debug, Clone)]
pub struct PassHandle {
    state: Rc<RefCell<PassState>>,
}

impl PassHandle {
    /// Total callbacks the pass expects (every record, addressed or not).
    #[must_use]
    pub fn expected(&self) -> usize {
        self.state.borrow().expected
    }

    /// Callbacks accounted for so far.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.state.borrow().completed
    }

    /// Successful geocodes.
    #[must_use]
    pub fn resolved(&self) -> usize {
        self.state.borrow().resolved
    }

    /// Failed geocodes (service failures, not missing addresses).
    #[must_use]
    pub fn failed(&self) -> usize {
        self.state.borrow().failed
    }

    /// Records skipped because they carry no address.
    #[must_use]
    pub fn missing_address(&self) -> usize {
        self.state.borrow().missing_address
    }

    /// Whether every expected callback has been accounted for.
    #[must_use]
    pub fn is_settled(&self) -> bool {
        let state = self.state.borrow();
        state.completed == state.expected
    }

    /// Whether this pass fitted the viewport.
    #[must_use]
    pub fn did_fit_bounds(&self) -> bool {
        self.state.borrow().fitted
    }

    /// The bounding region accumulated so far, if any geocode succeeded.
    #[must_use]
    pub fn bounds(&self) -> Option<Rect<f64>> {
        self.state.borrow().bounds.to_rect()
    }
}

/// Drives a [`MapSurface`] from record sets and a [`Geocoder`].
///
/// # Examples
/// ```
/// use siteline_core::test_support::{RecordingSurface, StaticGeocoder};
/// use siteline_core::{AddressRecord, RecordKind, RecordSets, SyncEngine};
/// use geo::Coord;
///
/// let geocoder = StaticGeocoder::default()
///     .with_position("1 Quay St", Coord { x: -2.59, y: 51.45 });
/// let sets = RecordSets {
///     requirements: vec![],
///     listings: vec![AddressRecord::bare(
///         "lst1",
///         "Harbour Works",
///         RecordKind::Listing,
///         Some("1 Quay St".into()),
///     )],
/// };
///
/// let engine = SyncEngine::new(RecordingSurface::default());
/// let pass = engine.sync(&geocoder, &sets);
/// assert!(pass.is_settled());
/// assert_eq!(pass.resolved(), 1);
/// assert!(pass.did_fit_bounds());
/// ```
pub struct SyncEngine<S: MapSurface> {
    surface: Rc<RefCell<S>>,
    state: Rc<RefCell<EngineState>>,
}

impl<S: MapSurface + 'static> SyncEngine<S> {
    /// Wrap a surface. The engine owns every overlay it places on it.
    #[must_use]
    pub fn new(surface: S) -> Self {
        Self {
            surface: Rc::new(RefCell::new(surface)),
            state: Rc::new(RefCell::new(EngineState::default())),
        }
    }

    /// Shared access to the wrapped surface, for hosts and tests.
    #[must_use]
    pub fn surface(&self) -> Rc<RefCell<S>> {
        Rc::clone(&self.surface)
    }

    /// Run one sync pass.
    ///
    /// Clears every overlay from the previous pass, then issues all geocode
    /// requests without waiting on one another. A record without an address
    /// ticks completion immediately and never reaches the geocoder. The
    /// returned [`PassHandle`] observes the pass; with a deferred geocoder
    /// it will not yet be settled when this returns.
    pub fn sync(&self, geocoder: &dyn Geocoder, records: &RecordSets) -> PassHandle {
        let generation = {
            let mut engine = self.state.borrow_mut();
            engine.generation += 1;
            let mut surface = self.surface.borrow_mut();
            for handle in engine.overlays.drain(..) {
                surface.remove_overlay(handle);
            }
            engine.generation
        };

        let pass = Rc::new(RefCell::new(PassState {
            generation,
            expected: records.total(),
            ..PassState::default()
        }));

        for record in records.iter() {
            match &record.address {
                None => {
                    debug!("record {} has no address; counted without geocoding", record.id);
                    Self::complete(&self.surface, &self.state, &pass, record, None);
                }
                Some(address) => {
                    let surface = Rc::clone(&self.surface);
                    let engine = Rc::clone(&self.state);
                    let pass_state = Rc::clone(&pass);
                    let record = record.clone();
                    geocoder.geocode(
                        address,
                        Box::new(move |outcome| {
                            Self::complete(&surface, &engine, &pass_state, &record, Some(outcome));
                        }),
                    );
                }
            }
        }

        PassHandle { state: pass }
    }

    /// Account for one settled record: place overlays on success, tick the
    /// counters either way, and fit the viewport when the pass completes.
    ///
    /// `outcome` is `None` for records that never reached the geocoder.
    fn complete(
        surface: &Rc<RefCell<S>>,
        engine: &Rc<RefCell<EngineState>>,
        pass: &Rc<RefCell<PassState>>,
        record: &AddressRecord,
        outcome: Option<GeocodeOutcome>,
    ) {
        let mut state = pass.borrow_mut();
        let active = engine.borrow().generation == state.generation;

        match outcome {
            None => state.missing_address += 1,
            Some(Err(failure)) => {
                warn!("geocoding failed for record {}: {failure}", record.id);
                state.failed += 1;
            }
            Some(Ok(position)) => {
                state.resolved += 1;
                if active {
                    let popup_html = render_popup(record);
                    let mut map = surface.borrow_mut();
                    let marker = map.add_marker(MarkerSpec {
                        position,
                        kind: record.kind,
                        title: record.display_name.clone(),
                        popup_html,
                    });
                    let mut owned = engine.borrow_mut();
                    owned.overlays.push(marker);
                    if record.kind == RecordKind::Requirement {
                        let circle = map.add_circle(CircleSpec {
                            center: position,
                            radius_meters: REQUIREMENT_RADIUS_METERS,
                        });
                        owned.overlays.push(circle);
                    }
                    state.bounds.extend(position);
                } else {
                    debug!("discarding stale geocode result for record {}", record.id);
                }
            }
        }

        state.completed += 1;

        if active && state.completed == state.expected && state.resolved > 0 && !state.fitted {
            if let Some(rect) = state.bounds.to_rect() {
                state.fitted = true;
                surface.borrow_mut().fit_bounds(&rect);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geocode::GeocodeFailure;
    use crate::test_support::{QueueGeocoder, RecordingSurface, StaticGeocoder};
    use geo::Coord;
    use rstest::{fixture, rstest};

    fn listing(id: &str, address: Option<&str>) -> AddressRecord {
        AddressRecord::bare(
            id,
            format!("Listing {id}"),
            RecordKind::Listing,
            address.map(str::to_owned),
        )
    }

    fn requirement(id: &str, address: Option<&str>) -> AddressRecord {
        AddressRecord::bare(
            id,
            format!("Requirement {id}"),
            RecordKind::Requirement,
            address.map(str::to_owned),
        )
    }

    #[fixture]
    fn geocoder() -> StaticGeocoder {
        StaticGeocoder::default()
            .with_position("A", Coord { x: -2.6, y: 51.45 })
            .with_position("B", Coord { x: -0.1, y: 51.5 })
    }

    #[rstest]
    fn empty_inputs_settle_without_fitting(geocoder: StaticGeocoder) {
        let engine = SyncEngine::new(RecordingSurface::default());
        let pass = engine.sync(&geocoder, &RecordSets::default());
        assert!(pass.is_settled());
        assert_eq!(pass.expected(), 0);
        assert!(!pass.did_fit_bounds());
        assert_eq!(engine.surface().borrow().fit_count(), 0);
    }

    #[rstest]
    fn worked_example_two_requirements_one_blank_listing(geocoder: StaticGeocoder) {
        let sets = RecordSets {
            requirements: vec![requirement("req1", Some("A")), requirement("req2", Some("B"))],
            listings: vec![listing("lst1", None)],
        };
        let engine = SyncEngine::new(RecordingSurface::default());
        let pass = engine.sync(&geocoder, &sets);

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
        assert_eq!(fitted.min(), Coord { x: -2.6, y: 51.45 });
        assert_eq!(fitted.max(), Coord { x: -0.1, y: 51.5 });
    }

    #[rstest]
    fn geocode_failure_never_aborts_the_pass(geocoder: StaticGeocoder) {
        let sets = RecordSets {
            requirements: vec![],
            listings: vec![listing("lst1", Some("unknown")), listing("lst2", Some("A"))],
        };
        let engine = SyncEngine::new(RecordingSurface::default());
        let pass = engine.sync(&geocoder, &sets);

        assert!(pass.is_settled());
        assert_eq!(pass.failed(), 1);
        assert_eq!(pass.resolved(), 1);
        assert_eq!(engine.surface().borrow().live_markers().len(), 1);
    }

    #[rstest]
    fn all_failures_mean_no_bounds_fit(geocoder: StaticGeocoder) {
        let sets = RecordSets {
            requirements: vec![],
            listings: vec![listing("lst1", Some("unknown")), listing("lst2", None)],
        };
        let engine = SyncEngine::new(RecordingSurface::default());
        let pass = engine.sync(&geocoder, &sets);

        assert!(pass.is_settled());
        assert!(!pass.did_fit_bounds());
        assert_eq!(engine.surface().borrow().fit_count(), 0);
    }

    #[rstest]
    fn listings_do_not_get_circles(geocoder: StaticGeocoder) {
        let sets = RecordSets {
            requirements: vec![],
            listings: vec![listing("lst1", Some("A"))],
        };
        let engine = SyncEngine::new(RecordingSurface::default());
        engine.sync(&geocoder, &sets);
        let surface = engine.surface();
        assert_eq!(surface.borrow().live_markers().len(), 1);
        assert!(surface.borrow().live_circles().is_empty());
    }

    #[rstest]
    fn requirement_circles_use_the_fixed_radius(geocoder: StaticGeocoder) {
        let sets = RecordSets {
            requirements: vec![requirement("req1", Some("A"))],
            listings: vec![],
        };
        let engine = SyncEngine::new(RecordingSurface::default());
        engine.sync(&geocoder, &sets);
        let surface = engine.surface();
        let surface = surface.borrow();
        assert_eq!(surface.circles[0].1.radius_meters, REQUIREMENT_RADIUS_METERS);
        assert_eq!(surface.circles[0].1.center, surface.markers[0].1.position);
    }

    #[rstest]
    fn resync_clears_previous_overlays(geocoder: StaticGeocoder) {
        let sets = RecordSets {
            requirements: vec![requirement("req1", Some("A"))],
            listings: vec![listing("lst1", Some("B"))],
        };
        let engine = SyncEngine::new(RecordingSurface::default());
        engine.sync(&geocoder, &sets);
        engine.sync(&geocoder, &sets);

        let surface = engine.surface();
        let surface = surface.borrow();
        // Two markers and one circle live after the second pass; the first
        // pass's three overlays were all detached.
        assert_eq!(surface.live_markers().len(), 2);
        assert_eq!(surface.live_circles().len(), 1);
        assert_eq!(surface.removed.len(), 3);
        assert_eq!(surface.fit_count(), 2);
    }

    #[rstest]
    fn out_of_order_delivery_reaches_the_same_settled_state() {
        let geocoder = QueueGeocoder::default();
        let sets = RecordSets {
            requirements: vec![requirement("req1", Some("A"))],
            listings: vec![listing("lst1", Some("B")), listing("lst2", Some("C"))],
        };
        let engine = SyncEngine::new(RecordingSurface::default());
        let pass = engine.sync(&geocoder, &sets);

        assert!(!pass.is_settled());
        assert_eq!(geocoder.pending(), 3);

        // Deliver last-issued first, then a failure, then the first.
        geocoder.deliver(2, Ok(Coord { x: 1.0, y: 1.0 }));
        assert_eq!(pass.completed(), 1);
        assert!(!pass.did_fit_bounds());
        geocoder.deliver(1, Err(GeocodeFailure::NoResults));
        assert!(!pass.did_fit_bounds());
        geocoder.deliver(0, Ok(Coord { x: -1.0, y: -1.0 }));

        assert!(pass.is_settled());
        assert_eq!(pass.resolved(), 2);
        assert_eq!(pass.failed(), 1);
        assert!(pass.did_fit_bounds());
        assert_eq!(engine.surface().borrow().fit_count(), 1);
    }

    #[rstest]
    fn fit_bounds_fires_exactly_once_per_pass() {
        let geocoder = QueueGeocoder::default();
        let sets = RecordSets {
            requirements: vec![],
            listings: vec![listing("lst1", Some("A")), listing("lst2", Some("B"))],
        };
        let engine = SyncEngine::new(RecordingSurface::default());
        engine.sync(&geocoder, &sets);
        geocoder.deliver(0, Ok(Coord { x: 0.0, y: 0.0 }));
        assert_eq!(engine.surface().borrow().fit_count(), 0);
        geocoder.deliver(1, Ok(Coord { x: 1.0, y: 1.0 }));
        assert_eq!(engine.surface().borrow().fit_count(), 1);
    }

    #[rstest]
    fn stale_callbacks_keep_their_own_counters_but_leave_the_surface_alone() {
        let geocoder = QueueGeocoder::default();
        let sets = RecordSets {
            requirements: vec![],
            listings: vec![listing("lst1", Some("A"))],
        };
        let engine = SyncEngine::new(RecordingSurface::default());
        let first = engine.sync(&geocoder, &sets);

        // A second pass begins while the first pass's geocode is in flight.
        let second = engine.sync(&geocoder, &sets);
        assert_eq!(geocoder.pending(), 2);

        // The stale callback settles its own pass without placing overlays
        // or fitting the viewport.
        geocoder.deliver(0, Ok(Coord { x: 5.0, y: 5.0 }));
        assert!(first.is_settled());
        assert_eq!(first.resolved(), 1);
        assert!(!first.did_fit_bounds());
        assert!(engine.surface().borrow().live_markers().is_empty());
        assert_eq!(engine.surface().borrow().fit_count(), 0);

        // The active pass is unaffected.
        geocoder.deliver(0, Ok(Coord { x: 1.0, y: 1.0 }));
        assert!(second.is_settled());
        assert!(second.did_fit_bounds());
        assert_eq!(engine.surface().borrow().live_markers().len(), 1);
    }

    #[rstest]
    fn popup_content_is_prebuilt_onto_the_marker(geocoder: StaticGeocoder) {
        let sets = RecordSets {
            requirements: vec![],
            listings: vec![listing("lst1", Some("A"))],
        };
        let engine = SyncEngine::new(RecordingSurface::default());
        engine.sync(&geocoder, &sets);
        let surface = engine.surface();
        let surface = surface.borrow();
        assert!(surface.markers[0].1.popup_html.contains("Listing lst1"));
    }
}
