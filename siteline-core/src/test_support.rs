//! Deterministic test doubles for the engine's three collaborators.
//!
//! [`MemorySource`] supplies tables built from literals, [`RecordingSurface`]
//! captures every surface call, and the two geocoders cover both delivery
//! styles: [`StaticGeocoder`] resolves immediately from an address table and
//! [`QueueGeocoder`] holds callbacks so a test can deliver them in any order.

use std::cell::RefCell;
use std::collections::HashMap;

use geo::{Coord, Rect};

use crate::geocode::{GeocodeCallback, GeocodeFailure, GeocodeOutcome, Geocoder};
use crate::source::{RecordSource, RecordTable};
use crate::surface::{CircleSpec, MapSurface, MarkerSpec, OverlayHandle};

/// One record in a [`MemoryTable`], built fluently.
///
/// # Examples
/// ```
/// use siteline_core::test_support::MemoryRecord;
///
/// let record = MemoryRecord::new("rec1", "Harbour Works")
///     .text("Address", "1 Quay St")
///     .number("Distance", 3.25)
///     .links("Category", ["Retail"]);
/// assert_eq!(record.id, "rec1");
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryRecord {
    /// Record identifier.
    pub id: String,
    /// Primary display name.
    pub name: String,
    /// Text cells by field name.
    pub text: HashMap<String, String>,
    /// Numeric cells by field name.
    pub numbers: HashMap<String, f64>,
    /// Linked-record cells by field name.
    pub links: HashMap<String, Vec<String>>,
}

impl MemoryRecord {
    /// Start a record with an id and display name.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            ..Self::default()
        }
    }

    /// Set a text cell.
    #[must_use]
    pub fn text(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.text.insert(field.into(), value.into());
        self
    }

    /// Set a numeric cell.
    #[must_use]
    pub fn number(mut self, field: impl Into<String>, value: f64) -> Self {
        self.numbers.insert(field.into(), value);
        self
    }

    /// Set a linked-record cell.
    #[must_use]
    pub fn links<I, T>(mut self, field: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.links
            .insert(field.into(), values.into_iter().map(Into::into).collect());
        self
    }
}

/// Ordered in-memory table.
#[derive(Debug, Clone, Default)]
pub struct MemoryTable {
    records: Vec<MemoryRecord>,
}

impl MemoryTable {
    /// Build a table from records, preserving their order.
    #[must_use]
    pub fn with_records<I>(records: I) -> Self
    where
        I: IntoIterator<Item = MemoryRecord>,
    {
        Self {
            records: records.into_iter().collect(),
        }
    }

    fn record(&self, record_id: &str) -> Option<&MemoryRecord> {
        self.records.iter().find(|record| record.id == record_id)
    }
}

impl RecordTable for MemoryTable {
    fn record_ids(&self) -> Vec<String> {
        self.records.iter().map(|record| record.id.clone()).collect()
    }

    fn display_name(&self, record_id: &str) -> Option<String> {
        self.record(record_id).map(|record| record.name.clone())
    }

    fn text_cell(&self, record_id: &str, field: &str) -> Option<String> {
        self.record(record_id)
            .and_then(|record| record.text.get(field).cloned())
    }

    fn number_cell(&self, record_id: &str, field: &str) -> Option<f64> {
        self.record(record_id)
            .and_then(|record| record.numbers.get(field).copied())
    }

    fn linked_cell(&self, record_id: &str, field: &str) -> Vec<String> {
        self.record(record_id)
            .and_then(|record| record.links.get(field).cloned())
            .unwrap_or_default()
    }
}

/// In-memory [`RecordSource`] keyed by table name.
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    tables: HashMap<String, MemoryTable>,
}

impl MemorySource {
    /// Add a table under a name.
    #[must_use]
    pub fn with_table(mut self, name: impl Into<String>, table: MemoryTable) -> Self {
        self.tables.insert(name.into(), table);
        self
    }
}

impl RecordSource for MemorySource {
    fn table(&self, name: &str) -> Option<&dyn RecordTable> {
        self.tables.get(name).map(|table| table as &dyn RecordTable)
    }
}

/// [`MapSurface`] that records every call for assertions.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    next_handle: u64,
    /// Every placed marker with its handle, in placement order.
    pub markers: Vec<(OverlayHandle, MarkerSpec)>,
    /// Every placed circle with its handle, in placement order.
    pub circles: Vec<(OverlayHandle, CircleSpec)>,
    /// Every removed handle, in removal order.
    pub removed: Vec<OverlayHandle>,
    /// Every opened popup as `(html, anchor)`.
    pub popups: Vec<(String, OverlayHandle)>,
    /// Every fitted rectangle, in call order.
    pub fits: Vec<Rect<f64>>,
}

impl RecordingSurface {
    fn assign_handle(&mut self) -> OverlayHandle {
        self.next_handle += 1;
        OverlayHandle(self.next_handle)
    }

    /// Markers that have not been removed.
    #[must_use]
    pub fn live_markers(&self) -> Vec<&MarkerSpec> {
        self.markers
            .iter()
            .filter(|(handle, _)| !self.removed.contains(handle))
            .map(|(_, marker)| marker)
            .collect()
    }

    /// Circles that have not been removed.
    #[must_use]
    pub fn live_circles(&self) -> Vec<&CircleSpec> {
        self.circles
            .iter()
            .filter(|(handle, _)| !self.removed.contains(handle))
            .map(|(_, circle)| circle)
            .collect()
    }

    /// How many times the viewport was fitted.
    #[must_use]
    pub fn fit_count(&self) -> usize {
        self.fits.len()
    }
}

impl MapSurface for RecordingSurface {
    fn add_marker(&mut self, marker: MarkerSpec) -> OverlayHandle {
        let handle = self.assign_handle();
        self.markers.push((handle, marker));
        handle
    }

    fn add_circle(&mut self, circle: CircleSpec) -> OverlayHandle {
        let handle = self.assign_handle();
        self.circles.push((handle, circle));
        handle
    }

    fn remove_overlay(&mut self, handle: OverlayHandle) {
        self.removed.push(handle);
    }

    fn open_popup(&mut self, html: &str, anchor: OverlayHandle) {
        self.popups.push((html.to_owned(), anchor));
    }

    fn fit_bounds(&mut self, bounds: &Rect<f64>) {
        self.fits.push(*bounds);
    }
}

/// [`Geocoder`] that resolves immediately from a fixed address table.
///
/// Unknown addresses fail with [`GeocodeFailure::NoResults`].
#[derive(Debug, Clone, Default)]
pub struct StaticGeocoder {
    positions: HashMap<String, Coord<f64>>,
}

impl StaticGeocoder {
    /// Map an address to a position.
    #[must_use]
    pub fn with_position(mut self, address: impl Into<String>, position: Coord<f64>) -> Self {
        self.positions.insert(address.into(), position);
        self
    }
}

impl Geocoder for StaticGeocoder {
    fn geocode(&self, address: &str, deliver: GeocodeCallback) {
        let outcome = self
            .positions
            .get(address)
            .copied()
            .ok_or(GeocodeFailure::NoResults);
        deliver(outcome);
    }
}

/// [`Geocoder`] that queues callbacks for manual, reorderable delivery.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use siteline_core::test_support::QueueGeocoder;
/// use siteline_core::Geocoder;
///
/// let geocoder = QueueGeocoder::default();
/// geocoder.geocode("somewhere", Box::new(|outcome| assert!(outcome.is_ok())));
/// assert_eq!(geocoder.pending(), 1);
/// geocoder.deliver(0, Ok(Coord { x: 0.0, y: 0.0 }));
/// assert_eq!(geocoder.pending(), 0);
/// ```
#[derive(Default)]
pub struct QueueGeocoder {
    queue: RefCell<Vec<(String, GeocodeCallback)>>,
}

impl QueueGeocoder {
    /// Number of requests awaiting delivery.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Addresses of pending requests, in issue order.
    #[must_use]
    pub fn pending_addresses(&self) -> Vec<String> {
        self.queue
            .borrow()
            .iter()
            .map(|(address, _)| address.clone())
            .collect()
    }

    /// Deliver the pending request at `index` with `outcome`.
    ///
    /// # Panics
    ///
    /// Panics when `index` is out of range; a test delivering more results
    /// than it queued is broken.
    pub fn deliver(&self, index: usize, outcome: GeocodeOutcome) {
        let (_, callback) = self.queue.borrow_mut().remove(index);
        callback(outcome);
    }
}

impl Geocoder for QueueGeocoder {
    fn geocode(&self, address: &str, deliver: GeocodeCallback) {
        self.queue.borrow_mut().push((address.to_owned(), deliver));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn memory_table_preserves_record_order() {
        let table = MemoryTable::with_records([
            MemoryRecord::new("b", "Second"),
            MemoryRecord::new("a", "First"),
        ]);
        assert_eq!(table.record_ids(), vec!["b".to_string(), "a".to_string()]);
    }

    #[rstest]
    fn recording_surface_tracks_live_overlays() {
        let mut surface = RecordingSurface::default();
        let marker = surface.add_marker(MarkerSpec {
            position: Coord { x: 0.0, y: 0.0 },
            kind: crate::record::RecordKind::Listing,
            title: "A".into(),
            popup_html: String::new(),
        });
        assert_eq!(surface.live_markers().len(), 1);
        surface.remove_overlay(marker);
        assert!(surface.live_markers().is_empty());
    }

    #[rstest]
    fn queue_geocoder_delivers_out_of_order() {
        let geocoder = QueueGeocoder::default();
        let seen = std::rc::Rc::new(RefCell::new(Vec::new()));
        for address in ["first", "second"] {
            let seen = std::rc::Rc::clone(&seen);
            geocoder.geocode(
                address,
                Box::new(move |outcome| seen.borrow_mut().push(outcome)),
            );
        }
        assert_eq!(
            geocoder.pending_addresses(),
            vec!["first".to_string(), "second".to_string()]
        );
        geocoder.deliver(1, Err(GeocodeFailure::NoResults));
        geocoder.deliver(0, Ok(Coord { x: 1.0, y: 1.0 }));
        assert_eq!(
            *seen.borrow(),
            vec![
                Err(GeocodeFailure::NoResults),
                Ok(Coord { x: 1.0, y: 1.0 })
            ]
        );
    }
}
