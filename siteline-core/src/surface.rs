//! The interactive map the engine draws onto.
//!
//! [`MapSurface`] is the seam to the host's mapping component: place
//! markers and circles, remove overlays by handle, open a popup anchored
//! to a marker, and fit the viewport to a bounding rectangle. The engine
//! owns every handle it receives and detaches them all at the start of the
//! next sync pass.

use geo::{Coord, Rect};

use crate::record::RecordKind;

/// Radius of the coverage circle drawn around requirement markers: 15 miles.
pub const REQUIREMENT_RADIUS_METERS: f64 = 24_140.16;

/// Opaque, surface-assigned identity of one placed overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OverlayHandle(pub u64);

/// A marker to place on the surface.
///
/// Popup content is pre-built per successful geocode and travels with the
/// marker; the surface shows it (via [`MapSurface::open_popup`]) when the
/// marker is clicked.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    /// WGS84 position, `x = longitude`, `y = latitude`.
    pub position: Coord<f64>,
    /// Whether this marks a requirement or a listing; surfaces may style
    /// the two differently.
    pub kind: RecordKind,
    /// Marker title, shown on hover.
    pub title: String,
    /// Pre-rendered popup fragment for this marker.
    pub popup_html: String,
}

/// A circle overlay accompanying a requirement marker.
#[derive(Debug, Clone, PartialEq)]
pub struct CircleSpec {
    /// Centre of the circle.
    pub center: Coord<f64>,
    /// Radius in metres.
    pub radius_meters: f64,
}

/// The host's interactive map.
pub trait MapSurface {
    /// Place a marker and return its handle.
    fn add_marker(&mut self, marker: MarkerSpec) -> OverlayHandle;

    /// Place a circle and return its handle.
    fn add_circle(&mut self, circle: CircleSpec) -> OverlayHandle;

    /// Detach a previously placed overlay. Unknown handles are ignored.
    fn remove_overlay(&mut self, handle: OverlayHandle);

    /// Open a popup anchored to a placed marker.
    fn open_popup(&mut self, html: &str, anchor: OverlayHandle);

    /// Adjust the viewport to contain `bounds`.
    fn fit_bounds(&mut self, bounds: &Rect<f64>);
}

/// Monotonically growing bounding region over geocoded positions.
///
/// Starts empty; [`Bounds::to_rect`] yields `None` until the first point
/// is added.
///
/// # Examples
/// ```
/// use geo::Coord;
/// use siteline_core::Bounds;
///
/// let mut bounds = Bounds::default();
/// assert!(bounds.is_empty());
/// bounds.extend(Coord { x: -2.6, y: 51.45 });
/// bounds.extend(Coord { x: -0.1, y: 51.5 });
/// let rect = bounds.to_rect().expect("two points were added");
/// assert_eq!(rect.min().x, -2.6);
/// assert_eq!(rect.max().y, 51.5);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Bounds {
    rect: Option<Rect<f64>>,
}

impl Bounds {
    /// Grow the region to include `position`.
    pub fn extend(&mut self, position: Coord<f64>) {
        self.rect = Some(match self.rect {
            None => Rect::new(position, position),
            Some(rect) => {
                let min = rect.min();
                let max = rect.max();
                Rect::new(
                    Coord {
                        x: min.x.min(position.x),
                        y: min.y.min(position.y),
                    },
                    Coord {
                        x: max.x.max(position.x),
                        y: max.y.max(position.y),
                    },
                )
            }
        });
    }

    /// The accumulated rectangle, or `None` while no point has been added.
    #[must_use]
    pub const fn to_rect(&self) -> Option<Rect<f64>> {
        self.rect
    }

    /// Whether any point has been added.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.rect.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    fn single_point_yields_degenerate_rect() {
        let mut bounds = Bounds::default();
        bounds.extend(Coord { x: 1.0, y: 2.0 });
        let rect = bounds.to_rect().expect("one point added");
        assert_eq!(rect.min(), rect.max());
    }

    #[rstest]
    fn extension_is_order_independent() {
        let points = [
            Coord { x: -2.6, y: 51.45 },
            Coord { x: -0.1, y: 51.5 },
            Coord { x: -1.9, y: 52.48 },
        ];
        let mut forward = Bounds::default();
        let mut reverse = Bounds::default();
        for point in points {
            forward.extend(point);
        }
        for point in points.iter().rev() {
            reverse.extend(*point);
        }
        assert_eq!(forward, reverse);
    }

    #[rstest]
    fn interior_points_do_not_grow_the_rect() {
        let mut bounds = Bounds::default();
        bounds.extend(Coord { x: 0.0, y: 0.0 });
        bounds.extend(Coord { x: 2.0, y: 2.0 });
        let before = bounds.to_rect();
        bounds.extend(Coord { x: 1.0, y: 1.0 });
        assert_eq!(bounds.to_rect(), before);
    }
}
