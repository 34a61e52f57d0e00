//! Records produced by field-mapping resolution.
//!
//! An [`AddressRecord`] is the fully-typed view of one source record after
//! every optional attribute has been resolved. Rendering code never touches
//! the record source directly; it only sees these values.

/// Which of the two linked collections a record belongs to.
///
/// Requirements render with a fixed-radius coverage circle around their
/// marker; listings render as a plain marker with a detail popup.
///
/// # Examples
/// ```
/// use siteline_core::RecordKind;
///
/// assert_eq!(RecordKind::Requirement.as_str(), "requirement");
/// assert_eq!(RecordKind::Listing.to_string(), "listing");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    /// A desired service area, drawn with a coverage circle.
    Requirement,
    /// A candidate property, drawn as a point with a detail popup.
    Listing,
}

impl RecordKind {
    /// Return the kind as a lowercase `&str`.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Requirement => "requirement",
            Self::Listing => "listing",
        }
    }
}

impl std::fmt::Display for RecordKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Optional popup attributes resolved ahead of any rendering.
///
/// Every field corresponds to an optional field-mapping role; an unmapped
/// role or an empty cell resolves to `None` (or an empty list) here, so
/// the popup builder never needs to consult the record source.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordDetails {
    /// Category labels shown as badges.
    pub categories: Vec<String>,
    /// Distance from the linked requirement, in miles.
    pub distance_miles: Option<f64>,
    /// Free-text drive time, e.g. `"25 min"`.
    pub drive_time: Option<String>,
    /// External URL for the listing.
    pub listing_url: Option<String>,
    /// Image URL shown in the popup.
    pub image_url: Option<String>,
    /// Display name of the linked requirement record.
    pub linked_requirement: Option<String>,
}

/// One source record, resolved and ready for geocoding and rendering.
///
/// `address` is `None` when the mapped address cell was empty or contained
/// only whitespace; such records are skipped for geocoding but still count
/// towards sync-pass completion.
///
/// # Examples
/// ```
/// use siteline_core::{AddressRecord, RecordDetails, RecordKind};
///
/// let record = AddressRecord::new(
///     "rec1",
///     "Harbour Works",
///     RecordKind::Listing,
///     Some("1 Quay St, Bristol".into()),
///     RecordDetails::default(),
/// );
/// assert!(record.has_address());
///
/// let blank = AddressRecord::new("rec2", "No address", RecordKind::Listing, Some("  ".into()), RecordDetails::default());
/// assert!(blank.address.is_none());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AddressRecord {
    /// Source record identifier.
    pub id: String,
    /// Human-readable name used as the marker title and popup heading.
    pub display_name: String,
    /// Collection the record came from.
    pub kind: RecordKind,
    /// Free-text address, normalised to `None` when blank.
    pub address: Option<String>,
    /// Resolved optional attributes.
    pub details: RecordDetails,
}

impl AddressRecord {
    /// Construct a record, normalising a blank address to `None`.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        display_name: impl Into<String>,
        kind: RecordKind,
        address: Option<String>,
        details: RecordDetails,
    ) -> Self {
        let address = address.filter(|text| !text.trim().is_empty());
        Self {
            id: id.into(),
            display_name: display_name.into(),
            kind,
            address,
            details,
        }
    }

    /// Construct a record with no optional attributes.
    #[must_use]
    pub fn bare(
        id: impl Into<String>,
        display_name: impl Into<String>,
        kind: RecordKind,
        address: Option<String>,
    ) -> Self {
        Self::new(id, display_name, kind, address, RecordDetails::default())
    }

    /// Whether the record carries a geocodable address.
    #[must_use]
    pub fn has_address(&self) -> bool {
        self.address.is_some()
    }
}
