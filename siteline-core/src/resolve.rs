//! Turn raw source records into typed [`AddressRecord`]s.
//!
//! Resolution is the single place where optional fields are read: it
//! validates the field mapping, locates both tables, and reads every record
//! into a fully-typed value before any geocoding or rendering happens.
//! Rendering code downstream never performs its own presence checks against
//! the source.

use thiserror::Error;

use crate::mapping::{FieldMapping, MappingError, Role};
use crate::record::{AddressRecord, RecordDetails, RecordKind};
use crate::source::{RecordSource, RecordTable};

/// The two resolved collections, in source order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RecordSets {
    /// Requirement records.
    pub requirements: Vec<AddressRecord>,
    /// Listing records.
    pub listings: Vec<AddressRecord>,
}

impl RecordSets {
    /// Total record count across both collections.
    #[must_use]
    pub fn total(&self) -> usize {
        self.requirements.len() + self.listings.len()
    }

    /// Whether both collections are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }

    /// All records, requirements first, preserving source order.
    pub fn iter(&self) -> impl Iterator<Item = &AddressRecord> {
        self.requirements.iter().chain(self.listings.iter())
    }
}

/// Errors raised while resolving records from a source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// The field mapping is not ready.
    #[error(transparent)]
    Mapping(#[from] MappingError),
    /// A mapped table does not exist in the record source.
    #[error("table {name:?} (role {role}) was not found in the record source")]
    MissingTable {
        /// The role whose table is absent.
        role: Role,
        /// The configured table name.
        name: String,
    },
}

/// Resolve both collections through the field mapping.
///
/// # Errors
///
/// Returns [`ResolveError::Mapping`] when required roles are unset (listing
/// exactly the missing ones) and [`ResolveError::MissingTable`] when a
/// configured table is absent from the source.
pub fn resolve_records(
    source: &dyn RecordSource,
    mapping: &FieldMapping,
) -> Result<RecordSets, ResolveError> {
    mapping.validate()?;

    let requirements_table = lookup_table(source, mapping, Role::RequirementsTable)?;
    let listings_table = lookup_table(source, mapping, Role::ListingsTable)?;
    let requirement_address = mapping.required(Role::RequirementAddressField)?;
    let listing_address = mapping.required(Role::ListingAddressField)?;

    let requirements = requirements_table
        .record_ids()
        .into_iter()
        .map(|id| {
            let address = requirements_table.text_cell(&id, requirement_address);
            let display_name = requirements_table
                .display_name(&id)
                .unwrap_or_else(|| id.clone());
            AddressRecord::new(
                id,
                display_name,
                RecordKind::Requirement,
                address,
                RecordDetails::default(),
            )
        })
        .collect();

    let listings = listings_table
        .record_ids()
        .into_iter()
        .map(|id| {
            let address = listings_table.text_cell(&id, listing_address);
            let display_name = listings_table
                .display_name(&id)
                .unwrap_or_else(|| id.clone());
            let details = resolve_details(listings_table, mapping, &id);
            AddressRecord::new(id, display_name, RecordKind::Listing, address, details)
        })
        .collect();

    Ok(RecordSets {
        requirements,
        listings,
    })
}

fn lookup_table<'a>(
    source: &'a dyn RecordSource,
    mapping: &FieldMapping,
    role: Role,
) -> Result<&'a dyn RecordTable, ResolveError> {
    let name = mapping.required(role)?;
    source
        .table(name)
        .ok_or_else(|| ResolveError::MissingTable {
            role,
            name: name.to_owned(),
        })
}

/// Read the optional popup attributes for one listing record.
fn resolve_details(
    table: &dyn RecordTable,
    mapping: &FieldMapping,
    record_id: &str,
) -> RecordDetails {
    let text = |role: Role| {
        mapping
            .value_of(role)
            .and_then(|field| table.text_cell(record_id, field))
            .filter(|value| !value.trim().is_empty())
    };

    let categories = mapping
        .value_of(Role::CategoryField)
        .map(|field| {
            let linked = table.linked_cell(record_id, field);
            if linked.is_empty() {
                table
                    .text_cell(record_id, field)
                    .filter(|value| !value.trim().is_empty())
                    .into_iter()
                    .collect()
            } else {
                linked
            }
        })
        .unwrap_or_default();

    let linked_requirement = mapping
        .value_of(Role::LinkedRequirementField)
        .and_then(|field| table.linked_cell(record_id, field).into_iter().next());

    let distance_miles = mapping
        .value_of(Role::DistanceField)
        .and_then(|field| table.number_cell(record_id, field));

    RecordDetails {
        categories,
        distance_miles,
        drive_time: text(Role::DriveTimeField),
        listing_url: text(Role::ListingUrlField),
        image_url: text(Role::ImageField),
        linked_requirement,
    }
}
