//! Field-mapping configuration.
//!
//! The host's settings surface resolves logical roles (which table holds
//! listings, which field holds the address, and so on) to concrete table
//! and field names. The engine treats an unresolved required role as "not
//! ready" and performs no work; validation reports exactly the missing
//! roles so a setup screen can list them.

use thiserror::Error;

/// Logical configuration roles the engine needs resolved.
///
/// # Examples
/// ```
/// use siteline_core::Role;
///
/// assert_eq!(Role::ListingAddressField.as_str(), "listing-address-field");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Geocoding service API key.
    ApiKey,
    /// Table holding requirement records.
    RequirementsTable,
    /// Table holding listing records.
    ListingsTable,
    /// Address field on the requirements table.
    RequirementAddressField,
    /// Address field on the listings table.
    ListingAddressField,
    /// Listing URL field (optional).
    ListingUrlField,
    /// Distance-in-miles field (optional).
    DistanceField,
    /// Drive-time field (optional).
    DriveTimeField,
    /// Linked-requirement field on the listings table (optional).
    LinkedRequirementField,
    /// Image URL field (optional).
    ImageField,
    /// Category field (optional).
    CategoryField,
}

impl Role {
    /// Stable kebab-case name used in configuration and messages.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiKey => "api-key",
            Self::RequirementsTable => "requirements-table",
            Self::ListingsTable => "listings-table",
            Self::RequirementAddressField => "requirement-address-field",
            Self::ListingAddressField => "listing-address-field",
            Self::ListingUrlField => "listing-url-field",
            Self::DistanceField => "distance-field",
            Self::DriveTimeField => "drive-time-field",
            Self::LinkedRequirementField => "linked-requirement-field",
            Self::ImageField => "image-field",
            Self::CategoryField => "category-field",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

fn join_roles(roles: &[Role]) -> String {
    roles
        .iter()
        .copied()
        .map(Role::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors raised when validating a [`FieldMapping`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MappingError {
    /// One or more required roles are unresolved.
    #[error("field mapping is incomplete: missing {}", join_roles(.missing))]
    Incomplete {
        /// The unresolved required roles, in declaration order.
        missing: Vec<Role>,
    },
}

/// User-configured association between roles and table/field names.
///
/// All fields are optional so a partially-configured mapping can be held
/// and re-validated as the host fills it in. [`FieldMapping::validate`]
/// decides readiness.
///
/// # Examples
/// ```
/// use siteline_core::{FieldMapping, Role};
///
/// let mapping = FieldMapping {
///     api_key: Some("key".into()),
///     requirements_table: Some("Requirements".into()),
///     listings_table: Some("Listings".into()),
///     requirement_address_field: Some("Address".into()),
///     ..FieldMapping::default()
/// };
/// let err = mapping.validate().expect_err("listing address is unset");
/// assert!(err.to_string().contains("listing-address-field"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(rename_all = "kebab-case", default)
)]
pub struct FieldMapping {
    /// Geocoding service API key.
    pub api_key: Option<String>,
    /// Name of the requirements table.
    pub requirements_table: Option<String>,
    /// Name of the listings table.
    pub listings_table: Option<String>,
    /// Address field on the requirements table.
    pub requirement_address_field: Option<String>,
    /// Address field on the listings table.
    pub listing_address_field: Option<String>,
    /// Listing URL field.
    pub listing_url_field: Option<String>,
    /// Distance field, in miles.
    pub distance_field: Option<String>,
    /// Drive-time field.
    pub drive_time_field: Option<String>,
    /// Linked-requirement field on the listings table.
    pub linked_requirement_field: Option<String>,
    /// Image URL field.
    pub image_field: Option<String>,
    /// Category field.
    pub category_field: Option<String>,
}

impl FieldMapping {
    /// Roles that must be resolved before a sync pass may start.
    pub const REQUIRED: [Role; 5] = [
        Role::ApiKey,
        Role::RequirementsTable,
        Role::ListingsTable,
        Role::RequirementAddressField,
        Role::ListingAddressField,
    ];

    /// The configured value for a role, if any.
    #[must_use]
    pub fn value_of(&self, role: Role) -> Option<&str> {
        let value = match role {
            Role::ApiKey => &self.api_key,
            Role::RequirementsTable => &self.requirements_table,
            Role::ListingsTable => &self.listings_table,
            Role::RequirementAddressField => &self.requirement_address_field,
            Role::ListingAddressField => &self.listing_address_field,
            Role::ListingUrlField => &self.listing_url_field,
            Role::DistanceField => &self.distance_field,
            Role::DriveTimeField => &self.drive_time_field,
            Role::LinkedRequirementField => &self.linked_requirement_field,
            Role::ImageField => &self.image_field,
            Role::CategoryField => &self.category_field,
        };
        value.as_deref().filter(|text| !text.trim().is_empty())
    }

    /// The configured value for a required role.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Incomplete`] naming `role` when it is unset.
    pub fn required(&self, role: Role) -> Result<&str, MappingError> {
        self.value_of(role)
            .ok_or(MappingError::Incomplete {
                missing: vec![role],
            })
    }

    /// Check that every required role is resolved.
    ///
    /// # Errors
    ///
    /// Returns [`MappingError::Incomplete`] listing exactly the unresolved
    /// required roles, in declaration order.
    pub fn validate(&self) -> Result<(), MappingError> {
        let missing: Vec<Role> = Self::REQUIRED
            .into_iter()
            .filter(|&role| self.value_of(role).is_none())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MappingError::Incomplete { missing })
        }
    }

    /// Whether a sync pass may start.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.validate().is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn complete() -> FieldMapping {
        FieldMapping {
            api_key: Some("key".into()),
            requirements_table: Some("Requirements".into()),
            listings_table: Some("Listings".into()),
            requirement_address_field: Some("Address".into()),
            listing_address_field: Some("Address".into()),
            ..FieldMapping::default()
        }
    }

    #[rstest]
    fn complete_mapping_is_ready(complete: FieldMapping) {
        assert!(complete.is_ready());
    }

    #[rstest]
    fn empty_mapping_lists_every_required_role() {
        let err = FieldMapping::default().validate().expect_err("nothing set");
        let MappingError::Incomplete { missing } = err;
        assert_eq!(missing, FieldMapping::REQUIRED.to_vec());
    }

    #[rstest]
    fn missing_listing_address_is_named_exactly(mut complete: FieldMapping) {
        complete.listing_address_field = None;
        let err = complete.validate().expect_err("one role unset");
        assert_eq!(
            err,
            MappingError::Incomplete {
                missing: vec![Role::ListingAddressField],
            }
        );
    }

    #[rstest]
    fn blank_values_count_as_unset(mut complete: FieldMapping) {
        complete.api_key = Some("   ".into());
        assert!(!complete.is_ready());
    }

    #[cfg(feature = "serde")]
    #[rstest]
    fn deserialises_kebab_case_keys() {
        let mapping: FieldMapping = serde_json::from_str(
            r#"{
                "api-key": "key",
                "requirements-table": "Requirements",
                "listings-table": "Listings",
                "requirement-address-field": "Address",
                "listing-address-field": "Address",
                "drive-time-field": "Drive time"
            }"#,
        )
        .expect("should deserialise");
        assert!(mapping.is_ready());
        assert_eq!(mapping.value_of(Role::DriveTimeField), Some("Drive time"));
    }
}
