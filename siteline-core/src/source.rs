//! Read-only access to the host's tabular data.
//!
//! The `RecordSource` and `RecordTable` traits define the interface the
//! engine consumes from whatever supplies the tables: named tables, ordered
//! records, and typed cell readers. Implementations live outside this crate
//! (see `siteline-data` for a JSON-backed one and
//! [`crate::test_support::MemorySource`] for tests). The engine never
//! mutates source data.

/// A named collection of tables.
pub trait RecordSource {
    /// Look up a table by name, if the source has one.
    fn table(&self, name: &str) -> Option<&dyn RecordTable>;
}

/// One ordered table of records with typed cell readers.
///
/// Cell readers return `None` (or an empty list) for absent fields and for
/// cells whose value does not match the requested type. Record order is
/// stable and meaningful: overlays are created in table order.
pub trait RecordTable {
    /// Identifiers of every record, in table order.
    fn record_ids(&self) -> Vec<String>;

    /// Primary display name of a record.
    fn display_name(&self, record_id: &str) -> Option<String>;

    /// Read a cell as text.
    fn text_cell(&self, record_id: &str, field: &str) -> Option<String>;

    /// Read a cell as a number.
    fn number_cell(&self, record_id: &str, field: &str) -> Option<f64>;

    /// Read a linked-record cell as the display names of its targets.
    ///
    /// Returns an empty vector when the field is absent or not a link.
    fn linked_cell(&self, record_id: &str, field: &str) -> Vec<String>;
}
