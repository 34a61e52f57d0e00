//! Record-source adapters.

mod json;

pub use json::{JsonRecordSource, JsonSourceError, JsonTable};
