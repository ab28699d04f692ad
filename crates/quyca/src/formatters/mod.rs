//! Output formatting.

pub mod csv;
pub mod json;

pub use self::csv::works_to_csv;
pub use self::json::{compact_affiliation, compact_catalog_item, compact_person, compact_source, compact_work};
