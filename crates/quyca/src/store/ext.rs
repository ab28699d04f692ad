//! Tolerant accessors for aggregation results.

use bson::{Bson, Document};

use crate::models::common::{bson_to_f64, bson_to_i64, bson_to_id};

/// Lenient reads over aggregation output, where numeric widths and missing
/// keys depend on the data rather than the pipeline.
pub trait DocExt {
    /// Integer value, 0 when missing or not numeric.
    fn int(&self, key: &str) -> i64;

    /// Optional integer value.
    fn opt_int(&self, key: &str) -> Option<i64>;

    /// Float value, 0.0 when missing or not numeric.
    fn float(&self, key: &str) -> f64;

    /// Non-empty string value.
    fn text(&self, key: &str) -> Option<&str>;

    /// Identifier rendered as a string.
    fn id_string(&self, key: &str) -> Option<String>;

    /// Embedded document, or an empty one.
    fn sub(&self, key: &str) -> Document;

    /// Array value, or an empty slice.
    fn list(&self, key: &str) -> &[Bson];
}

impl DocExt for Document {
    fn int(&self, key: &str) -> i64 {
        self.opt_int(key).unwrap_or(0)
    }

    fn opt_int(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(bson_to_i64)
    }

    fn float(&self, key: &str) -> f64 {
        self.get(key).and_then(bson_to_f64).unwrap_or(0.0)
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.get_str(key).ok().map(str::trim).filter(|s| !s.is_empty())
    }

    fn id_string(&self, key: &str) -> Option<String> {
        self.get(key).map(bson_to_id).filter(|s| !s.is_empty())
    }

    fn sub(&self, key: &str) -> Document {
        self.get_document(key).cloned().unwrap_or_default()
    }

    fn list(&self, key: &str) -> &[Bson] {
        self.get_array(key).map(Vec::as_slice).unwrap_or(&[])
    }
}
