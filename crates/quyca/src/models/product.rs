//! Patents and projects share one catalog shape.

use serde::{Deserialize, Serialize};

use super::common::{ExternalId, Title, TypeTag, de_id, de_opt_i32, select_title, select_type};
use super::work::WorkAuthor;

/// A patent or research project.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogItem {
    #[serde(rename = "_id", deserialize_with = "de_id")]
    pub id: String,
    pub titles: Vec<Title>,
    pub types: Vec<TypeTag>,
    #[serde(deserialize_with = "de_opt_i32")]
    pub year_published: Option<i32>,
    pub authors: Vec<WorkAuthor>,
    pub external_ids: Vec<ExternalId>,
}

impl CatalogItem {
    /// Display title in the requested language.
    #[must_use]
    pub fn title(&self, lang: &str) -> &str {
        select_title(&self.titles, lang).unwrap_or("Untitled")
    }

    /// Disambiguated type label.
    #[must_use]
    pub fn type_label(&self) -> Option<&str> {
        select_type(&self.types).map(|t| t.r#type.as_str())
    }
}
