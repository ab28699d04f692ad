//! Source (journal, conference, repository) model.

use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};

use super::common::{ExternalId, Name, TypeTag, Updated, de_id, de_opt_f64, de_opt_i32, de_opt_i64, de_text, select_name};

/// Ranking provenance holding the journal quartile.
pub const QUARTILE_SOURCE: &str = "Scimago Best Quartile";

/// A publication venue.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Source {
    /// Document ID.
    #[serde(rename = "_id", deserialize_with = "de_id")]
    pub id: String,

    /// Localized names.
    pub names: Vec<Name>,

    /// Types per provenance.
    pub types: Vec<TypeTag>,

    /// Article processing charge.
    pub apc: Option<Apc>,

    /// Rankings with validity windows.
    pub ranking: Vec<SourceRank>,

    /// Publisher.
    pub publisher: Option<Publisher>,

    /// External identifiers (ISSN, OpenAlex, ...).
    pub external_ids: Vec<ExternalId>,

    /// Provenances that contributed to this record.
    pub updated: Vec<Updated>,
}

impl Source {
    /// Display name.
    #[must_use]
    pub fn name(&self, lang: &str) -> &str {
        select_name(&self.names, lang).unwrap_or("Unknown")
    }
}

/// Find the quartile whose validity window contains `year`.
#[must_use]
pub fn quartile_at(ranking: &[SourceRank], year: i32) -> Option<&str> {
    ranking
        .iter()
        .filter(|r| r.source == QUARTILE_SOURCE && !r.rank.is_empty())
        .find(|r| {
            let from = r.from_date.and_then(epoch_year);
            let to = r.to_date.and_then(epoch_year);
            from.is_some_and(|f| f <= year) && to.is_none_or(|t| year <= t)
        })
        .map(|r| r.rank.as_str())
}

fn epoch_year(seconds: i64) -> Option<i32> {
    DateTime::from_timestamp(seconds, 0).map(|d| d.year())
}

/// Article processing charge of a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Apc {
    #[serde(deserialize_with = "de_opt_f64")]
    pub charges: Option<f64>,
    pub currency: Option<String>,
    #[serde(deserialize_with = "de_opt_i32")]
    pub year_published: Option<i32>,
}

/// Ranking entry of a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceRank {
    pub source: String,
    #[serde(deserialize_with = "de_text")]
    pub rank: String,
    #[serde(deserialize_with = "de_opt_i64")]
    pub from_date: Option<i64>,
    #[serde(deserialize_with = "de_opt_i64")]
    pub to_date: Option<i64>,
}

/// Publisher of a source.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Publisher {
    pub name: String,
    pub country_code: Option<String>,
}
