//! Person (researcher) model.

use chrono::{DateTime, Datelike};
use serde::{Deserialize, Serialize};

use super::common::{ExternalId, Rank, TypeTag, Updated, de_id, de_opt_i64};

/// A researcher.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Person {
    /// Document ID.
    #[serde(rename = "_id", deserialize_with = "de_id")]
    pub id: String,

    /// Full name.
    pub full_name: String,

    /// Given names.
    pub first_names: Vec<String>,

    /// Family names.
    pub last_names: Vec<String>,

    /// Sex as registered in CvLAC ("hombre", "mujer"), when known.
    pub sex: Option<String>,

    /// Birth date as epoch seconds; `-1` when unknown.
    #[serde(deserialize_with = "de_opt_i64")]
    pub birthdate: Option<i64>,

    /// Affiliation history.
    pub affiliations: Vec<PersonAffiliation>,

    /// Researcher category rankings.
    pub ranking: Vec<Rank>,

    /// External identifiers (ORCID, CvLAC, Scholar, ...).
    pub external_ids: Vec<ExternalId>,

    /// Provenances that contributed to this record.
    pub updated: Vec<Updated>,
}

impl Person {
    /// Display name.
    #[must_use]
    pub fn name(&self) -> &str {
        let name = self.full_name.trim();
        if name.is_empty() { "Unknown" } else { name }
    }

    /// Affiliations without an end date.
    pub fn current_affiliations(&self) -> impl Iterator<Item = &PersonAffiliation> {
        self.affiliations.iter().filter(|a| a.end_date.is_none_or(|end| end <= 0))
    }

    /// ORCID if available.
    #[must_use]
    pub fn orcid(&self) -> Option<&str> {
        self.external_ids
            .iter()
            .find(|e| e.source.eq_ignore_ascii_case("orcid"))
            .map(|e| e.id.as_str())
    }
}

/// Convert a stored birth date (epoch seconds, `-1` for unknown) to a year.
#[must_use]
pub fn birth_year(birthdate: i64) -> Option<i32> {
    if birthdate == -1 {
        return None;
    }
    DateTime::from_timestamp(birthdate, 0).map(|d| d.year())
}

/// Affiliation entry in a person's history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonAffiliation {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub types: Vec<TypeTag>,
    #[serde(deserialize_with = "de_opt_i64")]
    pub start_date: Option<i64>,
    #[serde(deserialize_with = "de_opt_i64")]
    pub end_date: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn test_birth_year() {
        // 1985-06-15T00:00:00Z
        assert_eq!(birth_year(487_641_600), Some(1985));
        // Dates before 1970 are negative timestamps.
        assert_eq!(birth_year(-315_619_200), Some(1960));
        assert_eq!(birth_year(-1), None);
    }

    #[test]
    fn test_current_affiliations() {
        let person: Person = bson::from_document(doc! {
            "_id": "p1",
            "full_name": "Ana María Pérez",
            "affiliations": [
                {"id": "a1", "name": "Old", "end_date": 1_500_000_000_i64},
                {"id": "a2", "name": "Current", "end_date": -1},
                {"id": "a3", "name": "Also current"},
            ],
            "external_ids": [{"source": "orcid", "id": "https://orcid.org/0000-0001"}],
        })
        .unwrap();

        let current: Vec<_> = person.current_affiliations().map(|a| a.id.as_str()).collect();
        assert_eq!(current, vec!["a2", "a3"]);
        assert_eq!(person.orcid(), Some("https://orcid.org/0000-0001"));
        assert_eq!(person.birthdate.and_then(birth_year), None);
    }
}
