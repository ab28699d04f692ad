//! Work (research product) model matching the KAHI `works` schema.

use serde::{Deserialize, Serialize};

use super::common::{
    ExternalId, Rank, Title, TypeTag, Updated, de_i64, de_id, de_opt_i32, de_opt_i64,
    de_text, select_title, select_type,
};

/// A research product.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Work {
    /// Document ID.
    #[serde(rename = "_id", deserialize_with = "de_id")]
    pub id: String,

    /// Titles from every provenance.
    pub titles: Vec<Title>,

    /// Product types from every provenance.
    pub types: Vec<TypeTag>,

    /// Publication year.
    #[serde(deserialize_with = "de_opt_i32")]
    pub year_published: Option<i32>,

    /// Publication date (epoch seconds).
    #[serde(deserialize_with = "de_opt_i64")]
    pub date_published: Option<i64>,

    /// Citation counts per provenance.
    pub citations_count: Vec<CitationCount>,

    /// Citations received per year.
    pub citations_by_year: Vec<YearCitations>,

    /// Authors with their affiliations at publication time.
    pub authors: Vec<WorkAuthor>,

    /// Venue.
    pub source: Option<SourceRef>,

    /// Subjects per provenance.
    pub subjects: Vec<SubjectGroup>,

    /// Open access information.
    pub open_access: Option<OpenAccess>,

    /// External identifiers (DOI, OpenAlex, Scienti COD_PRODUCTO, ...).
    pub external_ids: Vec<ExternalId>,

    /// Product rankings (e.g. Scienti categories).
    pub ranking: Vec<Rank>,

    /// Provenances that contributed to this record.
    pub updated: Vec<Updated>,

    /// Volume, issue and pages.
    pub bibliographic_info: Option<BibliographicInfo>,

    /// Number of authors as reported by the provenance.
    #[serde(deserialize_with = "de_opt_i64")]
    pub author_count: Option<i64>,
}

impl Work {
    /// Display title in the requested language.
    #[must_use]
    pub fn title(&self, lang: &str) -> &str {
        select_title(&self.titles, lang).unwrap_or("Untitled")
    }

    /// Disambiguated product type.
    #[must_use]
    pub fn product_type(&self) -> Option<&TypeTag> {
        select_type(&self.types)
    }

    /// Citation count: the largest count reported by any provenance.
    #[must_use]
    pub fn citations(&self) -> i64 {
        self.citations_count.iter().map(|c| c.count).max().unwrap_or(0).max(0)
    }

    /// Get the DOI if available.
    #[must_use]
    pub fn doi(&self) -> Option<&str> {
        self.external_ids
            .iter()
            .find(|e| e.source.eq_ignore_ascii_case("doi") && !e.id.is_empty())
            .map(|e| e.id.as_str())
    }

    /// Open access status, `None` when unknown.
    #[must_use]
    pub fn open_access_status(&self) -> Option<&str> {
        self.open_access.as_ref()?.open_access_status.as_deref()
    }

    /// Venue name if available.
    #[must_use]
    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.name.as_str()).filter(|n| !n.is_empty())
    }

    /// Author names joined with "; ".
    #[must_use]
    pub fn author_names(&self) -> String {
        self.authors
            .iter()
            .map(|a| a.full_name.trim())
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Citation count reported by one provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CitationCount {
    pub source: String,
    #[serde(deserialize_with = "de_i64")]
    pub count: i64,
}

/// Citations received in one year.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct YearCitations {
    #[serde(deserialize_with = "de_opt_i32")]
    pub year: Option<i32>,
    #[serde(deserialize_with = "de_i64")]
    pub cited_by_count: i64,
}

/// Author entry of a work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkAuthor {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub full_name: String,
    pub affiliations: Vec<AffiliationRef>,
}

/// Affiliation reference embedded in works and persons.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AffiliationRef {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    pub types: Vec<TypeTag>,
}

/// Venue reference.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceRef {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
}

/// Subjects assigned by one provenance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SubjectGroup {
    pub source: String,
    pub subjects: Vec<Subject>,
}

/// A subject (topic, concept) of a work.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Subject {
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    pub name: String,
    #[serde(deserialize_with = "de_opt_i64")]
    pub level: Option<i64>,
}

/// Where in its source a work appears.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BibliographicInfo {
    #[serde(deserialize_with = "de_text")]
    pub volume: String,
    #[serde(deserialize_with = "de_text")]
    pub issue: String,
    #[serde(deserialize_with = "de_text")]
    pub start_page: String,
    #[serde(deserialize_with = "de_text")]
    pub end_page: String,
}

impl BibliographicInfo {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Open access information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenAccess {
    pub is_open_access: Option<bool>,
    pub open_access_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use bson::oid::ObjectId;

    #[test]
    fn test_work_decodes_mixed_numeric_types() {
        let oid = ObjectId::new();
        let document = doc! {
            "_id": oid,
            "titles": [{"title": "Dengue en Medellín", "lang": "es", "source": "openalex"}],
            "types": [{"source": "openalex", "type": "article"}],
            "year_published": 2020_i64,
            "citations_count": [
                {"source": "openalex", "count": 12},
                {"source": "scholar", "count": 15.0},
            ],
            "citations_by_year": [{"year": 2021, "cited_by_count": 4_i64}],
            "source": {"id": "s1", "name": "Biomédica"},
            "external_ids": [{"source": "doi", "id": "10.1/abc"}],
            "open_access": {"is_open_access": true, "open_access_status": "gold"},
        };

        let work: Work = bson::from_document(document).unwrap();
        assert_eq!(work.id, oid.to_hex());
        assert_eq!(work.year_published, Some(2020));
        assert_eq!(work.citations(), 15);
        assert_eq!(work.citations_by_year[0].cited_by_count, 4);
        assert_eq!(work.doi(), Some("10.1/abc"));
        assert_eq!(work.open_access_status(), Some("gold"));
        assert_eq!(work.source_name(), Some("Biomédica"));
        assert_eq!(work.title("es"), "Dengue en Medellín");
    }

    #[test]
    fn test_work_defaults() {
        let work: Work = bson::from_document(doc! {"_id": "w1"}).unwrap();
        assert_eq!(work.id, "w1");
        assert_eq!(work.title("es"), "Untitled");
        assert_eq!(work.citations(), 0);
        assert!(work.product_type().is_none());
        assert!(work.doi().is_none());
        assert!(work.bibliographic_info.is_none());
    }

    #[test]
    fn test_work_bibliographic_info() {
        let work: Work = bson::from_document(doc! {
            "_id": "w1",
            "bibliographic_info": {"volume": 12, "issue": "3", "start_page": "101", "end_page": 110_i64},
            "updated": [{"source": "openalex", "time": 1_700_000_000_i64}],
        })
        .unwrap();
        let info = work.bibliographic_info.unwrap();
        assert_eq!(info.volume, "12");
        assert_eq!(info.end_page, "110");
        assert!(!info.is_empty());
        assert!(BibliographicInfo::default().is_empty());
        assert_eq!(work.updated.len(), 1);
    }
}
