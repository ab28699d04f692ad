//! Shared sub-documents and tolerant field decoders.
//!
//! KAHI documents are assembled from several provenances, so the same field may
//! arrive as an ObjectId or a string, or as an Int32, Int64 or Double. The
//! `de_*` helpers normalize those variations at decode time.

use bson::Bson;
use serde::{Deserialize, Deserializer, Serialize};

/// Provenance priority for titles (most trusted first).
pub const TITLE_SOURCE_PRIORITY: &[&str] = &["scienti", "minciencias", "ranking", "openalex"];

/// Provenance priority for product types (most trusted first).
pub const TYPE_SOURCE_PRIORITY: &[&str] = &["scienti", "minciencias", "openalex", "crossref"];

/// Render an identifier value as a string.
#[must_use]
pub fn bson_to_id(value: &Bson) -> String {
    match value {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s.clone(),
        Bson::Null | Bson::Undefined => String::new(),
        Bson::Int32(n) => n.to_string(),
        Bson::Int64(n) => n.to_string(),
        other => other.to_string(),
    }
}

/// Read a numeric value as an integer, truncating doubles.
#[must_use]
pub fn bson_to_i64(value: &Bson) -> Option<i64> {
    match value {
        Bson::Int32(n) => Some(i64::from(*n)),
        Bson::Int64(n) => Some(*n),
        Bson::Double(f) if f.is_finite() => Some(*f as i64),
        Bson::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Read a numeric value as a float.
#[must_use]
pub fn bson_to_f64(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(n) => Some(f64::from(*n)),
        Bson::Int64(n) => Some(*n as f64),
        Bson::Double(f) if f.is_finite() => Some(*f),
        Bson::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn de_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(bson_to_id(&Bson::deserialize(d)?))
}

pub(crate) fn de_opt_i64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i64>, D::Error> {
    Ok(bson_to_i64(&Bson::deserialize(d)?))
}

pub(crate) fn de_opt_i32<'de, D: Deserializer<'de>>(d: D) -> Result<Option<i32>, D::Error> {
    Ok(bson_to_i64(&Bson::deserialize(d)?).and_then(|n| i32::try_from(n).ok()))
}

pub(crate) fn de_i64<'de, D: Deserializer<'de>>(d: D) -> Result<i64, D::Error> {
    Ok(bson_to_i64(&Bson::deserialize(d)?).unwrap_or(0))
}

pub(crate) fn de_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
    Ok(bson_to_f64(&Bson::deserialize(d)?))
}

pub(crate) fn de_text<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    Ok(bson_to_id(&Bson::deserialize(d)?))
}

/// A title with its language and provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Title {
    pub title: String,
    pub lang: Option<String>,
    pub source: String,
}

/// A localized name (affiliations, sources).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Name {
    pub name: String,
    pub lang: Option<String>,
    pub source: Option<String>,
}

/// A type tag from one provenance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TypeTag {
    pub source: String,
    #[serde(rename = "type")]
    pub r#type: String,
    #[serde(deserialize_with = "de_opt_i64")]
    pub level: Option<i64>,
    /// Provenance-specific type code.
    #[serde(deserialize_with = "de_text")]
    pub code: String,
}

/// External identifier (DOI, ORCID, ROR, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExternalId {
    pub source: String,
    #[serde(deserialize_with = "de_id")]
    pub id: String,
}

/// Ranking entry of a work or person.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rank {
    pub source: String,
    #[serde(deserialize_with = "de_text")]
    pub rank: String,
}

/// Provenance update marker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Updated {
    pub source: String,
    #[serde(deserialize_with = "de_opt_i64")]
    pub time: Option<i64>,
}

fn source_rank(source: &str, priority: &[&str]) -> usize {
    priority.iter().position(|p| p.eq_ignore_ascii_case(source)).unwrap_or(priority.len())
}

/// Pick the display title.
///
/// Titles from the most trusted provenance win; inside it the requested
/// language is preferred, otherwise the first title of that provenance.
#[must_use]
pub fn select_title<'a>(titles: &'a [Title], lang: &str) -> Option<&'a str> {
    let usable: Vec<&Title> = titles.iter().filter(|t| !t.title.trim().is_empty()).collect();
    let best = usable.iter().map(|t| source_rank(&t.source, TITLE_SOURCE_PRIORITY)).min()?;
    let candidates: Vec<&Title> = usable
        .into_iter()
        .filter(|t| source_rank(&t.source, TITLE_SOURCE_PRIORITY) == best)
        .collect();

    candidates
        .iter()
        .copied()
        .find(|t| t.lang.as_deref().is_some_and(|l| l.eq_ignore_ascii_case(lang)))
        .or_else(|| candidates.first().copied())
        .map(|t| t.title.trim())
}

/// Pick the product type: most trusted provenance, then the most specific level.
#[must_use]
pub fn select_type(types: &[TypeTag]) -> Option<&TypeTag> {
    types.iter().filter(|t| !t.r#type.trim().is_empty()).min_by(|a, b| {
        source_rank(&a.source, TYPE_SOURCE_PRIORITY)
            .cmp(&source_rank(&b.source, TYPE_SOURCE_PRIORITY))
            .then_with(|| b.level.unwrap_or(-1).cmp(&a.level.unwrap_or(-1)))
    })
}

/// Pick a localized name: requested language, then English, then the first one.
#[must_use]
pub fn select_name<'a>(names: &'a [Name], lang: &str) -> Option<&'a str> {
    let usable = || names.iter().filter(|n| !n.name.trim().is_empty());
    let lang_is = |n: &&Name, want: &str| n.lang.as_deref().is_some_and(|l| l.eq_ignore_ascii_case(want));

    usable()
        .find(|n| lang_is(n, lang))
        .or_else(|| usable().find(|n| lang_is(n, "en")))
        .or_else(|| usable().next())
        .map(|n| n.name.trim())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(text: &str, lang: &str, source: &str) -> Title {
        Title { title: text.to_string(), lang: Some(lang.to_string()), source: source.to_string() }
    }

    fn type_tag(source: &str, ty: &str, level: Option<i64>) -> TypeTag {
        TypeTag { source: source.to_string(), r#type: ty.to_string(), level, ..TypeTag::default() }
    }

    #[test]
    fn test_select_title_prefers_trusted_source() {
        let titles = vec![
            title("OpenAlex title", "en", "openalex"),
            title("Título Scienti", "es", "scienti"),
        ];
        assert_eq!(select_title(&titles, "en"), Some("Título Scienti"));
    }

    #[test]
    fn test_select_title_prefers_language_within_source() {
        let titles = vec![
            title("Primer título", "es", "openalex"),
            title("First title", "en", "openalex"),
        ];
        assert_eq!(select_title(&titles, "en"), Some("First title"));
        assert_eq!(select_title(&titles, "es"), Some("Primer título"));
        assert_eq!(select_title(&titles, "pt"), Some("Primer título"));
    }

    #[test]
    fn test_select_title_skips_blank_titles() {
        let titles = vec![title("   ", "es", "scienti"), title(" Kept ", "en", "openalex")];
        assert_eq!(select_title(&titles, "es"), Some("Kept"));
        assert_eq!(select_title(&[], "es"), None);
    }

    #[test]
    fn test_select_type_hierarchy() {
        let types = vec![
            type_tag("openalex", "article", None),
            type_tag("scienti", "Publicado en revista especializada", Some(1)),
            type_tag("scienti", "Artículo de investigación", Some(2)),
        ];
        let selected = select_type(&types).unwrap();
        assert_eq!(selected.r#type, "Artículo de investigación");

        let types = vec![type_tag("crossref", "journal-article", None), type_tag("openalex", "article", None)];
        assert_eq!(select_type(&types).unwrap().r#type, "article");
        assert!(select_type(&[]).is_none());
    }

    #[test]
    fn test_select_name() {
        let names = vec![
            Name { name: "Universidad de Antioquia".into(), lang: Some("es".into()), source: None },
            Name { name: "University of Antioquia".into(), lang: Some("en".into()), source: None },
        ];
        assert_eq!(select_name(&names, "es"), Some("Universidad de Antioquia"));
        assert_eq!(select_name(&names, "fr"), Some("University of Antioquia"));
    }

    #[test]
    fn test_bson_numbers() {
        assert_eq!(bson_to_i64(&Bson::Int32(3)), Some(3));
        assert_eq!(bson_to_i64(&Bson::Double(4.9)), Some(4));
        assert_eq!(bson_to_i64(&Bson::String("12".into())), Some(12));
        assert_eq!(bson_to_i64(&Bson::Null), None);
        assert_eq!(bson_to_f64(&Bson::Int64(7)), Some(7.0));
    }
}
