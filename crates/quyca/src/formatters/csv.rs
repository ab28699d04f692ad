//! CSV export of research products.

use serde::Serialize;

use crate::config::DISPLAY_LANG;
use crate::error::{ServiceError, ServiceResult};
use crate::models::Work;

/// One exported row.
#[derive(Debug, Serialize)]
pub struct ProductRow<'a> {
    pub id: &'a str,
    pub title: &'a str,
    pub product_type: &'a str,
    pub year_published: Option<i32>,
    pub source: &'a str,
    pub citations_count: i64,
    pub doi: &'a str,
    pub open_access_status: &'a str,
    pub authors: String,
}

impl<'a> From<&'a Work> for ProductRow<'a> {
    fn from(work: &'a Work) -> Self {
        Self {
            id: &work.id,
            title: work.title(DISPLAY_LANG),
            product_type: work.product_type().map_or("", |t| t.r#type.as_str()),
            year_published: work.year_published,
            source: work.source_name().unwrap_or_default(),
            citations_count: work.citations(),
            doi: work.doi().unwrap_or_default(),
            open_access_status: work.open_access_status().unwrap_or_default(),
            authors: work.author_names(),
        }
    }
}

/// Render works as CSV with a header row.
///
/// # Errors
///
/// Returns error if a row cannot be written.
pub fn works_to_csv(works: &[Work]) -> ServiceResult<String> {
    let mut wtr = ::csv::Writer::from_writer(Vec::new());
    for work in works {
        wtr.serialize(ProductRow::from(work))?;
    }
    if works.is_empty() {
        wtr.write_record([
            "id",
            "title",
            "product_type",
            "year_published",
            "source",
            "citations_count",
            "doi",
            "open_access_status",
            "authors",
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| ServiceError::internal(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| ServiceError::internal(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Title, WorkAuthor};

    #[test]
    fn test_works_to_csv_quotes_fields() {
        let work = Work {
            id: "w1".into(),
            titles: vec![Title { title: "Malaria, dengue and \"zika\"".into(), lang: Some("en".into()), source: "openalex".into() }],
            year_published: Some(2021),
            authors: vec![
                WorkAuthor { id: "p1".into(), full_name: "Ana".into(), affiliations: vec![] },
                WorkAuthor { id: "p2".into(), full_name: "Luis".into(), affiliations: vec![] },
            ],
            ..Default::default()
        };

        let csv = works_to_csv(&[work]).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("id,title,product_type,year_published,source,citations_count,doi,open_access_status,authors")
        );
        assert_eq!(lines.next(), Some("w1,\"Malaria, dengue and \"\"zika\"\"\",,2021,,0,,,Ana; Luis"));
    }

    #[test]
    fn test_works_to_csv_empty_has_header() {
        let csv = works_to_csv(&[]).unwrap();
        assert!(csv.starts_with("id,title,"));
        assert_eq!(csv.lines().count(), 1);
    }
}
