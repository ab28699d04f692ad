//! Share-of-total breakdowns.

use bson::Document;
use serde_json::json;

use super::{OTHERS, Plot, PlotContext, UNKNOWN, decode_list, id_label, id_year};
use crate::config::limits;
use crate::error::ServiceResult;
use crate::models::{EntityKind, SourceRank, Target, WorkFilters, birth_year, quartile_at};
use crate::pipeline::plots as pipelines;
use crate::stats::{Share, percentages, top_n_with_rest};
use crate::store::DocExt;

/// Label for works whose source has no quartile for the publication year.
pub const NO_QUARTILE: &str = "no quartile";

fn label_counts(docs: &[Document]) -> Vec<(String, i64)> {
    docs.iter().map(|doc| (id_label(doc), doc.int("count"))).collect()
}

fn pie(shares: Vec<Share>) -> serde_json::Value {
    let total: i64 = shares.iter().map(|s| s.value).sum();
    json!({ "plot": shares, "total": total })
}

/// Normalize registered sex values to `male`, `female` or [`UNKNOWN`].
#[must_use]
pub fn sex_label(value: Option<&str>) -> &'static str {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        Some("hombre" | "male" | "m" | "masculino") => "male",
        Some("mujer" | "female" | "f" | "femenino") => "female",
        _ => UNKNOWN,
    }
}

/// Age bucket at publication time.
#[must_use]
pub fn age_bucket(birth_year: Option<i32>, publication_year: Option<i32>) -> &'static str {
    let (Some(born), Some(published)) = (birth_year, publication_year) else {
        return UNKNOWN;
    };
    match published - born {
        14..=26 => "14-26",
        27..=59 => "27-59",
        age if age >= 60 => "60+",
        _ => UNKNOWN,
    }
}

/// Works per level-0 subject.
pub struct SubjectPlot;

#[async_trait::async_trait]
impl Plot for SubjectPlot {
    fn name(&self) -> &'static str {
        "products_by_subject"
    }

    fn description(&self) -> &'static str {
        "Products by top-level subject"
    }

    fn supports(&self, _kind: EntityKind) -> bool {
        true
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let docs = ctx.works(pipelines::by_subject(target, filters)).await?;
        Ok(pie(top_n_with_rest(label_counts(&docs), limits::PIE_TOP, OTHERS)))
    }
}

/// Works per contributing database.
pub struct DatabasePlot;

#[async_trait::async_trait]
impl Plot for DatabasePlot {
    fn name(&self) -> &'static str {
        "products_by_database"
    }

    fn description(&self) -> &'static str {
        "Products by source database"
    }

    fn supports(&self, _kind: EntityKind) -> bool {
        true
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let docs = ctx.works(pipelines::by_database(target, filters)).await?;
        Ok(pie(percentages(label_counts(&docs))))
    }
}

/// Works per open access status.
pub struct OpenAccessPlot;

#[async_trait::async_trait]
impl Plot for OpenAccessPlot {
    fn name(&self) -> &'static str {
        "products_by_open_access"
    }

    fn description(&self) -> &'static str {
        "Products by open access status"
    }

    fn supports(&self, _kind: EntityKind) -> bool {
        true
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let docs = ctx.works(pipelines::by_open_access(target, filters)).await?;
        let counts = label_counts(&docs).into_iter().map(|(status, n)| (status.to_lowercase(), n));
        Ok(pie(percentages(counts)))
    }
}

/// Works per publisher.
pub struct PublisherPlot;

#[async_trait::async_trait]
impl Plot for PublisherPlot {
    fn name(&self) -> &'static str {
        "products_by_publisher"
    }

    fn description(&self) -> &'static str {
        "Products by publisher"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        kind != EntityKind::Source
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let docs = ctx.works(pipelines::by_publisher(target, filters)).await?;
        Ok(pie(top_n_with_rest(label_counts(&docs), limits::PIE_TOP, OTHERS)))
    }
}

/// Authorships of affiliation members by sex.
pub struct AuthorSexPlot;

#[async_trait::async_trait]
impl Plot for AuthorSexPlot {
    fn name(&self) -> &'static str {
        "products_by_author_sex"
    }

    fn description(&self) -> &'static str {
        "Authorships of members by sex"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        kind.is_affiliation()
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let docs = ctx.works(pipelines::by_author_sex(target, filters)).await?;
        let counts = docs.iter().map(|doc| (sex_label(doc.text("_id")).to_string(), doc.int("count")));
        Ok(pie(percentages(counts)))
    }
}

/// Authorships of affiliation members by age at publication.
pub struct AuthorAgePlot;

#[async_trait::async_trait]
impl Plot for AuthorAgePlot {
    fn name(&self) -> &'static str {
        "products_by_author_age"
    }

    fn description(&self) -> &'static str {
        "Authorships of members by age range at publication"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        kind.is_affiliation()
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let docs = ctx.works(pipelines::by_author_age(target, filters)).await?;
        let counts = docs.iter().map(|doc| {
            let born = doc.sub("_id").opt_int("birthdate").and_then(birth_year);
            (age_bucket(born, id_year(doc)).to_string(), doc.int("count"))
        });
        Ok(pie(percentages(counts)))
    }
}

/// Works per Scienti product category.
pub struct ScientiRankPlot;

#[async_trait::async_trait]
impl Plot for ScientiRankPlot {
    fn name(&self) -> &'static str {
        "products_by_scienti_rank"
    }

    fn description(&self) -> &'static str {
        "Products by Minciencias category"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        kind != EntityKind::Source
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let docs = ctx.works(pipelines::by_scienti_rank(target, filters)).await?;
        Ok(pie(percentages(label_counts(&docs))))
    }
}

/// Works by the quartile of their journal at publication time.
pub struct JournalRankPlot;

#[async_trait::async_trait]
impl Plot for JournalRankPlot {
    fn name(&self) -> &'static str {
        "products_by_journal_rank"
    }

    fn description(&self) -> &'static str {
        "Products by Scimago quartile of the journal in the publication year"
    }

    fn supports(&self, _kind: EntityKind) -> bool {
        true
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let docs = ctx.works(pipelines::by_journal_rank(target, filters)).await?;
        let counts = docs.iter().map(|doc| {
            let ranking: Vec<SourceRank> = decode_list(doc.list("ranking"));
            let label = id_year(doc)
                .and_then(|year| quartile_at(&ranking, year))
                .unwrap_or(NO_QUARTILE)
                .to_string();
            (label, doc.int("count"))
        });
        Ok(pie(percentages(counts)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sex_label() {
        assert_eq!(sex_label(Some("Hombre")), "male");
        assert_eq!(sex_label(Some("mujer ")), "female");
        assert_eq!(sex_label(Some("")), UNKNOWN);
        assert_eq!(sex_label(None), UNKNOWN);
    }

    #[test]
    fn test_age_bucket() {
        assert_eq!(age_bucket(Some(1990), Some(2010)), "14-26");
        assert_eq!(age_bucket(Some(1990), Some(2016)), "14-26");
        assert_eq!(age_bucket(Some(1990), Some(2017)), "27-59");
        assert_eq!(age_bucket(Some(1950), Some(2010)), "60+");
        assert_eq!(age_bucket(Some(2000), Some(2010)), UNKNOWN);
        assert_eq!(age_bucket(None, Some(2010)), UNKNOWN);
        assert_eq!(age_bucket(Some(1990), None), UNKNOWN);
    }
}
