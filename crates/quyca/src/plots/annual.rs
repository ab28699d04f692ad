//! Per-year series.

use std::collections::{BTreeMap, HashMap};

use serde_json::json;

use super::{Plot, PlotContext, UNKNOWN, YearPoint, decode_list, id_year};
use crate::config::limits;
use crate::error::ServiceResult;
use crate::models::{EntityKind, Target, TypeTag, WorkFilters, select_type};
use crate::pipeline::plots as pipelines;
use crate::stats::{CitationRecord, h_index_by_year, round2};
use crate::store::DocExt;

fn stacked<T: Copy>(series: &BTreeMap<(i32, String), T>) -> Vec<YearPoint<T>> {
    series
        .iter()
        .map(|((year, label), value)| YearPoint { x: *year, y: *value, series: Some(label.clone()) })
        .collect()
}

/// Works per year, stacked by product type.
pub struct YearTypePlot;

#[async_trait::async_trait]
impl Plot for YearTypePlot {
    fn name(&self) -> &'static str {
        "year_type"
    }

    fn description(&self) -> &'static str {
        "Products per year by product type"
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
        let docs = ctx.works(pipelines::year_type(target, filters)).await?;

        let mut series: BTreeMap<(i32, String), i64> = BTreeMap::new();
        for doc in &docs {
            let Some(year) = id_year(doc) else { continue };
            let types: Vec<TypeTag> = decode_list(doc.sub("_id").list("types"));
            let label = select_type(&types).map_or(UNKNOWN, |t| t.r#type.as_str()).to_string();
            *series.entry((year, label)).or_insert(0) += doc.int("count");
        }

        Ok(json!({ "plot": stacked(&series) }))
    }
}

/// Citations received per year.
pub struct YearCitationsPlot;

#[async_trait::async_trait]
impl Plot for YearCitationsPlot {
    fn name(&self) -> &'static str {
        "year_citations"
    }

    fn description(&self) -> &'static str {
        "Citations received per year"
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
        let docs = ctx.works(pipelines::year_citations(target, filters)).await?;

        let points: Vec<YearPoint<i64>> = docs
            .iter()
            .filter_map(|doc| {
                let year = i32::try_from(doc.opt_int("_id")?).ok()?;
                Some(YearPoint { x: year, y: doc.int("citations"), series: None })
            })
            .collect();
        let total: i64 = points.iter().map(|p| p.y).sum();

        Ok(json!({ "plot": points, "total": total }))
    }
}

/// Article processing charges paid per year, in USD of the configured year.
pub struct YearApcPlot;

#[async_trait::async_trait]
impl Plot for YearApcPlot {
    fn name(&self) -> &'static str {
        "year_apc"
    }

    fn description(&self) -> &'static str {
        "Inflation-adjusted APC expenses per year (USD)"
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
        let docs = ctx.works(pipelines::year_apc(target, filters)).await?;

        let mut by_year: BTreeMap<i32, f64> = BTreeMap::new();
        for doc in &docs {
            let Some(year) = id_year(doc) else { continue };
            let currency = doc.sub("_id").text("currency").unwrap_or_default().to_string();
            if let Some(usd) = ctx.currency.normalize(doc.float("charges"), &currency, Some(year)) {
                *by_year.entry(year).or_insert(0.0) += usd;
            }
        }

        let points: Vec<YearPoint<f64>> = by_year
            .into_iter()
            .map(|(year, usd)| YearPoint { x: year, y: round2(usd), series: None })
            .collect();
        let total = round2(points.iter().map(|p| p.y).sum());

        Ok(json!({
            "plot": points,
            "total": total,
            "currency": "USD",
            "reference_year": ctx.currency.target_year(),
        }))
    }
}

/// Works per year, stacked by open access status.
pub struct YearOpenAccessPlot;

#[async_trait::async_trait]
impl Plot for YearOpenAccessPlot {
    fn name(&self) -> &'static str {
        "year_oa"
    }

    fn description(&self) -> &'static str {
        "Products per year by open access status"
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
        let docs = ctx.works(pipelines::year_open_access(target, filters)).await?;

        let mut series: BTreeMap<(i32, String), i64> = BTreeMap::new();
        for doc in &docs {
            let Some(year) = id_year(doc) else { continue };
            let status = doc.sub("_id").text("status").unwrap_or(UNKNOWN).to_lowercase();
            *series.entry((year, status)).or_insert(0) += doc.int("count");
        }

        Ok(json!({ "plot": stacked(&series) }))
    }
}

/// Works per year for the most frequent publishers.
pub struct YearPublisherPlot;

#[async_trait::async_trait]
impl Plot for YearPublisherPlot {
    fn name(&self) -> &'static str {
        "year_publisher"
    }

    fn description(&self) -> &'static str {
        "Products per year for the top publishers"
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
        let docs = ctx.works(pipelines::year_publisher(target, filters)).await?;

        let rows: Vec<(i32, String, i64)> = docs
            .iter()
            .filter_map(|doc| {
                let year = id_year(doc)?;
                let publisher = doc.sub("_id").text("publisher")?.to_string();
                Some((year, publisher, doc.int("count")))
            })
            .collect();

        let mut totals: HashMap<&str, i64> = HashMap::new();
        for (_, publisher, count) in &rows {
            *totals.entry(publisher.as_str()).or_insert(0) += count;
        }
        let mut ranked: Vec<(&str, i64)> = totals.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        let top: Vec<&str> = ranked.into_iter().take(limits::TOP_PUBLISHERS).map(|(p, _)| p).collect();

        let mut series: BTreeMap<(i32, String), i64> = BTreeMap::new();
        for (year, publisher, count) in &rows {
            if top.contains(&publisher.as_str()) {
                *series.entry((*year, publisher.clone())).or_insert(0) += count;
            }
        }

        Ok(json!({ "plot": stacked(&series), "publishers": top }))
    }
}

/// Cumulative h-index at the end of each year.
pub struct YearHIndexPlot;

#[async_trait::async_trait]
impl Plot for YearHIndexPlot {
    fn name(&self) -> &'static str {
        "year_h"
    }

    fn description(&self) -> &'static str {
        "Cumulative h-index per year"
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
        let docs = ctx.works(pipelines::citation_history(target, filters)).await?;

        let records: Vec<CitationRecord> = docs
            .iter()
            .map(|doc| CitationRecord {
                year_published: doc.opt_int("year_published").and_then(|y| i32::try_from(y).ok()),
                citations_by_year: doc
                    .list("citations_by_year")
                    .iter()
                    .filter_map(|entry| {
                        let entry = entry.as_document()?;
                        let year = i32::try_from(entry.opt_int("year")?).ok()?;
                        Some((year, entry.int("cited_by_count")))
                    })
                    .collect(),
            })
            .collect();

        let points: Vec<YearPoint<usize>> = h_index_by_year(&records)
            .into_iter()
            .map(|(year, h)| YearPoint { x: year, y: h, series: None })
            .collect();
        let current = points.last().map_or(0, |p| p.y);

        Ok(json!({ "plot": points, "h_index": current }))
    }
}
