//! One bar per sub-unit of an affiliation.
//!
//! Institutions break down into faculties, faculties into departments,
//! departments into research groups and groups into their member persons.

use std::cmp::Ordering;
use std::collections::HashMap;

use bson::Document;
use serde::Serialize;
use serde_json::json;

use super::{Bar, Plot, PlotContext, decode_list};
use crate::config::DISPLAY_LANG;
use crate::error::{ServiceError, ServiceResult};
use crate::models::common::bson_to_i64;
use crate::models::{EntityKind, Name, Target, WorkFilters, select_name};
use crate::pipeline::plots::{self as pipelines, UnitMetric};
use crate::stats::{h_index, round2};
use crate::store::DocExt;

/// Sub-units of a target with the aggregation rows computed for them.
struct UnitRows {
    kind: EntityKind,
    /// `(id, display name)` of every sub-unit.
    units: Vec<(String, String)>,
    rows: Vec<Document>,
}

async fn unit_rows(
    ctx: &PlotContext,
    plot: &str,
    target: &Target,
    filters: &WorkFilters,
    metric: UnitMetric,
) -> ServiceResult<UnitRows> {
    let kind = target
        .kind
        .child_kind()
        .ok_or_else(|| ServiceError::unsupported_plot(plot, target.kind.as_str()))?;

    let (collection, pipeline) = pipelines::children(target, kind);
    let children = ctx.store.aggregate(collection, pipeline).await?;
    let units: Vec<(String, String)> = children
        .iter()
        .filter_map(|doc| {
            let id = doc.id_string("_id")?;
            let name = match doc.text("full_name") {
                Some(name) => name.to_string(),
                None => {
                    let names: Vec<Name> = decode_list(doc.list("names"));
                    select_name(&names, DISPLAY_LANG).unwrap_or(id.as_str()).to_string()
                }
            };
            Some((id, name))
        })
        .collect();
    tracing::debug!(entity = %target.id, kind = %kind, units = units.len(), "Resolved sub-units");

    if units.is_empty() {
        return Ok(UnitRows { kind, units, rows: Vec::new() });
    }
    let ids: Vec<String> = units.iter().map(|(id, _)| id.clone()).collect();
    let rows = ctx.works(pipelines::by_unit(target, filters, kind, &ids, metric)).await?;
    Ok(UnitRows { kind, units, rows })
}

/// One bar per sub-unit, zero for units without data, largest first.
fn bars<T>(units: &[(String, String)], values: &HashMap<String, T>) -> Vec<Bar<T>>
where
    T: Copy + Default + PartialOrd + Serialize,
{
    let mut bars: Vec<Bar<T>> = units
        .iter()
        .map(|(id, name)| Bar { x: name.clone(), y: values.get(id).copied().unwrap_or_default() })
        .collect();
    bars.sort_by(|a, b| b.y.partial_cmp(&a.y).unwrap_or(Ordering::Equal).then_with(|| a.x.cmp(&b.x)));
    bars
}

fn render<T>(unit_rows: &UnitRows, values: &HashMap<String, T>) -> serde_json::Value
where
    T: Copy + Default + PartialOrd + Serialize,
{
    json!({ "plot": bars(&unit_rows.units, values), "unit_kind": unit_rows.kind })
}

fn supports_sub_units(kind: EntityKind) -> bool {
    kind.child_kind().is_some()
}

/// Products per sub-unit.
pub struct ProductsByAffiliationPlot;

#[async_trait::async_trait]
impl Plot for ProductsByAffiliationPlot {
    fn name(&self) -> &'static str {
        "products_by_affiliation"
    }

    fn description(&self) -> &'static str {
        "Products per faculty, department, group or member"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        supports_sub_units(kind)
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let unit_rows = unit_rows(ctx, self.name(), target, filters, UnitMetric::Products).await?;
        let values: HashMap<String, i64> = unit_rows
            .rows
            .iter()
            .filter_map(|doc| Some((doc.id_string("_id")?, doc.int("count"))))
            .collect();
        Ok(render(&unit_rows, &values))
    }
}

/// Citations per sub-unit.
pub struct CitationsByAffiliationPlot;

#[async_trait::async_trait]
impl Plot for CitationsByAffiliationPlot {
    fn name(&self) -> &'static str {
        "citations_by_affiliation"
    }

    fn description(&self) -> &'static str {
        "Citations per faculty, department, group or member"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        supports_sub_units(kind)
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let unit_rows = unit_rows(ctx, self.name(), target, filters, UnitMetric::Citations).await?;
        let values: HashMap<String, i64> = unit_rows
            .rows
            .iter()
            .filter_map(|doc| Some((doc.id_string("_id")?, doc.int("citations"))))
            .collect();
        Ok(render(&unit_rows, &values))
    }
}

/// Inflation-adjusted APC expenses per sub-unit.
pub struct ApcByAffiliationPlot;

#[async_trait::async_trait]
impl Plot for ApcByAffiliationPlot {
    fn name(&self) -> &'static str {
        "apc_by_affiliation"
    }

    fn description(&self) -> &'static str {
        "APC expenses (USD) per faculty, department, group or member"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        supports_sub_units(kind)
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let unit_rows = unit_rows(ctx, self.name(), target, filters, UnitMetric::Apc).await?;
        let mut values: HashMap<String, f64> = HashMap::new();
        for doc in &unit_rows.rows {
            let key = doc.sub("_id");
            let Some(unit) = key.id_string("unit") else { continue };
            let charges = doc.float("charges");
            if charges <= 0.0 {
                continue;
            }
            let year = key.opt_int("year").and_then(|y| i32::try_from(y).ok());
            let currency = key.text("currency").unwrap_or_default();
            if let Some(usd) = ctx.currency.normalize(charges, currency, year) {
                *values.entry(unit).or_insert(0.0) += usd;
            }
        }
        for value in values.values_mut() {
            *value = round2(*value);
        }

        let mut result = render(&unit_rows, &values);
        result["currency"] = json!("USD");
        result["reference_year"] = json!(ctx.currency.target_year());
        Ok(result)
    }
}

/// h-index per sub-unit.
pub struct HIndexByAffiliationPlot;

#[async_trait::async_trait]
impl Plot for HIndexByAffiliationPlot {
    fn name(&self) -> &'static str {
        "h_by_affiliation"
    }

    fn description(&self) -> &'static str {
        "h-index per faculty, department, group or member"
    }

    fn supports(&self, kind: EntityKind) -> bool {
        supports_sub_units(kind)
    }

    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value> {
        let unit_rows = unit_rows(ctx, self.name(), target, filters, UnitMetric::HIndex).await?;
        let values: HashMap<String, usize> = unit_rows
            .rows
            .iter()
            .filter_map(|doc| {
                let citations: Vec<i64> = doc
                    .list("citations")
                    .iter()
                    .map(|c| bson_to_i64(c).unwrap_or(0))
                    .collect();
                Some((doc.id_string("_id")?, h_index(&citations)))
            })
            .collect();
        Ok(render(&unit_rows, &values))
    }
}
