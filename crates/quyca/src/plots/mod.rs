//! Dashboard plots.
//!
//! Plots are organized by category:
//! - **Annual**: per-year series (types, citations, APC, open access, publishers, h-index)
//! - **Distribution**: share-of-total breakdowns
//! - **Affiliations**: one bar per sub-unit of an affiliation
//! - **Collaboration**: co-authorship maps and networks

mod affiliations;
mod annual;
mod collaboration;
mod distribution;

pub use affiliations::*;
pub use annual::*;
pub use collaboration::*;
pub use distribution::*;

use std::sync::Arc;

use bson::{Bson, Document};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::{Config, collections};
use crate::error::ServiceResult;
use crate::models::{EntityKind, Target, WorkFilters};
use crate::stats::CurrencyConverter;
use crate::store::{DocExt, Store};

/// Label for rows whose grouping key is missing.
pub const UNKNOWN: &str = "unknown";

/// Label for the folded remainder of a pie.
pub const OTHERS: &str = "Others";

/// Everything a plot needs to run.
#[derive(Clone)]
pub struct PlotContext {
    /// Document store.
    pub store: Arc<dyn Store>,
    /// APC normalization tables.
    pub currency: Arc<CurrencyConverter>,
    /// Service configuration.
    pub config: Arc<Config>,
}

impl PlotContext {
    /// Create a new plot context.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, currency: CurrencyConverter, config: Config) -> Self {
        Self { store, currency: Arc::new(currency), config: Arc::new(config) }
    }

    /// Run a pipeline over the works collection.
    pub async fn works(&self, pipeline: Vec<Document>) -> ServiceResult<Vec<Document>> {
        Ok(self.store.aggregate(collections::WORKS, pipeline).await?)
    }
}

impl std::fmt::Debug for PlotContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotContext").field("config", &self.config).finish_non_exhaustive()
    }
}

/// Trait for all dashboard plots.
#[async_trait::async_trait]
pub trait Plot: Send + Sync {
    /// Plot name as requested in the `plot` query parameter.
    fn name(&self) -> &'static str;

    /// Human-readable description.
    fn description(&self) -> &'static str;

    /// Whether the plot can be computed for this kind of entity.
    fn supports(&self, kind: EntityKind) -> bool;

    /// Compute the plot.
    async fn execute(
        &self,
        ctx: &PlotContext,
        target: &Target,
        filters: &WorkFilters,
    ) -> ServiceResult<serde_json::Value>;
}

/// Register all available plots.
#[must_use]
pub fn register_all_plots() -> Vec<Box<dyn Plot>> {
    vec![
        // Annual
        Box::new(YearTypePlot),
        Box::new(YearCitationsPlot),
        Box::new(YearApcPlot),
        Box::new(YearOpenAccessPlot),
        Box::new(YearPublisherPlot),
        Box::new(YearHIndexPlot),
        // Distribution
        Box::new(SubjectPlot),
        Box::new(DatabasePlot),
        Box::new(OpenAccessPlot),
        Box::new(PublisherPlot),
        Box::new(AuthorSexPlot),
        Box::new(AuthorAgePlot),
        Box::new(ScientiRankPlot),
        Box::new(JournalRankPlot),
        // Affiliations
        Box::new(ProductsByAffiliationPlot),
        Box::new(CitationsByAffiliationPlot),
        Box::new(ApcByAffiliationPlot),
        Box::new(HIndexByAffiliationPlot),
        // Collaboration
        Box::new(WorldMapPlot),
        Box::new(CityMapPlot),
        Box::new(NetworkPlot),
    ]
}

/// Point of a per-year series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearPoint<T> {
    pub x: i32,
    pub y: T,
    /// Series the point belongs to, for stacked plots.
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub series: Option<String>,
}

/// Bar of a per-name plot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bar<T> {
    pub x: String,
    pub y: T,
}

/// Year stored under `_id.year`.
pub(crate) fn id_year(doc: &Document) -> Option<i32> {
    doc.sub("_id").opt_int("year").and_then(|y| i32::try_from(y).ok())
}

/// Key grouped under `_id`, or [`UNKNOWN`].
pub(crate) fn id_label(doc: &Document) -> String {
    doc.text("_id").unwrap_or(UNKNOWN).to_string()
}

/// Decode an embedded array, skipping it when malformed.
pub(crate) fn decode_list<T: DeserializeOwned>(items: &[Bson]) -> Vec<T> {
    bson::from_bson(Bson::Array(items.to_vec())).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Skipping malformed embedded list");
        Vec::new()
    })
}
