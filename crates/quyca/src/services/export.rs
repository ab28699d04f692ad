//! Bulk export of research products.

use std::sync::Arc;

use crate::config::collections;
use crate::error::{ServiceResult, StoreError};
use crate::formatters::{compact_work, works_to_csv};
use crate::models::{ExportFormat, SortOrder, Target, Work, WorkFilters};
use crate::pipeline::PipelineBuilder;
use crate::store::Store;

/// Rendered export body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    pub content_type: &'static str,
    pub body: String,
}

/// Product exports.
#[derive(Clone)]
pub struct ExportService {
    store: Arc<dyn Store>,
}

impl ExportService {
    /// Create a new export service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Every work of the target matching the filters, most cited first.
    ///
    /// # Errors
    ///
    /// Returns error if the aggregation fails or the output cannot be rendered.
    pub async fn export(
        &self,
        target: &Target,
        filters: &WorkFilters,
        format: ExportFormat,
    ) -> ServiceResult<ExportOutput> {
        let pipeline = PipelineBuilder::for_target(target)
            .filters(filters)
            .with_citations()
            .sorted(SortOrder::CitationsDesc)
            .build();
        let docs = self.store.aggregate(collections::WORKS, pipeline).await?;
        let works: Vec<Work> = docs
            .into_iter()
            .map(bson::from_document)
            .collect::<Result<_, _>>()
            .map_err(StoreError::from)?;
        tracing::info!(kind = %target.kind, id = %target.id, works = works.len(), ?format, "Exporting products");

        Ok(match format {
            ExportFormat::Csv => ExportOutput { content_type: "text/csv; charset=utf-8", body: works_to_csv(&works)? },
            ExportFormat::Json => {
                let data: Vec<serde_json::Value> = works.iter().map(compact_work).collect();
                ExportOutput { content_type: "application/json", body: serde_json::to_string(&data)? }
            }
        })
    }
}
