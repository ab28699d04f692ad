//! Paginated research product listings.

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::config::collections;
use crate::error::{ServiceResult, StoreError};
use crate::formatters::compact_work;
use crate::models::{Pagination, Target, Work, WorkFilters};
use crate::pipeline::PipelineBuilder;
use crate::store::{DocExt, Store};

/// One page of results.
#[derive(Debug, Clone, Serialize)]
pub struct ResultPage {
    pub data: Vec<Value>,
    /// Matches across all pages.
    pub total_results: i64,
    /// Results on this page.
    pub count: usize,
    pub page: i64,
}

/// Product listings.
#[derive(Clone)]
pub struct ProductsService {
    store: Arc<dyn Store>,
}

impl ProductsService {
    /// Create a new products service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// List the target's works, sorted and paginated.
    ///
    /// # Errors
    ///
    /// Returns error if an aggregation fails or a work cannot be decoded.
    pub async fn list(
        &self,
        target: &Target,
        filters: &WorkFilters,
        pagination: &Pagination,
    ) -> ServiceResult<ResultPage> {
        let pipeline = PipelineBuilder::for_target(target)
            .filters(filters)
            .with_citations()
            .paginated(pagination)
            .build();
        let docs = self.store.aggregate(collections::WORKS, pipeline).await?;
        let total_results = self.count(target, filters).await?;

        let works: Vec<Work> = docs
            .into_iter()
            .map(bson::from_document)
            .collect::<Result<_, _>>()
            .map_err(StoreError::from)?;
        let data: Vec<Value> = works.iter().map(compact_work).collect();

        Ok(ResultPage { count: data.len(), data, total_results, page: pagination.page })
    }

    /// Number of works matching the filters.
    ///
    /// # Errors
    ///
    /// Returns error if the aggregation fails.
    pub async fn count(&self, target: &Target, filters: &WorkFilters) -> ServiceResult<i64> {
        let pipeline = PipelineBuilder::for_target(target).filters(filters).count();
        let rows = self.store.aggregate(collections::WORKS, pipeline).await?;
        Ok(rows.first().map_or(0, |row| row.int("total")))
    }
}
