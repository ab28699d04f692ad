//! Full-text search over the KAHI collections.

use std::sync::Arc;

use bson::{Document, doc};
use serde_json::Value;

use super::ResultPage;
use crate::error::{ServiceError, ServiceResult, StoreError};
use crate::formatters;
use crate::models::{Affiliation, CatalogItem, EntityKind, Pagination, Person, Resource, Source, Work};
use crate::pipeline::plots::{SUB_UNIT_TYPES, type_pattern};
use crate::pipeline::{text_search, text_search_count};
use crate::store::{DocExt, Store};

/// Keyword search.
#[derive(Clone)]
pub struct SearchService {
    store: Arc<dyn Store>,
}

fn summarize(resource: Resource, doc: Document) -> Result<Value, StoreError> {
    Ok(match resource {
        Resource::Affiliation => formatters::compact_affiliation(&bson::from_document::<Affiliation>(doc)?),
        Resource::Person => formatters::compact_person(&bson::from_document::<Person>(doc)?),
        Resource::Source => formatters::compact_source(&bson::from_document::<Source>(doc)?),
        Resource::Work => formatters::compact_work(&bson::from_document::<Work>(doc)?),
        Resource::Patent | Resource::Project => {
            formatters::compact_catalog_item(&bson::from_document::<CatalogItem>(doc)?)
        }
    })
}

/// Narrow an affiliation search to one kind.
fn kind_filter(resource: Resource, kind: EntityKind) -> ServiceResult<Document> {
    if resource != Resource::Affiliation || !kind.is_affiliation() {
        return Err(ServiceError::validation(
            "type",
            format!("cannot narrow {} searches to {kind}", resource.collection()),
        ));
    }
    Ok(if kind == EntityKind::Institution {
        doc! { "types.type": { "$not": type_pattern(SUB_UNIT_TYPES) } }
    } else {
        doc! { "types.type": type_pattern(&[kind.as_str()]) }
    })
}

impl SearchService {
    /// Create a new search service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Records matching the keywords, best matches first.
    ///
    /// # Errors
    ///
    /// Returns a validation error for empty keywords or an invalid kind.
    pub async fn search(
        &self,
        resource: Resource,
        keywords: &str,
        kind: Option<EntityKind>,
        pagination: &Pagination,
    ) -> ServiceResult<ResultPage> {
        let keywords = keywords.trim();
        if keywords.is_empty() {
            return Err(ServiceError::validation("keywords", "must not be empty"));
        }
        let extra = kind.map(|k| kind_filter(resource, k)).transpose()?;

        let collection = resource.collection();
        let docs = self
            .store
            .aggregate(collection, text_search(keywords, extra.clone(), pagination))
            .await?;
        let total_results = self
            .store
            .aggregate(collection, text_search_count(keywords, extra))
            .await?
            .first()
            .map_or(0, |row| row.int("total"));
        tracing::debug!(collection, keywords, total_results, "Search finished");

        let data = docs
            .into_iter()
            .map(|doc| summarize(resource, doc))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(ResultPage { count: data.len(), data, total_results, page: pagination.page })
    }
}
