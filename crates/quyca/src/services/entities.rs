//! Entity summaries with headline indicators.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::{ResultCache, build_cache, cache_key};
use crate::config::{Config, collections};
use crate::error::ServiceResult;
use crate::formatters;
use crate::models::common::bson_to_i64;
use crate::models::{Affiliation, CatalogItem, EntityKind, Person, Resource, Source, Target, Work};
use crate::pipeline::plots::indicators;
use crate::stats::h_index;
use crate::store::{DocExt, Store, get_by_id};

/// Headline numbers of an entity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Indicators {
    pub products_count: i64,
    /// Sum of the per-work citation counts.
    pub citations_count: i64,
    pub h_index: usize,
}

/// Entity lookups.
#[derive(Clone)]
pub struct EntityService {
    store: Arc<dyn Store>,
    cache: Option<ResultCache>,
}

impl EntityService {
    /// Create a new entity service.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: &Config) -> Self {
        Self { store, cache: build_cache(config) }
    }

    /// Summary of one record, with indicators for entities that own products.
    ///
    /// # Errors
    ///
    /// Returns error if the record does not exist or the store fails.
    pub async fn info(&self, resource: Resource, id: &str) -> ServiceResult<Value> {
        let store = self.store.as_ref();
        let collection = resource.collection();

        let (mut summary, target) = match resource {
            Resource::Affiliation => {
                let affiliation: Affiliation = get_by_id(store, collection, id).await?;
                let target = Target::new(affiliation.kind(), &affiliation.id);
                (formatters::compact_affiliation(&affiliation), Some(target))
            }
            Resource::Person => {
                let person: Person = get_by_id(store, collection, id).await?;
                let target = Target::new(EntityKind::Person, &person.id);
                (formatters::compact_person(&person), Some(target))
            }
            Resource::Source => {
                let source: Source = get_by_id(store, collection, id).await?;
                let target = Target::new(EntityKind::Source, &source.id);
                (formatters::compact_source(&source), Some(target))
            }
            Resource::Work => {
                let work: Work = get_by_id(store, collection, id).await?;
                (formatters::compact_work(&work), None)
            }
            Resource::Patent | Resource::Project => {
                let item: CatalogItem = get_by_id(store, collection, id).await?;
                (formatters::compact_catalog_item(&item), None)
            }
        };

        if let Some(target) = target {
            let indicators = self.indicators(&target).await?;
            summary["products_count"] = json!(indicators.products_count);
            summary["citations_count"] = json!(indicators.citations_count);
            summary["h_index"] = json!(indicators.h_index);
        }

        Ok(json!({ "data": summary }))
    }

    /// Product count, citation count and h-index of a target.
    ///
    /// # Errors
    ///
    /// Returns error if the aggregation fails.
    pub async fn indicators(&self, target: &Target) -> ServiceResult<Indicators> {
        let key = cache_key(&["indicators", target.kind.as_str(), &target.id]);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&key).await {
                if let Ok(indicators) = serde_json::from_value::<Indicators>(cached) {
                    return Ok(indicators);
                }
            }
        }

        let rows = self.store.aggregate(collections::WORKS, indicators(target)).await?;
        let result = rows.first().map_or_else(Indicators::default, |row| {
            let citations: Vec<i64> = row
                .list("citations")
                .iter()
                .map(|c| bson_to_i64(c).unwrap_or(0))
                .collect();
            Indicators {
                products_count: row.int("products"),
                citations_count: row.int("citations_sum"),
                h_index: h_index(&citations),
            }
        });
        tracing::debug!(kind = %target.kind, id = %target.id, products = result.products_count, "Computed indicators");

        if let Some(cache) = &self.cache {
            cache.insert(key, serde_json::to_value(result)?).await;
        }
        Ok(result)
    }
}
