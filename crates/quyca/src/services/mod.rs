//! Request-level operations on top of the store, pipelines and plots.

mod entities;
mod export;
mod plots;
mod products;
mod search;

pub use entities::{EntityService, Indicators};
pub use export::{ExportOutput, ExportService};
pub use plots::PlotService;
pub use products::{ProductsService, ResultPage};
pub use search::SearchService;

use std::sync::Arc;

use bson::doc;
use moka::future::Cache;

use crate::config::Config;
use crate::error::{ServiceError, ServiceResult, StoreError};
use crate::models::{Affiliation, EntityKind, Resource, Target};
use crate::stats::CurrencyConverter;
use crate::store::{Store, get_by_id, id_value};

/// Cached JSON results keyed by md5 digest.
pub(crate) type ResultCache = Cache<String, serde_json::Value>;

/// Build a result cache, or `None` when caching is disabled.
pub(crate) fn build_cache(config: &Config) -> Option<ResultCache> {
    config.caching_enabled().then(|| {
        Cache::builder()
            .max_capacity(config.cache_max_size)
            .time_to_live(config.cache_ttl)
            .build()
    })
}

/// Generate a cache key from its parts.
pub(crate) fn cache_key(parts: &[&str]) -> String {
    use md5::{Digest, Md5};

    let mut hasher = Md5::new();
    for part in parts {
        hasher.update(part.as_bytes());
        hasher.update(b"|");
    }
    format!("{:x}", hasher.finalize())
}

/// Resolve the entity whose research products a request addresses.
///
/// Affiliations are classified from their type tags; persons and sources
/// only need to exist.
///
/// # Errors
///
/// Returns a validation error for resources without products and a not
/// found error when the document does not exist.
pub async fn resolve_target(store: &dyn Store, resource: Resource, id: &str) -> ServiceResult<Target> {
    let kind = match resource {
        Resource::Affiliation => {
            let affiliation: Affiliation = get_by_id(store, resource.collection(), id).await?;
            affiliation.kind()
        }
        Resource::Person | Resource::Source => {
            if id.trim().is_empty() {
                return Err(StoreError::InvalidId(id.to_string()).into());
            }
            let exists = store
                .find_one(resource.collection(), doc! { "_id": id_value(id) })
                .await?
                .is_some();
            if !exists {
                return Err(StoreError::not_found(resource.collection(), id).into());
            }
            if resource == Resource::Person { EntityKind::Person } else { EntityKind::Source }
        }
        Resource::Work | Resource::Patent | Resource::Project => {
            return Err(ServiceError::validation(
                "entity",
                format!("{} records have no research products", resource.collection()),
            ));
        }
    };
    Ok(Target::new(kind, id))
}

/// All services sharing one store.
#[derive(Clone)]
pub struct Services {
    pub store: Arc<dyn Store>,
    pub entities: EntityService,
    pub products: ProductsService,
    pub export: ExportService,
    pub search: SearchService,
    pub plots: PlotService,
}

impl Services {
    /// Wire every service to the store.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: Config, currency: CurrencyConverter) -> Self {
        Self {
            entities: EntityService::new(Arc::clone(&store), &config),
            products: ProductsService::new(Arc::clone(&store)),
            export: ExportService::new(Arc::clone(&store)),
            search: SearchService::new(Arc::clone(&store)),
            plots: PlotService::new(Arc::clone(&store), config, currency),
            store,
        }
    }

    /// Resolve a request target against the store.
    ///
    /// # Errors
    ///
    /// See [`resolve_target`].
    pub async fn target(&self, resource: Resource, id: &str) -> ServiceResult<Target> {
        resolve_target(self.store.as_ref(), resource, id).await
    }
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services").field("plots", &self.plots).finish_non_exhaustive()
    }
}
