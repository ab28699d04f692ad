//! Plot dispatch with result caching.

use std::sync::Arc;

use serde_json::Value;

use super::{ResultCache, build_cache, cache_key};
use crate::config::Config;
use crate::error::{ServiceError, ServiceResult};
use crate::models::{EntityKind, Target, WorkFilters};
use crate::plots::{self, Plot, PlotContext};
use crate::stats::CurrencyConverter;
use crate::store::Store;

/// Runs plots by name.
#[derive(Clone)]
pub struct PlotService {
    ctx: PlotContext,
    plots: Arc<Vec<Box<dyn Plot>>>,
    cache: Option<ResultCache>,
}

impl PlotService {
    /// Create a plot service with every registered plot.
    #[must_use]
    pub fn new(store: Arc<dyn Store>, config: Config, currency: CurrencyConverter) -> Self {
        let cache = build_cache(&config);
        Self {
            ctx: PlotContext::new(store, currency, config),
            plots: Arc::new(plots::register_all_plots()),
            cache,
        }
    }

    /// Get plot by name.
    #[must_use]
    pub fn get_plot(&self, name: &str) -> Option<&dyn Plot> {
        self.plots.iter().find(|p| p.name() == name).map(|p| p.as_ref())
    }

    /// Names and descriptions of the plots available for a kind.
    #[must_use]
    pub fn list_plots(&self, kind: EntityKind) -> Vec<(&'static str, &'static str)> {
        self.plots
            .iter()
            .filter(|p| p.supports(kind))
            .map(|p| (p.name(), p.description()))
            .collect()
    }

    /// Compute a plot for the target.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedPlot` for unknown plots or plots that do not apply
    /// to the target kind, and store errors from the computation.
    pub async fn plot(&self, target: &Target, name: &str, filters: &WorkFilters) -> ServiceResult<Value> {
        let plot = self
            .get_plot(name)
            .filter(|p| p.supports(target.kind))
            .ok_or_else(|| ServiceError::unsupported_plot(name, target.kind.as_str()))?;

        let key = cache_key(&[target.kind.as_str(), &target.id, name, &filters.cache_fragment()]);
        if let Some(cache) = &self.cache {
            if let Some(cached) = cache.get(&key).await {
                tracing::debug!(plot = name, id = %target.id, "Plot cache hit");
                return Ok(cached);
            }
        }

        tracing::info!(plot = name, kind = %target.kind, id = %target.id, "Computing plot");
        let result = plot.execute(&self.ctx, target, filters).await?;

        if let Some(cache) = &self.cache {
            cache.insert(key, result.clone()).await;
        }
        Ok(result)
    }
}

impl std::fmt::Debug for PlotService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotService")
            .field("plots", &self.plots.len())
            .field("cached", &self.cache.is_some())
            .finish()
    }
}
