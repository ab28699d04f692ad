//! Router and request handlers.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::{Value, json};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use super::ApiError;
use crate::error::ServiceError;
use crate::models::{EntityKind, ExportFormat, ProductsParams, Resource, SearchParams};
use crate::services::Services;

type AppState = Arc<Services>;
type ApiResult<T> = Result<T, ApiError>;

/// Create the HTTP router.
pub fn create_router(services: Services) -> Router {
    let state: AppState = Arc::new(services);

    Router::new()
        .route("/", get(health_check))
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/plots/{kind}", get(list_plots))
        .route("/app/search/{entity}", get(search))
        .route("/app/{entity}/{id}", get(entity_info))
        .route("/app/{entity}/{id}/research/products", get(research_products))
        .route("/app/{entity}/{id}/research/products/{format}", get(export_products))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn parse_resource(entity: &str) -> ApiResult<Resource> {
    Ok(entity.parse().map_err(|e: String| ServiceError::validation("entity", e))?)
}

fn parse_kind(value: &str) -> ApiResult<EntityKind> {
    Ok(value.parse().map_err(|e: String| ServiceError::validation("type", e))?)
}

async fn health_check() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "quyca",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

async fn readiness_check(State(services): State<AppState>) -> impl IntoResponse {
    match services.store.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "status": "ready",
                "service": "quyca",
                "version": env!("CARGO_PKG_VERSION")
            })),
        ),
        Err(err) => {
            tracing::warn!(error = %err, "Readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "status": "unavailable",
                    "service": "quyca",
                    "version": env!("CARGO_PKG_VERSION")
                })),
            )
        }
    }
}

/// Plots available for an entity kind.
async fn list_plots(
    State(services): State<AppState>,
    Path(kind): Path<String>,
) -> ApiResult<Json<Value>> {
    let kind = parse_kind(&kind)?;
    let plots: Vec<Value> = services
        .plots
        .list_plots(kind)
        .into_iter()
        .map(|(name, description)| json!({ "name": name, "description": description }))
        .collect();
    Ok(Json(json!({ "kind": kind, "plots": plots })))
}

async fn entity_info(
    State(services): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let resource = parse_resource(&entity)?;
    Ok(Json(services.entities.info(resource, &id).await?))
}

/// A plot when `plot=` is given, otherwise a page of products.
async fn research_products(
    State(services): State<AppState>,
    Path((entity, id)): Path<(String, String)>,
    Query(params): Query<ProductsParams>,
) -> ApiResult<Json<Value>> {
    let resource = parse_resource(&entity)?;
    let filters = params.filters()?;
    let plot = params.plot.as_deref().map(str::trim).filter(|p| !p.is_empty());

    let target = services.target(resource, &id).await?;

    let value = match plot {
        Some(plot) => services.plots.plot(&target, plot, &filters).await?,
        None => {
            let page = services.products.list(&target, &filters, &params.pagination()?).await?;
            serde_json::to_value(page).map_err(ServiceError::from)?
        }
    };
    Ok(Json(value))
}

async fn export_products(
    State(services): State<AppState>,
    Path((entity, id, format)): Path<(String, String, String)>,
    Query(params): Query<ProductsParams>,
) -> ApiResult<Response> {
    let resource = parse_resource(&entity)?;
    let format: ExportFormat =
        format.parse().map_err(|e: String| ServiceError::validation("format", e))?;
    let filters = params.filters()?;

    let target = services.target(resource, &id).await?;
    let output = services.export.export(&target, &filters, format).await?;

    let extension = match format {
        ExportFormat::Csv => "csv",
        ExportFormat::Json => "json",
    };
    let disposition = format!("attachment; filename=\"products.{extension}\"");
    Ok((
        [
            (header::CONTENT_TYPE, output.content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        output.body,
    )
        .into_response())
}

async fn search(
    State(services): State<AppState>,
    Path(entity): Path<String>,
    Query(params): Query<SearchParams>,
) -> ApiResult<Json<Value>> {
    let resource = parse_resource(&entity)?;
    let kind = params
        .kind
        .as_deref()
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(parse_kind)
        .transpose()?;
    let pagination = params.pagination()?;
    let keywords = params.keywords.as_deref().unwrap_or_default();

    let page = services.search.search(resource, keywords, kind, &pagination).await?;
    Ok(Json(serde_json::to_value(page).map_err(ServiceError::from)?))
}
