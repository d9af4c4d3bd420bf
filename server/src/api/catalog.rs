use crate::api::{error_response, store_error_response, ErrorResponse};
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use larder_core::catalog::CatalogSnapshot;
use larder_core::store::{load_catalog, CatalogLoadError};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Returns the router for /api/catalog endpoints
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/catalog", get(get_catalog))
        .route("/api/catalog/reload", post(reload_catalog))
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CatalogSummary {
    pub ingredients: usize,
    pub cuisines: usize,
    pub templates: usize,
    pub loaded_at: DateTime<Utc>,
}

impl From<&CatalogSnapshot> for CatalogSummary {
    fn from(snapshot: &CatalogSnapshot) -> Self {
        Self {
            ingredients: snapshot.ingredients().len(),
            cuisines: snapshot.cuisines().len(),
            templates: snapshot.template_count(),
            loaded_at: snapshot.loaded_at(),
        }
    }
}

/// Summary of the catalog snapshot the generator is using
#[utoipa::path(
    get,
    path = "/api/catalog",
    tag = "catalog",
    responses(
        (status = 200, description = "Live catalog summary", body = CatalogSummary)
    )
)]
pub async fn get_catalog(State(state): State<AppState>) -> impl IntoResponse {
    let snapshot = state.synthesizer.catalog().load();
    Json(CatalogSummary::from(snapshot.as_ref()))
}

/// Rebuild the catalog from the store and swap it in
///
/// Requests already running keep the snapshot they started with. On a validation
/// failure the previous snapshot stays live.
#[utoipa::path(
    post,
    path = "/api/catalog/reload",
    tag = "catalog",
    responses(
        (status = 200, description = "New catalog is live", body = CatalogSummary),
        (status = 422, description = "Stored catalog failed validation; old catalog kept", body = ErrorResponse),
        (status = 503, description = "Document store unavailable", body = ErrorResponse)
    )
)]
pub async fn reload_catalog(State(state): State<AppState>) -> impl IntoResponse {
    match load_catalog(state.store.as_ref()).await {
        Ok(snapshot) => {
            let summary = CatalogSummary::from(&snapshot);
            state.synthesizer.catalog().replace(snapshot);
            tracing::info!(
                ingredients = summary.ingredients,
                cuisines = summary.cuisines,
                "catalog reloaded"
            );
            (StatusCode::OK, Json(summary)).into_response()
        }
        Err(CatalogLoadError::Catalog(e)) => {
            tracing::warn!("Catalog reload rejected: {}", e);
            error_response(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
        }
        Err(CatalogLoadError::Store(e)) => store_error_response("reload catalog", e),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(get_catalog, reload_catalog),
    components(schemas(CatalogSummary))
)]
pub struct ApiDoc;
