//! Cuisine profile documents, templates included.

use crate::api::{error_response, json_rejection_response, store_error_response, ErrorResponse};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use larder_core::catalog::CuisineProfile;
use larder_core::store::{get_as, list_as, put_as, validate_id, Collection};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Returns the router for /api/cuisines endpoints (mounted at /api/cuisines)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_cuisines).post(create_cuisine))
        .route(
            "/{id}",
            get(get_cuisine).put(update_cuisine).delete(delete_cuisine),
        )
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct CuisinesListResponse {
    pub cuisines: Vec<CuisineProfile>,
}

#[utoipa::path(
    get,
    path = "/api/cuisines",
    tag = "cuisines",
    responses(
        (status = 200, description = "Stored cuisine profiles, ordered by id", body = CuisinesListResponse)
    )
)]
pub async fn list_cuisines(State(state): State<AppState>) -> impl IntoResponse {
    match list_as::<CuisineProfile>(state.store.as_ref(), Collection::Cuisines, None).await {
        Ok(cuisines) => {
            let response = CuisinesListResponse {
                cuisines: cuisines.into_iter().map(|(_, cuisine)| cuisine).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => store_error_response("list cuisines", e),
    }
}

#[utoipa::path(
    post,
    path = "/api/cuisines",
    tag = "cuisines",
    request_body = CuisineProfile,
    responses(
        (status = 201, description = "Cuisine created", body = CuisineProfile),
        (status = 400, description = "Invalid cuisine document", body = ErrorResponse),
        (status = 409, description = "Cuisine id already exists", body = ErrorResponse)
    )
)]
pub async fn create_cuisine(
    State(state): State<AppState>,
    payload: Result<Json<CuisineProfile>, JsonRejection>,
) -> impl IntoResponse {
    let Json(cuisine) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response(rejection),
    };

    if let Err(e) = validate_id(&cuisine.id) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    match state.store.get(Collection::Cuisines, &cuisine.id).await {
        Ok(None) => {}
        Ok(Some(_)) => return error_response(StatusCode::CONFLICT, "Cuisine already exists"),
        Err(e) => return store_error_response("check cuisine", e),
    }

    if let Err(e) = put_as(state.store.as_ref(), Collection::Cuisines, &cuisine.id, &cuisine).await {
        return store_error_response("create cuisine", e);
    }

    (StatusCode::CREATED, Json(cuisine)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/cuisines/{id}",
    tag = "cuisines",
    params(
        ("id" = String, Path, description = "Cuisine ID")
    ),
    responses(
        (status = 200, description = "Cuisine profile", body = CuisineProfile),
        (status = 404, description = "Cuisine not found", body = ErrorResponse)
    )
)]
pub async fn get_cuisine(State(state): State<AppState>, Path(id): Path<String>) -> impl IntoResponse {
    match get_as::<CuisineProfile>(state.store.as_ref(), Collection::Cuisines, &id).await {
        Ok(Some(cuisine)) => (StatusCode::OK, Json(cuisine)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Cuisine not found"),
        Err(e) => store_error_response("fetch cuisine", e),
    }
}

#[utoipa::path(
    put,
    path = "/api/cuisines/{id}",
    tag = "cuisines",
    params(
        ("id" = String, Path, description = "Cuisine ID")
    ),
    request_body = CuisineProfile,
    responses(
        (status = 200, description = "Cuisine replaced", body = CuisineProfile),
        (status = 400, description = "Invalid document or id mismatch", body = ErrorResponse),
        (status = 404, description = "Cuisine not found", body = ErrorResponse)
    )
)]
pub async fn update_cuisine(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<CuisineProfile>, JsonRejection>,
) -> impl IntoResponse {
    let Json(cuisine) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response(rejection),
    };

    if cuisine.id != id {
        return error_response(StatusCode::BAD_REQUEST, "Cuisine id does not match path");
    }

    match state.store.get(Collection::Cuisines, &id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Cuisine not found"),
        Err(e) => return store_error_response("fetch cuisine", e),
    }

    if let Err(e) = put_as(state.store.as_ref(), Collection::Cuisines, &id, &cuisine).await {
        return store_error_response("update cuisine", e);
    }

    (StatusCode::OK, Json(cuisine)).into_response()
}

#[utoipa::path(
    delete,
    path = "/api/cuisines/{id}",
    tag = "cuisines",
    params(
        ("id" = String, Path, description = "Cuisine ID")
    ),
    responses(
        (status = 204, description = "Cuisine deleted"),
        (status = 404, description = "Cuisine not found", body = ErrorResponse)
    )
)]
pub async fn delete_cuisine(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete(Collection::Cuisines, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Cuisine not found"),
        Err(e) => store_error_response("delete cuisine", e),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(list_cuisines, create_cuisine, get_cuisine, update_cuisine, delete_cuisine),
    components(schemas(CuisineProfile, CuisinesListResponse))
)]
pub struct ApiDoc;
