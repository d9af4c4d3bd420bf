//! Catalog ingredient documents. Writes reach the generator only after a catalog reload.

use crate::api::{error_response, json_rejection_response, store_error_response, ErrorResponse};
use crate::AppState;
use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use larder_core::catalog::{Category, IngredientCatalogEntry};
use larder_core::store::{get_as, list_as, put_as, validate_id, Collection, FieldFilter};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, OpenApi, ToSchema};

/// Returns the router for /api/ingredients endpoints (mounted at /api/ingredients)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_ingredients).post(create_ingredient))
        .route(
            "/{id}",
            get(get_ingredient)
                .put(update_ingredient)
                .delete(delete_ingredient),
        )
}

#[derive(Debug, Clone, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct IngredientListQuery {
    /// Only ingredients in this category
    pub category: Option<Category>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IngredientsListResponse {
    pub ingredients: Vec<IngredientCatalogEntry>,
}

#[utoipa::path(
    get,
    path = "/api/ingredients",
    tag = "ingredients",
    params(IngredientListQuery),
    responses(
        (status = 200, description = "Stored catalog ingredients, ordered by id", body = IngredientsListResponse),
        (status = 400, description = "Unknown category", body = ErrorResponse)
    )
)]
pub async fn list_ingredients(
    State(state): State<AppState>,
    query: Result<Query<IngredientListQuery>, QueryRejection>,
) -> impl IntoResponse {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return error_response(StatusCode::BAD_REQUEST, rejection.body_text()),
    };

    let filter = query
        .category
        .map(|category| FieldFilter::new("category", category.as_str()));

    match list_as::<IngredientCatalogEntry>(
        state.store.as_ref(),
        Collection::Ingredients,
        filter.as_ref(),
    )
    .await
    {
        Ok(entries) => {
            let response = IngredientsListResponse {
                ingredients: entries.into_iter().map(|(_, entry)| entry).collect(),
            };
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => store_error_response("list ingredients", e),
    }
}

#[utoipa::path(
    post,
    path = "/api/ingredients",
    tag = "ingredients",
    request_body = IngredientCatalogEntry,
    responses(
        (status = 201, description = "Ingredient created", body = IngredientCatalogEntry),
        (status = 400, description = "Invalid ingredient document", body = ErrorResponse),
        (status = 409, description = "Ingredient id already exists", body = ErrorResponse)
    )
)]
pub async fn create_ingredient(
    State(state): State<AppState>,
    payload: Result<Json<IngredientCatalogEntry>, JsonRejection>,
) -> impl IntoResponse {
    let Json(entry) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response(rejection),
    };

    if let Err(e) = validate_id(&entry.id) {
        return error_response(StatusCode::BAD_REQUEST, e.to_string());
    }

    match state.store.get(Collection::Ingredients, &entry.id).await {
        Ok(None) => {}
        Ok(Some(_)) => return error_response(StatusCode::CONFLICT, "Ingredient already exists"),
        Err(e) => return store_error_response("check ingredient", e),
    }

    if let Err(e) = put_as(state.store.as_ref(), Collection::Ingredients, &entry.id, &entry).await {
        return store_error_response("create ingredient", e);
    }

    (StatusCode::CREATED, Json(entry)).into_response()
}

#[utoipa::path(
    get,
    path = "/api/ingredients/{id}",
    tag = "ingredients",
    params(
        ("id" = String, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 200, description = "Ingredient document", body = IngredientCatalogEntry),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match get_as::<IngredientCatalogEntry>(state.store.as_ref(), Collection::Ingredients, &id).await
    {
        Ok(Some(entry)) => (StatusCode::OK, Json(entry)).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Ingredient not found"),
        Err(e) => store_error_response("fetch ingredient", e),
    }
}

#[utoipa::path(
    put,
    path = "/api/ingredients/{id}",
    tag = "ingredients",
    params(
        ("id" = String, Path, description = "Ingredient ID")
    ),
    request_body = IngredientCatalogEntry,
    responses(
        (status = 200, description = "Ingredient replaced", body = IngredientCatalogEntry),
        (status = 400, description = "Invalid document or id mismatch", body = ErrorResponse),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
pub async fn update_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<IngredientCatalogEntry>, JsonRejection>,
) -> impl IntoResponse {
    let Json(entry) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response(rejection),
    };

    if entry.id != id {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Ingredient id does not match path",
        );
    }

    match state.store.get(Collection::Ingredients, &id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Ingredient not found"),
        Err(e) => return store_error_response("fetch ingredient", e),
    }

    if let Err(e) = put_as(state.store.as_ref(), Collection::Ingredients, &id, &entry).await {
        return store_error_response("update ingredient", e);
    }

    (StatusCode::OK, Json(entry)).into_response()
}

#[utoipa::path(
    delete,
    path = "/api/ingredients/{id}",
    tag = "ingredients",
    params(
        ("id" = String, Path, description = "Ingredient ID")
    ),
    responses(
        (status = 204, description = "Ingredient deleted"),
        (status = 404, description = "Ingredient not found", body = ErrorResponse)
    )
)]
pub async fn delete_ingredient(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.delete(Collection::Ingredients, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Ingredient not found"),
        Err(e) => store_error_response("delete ingredient", e),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_ingredients,
        create_ingredient,
        get_ingredient,
        update_ingredient,
        delete_ingredient,
    ),
    components(schemas(IngredientCatalogEntry, IngredientsListResponse))
)]
pub struct ApiDoc;
