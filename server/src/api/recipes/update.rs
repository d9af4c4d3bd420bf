use super::get::RecipeResponse;
use super::{load_owned, validate_recipe, StoredRecipe};
use crate::api::{error_response, json_rejection_response, store_error_response, ErrorResponse};
use crate::caller::Caller;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use larder_core::materializer::SynthesizedRecipe;
use larder_core::store::{put_as, Collection};

/// Replace a saved recipe's content
#[utoipa::path(
    put,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID")
    ),
    request_body = SynthesizedRecipe,
    responses(
        (status = 200, description = "Recipe updated", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("user_id" = [])
    )
)]
pub async fn update_recipe(
    Caller(user_id): Caller,
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<SynthesizedRecipe>, JsonRejection>,
) -> impl IntoResponse {
    let Json(recipe) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response(rejection),
    };

    if let Err(message) = validate_recipe(&recipe) {
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    let existing = match load_owned(state.store.as_ref(), &id, &user_id).await {
        Ok(Some(existing)) => existing,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => return store_error_response("fetch recipe", e),
    };

    let stored = StoredRecipe {
        user_id,
        created_at: existing.created_at,
        updated_at: Utc::now(),
        recipe,
    };

    if let Err(e) = put_as(state.store.as_ref(), Collection::Recipes, &id, &stored).await {
        return store_error_response("update recipe", e);
    }

    (StatusCode::OK, Json(RecipeResponse::new(id, stored))).into_response()
}
