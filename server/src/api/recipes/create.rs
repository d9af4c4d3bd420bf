use super::get::RecipeResponse;
use super::{validate_recipe, StoredRecipe};
use crate::api::{error_response, json_rejection_response, store_error_response, ErrorResponse};
use crate::caller::Caller;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use larder_core::materializer::SynthesizedRecipe;
use larder_core::store::{put_as, Collection};
use uuid::Uuid;

/// Save a generated recipe the caller has confirmed
#[utoipa::path(
    post,
    path = "/api/recipes",
    tag = "recipes",
    request_body = SynthesizedRecipe,
    responses(
        (status = 201, description = "Recipe saved", body = RecipeResponse),
        (status = 400, description = "Invalid recipe", body = ErrorResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse)
    ),
    security(
        ("user_id" = [])
    )
)]
pub async fn create_recipe(
    Caller(user_id): Caller,
    State(state): State<AppState>,
    payload: Result<Json<SynthesizedRecipe>, JsonRejection>,
) -> impl IntoResponse {
    let Json(recipe) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response(rejection),
    };

    if let Err(message) = validate_recipe(&recipe) {
        return error_response(StatusCode::BAD_REQUEST, message);
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let stored = StoredRecipe {
        user_id,
        created_at: now,
        updated_at: now,
        recipe,
    };

    if let Err(e) = put_as(state.store.as_ref(), Collection::Recipes, &id, &stored).await {
        return store_error_response("save recipe", e);
    }

    tracing::info!(recipe_id = %id, name = %stored.recipe.name, "saved recipe");
    (StatusCode::CREATED, Json(RecipeResponse::new(id, stored))).into_response()
}
