use super::get::RecipeResponse;
use super::StoredRecipe;
use crate::api::{store_error_response, ErrorResponse};
use crate::caller::Caller;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use larder_core::store::{list_as, Collection, FieldFilter};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipesListResponse {
    pub recipes: Vec<RecipeResponse>,
}

#[utoipa::path(
    get,
    path = "/api/recipes",
    tag = "recipes",
    responses(
        (status = 200, description = "The caller's saved recipes, ordered by id", body = RecipesListResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse)
    ),
    security(
        ("user_id" = [])
    )
)]
pub async fn list_recipes(
    Caller(user_id): Caller,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let filter = FieldFilter::new("user_id", user_id);
    let recipes: Vec<(String, StoredRecipe)> =
        match list_as(state.store.as_ref(), Collection::Recipes, Some(&filter)).await {
            Ok(recipes) => recipes,
            Err(e) => return store_error_response("list recipes", e),
        };

    let response = RecipesListResponse {
        recipes: recipes
            .into_iter()
            .map(|(id, stored)| RecipeResponse::new(id, stored))
            .collect(),
    };

    (StatusCode::OK, Json(response)).into_response()
}
