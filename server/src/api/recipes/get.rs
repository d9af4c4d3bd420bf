use super::{load_owned, StoredRecipe};
use crate::api::{error_response, store_error_response, ErrorResponse};
use crate::caller::Caller;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use larder_core::materializer::SynthesizedRecipe;
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RecipeResponse {
    pub id: String,
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub recipe: SynthesizedRecipe,
}

impl RecipeResponse {
    pub fn new(id: String, stored: StoredRecipe) -> Self {
        Self {
            id,
            user_id: stored.user_id,
            created_at: stored.created_at,
            updated_at: stored.updated_at,
            recipe: stored.recipe,
        }
    }
}

#[utoipa::path(
    get,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID")
    ),
    responses(
        (status = 200, description = "Recipe details", body = RecipeResponse),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("user_id" = [])
    )
)]
pub async fn get_recipe(
    Caller(user_id): Caller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match load_owned(state.store.as_ref(), &id, &user_id).await {
        Ok(Some(stored)) => (StatusCode::OK, Json(RecipeResponse::new(id, stored))).into_response(),
        Ok(None) => error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => store_error_response("fetch recipe", e),
    }
}
