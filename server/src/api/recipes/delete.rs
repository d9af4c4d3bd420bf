use super::load_owned;
use crate::api::{error_response, store_error_response, ErrorResponse};
use crate::caller::Caller;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use larder_core::store::Collection;

#[utoipa::path(
    delete,
    path = "/api/recipes/{id}",
    tag = "recipes",
    params(
        ("id" = String, Path, description = "Recipe ID")
    ),
    responses(
        (status = 204, description = "Recipe deleted"),
        (status = 401, description = "Missing caller identity", body = ErrorResponse),
        (status = 404, description = "Recipe not found", body = ErrorResponse)
    ),
    security(
        ("user_id" = [])
    )
)]
pub async fn delete_recipe(
    Caller(user_id): Caller,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match load_owned(state.store.as_ref(), &id, &user_id).await {
        Ok(Some(_)) => {}
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => return store_error_response("fetch recipe", e),
    }

    match state.store.delete(Collection::Recipes, &id).await {
        Ok(true) => StatusCode::NO_CONTENT.into_response(),
        Ok(false) => error_response(StatusCode::NOT_FOUND, "Recipe not found"),
        Err(e) => store_error_response("delete recipe", e),
    }
}
