use super::{User, UserResponse};
use crate::api::store_error_response;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use larder_core::store::{list_as, Collection};
use serde::Serialize;
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UsersListResponse {
    pub users: Vec<UserResponse>,
}

#[utoipa::path(
    get,
    path = "/api/users",
    tag = "users",
    responses(
        (status = 200, description = "All users, ordered by id", body = UsersListResponse)
    )
)]
pub async fn list_users(State(state): State<AppState>) -> impl IntoResponse {
    let users: Vec<(String, User)> =
        match list_as(state.store.as_ref(), Collection::Users, None).await {
            Ok(users) => users,
            Err(e) => return store_error_response("list users", e),
        };

    let response = UsersListResponse {
        users: users
            .into_iter()
            .map(|(id, user)| UserResponse { id, user })
            .collect(),
    };

    (StatusCode::OK, Json(response)).into_response()
}
