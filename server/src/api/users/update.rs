use super::{email_taken, User, UserRequest, UserResponse};
use crate::api::{error_response, json_rejection_response, store_error_response, ErrorResponse};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use larder_core::store::{get_as, put_as, Collection};

#[utoipa::path(
    put,
    path = "/api/users/{id}",
    tag = "users",
    params(
        ("id" = String, Path, description = "User ID")
    ),
    request_body = UserRequest,
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Missing name or email", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<UserRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response(rejection),
    };

    let fields = match request.validate() {
        Ok(fields) => fields,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    let existing = match get_as::<User>(state.store.as_ref(), Collection::Users, &id).await {
        Ok(Some(existing)) => existing,
        Ok(None) => return error_response(StatusCode::NOT_FOUND, "User not found"),
        Err(e) => return store_error_response("fetch user", e),
    };

    match email_taken(state.store.as_ref(), &fields.email, Some(&id)).await {
        Ok(false) => {}
        Ok(true) => return error_response(StatusCode::CONFLICT, "Email already registered"),
        Err(e) => return store_error_response("check email", e),
    }

    let user = User {
        name: fields.name,
        email: fields.email,
        phone: fields.phone,
        dietary_preferences: fields.dietary_preferences,
        created_at: existing.created_at,
        updated_at: Utc::now(),
    };

    if let Err(e) = put_as(state.store.as_ref(), Collection::Users, &id, &user).await {
        return store_error_response("update user", e);
    }

    (StatusCode::OK, Json(UserResponse { id, user })).into_response()
}
