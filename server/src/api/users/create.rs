use super::{email_taken, User, UserRequest, UserResponse};
use crate::api::{error_response, json_rejection_response, store_error_response, ErrorResponse};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use larder_core::store::{put_as, Collection};
use uuid::Uuid;

#[utoipa::path(
    post,
    path = "/api/users",
    tag = "users",
    request_body = UserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Missing name or email", body = ErrorResponse),
        (status = 409, description = "Email already registered", body = ErrorResponse)
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
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

    match email_taken(state.store.as_ref(), &fields.email, None).await {
        Ok(false) => {}
        Ok(true) => return error_response(StatusCode::CONFLICT, "Email already registered"),
        Err(e) => return store_error_response("check email", e),
    }

    let id = Uuid::new_v4().to_string();
    let now = Utc::now();
    let user = User {
        name: fields.name,
        email: fields.email,
        phone: fields.phone,
        dietary_preferences: fields.dietary_preferences,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = put_as(state.store.as_ref(), Collection::Users, &id, &user).await {
        return store_error_response("create user", e);
    }

    (StatusCode::CREATED, Json(UserResponse { id, user })).into_response()
}
