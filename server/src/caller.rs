use crate::api::ErrorResponse;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};

pub const USER_ID_HEADER: &str = "x-user-id";

/// Extractor for the opaque caller identity carried in the `X-User-Id` header.
///
/// Use this in any handler that works on owned documents:
/// ```ignore
/// async fn my_handler(Caller(user_id): Caller) -> impl IntoResponse {
///     // user_id is the trimmed header value
/// }
/// ```
pub struct Caller(pub String);

pub enum CallerError {
    MissingHeader,
    InvalidHeader,
}

impl IntoResponse for CallerError {
    fn into_response(self) -> Response {
        let message = match self {
            CallerError::MissingHeader => "Missing X-User-Id header",
            CallerError::InvalidHeader => "Invalid X-User-Id header",
        };

        (
            StatusCode::UNAUTHORIZED,
            Json(ErrorResponse {
                error: message.to_string(),
            }),
        )
            .into_response()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = CallerError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(USER_ID_HEADER)
            .ok_or(CallerError::MissingHeader)?;

        let user_id = header
            .to_str()
            .map_err(|_| CallerError::InvalidHeader)?
            .trim();

        if user_id.is_empty() {
            return Err(CallerError::InvalidHeader);
        }

        Ok(Caller(user_id.to_string()))
    }
}
