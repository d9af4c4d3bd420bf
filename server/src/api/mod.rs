pub mod catalog;
pub mod cuisines;
pub mod generate;
pub mod ingredients;
pub mod recipes;
pub mod testing;
pub mod users;

use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use larder_core::store::StoreError;
use serde::Serialize;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{OpenApi, ToSchema};

/// Shared error response used by all endpoints
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Malformed or mistyped JSON bodies are a 400, not axum's default 422.
pub fn json_rejection_response(rejection: JsonRejection) -> Response {
    error_response(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// Map a store failure to a response. `action` reads like "fetch recipe".
pub fn store_error_response(action: &str, error: StoreError) -> Response {
    match error {
        StoreError::InvalidId(_) => error_response(StatusCode::BAD_REQUEST, error.to_string()),
        StoreError::Timeout(_) | StoreError::Unavailable(_) => {
            tracing::error!("Failed to {}: {}", action, error);
            error_response(
                StatusCode::SERVICE_UNAVAILABLE,
                "Document store unavailable",
            )
        }
        StoreError::Io(_) | StoreError::Malformed { .. } => {
            tracing::error!("Failed to {}: {}", action, error);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to {}", action),
            )
        }
    }
}

/// Generate the complete OpenAPI spec by merging all module specs
pub fn openapi() -> utoipa::openapi::OpenApi {
    // Base spec with shared components and security
    #[derive(OpenApi)]
    #[openapi(components(schemas(ErrorResponse)))]
    struct BaseApi;

    let mut spec = BaseApi::openapi();

    if let Some(components) = spec.components.as_mut() {
        components.add_security_scheme(
            "user_id",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::new("X-User-Id"))),
        );
    }

    // Merge in each module's spec
    let modules: Vec<utoipa::openapi::OpenApi> = vec![
        testing::ApiDoc::openapi(),
        generate::ApiDoc::openapi(),
        catalog::ApiDoc::openapi(),
        recipes::ApiDoc::openapi(),
        users::ApiDoc::openapi(),
        ingredients::ApiDoc::openapi(),
        cuisines::ApiDoc::openapi(),
    ];

    for module_spec in modules {
        // Merge paths
        spec.paths.paths.extend(module_spec.paths.paths);

        // Merge components (schemas)
        if let Some(module_components) = module_spec.components {
            if let Some(spec_components) = spec.components.as_mut() {
                spec_components.schemas.extend(module_components.schemas);
            }
        }
    }

    spec
}
