use crate::api::{error_response, json_rejection_response, ErrorResponse};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use larder_core::composer::TemplateRejection;
use larder_core::dietary::DietaryConstraintSet;
use larder_core::engine::SynthesisRequest;
use larder_core::error::SynthesisError;
use larder_core::materializer::SynthesizedRecipe;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

/// Returns the router for the generator endpoint
pub fn router() -> Router<AppState> {
    Router::new().route("/api/generate-recipe", post(generate_recipe))
}

/// Context returned when no template can be filled under the constraints.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct NoFeasibleRecipeResponse {
    pub error: String,
    pub cuisine: String,
    pub constraints: DietaryConstraintSet,
    /// One entry per template that was tried.
    pub rejections: Vec<TemplateRejection>,
}

/// Generate a recipe from pantry ingredients
///
/// Stateless: the recipe is not saved. Clients confirm it by POSTing it to /api/recipes.
#[utoipa::path(
    post,
    path = "/api/generate-recipe",
    tag = "generate",
    request_body = SynthesisRequest,
    responses(
        (status = 200, description = "Synthesized recipe", body = SynthesizedRecipe),
        (status = 400, description = "Empty ingredients, unknown dietary preference, or malformed body", body = ErrorResponse),
        (status = 422, description = "No template can be filled under the constraints", body = NoFeasibleRecipeResponse),
        (status = 500, description = "Internal error", body = ErrorResponse)
    )
)]
pub async fn generate_recipe(
    State(state): State<AppState>,
    payload: Result<Json<SynthesisRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match payload {
        Ok(payload) => payload,
        Err(rejection) => return json_rejection_response(rejection),
    };

    match state.synthesizer.synthesize(&request) {
        Ok(recipe) => (StatusCode::OK, Json(recipe)).into_response(),
        Err(SynthesisError::InvalidRequest(message)) => {
            error_response(StatusCode::BAD_REQUEST, message)
        }
        Err(SynthesisError::NoFeasibleTemplate {
            cuisine,
            constraints,
            rejections,
        }) => {
            tracing::info!(
                cuisine = %cuisine,
                rejections = rejections.len(),
                "no feasible recipe"
            );
            (
                StatusCode::UNPROCESSABLE_ENTITY,
                Json(NoFeasibleRecipeResponse {
                    error: "no feasible recipe".to_string(),
                    cuisine,
                    constraints,
                    rejections,
                }),
            )
                .into_response()
        }
        Err(e @ SynthesisError::CatalogUnavailable(_)) => {
            tracing::error!("Failed to generate recipe: {}", e);
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate recipe",
            )
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(generate_recipe),
    components(schemas(SynthesisRequest, SynthesizedRecipe, NoFeasibleRecipeResponse))
)]
pub struct ApiDoc;
