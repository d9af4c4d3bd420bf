pub mod create;
pub mod delete;
pub mod get;
pub mod list;
pub mod update;

use crate::AppState;
use axum::routing::get;
use axum::Router;
use chrono::{DateTime, Utc};
use larder_core::materializer::SynthesizedRecipe;
use larder_core::store::{get_as, Collection, DocumentStore, StoreError};
use serde::{Deserialize, Serialize};
use utoipa::OpenApi;

/// Returns the router for /api/recipes endpoints (mounted at /api/recipes)
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list::list_recipes).post(create::create_recipe))
        .route(
            "/{id}",
            get(get::get_recipe)
                .put(update::update_recipe)
                .delete(delete::delete_recipe),
        )
}

/// A saved recipe as kept in the `recipes` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredRecipe {
    pub user_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(flatten)]
    pub recipe: SynthesizedRecipe,
}

/// Load a recipe only if `user_id` owns it. Someone else's recipe reads as missing.
pub async fn load_owned(
    store: &dyn DocumentStore,
    id: &str,
    user_id: &str,
) -> Result<Option<StoredRecipe>, StoreError> {
    let stored: Option<StoredRecipe> = get_as(store, Collection::Recipes, id).await?;
    Ok(stored.filter(|recipe| recipe.user_id == user_id))
}

/// Checks shared by create and update.
pub fn validate_recipe(recipe: &SynthesizedRecipe) -> Result<(), &'static str> {
    if recipe.name.trim().is_empty() {
        return Err("Recipe name cannot be empty");
    }
    if recipe.servings == 0 {
        return Err("Servings must be at least 1");
    }
    if recipe.ingredient_lines.is_empty() {
        return Err("Recipe must have at least one ingredient");
    }
    Ok(())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list::list_recipes,
        create::create_recipe,
        get::get_recipe,
        update::update_recipe,
        delete::delete_recipe,
    ),
    components(schemas(get::RecipeResponse, list::RecipesListResponse))
)]
pub struct ApiDoc;
