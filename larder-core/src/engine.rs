//! Synthesis engine facade: validate, normalize, compose, materialize.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogHandle, CatalogSnapshot};
use crate::composer::compose;
use crate::dietary::{DietaryConstraintSet, DietaryPreference};
use crate::error::SynthesisError;
use crate::materializer::{materialize, SynthesizedRecipe};
use crate::normalizer::{normalize, PantryItem};

pub const DEFAULT_SERVINGS: u32 = 4;
/// Longest accepted pantry entry, in characters.
pub const MAX_INGREDIENT_CHARS: usize = 200;
pub const MAX_INGREDIENTS: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SynthesisRequest {
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub cuisine: Option<String>,
    /// Labels such as "Vegan" or "gluten free".
    #[serde(default, alias = "dietaryPreferences")]
    pub dietary_preferences: Vec<String>,
    #[serde(default)]
    pub servings: Option<u32>,
}

impl SynthesisRequest {
    pub fn new<S: Into<String>>(ingredients: impl IntoIterator<Item = S>) -> Self {
        Self {
            ingredients: ingredients.into_iter().map(Into::into).collect(),
            ..Default::default()
        }
    }

    pub fn with_cuisine(mut self, cuisine: impl Into<String>) -> Self {
        self.cuisine = Some(cuisine.into());
        self
    }

    pub fn with_preference(mut self, label: impl Into<String>) -> Self {
        self.dietary_preferences.push(label.into());
        self
    }

    pub fn with_servings(mut self, servings: u32) -> Self {
        self.servings = Some(servings);
        self
    }
}

/// A request that passed validation.
struct ValidRequest<'a> {
    ingredients: Vec<&'a str>,
    cuisine: Option<&'a str>,
    preferences: Vec<DietaryPreference>,
    servings: u32,
}

fn validate(request: &SynthesisRequest) -> Result<ValidRequest<'_>, SynthesisError> {
    if request.ingredients.is_empty() {
        return Err(SynthesisError::InvalidRequest("empty ingredients".to_string()));
    }
    let ingredients: Vec<&str> = request
        .ingredients
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();
    if ingredients.is_empty() {
        return Err(SynthesisError::InvalidRequest("empty ingredients".to_string()));
    }
    if ingredients.len() > MAX_INGREDIENTS {
        return Err(SynthesisError::InvalidRequest(format!(
            "at most {MAX_INGREDIENTS} ingredients allowed"
        )));
    }
    if ingredients
        .iter()
        .any(|s| s.chars().count() > MAX_INGREDIENT_CHARS)
    {
        return Err(SynthesisError::InvalidRequest(format!(
            "ingredient longer than {MAX_INGREDIENT_CHARS} characters"
        )));
    }

    let servings = request.servings.unwrap_or(DEFAULT_SERVINGS);
    if servings < 1 {
        return Err(SynthesisError::InvalidRequest(
            "servings must be at least 1".to_string(),
        ));
    }

    let mut preferences = Vec::new();
    for label in &request.dietary_preferences {
        let preference = DietaryPreference::parse(label).ok_or_else(|| {
            SynthesisError::InvalidRequest(format!("unknown dietary preference {label:?}"))
        })?;
        if !preferences.contains(&preference) {
            preferences.push(preference);
        }
    }

    Ok(ValidRequest {
        ingredients,
        cuisine: request.cuisine.as_deref(),
        preferences,
        servings,
    })
}

/// Entry point shared by the server and the CLI.
#[derive(Debug, Clone)]
pub struct RecipeSynthesizer {
    catalog: Arc<CatalogHandle>,
}

impl RecipeSynthesizer {
    pub fn new(catalog: Arc<CatalogHandle>) -> Self {
        Self { catalog }
    }

    pub fn from_snapshot(snapshot: CatalogSnapshot) -> Self {
        Self::new(Arc::new(CatalogHandle::new(snapshot)))
    }

    pub fn catalog(&self) -> &Arc<CatalogHandle> {
        &self.catalog
    }

    pub fn synthesize(&self, request: &SynthesisRequest) -> Result<SynthesizedRecipe, SynthesisError> {
        let request = validate(request)?;
        // One snapshot for the whole request; a concurrent reload can't change it.
        let snapshot = self.catalog.load();

        let pantry = normalize(&request.ingredients, &snapshot);
        let constraints = DietaryConstraintSet::from_preferences(&request.preferences);

        let mut plan = compose(&pantry, request.cuisine, &constraints, &snapshot)?;
        plan.dietary_preferences = request.preferences;

        let recipe = materialize(&plan, request.servings)?;
        tracing::info!(
            recipe = %recipe.name,
            template = %recipe.template_id,
            fell_back = plan.fell_back,
            unverified = plan.unverified.len(),
            "synthesized recipe"
        );
        Ok(recipe)
    }

    /// Normalizer stage on its own, against the current snapshot.
    pub fn normalize(&self, raw_names: &[String]) -> Vec<PantryItem> {
        normalize(raw_names, &self.catalog.load())
    }
}
