//! Ingredient and cuisine reference data.
//!
//! A [`CatalogSnapshot`] is validated once and then treated as immutable.
//! [`CatalogHandle`] lets a caller swap in a whole new snapshot without readers
//! ever seeing a half-updated catalog.

mod types;

pub use types::{
    AllergenTag, Category, CountRange, CuisineProfile, Difficulty, IngredientCatalogEntry,
    MinuteRange, Nutrition, Role, RoleRequirement, Segment, Slot, StepSkeleton,
    TechniqueTemplate,
};

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::pantry_text::normalize_key;

/// The catalog shipped with the crate.
pub const BUILTIN_CATALOG_JSON: &str = include_str!("../../../data/catalog.json");

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CatalogError {
    #[error("Invalid catalog JSON: {0}")]
    InvalidJson(String),

    #[error("Duplicate ingredient id: {0}")]
    DuplicateIngredient(String),

    #[error("Alias {alias:?} is used by both {first} and {second}")]
    DuplicateAlias {
        alias: String,
        first: String,
        second: String,
    },

    #[error("Duplicate cuisine id: {0}")]
    DuplicateCuisine(String),

    #[error("Ingredient {id}: {reason}")]
    InvalidIngredient { id: String, reason: String },

    #[error("Cuisine {cuisine} references unknown ingredient {ingredient}")]
    UnknownAffinityIngredient { cuisine: String, ingredient: String },

    #[error("Template {template}: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("Catalog has no {0}")]
    Empty(&'static str),
}

/// On-disk catalog document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogData {
    pub ingredients: Vec<IngredientCatalogEntry>,
    pub cuisines: Vec<CuisineProfile>,
}

impl CatalogData {
    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        serde_json::from_str(json).map_err(|e| CatalogError::InvalidJson(e.to_string()))
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Self::from_json(BUILTIN_CATALOG_JSON)
    }
}

/// Validated, indexed, read-only catalog.
#[derive(Debug)]
pub struct CatalogSnapshot {
    ingredients: Vec<IngredientCatalogEntry>,
    cuisines: Vec<CuisineProfile>,
    by_id: HashMap<String, usize>,
    /// Normalized alias (and canonical name) -> ingredient index.
    by_alias: HashMap<String, usize>,
    /// Lowercased cuisine id and name -> cuisine index.
    cuisine_keys: HashMap<String, usize>,
    loaded_at: DateTime<Utc>,
}

impl CatalogSnapshot {
    pub fn new(data: CatalogData) -> Result<Self, CatalogError> {
        let CatalogData {
            ingredients,
            cuisines,
        } = data;

        if ingredients.is_empty() {
            return Err(CatalogError::Empty("ingredients"));
        }
        if cuisines.is_empty() {
            return Err(CatalogError::Empty("cuisines"));
        }

        let mut by_id = HashMap::new();
        let mut by_alias: HashMap<String, usize> = HashMap::new();

        for (idx, entry) in ingredients.iter().enumerate() {
            if by_id.insert(entry.id.clone(), idx).is_some() {
                return Err(CatalogError::DuplicateIngredient(entry.id.clone()));
            }
            validate_entry(entry)?;

            let names = std::iter::once(&entry.canonical_name).chain(entry.aliases.iter());
            for name in names {
                let key = normalize_key(name);
                if key.is_empty() {
                    continue;
                }
                match by_alias.get(&key) {
                    Some(&other) if other != idx => {
                        return Err(CatalogError::DuplicateAlias {
                            alias: key,
                            first: ingredients[other].id.clone(),
                            second: entry.id.clone(),
                        });
                    }
                    Some(_) => {}
                    None => {
                        by_alias.insert(key, idx);
                    }
                }
            }
        }

        let mut cuisine_keys = HashMap::new();
        let mut cuisine_ids = HashSet::new();
        for (idx, cuisine) in cuisines.iter().enumerate() {
            if !cuisine_ids.insert(cuisine.id.clone()) {
                return Err(CatalogError::DuplicateCuisine(cuisine.id.clone()));
            }
            for ingredient in &cuisine.affinity_ingredient_ids {
                if !by_id.contains_key(ingredient) {
                    return Err(CatalogError::UnknownAffinityIngredient {
                        cuisine: cuisine.id.clone(),
                        ingredient: ingredient.clone(),
                    });
                }
            }
            for template in &cuisine.technique_templates {
                validate_template(cuisine, template)?;
            }
            cuisine_keys.entry(cuisine.name.to_lowercase()).or_insert(idx);
            cuisine_keys.insert(cuisine.id.to_lowercase(), idx);
        }

        Ok(Self {
            ingredients,
            cuisines,
            by_id,
            by_alias,
            cuisine_keys,
            loaded_at: Utc::now(),
        })
    }

    pub fn from_json(json: &str) -> Result<Self, CatalogError> {
        Self::new(CatalogData::from_json(json)?)
    }

    pub fn builtin() -> Result<Self, CatalogError> {
        Self::new(CatalogData::builtin()?)
    }

    /// Ingredients in declaration order.
    pub fn ingredients(&self) -> &[IngredientCatalogEntry] {
        &self.ingredients
    }

    /// Cuisines in declaration order.
    pub fn cuisines(&self) -> &[CuisineProfile] {
        &self.cuisines
    }

    pub fn ingredient(&self, id: &str) -> Option<&IngredientCatalogEntry> {
        self.by_id.get(id).map(|&idx| &self.ingredients[idx])
    }

    /// Exact lookup by alias or canonical name, ignoring case and extra whitespace.
    pub fn by_alias(&self, name: &str) -> Option<&IngredientCatalogEntry> {
        self.by_alias
            .get(&normalize_key(name))
            .map(|&idx| &self.ingredients[idx])
    }

    /// All (normalized name, entry) pairs, in ingredient declaration order.
    pub fn alias_keys(&self) -> impl Iterator<Item = (String, &IngredientCatalogEntry)> + '_ {
        self.ingredients.iter().flat_map(|entry| {
            std::iter::once(&entry.canonical_name)
                .chain(entry.aliases.iter())
                .map(move |name| (normalize_key(name), entry))
        })
    }

    /// Case-insensitive lookup by id or display name.
    pub fn cuisine(&self, key: &str) -> Option<&CuisineProfile> {
        self.cuisine_keys
            .get(&key.trim().to_lowercase())
            .map(|&idx| &self.cuisines[idx])
    }

    pub fn template_count(&self) -> usize {
        self.cuisines
            .iter()
            .map(|c| c.technique_templates.len())
            .sum()
    }

    pub fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    /// Copy the reference data back out, e.g. for seeding a store.
    pub fn to_data(&self) -> CatalogData {
        CatalogData {
            ingredients: self.ingredients.clone(),
            cuisines: self.cuisines.clone(),
        }
    }
}

fn validate_entry(entry: &IngredientCatalogEntry) -> Result<(), CatalogError> {
    let invalid = |reason: &str| CatalogError::InvalidIngredient {
        id: entry.id.clone(),
        reason: reason.to_string(),
    };

    if entry.id.trim().is_empty() {
        return Err(invalid("empty id"));
    }
    if entry.canonical_name.trim().is_empty() {
        return Err(invalid("empty canonical name"));
    }
    if !(entry.base_unit_size > 0.0) {
        return Err(invalid("base_unit_size must be positive"));
    }
    if !(entry.serving_quantity >= 0.0) {
        return Err(invalid("serving_quantity must not be negative"));
    }
    Ok(())
}

fn validate_template(
    cuisine: &CuisineProfile,
    template: &TechniqueTemplate,
) -> Result<(), CatalogError> {
    let invalid = |reason: String| CatalogError::InvalidTemplate {
        template: template.id.clone(),
        reason,
    };

    if template.cuisine_id != cuisine.id {
        return Err(invalid(format!(
            "cuisine_id {} does not match owning cuisine {}",
            template.cuisine_id, cuisine.id
        )));
    }

    let mut seen = HashSet::new();
    for requirement in &template.required_roles {
        if !seen.insert(requirement.role) {
            return Err(invalid(format!("role {} listed twice", requirement.role)));
        }
        if requirement.range.min > requirement.range.max {
            return Err(invalid(format!(
                "role {} has min {} > max {}",
                requirement.role, requirement.range.min, requirement.range.max
            )));
        }
        if requirement.range.max == 0 {
            return Err(invalid(format!("role {} has max 0", requirement.role)));
        }
        if !(requirement.portion > 0.0) {
            return Err(invalid(format!(
                "role {} portion must be positive",
                requirement.role
            )));
        }
    }

    let range = template.base_cooking_time_range_minutes;
    if range.low > range.high {
        return Err(invalid(format!(
            "cooking time range {}..{} is inverted",
            range.low, range.high
        )));
    }

    for skeleton in &template.step_skeletons {
        for segment in skeleton.segments().map_err(invalid)? {
            if let Segment::Slot(Slot::Role(role)) = segment {
                if template.requirement(role).is_none() {
                    return Err(invalid(format!(
                        "step {:?} uses role {} that the template does not require",
                        skeleton.text(),
                        role
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Shared, atomically replaceable catalog snapshot.
#[derive(Debug)]
pub struct CatalogHandle {
    snapshot: ArcSwap<CatalogSnapshot>,
}

impl CatalogHandle {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
        }
    }

    /// The current snapshot. Hold on to it for the whole request.
    pub fn load(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }

    /// Swap in a new snapshot, returning the previous one.
    pub fn replace(&self, snapshot: CatalogSnapshot) -> Arc<CatalogSnapshot> {
        self.snapshot.swap(Arc::new(snapshot))
    }
}
