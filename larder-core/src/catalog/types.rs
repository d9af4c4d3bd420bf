//! Reference data types: ingredients, cuisines, technique templates.
//!
//! These are immutable once a [`super::CatalogSnapshot`] is built and are shared
//! by every synthesis request.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Grocery category of a catalog ingredient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Meat,
    Poultry,
    Seafood,
    Dairy,
    Egg,
    Honey,
    Grain,
    Legume,
    Vegetable,
    Fruit,
    Herb,
    Spice,
    Oil,
    Nut,
    Sweetener,
    Condiment,
    Broth,
    Other,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Meat => "meat",
            Category::Poultry => "poultry",
            Category::Seafood => "seafood",
            Category::Dairy => "dairy",
            Category::Egg => "egg",
            Category::Honey => "honey",
            Category::Grain => "grain",
            Category::Legume => "legume",
            Category::Vegetable => "vegetable",
            Category::Fruit => "fruit",
            Category::Herb => "herb",
            Category::Spice => "spice",
            Category::Oil => "oil",
            Category::Nut => "nut",
            Category::Sweetener => "sweetener",
            Category::Condiment => "condiment",
            Category::Broth => "broth",
            Category::Other => "other",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum AllergenTag {
    Gluten,
    Dairy,
    Egg,
    TreeNut,
    Peanut,
    Soy,
    Fish,
    Shellfish,
    Sesame,
}

/// A functional slot in a cooking technique.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Protein,
    Aromatic,
    Fat,
    Vegetable,
    Starch,
    Herb,
    Spice,
    Liquid,
    Acid,
}

impl Role {
    pub const ALL: &'static [Role] = &[
        Role::Protein,
        Role::Aromatic,
        Role::Fat,
        Role::Vegetable,
        Role::Starch,
        Role::Herb,
        Role::Spice,
        Role::Liquid,
        Role::Acid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Protein => "protein",
            Role::Aromatic => "aromatic",
            Role::Fat => "fat",
            Role::Vegetable => "vegetable",
            Role::Starch => "starch",
            Role::Herb => "herb",
            Role::Spice => "spice",
            Role::Liquid => "liquid",
            Role::Acid => "acid",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        Role::ALL.iter().copied().find(|r| r.as_str() == s)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Difficulty levels, ordered from easiest to hardest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// One level harder, saturating at `Hard`.
    pub fn escalate(self) -> Self {
        match self {
            Difficulty::Easy => Difficulty::Medium,
            Difficulty::Medium | Difficulty::Hard => Difficulty::Hard,
        }
    }
}

/// Macronutrients. Per base unit on catalog entries, aggregate on recipes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Nutrition {
    pub calories: f64,
    pub protein_g: f64,
    pub carbs_g: f64,
    pub fat_g: f64,
}

impl Nutrition {
    pub fn scaled(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein_g: self.protein_g * factor,
            carbs_g: self.carbs_g * factor,
            fat_g: self.fat_g * factor,
        }
    }

    pub fn add(&mut self, other: &Nutrition) {
        self.calories += other.calories;
        self.protein_g += other.protein_g;
        self.carbs_g += other.carbs_g;
        self.fat_g += other.fat_g;
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IngredientCatalogEntry {
    pub id: String,
    pub canonical_name: String,
    #[serde(default)]
    pub aliases: BTreeSet<String>,
    pub category: Category,
    #[serde(default)]
    pub allergens: BTreeSet<AllergenTag>,
    #[serde(default)]
    pub roles: BTreeSet<Role>,
    /// Nutrition for `base_unit_size` of `default_unit`.
    pub nutrition_per_unit: Nutrition,
    pub default_unit: String,
    pub base_unit_size: f64,
    /// Amount of `default_unit` a single serving uses.
    pub serving_quantity: f64,
}

/// Inclusive count range for a role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CountRange {
    pub min: u32,
    pub max: u32,
}

/// Inclusive minute range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MinuteRange {
    pub low: u32,
    pub high: u32,
}

impl MinuteRange {
    /// Rounds down. Does not overflow near `u32::MAX`.
    pub fn midpoint(&self) -> u32 {
        self.low + self.high.saturating_sub(self.low) / 2
    }
}

fn default_portion() -> f64 {
    1.0
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct RoleRequirement {
    pub role: Role,
    pub range: CountRange,
    /// Multiplier on the per-serving quantity, shared among the role's ingredients.
    #[serde(default = "default_portion")]
    pub portion: f64,
}

/// A substitution point inside a step skeleton.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    Role(Role),
    /// Every ingredient that came from the pantry.
    Main,
}

/// Step text with `{slot}` placeholders, e.g. `"Sauté {aromatic} until fragrant"`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(transparent)]
pub struct StepSkeleton(pub String);

/// A piece of a parsed skeleton.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Text(&'a str),
    Slot(Slot),
}

impl StepSkeleton {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }

    /// Split into literal text and slots. Errors name the offending slot.
    pub fn segments(&self) -> Result<Vec<Segment<'_>>, String> {
        let mut segments = Vec::new();
        let mut rest = self.0.as_str();

        while let Some(start) = rest.find('{') {
            let Some(len) = rest[start..].find('}') else {
                return Err(format!("unclosed slot in {:?}", self.0));
            };
            if start > 0 {
                segments.push(Segment::Text(&rest[..start]));
            }
            let name = &rest[start + 1..start + len];
            let slot = if name == "main" {
                Slot::Main
            } else {
                Slot::Role(Role::from_str(name).ok_or_else(|| format!("unknown slot {{{name}}}"))?)
            };
            segments.push(Segment::Slot(slot));
            rest = &rest[start + len + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Text(rest));
        }

        Ok(segments)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TechniqueTemplate {
    pub id: String,
    pub cuisine_id: String,
    pub name: String,
    pub step_skeletons: Vec<StepSkeleton>,
    /// Declaration order is the tie-break order for role specificity.
    pub required_roles: Vec<RoleRequirement>,
    pub base_cooking_time_range_minutes: MinuteRange,
    pub base_difficulty: Difficulty,
}

impl TechniqueTemplate {
    pub fn requirement(&self, role: Role) -> Option<&RoleRequirement> {
        self.required_roles.iter().find(|r| r.role == role)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct CuisineProfile {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub popular_dishes: Vec<String>,
    pub technique_templates: Vec<TechniqueTemplate>,
    /// Ordered; earlier ids are used first when backfilling.
    #[serde(default)]
    pub affinity_ingredient_ids: Vec<String>,
}
