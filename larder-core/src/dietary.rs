//! Dietary preference labels and the hard constraints they imply.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::{AllergenTag, Category, IngredientCatalogEntry};

/// The fixed set of preference labels a caller may send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum DietaryPreference {
    Vegetarian,
    Vegan,
    #[serde(rename = "Gluten-Free")]
    GlutenFree,
    #[serde(rename = "Dairy-Free")]
    DairyFree,
    #[serde(rename = "Nut-Free")]
    NutFree,
    #[serde(rename = "Low-Carb")]
    LowCarb,
    #[serde(rename = "Low-Fat")]
    LowFat,
    #[serde(rename = "High-Protein")]
    HighProtein,
}

impl DietaryPreference {
    pub const ALL: &'static [DietaryPreference] = &[
        DietaryPreference::Vegetarian,
        DietaryPreference::Vegan,
        DietaryPreference::GlutenFree,
        DietaryPreference::DairyFree,
        DietaryPreference::NutFree,
        DietaryPreference::LowCarb,
        DietaryPreference::LowFat,
        DietaryPreference::HighProtein,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DietaryPreference::Vegetarian => "Vegetarian",
            DietaryPreference::Vegan => "Vegan",
            DietaryPreference::GlutenFree => "Gluten-Free",
            DietaryPreference::DairyFree => "Dairy-Free",
            DietaryPreference::NutFree => "Nut-Free",
            DietaryPreference::LowCarb => "Low-Carb",
            DietaryPreference::LowFat => "Low-Fat",
            DietaryPreference::HighProtein => "High-Protein",
        }
    }

    /// Parse a label, ignoring case, spaces, hyphens and underscores.
    pub fn parse(label: &str) -> Option<Self> {
        let key = squash(label);
        Self::ALL.iter().copied().find(|p| squash(p.label()) == key)
    }

    fn excluded_categories(&self) -> &'static [Category] {
        match self {
            DietaryPreference::Vegetarian => &[Category::Meat, Category::Poultry, Category::Seafood],
            DietaryPreference::Vegan => &[
                Category::Meat,
                Category::Poultry,
                Category::Seafood,
                Category::Dairy,
                Category::Egg,
                Category::Honey,
            ],
            DietaryPreference::DairyFree => &[Category::Dairy],
            DietaryPreference::NutFree => &[Category::Nut],
            DietaryPreference::LowCarb => &[Category::Grain, Category::Sweetener],
            DietaryPreference::GlutenFree
            | DietaryPreference::LowFat
            | DietaryPreference::HighProtein => &[],
        }
    }

    fn excluded_allergens(&self) -> &'static [AllergenTag] {
        match self {
            DietaryPreference::Vegan => &[AllergenTag::Dairy, AllergenTag::Egg],
            DietaryPreference::GlutenFree => &[AllergenTag::Gluten],
            DietaryPreference::DairyFree => &[AllergenTag::Dairy],
            DietaryPreference::NutFree => &[AllergenTag::TreeNut, AllergenTag::Peanut],
            DietaryPreference::Vegetarian
            | DietaryPreference::LowCarb
            | DietaryPreference::LowFat
            | DietaryPreference::HighProtein => &[],
        }
    }
}

impl fmt::Display for DietaryPreference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn squash(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Hard exclusions applied to every ingredient the composer considers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DietaryConstraintSet {
    pub excluded_allergens: BTreeSet<AllergenTag>,
    pub excluded_categories: BTreeSet<Category>,
}

impl DietaryConstraintSet {
    pub fn from_preferences(preferences: &[DietaryPreference]) -> Self {
        let mut set = Self::default();
        for preference in preferences {
            set.excluded_categories
                .extend(preference.excluded_categories().iter().copied());
            set.excluded_allergens
                .extend(preference.excluded_allergens().iter().copied());
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.excluded_allergens.is_empty() && self.excluded_categories.is_empty()
    }

    pub fn permits(&self, entry: &IngredientCatalogEntry) -> bool {
        !self.excluded_categories.contains(&entry.category)
            && entry.allergens.is_disjoint(&self.excluded_allergens)
    }
}
