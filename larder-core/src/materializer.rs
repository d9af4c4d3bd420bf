//! Recipe materializer: turn a [`TechniquePlan`] into a concrete recipe.
//!
//! Everything here is deterministic. Quantities come from each ingredient's
//! per-serving amount, cooking time from the template's range, and nutrition
//! is the exact sum over the produced ingredient lines.

use serde::{Deserialize, Serialize};

use crate::catalog::{Difficulty, Nutrition, Role, Segment, Slot};
use crate::composer::{IngredientSource, TechniquePlan};
use crate::dietary::DietaryPreference;
use crate::error::SynthesisError;

/// Verified lines beyond this count add cooking time.
pub const BASELINE_INGREDIENTS: usize = 5;
pub const MINUTES_PER_EXTRA_INGREDIENT: u32 = 5;
/// Filling more distinct roles than this makes the recipe one level harder.
pub const ESCALATION_ROLE_THRESHOLD: usize = 4;

const UNVERIFIED_UNIT: &str = "portion";
const UNVERIFIED_NOTE: &str = "unverified: not in the ingredient catalog";
const AFFINITY_NOTE: &str = "not in pantry";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct IngredientLine {
    /// None only for unverified pantry items.
    pub ingredient_id: Option<String>,
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default)]
    pub unverified: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct SynthesizedRecipe {
    pub name: String,
    pub cuisine_id: String,
    pub template_id: String,
    pub servings: u32,
    pub ingredient_lines: Vec<IngredientLine>,
    pub steps: Vec<String>,
    pub cooking_time_minutes: u32,
    pub difficulty: Difficulty,
    pub nutrition: Nutrition,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dietary_preferences: Vec<DietaryPreference>,
}

pub fn materialize(plan: &TechniquePlan, servings: u32) -> Result<SynthesizedRecipe, SynthesisError> {
    if servings < 1 {
        return Err(SynthesisError::InvalidRequest(
            "servings must be at least 1".to_string(),
        ));
    }

    let mut lines = Vec::new();
    let mut nutrition = Nutrition::default();

    for assignment in &plan.assignments {
        let count = assignment.ingredients.len();
        for assigned in &assignment.ingredients {
            let entry = &assigned.entry;
            let quantity = round2(
                entry.serving_quantity * assignment.requirement.portion / count as f64
                    * servings as f64,
            );
            nutrition.add(
                &entry
                    .nutrition_per_unit
                    .scaled(quantity / entry.base_unit_size),
            );
            lines.push(IngredientLine {
                ingredient_id: Some(entry.id.clone()),
                name: entry.canonical_name.clone(),
                quantity,
                unit: entry.default_unit.clone(),
                role: Some(assignment.requirement.role),
                note: (assigned.source == IngredientSource::Affinity)
                    .then(|| AFFINITY_NOTE.to_string()),
                unverified: false,
            });
        }
    }

    let verified_lines = lines.len();

    for name in &plan.unverified {
        lines.push(IngredientLine {
            ingredient_id: None,
            name: name.clone(),
            quantity: servings as f64,
            unit: UNVERIFIED_UNIT.to_string(),
            role: None,
            note: Some(UNVERIFIED_NOTE.to_string()),
            unverified: true,
        });
    }

    let template = &plan.template;
    let extra = u32::try_from(verified_lines.saturating_sub(BASELINE_INGREDIENTS))
        .unwrap_or(u32::MAX);
    let cooking_time_minutes = template
        .base_cooking_time_range_minutes
        .midpoint()
        .saturating_add(extra.saturating_mul(MINUTES_PER_EXTRA_INGREDIENT));

    let mut difficulty = template.base_difficulty;
    if plan.filled_role_count() > ESCALATION_ROLE_THRESHOLD {
        difficulty = difficulty.escalate();
    }

    Ok(SynthesizedRecipe {
        name: recipe_name(plan),
        cuisine_id: plan.cuisine_id.clone(),
        template_id: template.id.clone(),
        servings,
        ingredient_lines: lines,
        steps: render_steps(plan),
        cooking_time_minutes,
        difficulty,
        nutrition,
        dietary_preferences: plan.dietary_preferences.clone(),
    })
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn slot_names(plan: &TechniquePlan, slot: Slot) -> Vec<&str> {
    match slot {
        Slot::Role(role) => plan
            .assignment(role)
            .map(|a| {
                a.ingredients
                    .iter()
                    .map(|i| i.entry.canonical_name.as_str())
                    .collect()
            })
            .unwrap_or_default(),
        Slot::Main => plan
            .assignments
            .iter()
            .flat_map(|a| a.ingredients.iter())
            .filter(|i| i.source == IngredientSource::Pantry)
            .map(|i| i.entry.canonical_name.as_str())
            .collect(),
    }
}

/// Render each skeleton; skip any whose slots came out empty.
fn render_steps(plan: &TechniquePlan) -> Vec<String> {
    let mut steps = Vec::new();

    'skeletons: for skeleton in &plan.template.step_skeletons {
        // Skeletons are validated when the catalog loads.
        let Ok(segments) = skeleton.segments() else {
            continue;
        };

        let mut text = String::new();
        for segment in segments {
            match segment {
                Segment::Text(t) => text.push_str(t),
                Segment::Slot(slot) => {
                    let names = slot_names(plan, slot);
                    if names.is_empty() {
                        continue 'skeletons;
                    }
                    text.push_str(&names.join(", "));
                }
            }
        }
        steps.push(text);
    }

    steps
}

fn title_case(s: &str) -> String {
    s.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// The main ingredient is the pantry protein if there is one, else the first
/// pantry ingredient, else whatever came first.
fn recipe_name(plan: &TechniquePlan) -> String {
    let ingredients = plan.assignments.iter().flat_map(|a| a.ingredients.iter());
    let pantry_protein = plan.assignment(Role::Protein).and_then(|a| {
        a.ingredients
            .iter()
            .find(|i| i.source == IngredientSource::Pantry)
    });
    let main = pantry_protein
        .or_else(|| {
            ingredients
                .clone()
                .find(|i| i.source == IngredientSource::Pantry)
        })
        .or_else(|| ingredients.clone().next())
        .map(|i| title_case(&i.entry.canonical_name));

    let mut name = match main {
        Some(main) => format!("{} {} {}", plan.cuisine_name, main, plan.template.name),
        None => format!("{} {}", plan.cuisine_name, plan.template.name),
    };

    if !plan.dietary_preferences.is_empty() {
        let labels: Vec<&str> = plan.dietary_preferences.iter().map(|p| p.label()).collect();
        name.push_str(&format!(" ({})", labels.join(", ")));
    }

    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::test_support::*;
    use crate::catalog::{Category, IngredientCatalogEntry, MinuteRange, Nutrition};
    use crate::composer::{AssignedIngredient, RoleAssignment};

    fn assigned(entry: IngredientCatalogEntry, source: IngredientSource) -> AssignedIngredient {
        AssignedIngredient { entry, source }
    }

    fn plan() -> TechniquePlan {
        let mut garlic = entry("garlic", Category::Vegetable, &[Role::Aromatic], &[]);
        garlic.default_unit = "clove".to_string();
        garlic.base_unit_size = 1.0;
        garlic.serving_quantity = 1.0;
        garlic.nutrition_per_unit = Nutrition {
            calories: 4.0,
            protein_g: 0.2,
            carbs_g: 1.0,
            fat_g: 0.0,
        };

        let mut tpl = template(
            "skillet",
            "test",
            vec![
                requirement(Role::Protein, 1, 2),
                requirement(Role::Aromatic, 1, 1),
                requirement(Role::Herb, 0, 1),
            ],
            &[
                "Brown {protein}",
                "Add {aromatic}",
                "Finish with {herb}",
                "Serve the {main}",
            ],
        );
        tpl.name = "Skillet".to_string();
        tpl.base_cooking_time_range_minutes = MinuteRange { low: 25, high: 40 };

        TechniquePlan {
            template: tpl.clone(),
            cuisine_id: "test".to_string(),
            cuisine_name: "Test".to_string(),
            fell_back: false,
            assignments: vec![
                RoleAssignment {
                    requirement: tpl.required_roles[0].clone(),
                    ingredients: vec![
                        assigned(
                            entry("chicken", Category::Poultry, &[Role::Protein], &[]),
                            IngredientSource::Pantry,
                        ),
                        assigned(
                            entry("pork", Category::Meat, &[Role::Protein], &[]),
                            IngredientSource::Pantry,
                        ),
                    ],
                },
                RoleAssignment {
                    requirement: tpl.required_roles[1].clone(),
                    ingredients: vec![assigned(garlic, IngredientSource::Affinity)],
                },
                RoleAssignment {
                    requirement: tpl.required_roles[2].clone(),
                    ingredients: vec![],
                },
            ],
            unverified: vec!["moon dust".to_string()],
            dietary_preferences: vec![],
            pantry_roles: 1,
            unused_pantry: 0,
        }
    }

    #[test]
    fn test_quantities_split_within_role_and_scale_with_servings() {
        let recipe = materialize(&plan(), 4).unwrap();
        let chicken = &recipe.ingredient_lines[0];
        // 100 g per serving, shared by two proteins, four servings.
        assert_eq!(chicken.quantity, 200.0);
        assert_eq!(chicken.unit, "g");
        let garlic = &recipe.ingredient_lines[2];
        assert_eq!(garlic.quantity, 4.0);
        assert_eq!(garlic.note.as_deref(), Some("not in pantry"));
    }

    #[test]
    fn test_unverified_items_listed_with_zero_nutrition() {
        let recipe = materialize(&plan(), 2).unwrap();
        let last = recipe.ingredient_lines.last().unwrap();
        assert!(last.unverified);
        assert_eq!(last.ingredient_id, None);
        assert_eq!(last.name, "moon dust");
        assert_eq!(last.quantity, 2.0);
        assert_eq!(last.unit, "portion");

        // chicken 100 g + pork 100 g + garlic 2 cloves
        assert!((recipe.nutrition.calories - (100.0 + 100.0 + 8.0)).abs() < 1e-9);
        assert!((recipe.nutrition.protein_g - (10.0 + 10.0 + 0.4)).abs() < 1e-9);
    }

    #[test]
    fn test_steps_skip_empty_roles() {
        let recipe = materialize(&plan(), 1).unwrap();
        assert_eq!(
            recipe.steps,
            vec![
                "Brown chicken, pork".to_string(),
                "Add garlic".to_string(),
                "Serve the chicken, pork".to_string(),
            ]
        );
    }

    #[test]
    fn test_cooking_time_and_difficulty() {
        let recipe = materialize(&plan(), 1).unwrap();
        // Midpoint of 25..40, three verified lines is under the baseline.
        assert_eq!(recipe.cooking_time_minutes, 32);
        // Two filled roles does not escalate.
        assert_eq!(recipe.difficulty, Difficulty::Easy);
    }

    #[test]
    fn test_extra_ingredients_add_time_and_many_roles_escalate() {
        let mut plan = plan();
        let mut roles = Vec::new();
        for (i, role) in [Role::Fat, Role::Vegetable, Role::Starch, Role::Spice]
            .into_iter()
            .enumerate()
        {
            let requirement = requirement(role, 1, 1);
            plan.template.required_roles.push(requirement.clone());
            roles.push(RoleAssignment {
                requirement,
                ingredients: vec![assigned(
                    entry(&format!("extra{i}"), Category::Other, &[role], &[]),
                    IngredientSource::Pantry,
                )],
            });
        }
        plan.assignments.extend(roles);

        let recipe = materialize(&plan, 1).unwrap();
        // 7 verified lines: two beyond the baseline.
        assert_eq!(recipe.cooking_time_minutes, 32 + 2 * MINUTES_PER_EXTRA_INGREDIENT);
        // Six filled roles.
        assert_eq!(recipe.difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_cooking_time_saturates_on_huge_ranges() {
        let mut plan = plan();
        plan.template.base_cooking_time_range_minutes = MinuteRange {
            low: u32::MAX - 1,
            high: u32::MAX,
        };
        assert_eq!(materialize(&plan, 1).unwrap().cooking_time_minutes, u32::MAX - 1);

        for i in 0..4 {
            plan.assignments[0].ingredients.push(assigned(
                entry(&format!("more{i}"), Category::Meat, &[Role::Protein], &[]),
                IngredientSource::Pantry,
            ));
        }
        assert_eq!(materialize(&plan, 1).unwrap().cooking_time_minutes, u32::MAX);
    }

    #[test]
    fn test_name_uses_first_pantry_ingredient_and_labels() {
        let mut plan = plan();
        assert_eq!(materialize(&plan, 1).unwrap().name, "Test Chicken Skillet");

        plan.dietary_preferences = vec![DietaryPreference::GlutenFree, DietaryPreference::LowFat];
        assert_eq!(
            materialize(&plan, 1).unwrap().name,
            "Test Chicken Skillet (Gluten-Free, Low-Fat)"
        );
    }

    #[test]
    fn test_zero_servings_rejected() {
        assert!(matches!(
            materialize(&plan(), 0),
            Err(SynthesisError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_deterministic() {
        let a = serde_json::to_string(&materialize(&plan(), 3).unwrap()).unwrap();
        let b = serde_json::to_string(&materialize(&plan(), 3).unwrap()).unwrap();
        assert_eq!(a, b);
    }
}
