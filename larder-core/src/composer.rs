//! Candidate composer: pick a technique template and fill its roles.
//!
//! Every candidate template gets an all-or-nothing role assignment. Pantry
//! ingredients that satisfy the dietary constraints are assigned first; roles
//! still below their minimum are backfilled from the cuisine's affinity list.
//! Feasible candidates are ranked by how much of the pantry they use.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{
    CatalogSnapshot, CuisineProfile, IngredientCatalogEntry, Role, RoleRequirement,
    TechniqueTemplate,
};
use crate::dietary::{DietaryConstraintSet, DietaryPreference};
use crate::error::SynthesisError;
use crate::normalizer::PantryItem;

/// Where an assigned ingredient came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
#[serde(rename_all = "snake_case")]
pub enum IngredientSource {
    Pantry,
    Affinity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignedIngredient {
    pub entry: IngredientCatalogEntry,
    pub source: IngredientSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RoleAssignment {
    pub requirement: RoleRequirement,
    pub ingredients: Vec<AssignedIngredient>,
}

impl RoleAssignment {
    fn filled_from_pantry(&self) -> bool {
        !self.ingredients.is_empty()
            && self
                .ingredients
                .iter()
                .all(|i| i.source == IngredientSource::Pantry)
    }
}

/// Why a template could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct TemplateRejection {
    pub template_id: String,
    pub role: Role,
    pub required: u32,
    pub available: u32,
}

/// A fully assigned template, ready to materialize.
///
/// Owns copies of everything it references so materializing needs no catalog.
#[derive(Debug, Clone, PartialEq)]
pub struct TechniquePlan {
    pub template: TechniqueTemplate,
    pub cuisine_id: String,
    pub cuisine_name: String,
    /// True when the requested cuisine was missing or unknown.
    pub fell_back: bool,
    /// In template declaration order.
    pub assignments: Vec<RoleAssignment>,
    /// Display names of pantry items the catalog could not resolve.
    pub unverified: Vec<String>,
    /// Labels echoed into the recipe name.
    pub dietary_preferences: Vec<DietaryPreference>,
    pub pantry_roles: usize,
    pub unused_pantry: usize,
}

impl TechniquePlan {
    pub fn assignment(&self, role: Role) -> Option<&RoleAssignment> {
        self.assignments.iter().find(|a| a.requirement.role == role)
    }

    pub fn filled_role_count(&self) -> usize {
        self.assignments
            .iter()
            .filter(|a| !a.ingredients.is_empty())
            .count()
    }
}

struct Candidate {
    assignments: Vec<RoleAssignment>,
    pantry_roles: usize,
    unused_pantry: usize,
}

/// Choose the best feasible template for the pantry.
///
/// An unknown or absent `cuisine` falls back to every template of every
/// cuisine, each backfilled from its own cuisine's affinity list.
pub fn compose(
    pantry: &[PantryItem],
    cuisine: Option<&str>,
    constraints: &DietaryConstraintSet,
    catalog: &CatalogSnapshot,
) -> Result<TechniquePlan, SynthesisError> {
    let requested = cuisine.map(str::trim).filter(|c| !c.is_empty());

    let (candidates, fell_back): (Vec<(&CuisineProfile, &TechniqueTemplate)>, bool) =
        match requested.and_then(|c| catalog.cuisine(c)) {
            Some(profile) => (
                profile
                    .technique_templates
                    .iter()
                    .map(|t| (profile, t))
                    .collect(),
                false,
            ),
            None => {
                if let Some(name) = requested {
                    tracing::warn!(cuisine = name, "unknown cuisine, using all templates");
                }
                (
                    catalog
                        .cuisines()
                        .iter()
                        .flat_map(|p| p.technique_templates.iter().map(move |t| (p, t)))
                        .collect(),
                    true,
                )
            }
        };

    let mut seen = HashSet::new();
    let mut usable: Vec<&IngredientCatalogEntry> = Vec::new();
    let mut unverified = Vec::new();
    for item in pantry {
        match item.ingredient_id.as_deref().and_then(|id| catalog.ingredient(id)) {
            Some(entry) => {
                if !seen.insert(entry.id.as_str()) {
                    continue;
                }
                if constraints.permits(entry) {
                    usable.push(entry);
                } else {
                    tracing::debug!(ingredient = %entry.id, "pantry item excluded by dietary constraints");
                }
            }
            None => unverified.push(item.display_name()),
        }
    }

    let mut best: Option<(usize, &CuisineProfile, &TechniqueTemplate, Candidate)> = None;
    let mut rejections = Vec::new();

    for (index, &(profile, template)) in candidates.iter().enumerate() {
        let candidate = match assign_roles(template, profile, &usable, constraints, catalog) {
            Ok(c) => c,
            Err(rejection) => {
                tracing::debug!(
                    template = %template.id,
                    role = %rejection.role,
                    required = rejection.required,
                    available = rejection.available,
                    "template infeasible"
                );
                rejections.push(rejection);
                continue;
            }
        };

        let better = match &best {
            None => true,
            Some((best_index, _, _, current)) => {
                rank(&candidate, index, current, *best_index) == Ordering::Less
            }
        };
        if better {
            best = Some((index, profile, template, candidate));
        }
    }

    let Some((_, profile, template, candidate)) = best else {
        return Err(SynthesisError::NoFeasibleTemplate {
            cuisine: requested.unwrap_or_default().to_string(),
            constraints: constraints.clone(),
            rejections,
        });
    };

    tracing::debug!(
        template = %template.id,
        pantry_roles = candidate.pantry_roles,
        unused_pantry = candidate.unused_pantry,
        "selected template"
    );

    Ok(TechniquePlan {
        template: template.clone(),
        cuisine_id: profile.id.clone(),
        cuisine_name: profile.name.clone(),
        fell_back,
        assignments: candidate.assignments,
        unverified,
        dietary_preferences: Vec::new(),
        pantry_roles: candidate.pantry_roles,
        unused_pantry: candidate.unused_pantry,
    })
}

/// More pantry-filled roles first, then fewer unused pantry items, then declaration order.
fn rank(a: &Candidate, a_index: usize, b: &Candidate, b_index: usize) -> Ordering {
    b.pantry_roles
        .cmp(&a.pantry_roles)
        .then(a.unused_pantry.cmp(&b.unused_pantry))
        .then(a_index.cmp(&b_index))
}

fn assign_roles(
    template: &TechniqueTemplate,
    profile: &CuisineProfile,
    pantry: &[&IngredientCatalogEntry],
    constraints: &DietaryConstraintSet,
    catalog: &CatalogSnapshot,
) -> Result<Candidate, TemplateRejection> {
    let affinity: Vec<&IngredientCatalogEntry> = profile
        .affinity_ingredient_ids
        .iter()
        .filter_map(|id| catalog.ingredient(id))
        .filter(|e| constraints.permits(e))
        .collect();

    let eligible = |role: Role, pool: &[&IngredientCatalogEntry]| {
        pool.iter().filter(|e| e.roles.contains(&role)).count()
    };

    // Scarce roles pick first so common ingredients don't starve them.
    let mut order: Vec<usize> = (0..template.required_roles.len()).collect();
    order.sort_by_key(|&i| {
        let role = template.required_roles[i].role;
        let from_pantry = eligible(role, pantry);
        (from_pantry + eligible(role, affinity.as_slice()), from_pantry, i)
    });

    let mut used: HashSet<&str> = HashSet::new();
    let mut assigned: Vec<Vec<AssignedIngredient>> = vec![Vec::new(); template.required_roles.len()];

    for &i in &order {
        let requirement = &template.required_roles[i];
        let min = requirement.range.min as usize;
        let max = requirement.range.max as usize;
        let slot = &mut assigned[i];

        for entry in pantry {
            if slot.len() >= max {
                break;
            }
            if entry.roles.contains(&requirement.role) && used.insert(entry.id.as_str()) {
                slot.push(AssignedIngredient {
                    entry: (*entry).clone(),
                    source: IngredientSource::Pantry,
                });
            }
        }

        for entry in &affinity {
            if slot.len() >= min {
                break;
            }
            if entry.roles.contains(&requirement.role) && used.insert(entry.id.as_str()) {
                slot.push(AssignedIngredient {
                    entry: (*entry).clone(),
                    source: IngredientSource::Affinity,
                });
            }
        }

        if slot.len() < min {
            return Err(TemplateRejection {
                template_id: template.id.clone(),
                role: requirement.role,
                required: requirement.range.min,
                available: slot.len() as u32,
            });
        }
    }

    let assignments: Vec<RoleAssignment> = template
        .required_roles
        .iter()
        .cloned()
        .zip(assigned)
        .map(|(requirement, ingredients)| RoleAssignment {
            requirement,
            ingredients,
        })
        .collect();

    let pantry_roles = assignments.iter().filter(|a| a.filled_from_pantry()).count();
    let pantry_used = pantry
        .iter()
        .filter(|e| used.contains(e.id.as_str()))
        .count();

    Ok(Candidate {
        assignments,
        pantry_roles,
        unused_pantry: pantry.len() - pantry_used,
    })
}
