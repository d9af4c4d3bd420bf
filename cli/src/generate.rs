//! Offline recipe generation and pantry normalization.

use crate::catalog;
use anyhow::Result;
use larder_core::composer::TemplateRejection;
use larder_core::dietary::DietaryConstraintSet;
use larder_core::engine::{RecipeSynthesizer, SynthesisRequest};
use larder_core::error::SynthesisError;
use std::fmt::Write;
use std::path::Path;
use std::process::ExitCode;

/// Exit code when no template can be filled under the constraints.
const EXIT_NO_FEASIBLE_RECIPE: u8 = 2;

pub fn generate(
    ingredients: Vec<String>,
    cuisine: Option<String>,
    diets: Vec<String>,
    servings: Option<u32>,
    catalog_path: Option<&Path>,
) -> Result<ExitCode> {
    let synthesizer = RecipeSynthesizer::from_snapshot(catalog::load(catalog_path)?);
    let request = SynthesisRequest {
        ingredients,
        cuisine,
        dietary_preferences: diets,
        servings,
    };

    match synthesizer.synthesize(&request) {
        Ok(recipe) => {
            println!("{}", serde_json::to_string_pretty(&recipe)?);
            Ok(ExitCode::SUCCESS)
        }
        Err(SynthesisError::NoFeasibleTemplate {
            cuisine,
            constraints,
            rejections,
        }) => {
            eprint!("{}", infeasible_report(&cuisine, &constraints, &rejections));
            Ok(ExitCode::from(EXIT_NO_FEASIBLE_RECIPE))
        }
        Err(e) => Err(e.into()),
    }
}

pub fn normalize(names: &[String], catalog_path: Option<&Path>) -> Result<()> {
    let synthesizer = RecipeSynthesizer::from_snapshot(catalog::load(catalog_path)?);
    let items = synthesizer.normalize(names);
    println!("{}", serde_json::to_string_pretty(&items)?);
    Ok(())
}

/// Human-readable explanation of which roles could not be filled.
fn infeasible_report(
    cuisine: &str,
    constraints: &DietaryConstraintSet,
    rejections: &[TemplateRejection],
) -> String {
    let mut report = format!("No feasible recipe for cuisine {cuisine}\n");

    if !constraints.is_empty() {
        let categories: Vec<&str> = constraints
            .excluded_categories
            .iter()
            .map(|c| c.as_str())
            .collect();
        let _ = writeln!(report, "Excluded categories: {}", categories.join(", "));
    }

    for rejection in rejections {
        let _ = writeln!(
            report,
            "  {}: needs {} {}, found {}",
            rejection.template_id, rejection.required, rejection.role, rejection.available
        );
    }

    report
}
