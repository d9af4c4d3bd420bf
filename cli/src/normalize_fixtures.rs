//! CLI command for normalizer golden fixture management.

use anyhow::{Context, Result};
use larder_core::catalog::CatalogSnapshot;
use larder_core::normalizer::{normalize, PantryItem};
use larder_core::pantry_text::Measurement;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// A normalizer test case
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TestCase {
    raw: String,
    expected: ExpectedMatch,
}

/// Expected catalog match for one raw pantry string
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct ExpectedMatch {
    ingredient_id: Option<String>,
    matched_alias: Option<String>,
    exact: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    measurement: Option<Measurement>,
}

impl From<PantryItem> for ExpectedMatch {
    fn from(item: PantryItem) -> Self {
        Self {
            exact: item.confidence == 1.0,
            ingredient_id: item.ingredient_id,
            matched_alias: item.matched_alias,
            measurement: item.measurement,
        }
    }
}

/// Default path to the fixtures directory
fn default_fixtures_dir() -> PathBuf {
    PathBuf::from("larder-core/tests/fixtures/normalize")
}

/// Update all fixtures to match current normalizer output.
///
/// Runs the normalizer on each test case's `raw` input against the built-in
/// catalog and rewrites `expected` where it differs.
pub fn update_fixtures(fixtures_dir: Option<&Path>) -> Result<()> {
    let fixtures_dir = fixtures_dir
        .map(PathBuf::from)
        .unwrap_or_else(default_fixtures_dir);
    let catalog = CatalogSnapshot::builtin().context("Built-in catalog is invalid")?;

    let (updated, unchanged) = update_dir(&fixtures_dir, &catalog)?;
    println!("\nSummary: {} updated, {} unchanged", updated, unchanged);

    Ok(())
}

fn update_dir(dir: &Path, catalog: &CatalogSnapshot) -> Result<(usize, usize)> {
    let mut updated = 0;
    let mut unchanged = 0;

    let mut paths: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.extension().map(|e| e == "json").unwrap_or(false))
        .collect();
    paths.sort();

    for path in paths {
        let content = fs::read_to_string(&path)?;
        let mut test_case: TestCase = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        let actual = normalize(&[test_case.raw.as_str()], catalog)
            .into_iter()
            .next()
            .map(ExpectedMatch::from)
            .context("Normalizer returned no item")?;

        if actual != test_case.expected {
            test_case.expected = actual;
            let json = serde_json::to_string_pretty(&test_case)?;
            fs::write(&path, json + "\n")?;
            updated += 1;
            println!("Updated: {}", path.display());
        } else {
            unchanged += 1;
        }
    }

    Ok((updated, unchanged))
}
