//! Golden file tests for the pantry normalizer.
//!
//! Each JSON file in `fixtures/normalize/` holds one raw pantry string and the
//! catalog match it should produce against the built-in catalog.
//!
//! Test format:
//! ```json
//! {
//!   "raw": "2 Tablespoons olive oil, divided",
//!   "expected": {
//!     "ingredient_id": "olive_oil",
//!     "matched_alias": "olive oil",
//!     "exact": true,
//!     "measurement": { "amount": 2.0, "unit": "tbsp" }
//!   }
//! }
//! ```

use glob::glob;
use larder_core::catalog::CatalogSnapshot;
use larder_core::normalizer::{normalize, PantryItem};
use larder_core::pantry_text::Measurement;
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Deserialize)]
struct TestCase {
    raw: String,
    expected: Expected,
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
struct Expected {
    ingredient_id: Option<String>,
    matched_alias: Option<String>,
    /// True when the match should have confidence exactly 1.
    exact: bool,
    #[serde(default)]
    measurement: Option<Measurement>,
}

impl From<PantryItem> for Expected {
    fn from(item: PantryItem) -> Self {
        Self {
            exact: item.confidence == 1.0,
            ingredient_id: item.ingredient_id,
            matched_alias: item.matched_alias,
            measurement: item.measurement,
        }
    }
}

fn load_test_cases() -> Vec<(String, TestCase)> {
    let pattern = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/normalize/*.json");
    let pattern_str = pattern.to_string_lossy();

    let mut cases = Vec::new();
    for entry in glob(&pattern_str).expect("Failed to read glob pattern") {
        let path = entry.expect("Failed to read directory entry");
        let name = path.file_stem().unwrap().to_string_lossy().into_owned();
        let content = fs::read_to_string(&path)
            .unwrap_or_else(|e| panic!("Failed to read {}: {}", path.display(), e));
        let case: TestCase = serde_json::from_str(&content)
            .unwrap_or_else(|e| panic!("Failed to parse {}: {}", path.display(), e));
        cases.push((name, case));
    }

    cases.sort_by(|a, b| a.0.cmp(&b.0));
    cases
}

#[test]
fn test_normalize_golden_files() {
    let cases = load_test_cases();
    assert!(!cases.is_empty(), "no normalizer fixtures found");

    let catalog = CatalogSnapshot::builtin().unwrap();
    let raws: Vec<&str> = cases.iter().map(|(_, case)| case.raw.as_str()).collect();
    let items = normalize(&raws, &catalog);
    assert_eq!(items.len(), cases.len());

    let mut failures = Vec::new();
    for ((name, case), item) in cases.iter().zip(items) {
        assert_eq!(item.raw_text, case.raw, "{name}: raw text must be kept verbatim");
        assert!(
            (0.0..=1.0).contains(&item.confidence),
            "{name}: confidence {} out of range",
            item.confidence
        );

        let actual = Expected::from(item);
        if actual != case.expected {
            failures.push((name.clone(), case.raw.clone(), case.expected.clone(), actual));
        }
    }

    if !failures.is_empty() {
        let mut msg = format!(
            "\n{} failures across {} tests:\n",
            failures.len(),
            cases.len()
        );

        for (name, raw, expected, actual) in &failures {
            msg.push_str(&format!("\n=== {} ===\n", name));
            msg.push_str(&format!("Input: {:?}\n", raw));
            msg.push_str(&format!("Expected: {:#?}\n", expected));
            msg.push_str(&format!("Actual:   {:#?}\n", actual));
        }

        panic!("{}", msg);
    }

    println!("All {} normalizer tests passed!", cases.len());
}
