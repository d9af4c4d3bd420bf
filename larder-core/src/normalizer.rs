//! Pantry normalizer: raw ingredient strings to catalog references.
//!
//! Exact alias matches win outright. They are tried against the whole entry,
//! then the entry without its measurement, then the name with leading prep
//! words dropped, so "fresh coriander" stays an alias of its own and is not
//! read as "coriander". Otherwise every alias is scored with a
//! string-similarity measure and the best one is accepted only above
//! [`MATCH_THRESHOLD`]. Unknown input is never dropped: it comes back
//! unresolved with confidence 0.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::catalog::{CatalogSnapshot, IngredientCatalogEntry};
use crate::pantry_text::{normalize_key, parse_pantry_line, singularize, Measurement};

/// A fuzzy match must score strictly above this to be accepted.
pub const MATCH_THRESHOLD: f64 = 0.6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct PantryItem {
    /// The caller's text, verbatim.
    pub raw_text: String,
    pub ingredient_id: Option<String>,
    /// 1.0 for exact alias matches, the similarity score for fuzzy ones, 0 when unresolved.
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_alias: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub measurement: Option<Measurement>,
}

impl PantryItem {
    pub fn is_resolved(&self) -> bool {
        self.ingredient_id.is_some()
    }

    /// The cleaned name used for display when the item is unresolved.
    pub fn display_name(&self) -> String {
        let parsed = parse_pantry_line(&self.raw_text);
        if parsed.name.is_empty() {
            self.raw_text.trim().to_string()
        } else {
            parsed.name
        }
    }
}

/// Resolve each raw name against the catalog. Output order matches input order.
pub fn normalize<S: AsRef<str>>(raw_names: &[S], catalog: &CatalogSnapshot) -> Vec<PantryItem> {
    raw_names
        .iter()
        .map(|raw| normalize_one(raw.as_ref(), catalog))
        .collect()
}

fn normalize_one(raw: &str, catalog: &CatalogSnapshot) -> PantryItem {
    let line = parse_pantry_line(raw);
    let candidates = [normalize_key(raw), line.full_name.clone(), line.name.clone()];

    let resolved = candidates
        .iter()
        .find_map(|key| exact_match(key, catalog))
        .or_else(|| fuzzy_match(&line.name, catalog));

    match resolved {
        Some((entry, alias, confidence)) => PantryItem {
            raw_text: raw.to_string(),
            ingredient_id: Some(entry.id.clone()),
            confidence,
            matched_alias: Some(alias),
            measurement: line.measurement,
        },
        None => {
            tracing::debug!(raw = raw, "pantry item did not match the catalog");
            PantryItem {
                raw_text: raw.to_string(),
                ingredient_id: None,
                confidence: 0.0,
                matched_alias: None,
                measurement: line.measurement,
            }
        }
    }
}

/// Alias lookup on the key or its singular form.
fn exact_match<'a>(
    key: &str,
    catalog: &'a CatalogSnapshot,
) -> Option<(&'a IngredientCatalogEntry, String, f64)> {
    if key.is_empty() {
        return None;
    }
    if let Some(entry) = catalog.by_alias(key) {
        return Some((entry, key.to_string(), 1.0));
    }
    let singular = singularize(key)?;
    catalog
        .by_alias(&singular)
        .map(|entry| (entry, singular, 1.0))
}

fn fuzzy_match<'a>(
    name: &str,
    catalog: &'a CatalogSnapshot,
) -> Option<(&'a IngredientCatalogEntry, String, f64)> {
    let key = normalize_key(name);
    if key.is_empty() {
        return None;
    }

    let mut best: Option<(&IngredientCatalogEntry, String, f64)> = None;
    for (alias, entry) in catalog.alias_keys() {
        let score = similarity(&key, &alias);
        // Strictly greater keeps the earliest entry on ties.
        if best.as_ref().is_none_or(|(_, _, s)| score > *s) {
            best = Some((entry, alias, score));
        }
    }

    best.filter(|(_, _, score)| *score > MATCH_THRESHOLD)
        .map(|(entry, alias, score)| (entry, alias, score.clamp(0.0, 1.0)))
}

/// Max of normalized edit distance and token-set overlap, in [0, 1].
pub fn similarity(a: &str, b: &str) -> f64 {
    let edit = strsim::normalized_levenshtein(a, b);
    edit.max(token_overlap(a, b))
}

fn token_overlap(a: &str, b: &str) -> f64 {
    let tokens = |s: &str| -> BTreeSet<String> {
        s.split_whitespace()
            .map(|t| singularize(t).unwrap_or_else(|| t.to_string()))
            .collect()
    };
    let a = tokens(a);
    let b = tokens(b);
    let union = a.union(&b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(&b).count() as f64 / union as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CatalogSnapshot {
        CatalogSnapshot::builtin().unwrap()
    }

    #[test]
    fn test_one_item_per_input_in_order() {
        let items = normalize(&["chicken", "xyzzy", "rice"], &catalog());
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].raw_text, "chicken");
        assert_eq!(items[1].raw_text, "xyzzy");
        assert_eq!(items[2].raw_text, "rice");
    }

    #[test]
    fn test_exact_alias_confidence_is_one() {
        let items = normalize(&["Chicken", "  TOMATO "], &catalog());
        assert_eq!(items[0].ingredient_id.as_deref(), Some("chicken"));
        assert_eq!(items[0].confidence, 1.0);
        assert_eq!(items[1].ingredient_id.as_deref(), Some("tomato"));
        assert_eq!(items[1].confidence, 1.0);
    }

    #[test]
    fn test_alias_with_prep_word_wins_over_stripped_name() {
        let catalog = catalog();
        assert_eq!(
            catalog.by_alias("fresh coriander").map(|e| e.id.as_str()),
            Some("cilantro")
        );

        let items = normalize(&["fresh coriander", "Fresh Coriander", "coriander"], &catalog);
        assert_eq!(items[0].ingredient_id.as_deref(), Some("cilantro"));
        assert_eq!(items[0].matched_alias.as_deref(), Some("fresh coriander"));
        assert_eq!(items[0].confidence, 1.0);
        assert_eq!(items[1].ingredient_id.as_deref(), Some("cilantro"));
        assert_eq!(items[2].ingredient_id.as_deref(), Some("coriander"));
    }

    #[test]
    fn test_alias_after_measurement_is_exact() {
        let items = normalize(&["½ lb ground beef", "2 tbsp toasted sesame oil"], &catalog());
        assert_eq!(items[0].ingredient_id.as_deref(), Some("beef"));
        assert_eq!(items[0].matched_alias.as_deref(), Some("ground beef"));
        assert_eq!(items[1].ingredient_id.as_deref(), Some("sesame_oil"));
        assert_eq!(items[1].matched_alias.as_deref(), Some("toasted sesame oil"));
        assert_eq!(items[1].confidence, 1.0);
    }

    #[test]
    fn test_plural_counts_as_exact() {
        let items = normalize(&["tomatoes"], &catalog());
        assert_eq!(items[0].ingredient_id.as_deref(), Some("tomato"));
        assert_eq!(items[0].confidence, 1.0);
    }

    #[test]
    fn test_fuzzy_match_below_one() {
        let items = normalize(&["chiken"], &catalog());
        assert_eq!(items[0].ingredient_id.as_deref(), Some("chicken"));
        assert!(items[0].confidence > MATCH_THRESHOLD);
        assert!(items[0].confidence < 1.0);
    }

    #[test]
    fn test_unknown_kept_verbatim() {
        let items = normalize(&["Dragon Fruit Jam!"], &catalog());
        assert_eq!(items[0].ingredient_id, None);
        assert_eq!(items[0].confidence, 0.0);
        assert_eq!(items[0].raw_text, "Dragon Fruit Jam!");
    }

    #[test]
    fn test_measurement_is_carried() {
        let items = normalize(&["2 cups rice"], &catalog());
        assert_eq!(items[0].ingredient_id.as_deref(), Some("rice"));
        let measurement = items[0].measurement.as_ref().unwrap();
        assert_eq!(measurement.amount, 2.0);
        assert_eq!(measurement.unit.as_deref(), Some("cup"));
    }

    #[test]
    fn test_blank_is_unresolved() {
        let items = normalize(&["   ", "3"], &catalog());
        assert!(items.iter().all(|i| !i.is_resolved() && i.confidence == 0.0));
    }

    #[test]
    fn test_confidence_always_in_unit_interval() {
        let inputs = [
            "chicken", "chiken", "garlic cloves", "evoo", "parm", "", "a", "basil leaves",
            "red onion", "soy", "qqqq",
        ];
        for item in normalize(&inputs, &catalog()) {
            assert!(
                (0.0..=1.0).contains(&item.confidence),
                "{}: {}",
                item.raw_text,
                item.confidence
            );
        }
    }

    #[test]
    fn test_similarity_bounds() {
        assert_eq!(similarity("olive oil", "olive oil"), 1.0);
        assert_eq!(similarity("oil olive", "olive oil"), 1.0);
        assert!(similarity("tofu", "tomato") < MATCH_THRESHOLD);
    }
}
