//! Cleaning of free-text pantry entries.
//!
//! Turns strings like "2 Tablespoons olive oil, divided" into a bare ingredient
//! name ("olive oil") plus a normalized measurement (2 tbsp).

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

/// An amount with a canonical unit spelling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct Measurement {
    pub amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// A pantry entry split into name and optional measurement.
#[derive(Debug, Clone, PartialEq)]
pub struct PantryLine {
    pub name: String,
    /// The name before leading prep words were dropped ("ground beef").
    pub full_name: String,
    pub measurement: Option<Measurement>,
}

/// (spelling, canonical) pairs, sorted longest spelling first at runtime so
/// "tablespoons" wins over "t".
static UNITS_SORTED: LazyLock<Vec<(&'static str, &'static str)>> = LazyLock::new(|| {
    let mut units = UNITS_RAW.to_vec();
    units.sort_by(|a, b| b.0.len().cmp(&a.0.len()).then_with(|| a.0.cmp(b.0)));
    units
});

const UNITS_RAW: &[(&str, &str)] = &[
    // Volume
    ("fluid ounces", "fl oz"),
    ("fluid ounce", "fl oz"),
    ("fl oz", "fl oz"),
    ("tablespoons", "tbsp"),
    ("tablespoon", "tbsp"),
    ("tbsp", "tbsp"),
    ("tbs", "tbsp"),
    ("teaspoons", "tsp"),
    ("teaspoon", "tsp"),
    ("tsp", "tsp"),
    ("cups", "cup"),
    ("cup", "cup"),
    ("pints", "pint"),
    ("pint", "pint"),
    ("quarts", "quart"),
    ("quart", "quart"),
    ("milliliters", "ml"),
    ("milliliter", "ml"),
    ("ml", "ml"),
    ("liters", "l"),
    ("liter", "l"),
    ("litres", "l"),
    ("litre", "l"),
    // Weight
    ("ounces", "oz"),
    ("ounce", "oz"),
    ("oz", "oz"),
    ("pounds", "lb"),
    ("pound", "lb"),
    ("lbs", "lb"),
    ("lb", "lb"),
    ("kilograms", "kg"),
    ("kilogram", "kg"),
    ("kg", "kg"),
    ("grams", "g"),
    ("gram", "g"),
    ("g", "g"),
    // Count
    ("cloves", "clove"),
    ("clove", "clove"),
    ("bunches", "bunch"),
    ("bunch", "bunch"),
    ("handfuls", "handful"),
    ("handful", "handful"),
    ("stalks", "stalk"),
    ("stalk", "stalk"),
    ("slices", "slice"),
    ("slice", "slice"),
    ("pieces", "piece"),
    ("piece", "piece"),
    ("cans", "can"),
    ("can", "can"),
    ("pinches", "pinch"),
    ("pinch", "pinch"),
    ("heads", "head"),
    ("head", "head"),
    ("inch", "inch"),
    ("large", "large"),
    ("medium", "medium"),
    ("small", "small"),
];

/// Leading words that describe preparation rather than the ingredient.
const PREP_WORDS: &[&str] = &[
    "chopped", "minced", "sliced", "diced", "grated", "fresh", "dried", "frozen", "cooked",
    "raw", "whole", "ground", "crushed", "peeled", "shredded", "toasted", "roasted",
];

/// Lowercase, trim, and collapse internal whitespace.
pub fn normalize_key(s: &str) -> String {
    s.split_whitespace()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Naive singular form: "tomatoes" -> "tomato", "onions" -> "onion".
/// Returns None when the word does not look plural.
pub fn singularize(key: &str) -> Option<String> {
    if key.ends_with("ss") || key.len() < 4 {
        return None;
    }
    if let Some(stem) = key.strip_suffix("oes") {
        return Some(format!("{stem}o"));
    }
    if let Some(stem) = key.strip_suffix("ies") {
        return Some(format!("{stem}y"));
    }
    key.strip_suffix('s').map(str::to_string)
}

/// Split a raw pantry entry into its ingredient name and measurement.
pub fn parse_pantry_line(raw: &str) -> PantryLine {
    let mut text = normalize_key(raw);

    // Everything after the first comma is a preparation note.
    if let Some(idx) = text.find(',') {
        text.truncate(idx);
        text = text.trim_end().to_string();
    }

    let mut measurement = None;
    if let Some((amount, rest)) = take_amount(&text) {
        let (unit, rest) = match take_unit(rest) {
            Some((unit, rest)) => (Some(unit.to_string()), rest),
            None => (None, rest),
        };
        measurement = Some(Measurement { amount, unit });
        text = rest.trim().to_string();
    }

    let full_name = text;
    let mut words: Vec<&str> = full_name.split(' ').filter(|w| !w.is_empty()).collect();
    while words.len() > 1 && words.first().is_some_and(|w| PREP_WORDS.contains(w)) {
        words.remove(0);
    }
    if words.first() == Some(&"of") && words.len() > 1 {
        words.remove(0);
    }

    let name = words.join(" ");
    PantryLine {
        name,
        full_name,
        measurement,
    }
}

/// Parse a leading amount: "2", "1.5", "1/2", "1 1/2", "½", "1½".
fn take_amount(text: &str) -> Option<(f64, &str)> {
    let (first, rest) = split_word(text);
    let mut amount = parse_number(first)?;
    let mut rest = rest;

    // Mixed number: whole part followed by a fraction word.
    if first.chars().all(|c| c.is_ascii_digit()) {
        let (next, after) = split_word(rest);
        if next.contains('/') || (!next.is_empty() && next.chars().all(is_vulgar_fraction)) {
            if let Some(frac) = parse_number(next) {
                amount += frac;
                rest = after;
            }
        }
    }

    Some((amount, rest))
}

fn split_word(text: &str) -> (&str, &str) {
    let text = text.trim_start();
    match text.find(' ') {
        Some(idx) => (&text[..idx], &text[idx + 1..]),
        None => (text, ""),
    }
}

fn is_vulgar_fraction(c: char) -> bool {
    vulgar_value(c).is_some()
}

fn vulgar_value(c: char) -> Option<f64> {
    match c {
        '½' => Some(0.5),
        '⅓' => Some(1.0 / 3.0),
        '⅔' => Some(2.0 / 3.0),
        '¼' => Some(0.25),
        '¾' => Some(0.75),
        '⅛' => Some(0.125),
        _ => None,
    }
}

fn parse_number(word: &str) -> Option<f64> {
    if word.is_empty() {
        return None;
    }

    if let Some((num, den)) = word.split_once('/') {
        let num: f64 = num.parse().ok()?;
        let den: f64 = den.parse().ok()?;
        if den == 0.0 {
            return None;
        }
        return Some(num / den);
    }

    // Trailing unicode fraction, e.g. "1½" or "½".
    let mut chars = word.chars();
    if let Some(last) = chars.next_back() {
        if let Some(frac) = vulgar_value(last) {
            let whole = chars.as_str();
            if whole.is_empty() {
                return Some(frac);
            }
            return whole.parse::<f64>().ok().map(|w| w + frac);
        }
    }

    let value: f64 = word.parse().ok()?;
    value.is_finite().then_some(value)
}

/// Match a unit word at the start of `text` (which is already lowercase).
fn take_unit(text: &str) -> Option<(&'static str, &str)> {
    let text = text.trim_start();
    for &(spelling, canonical) in UNITS_SORTED.iter() {
        if let Some(rest) = text.strip_prefix(spelling) {
            // Must end on a word boundary; "g" must not eat "garlic".
            let rest = rest.strip_prefix('.').unwrap_or(rest);
            if rest.is_empty() || rest.starts_with(' ') {
                return Some((canonical, rest));
            }
        }
    }
    None
}
