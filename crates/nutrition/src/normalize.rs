//! Ingredient normalization
//!
//! Converts loosely typed records coming from external food databases or
//! user forms into a canonical [`ProcessedIngredient`]. Every function here
//! is total: bad input degrades to a safe default instead of failing.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use unicode_normalization::UnicodeNormalization;

use crate::aggregate::Macros;
use crate::units::Unit;

/// Name used when a record has no usable name
pub const UNKNOWN_INGREDIENT: &str = "ingrediente desconhecido";

static LEADING_NUMBER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[+-]?(?:\d+\.?\d*|\.\d+)(?:[eE][+-]?\d+)?").expect("valid number pattern")
});

/// Loosely typed ingredient as delivered by a food API or a form
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawIngredient {
    pub name: Value,
    pub calories: Value,
    pub protein: Value,
    pub carbs: Value,
    pub fat: Value,
    pub fiber: Value,
    pub sodium: Value,
    pub unit: Value,
    pub allergens: Vec<String>,
}

/// Canonical ingredient with guaranteed numeric and unit fields
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProcessedIngredient {
    pub name: String,
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sodium: f64,
    pub unit: Unit,
    #[serde(default)]
    pub allergens: Vec<String>,
}

impl ProcessedIngredient {
    /// Nutrient values per 100 units of the ingredient
    pub fn per_100(&self) -> Macros {
        Macros {
            calories: self.calories,
            protein: self.protein,
            carbs: self.carbs,
            fat: self.fat,
            fiber: self.fiber,
            sodium: self.sodium,
        }
    }
}

/// Lower-case, strip diacritics and drop everything except ASCII letters,
/// digits, whitespace and the characters in `keep`
pub fn normalize_text(text: &str, keep: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .filter(|c| {
            c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || keep.contains(*c)
        })
        .collect();

    folded.trim().to_string()
}

/// Coerce a JSON value to a non-negative number, falling back to zero
///
/// Strings are read like a browser's `parseFloat`: the longest leading
/// numeric prefix counts, so `"12.5 g"` yields `12.5`.
pub fn to_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => LEADING_NUMBER
            .find(s.trim_start())
            .and_then(|m| m.as_str().parse::<f64>().ok()),
        _ => None,
    };

    match parsed {
        Some(n) if n.is_finite() && n > 0.0 => n,
        _ => 0.0,
    }
}

/// Classify a free-form unit string; anything unrecognized is grams
pub fn standardize_unit(value: &Value) -> Unit {
    let Value::String(unit) = value else {
        return Unit::Grams;
    };

    let unit = unit.to_lowercase();
    if unit.contains("gram") || unit == "g" {
        Unit::Grams
    } else if unit.contains("milliliter") || unit == "ml" {
        Unit::Milliliters
    } else if unit.contains("unit") || unit == "un" {
        Unit::Units
    } else {
        Unit::Grams
    }
}

fn name_of(value: &Value) -> String {
    match value {
        Value::String(s) if !s.is_empty() => s.clone(),
        Value::Number(n) if n.as_f64() != Some(0.0) => n.to_string(),
        Value::Bool(true) => "true".to_string(),
        _ => UNKNOWN_INGREDIENT.to_string(),
    }
}

/// Normalize a raw record into a [`ProcessedIngredient`]
pub fn process_ingredient(raw: &RawIngredient) -> ProcessedIngredient {
    ProcessedIngredient {
        name: normalize_text(&name_of(&raw.name), ""),
        calories: to_number(&raw.calories),
        protein: to_number(&raw.protein),
        carbs: to_number(&raw.carbs),
        fat: to_number(&raw.fat),
        fiber: to_number(&raw.fiber),
        sodium: to_number(&raw.sodium),
        unit: standardize_unit(&raw.unit),
        allergens: raw
            .allergens
            .iter()
            .map(|allergen| normalize_text(allergen, ":"))
            .collect(),
    }
}
