//! FitCooker nutrition core
//!
//! Pure, I/O-free building blocks shared by the FitCooker client:
//!
//! - Ingredient normalization (`normalize`)
//! - Culinary units and conversion (`units`)
//! - BMI classification (`bmi`)
//! - Daily calorie and macro targets (`targets`)
//! - Recipe macro aggregation and per-quantity nutrients (`aggregate`)

pub mod aggregate;
pub mod bmi;
pub mod normalize;
pub mod targets;
pub mod units;

use thiserror::Error;

pub use aggregate::{nutrients_for_quantity, recipe_totals, IngredientLine, Macros, QuantityNutrients};
pub use bmi::{Bmi, BmiClass};
pub use normalize::{normalize_text, process_ingredient, standardize_unit, to_number, ProcessedIngredient, RawIngredient};
pub use targets::{ActivityLevel, BodyMetrics, Goal, MacroTargets};
pub use units::{convert, KitchenUnit, Unit};

/// Errors raised when parsing user-facing identifiers
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NutritionError {
    #[error("Unknown unit: {0}")]
    UnknownUnit(String),

    #[error("Unknown activity level: {0}")]
    UnknownActivityLevel(String),

    #[error("Unknown goal: {0}")]
    UnknownGoal(String),
}

/// Round to a fixed number of decimal places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
