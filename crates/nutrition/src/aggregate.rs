//! Macro aggregation for recipes and single portions

use std::iter::Sum;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

use crate::round_to;
use crate::units::KitchenUnit;

/// Calories plus macro and micro nutrients tracked by recipes
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Macros {
    pub calories: f64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
    pub fiber: f64,
    pub sodium: f64,
}

impl Macros {
    /// Multiply every field by `factor`
    pub fn scale(&self, factor: f64) -> Self {
        Self {
            calories: self.calories * factor,
            protein: self.protein * factor,
            carbs: self.carbs * factor,
            fat: self.fat * factor,
            fiber: self.fiber * factor,
            sodium: self.sodium * factor,
        }
    }
}

impl Add for Macros {
    type Output = Macros;

    fn add(self, rhs: Macros) -> Macros {
        Macros {
            calories: self.calories + rhs.calories,
            protein: self.protein + rhs.protein,
            carbs: self.carbs + rhs.carbs,
            fat: self.fat + rhs.fat,
            fiber: self.fiber + rhs.fiber,
            sodium: self.sodium + rhs.sodium,
        }
    }
}

impl AddAssign for Macros {
    fn add_assign(&mut self, rhs: Macros) {
        *self = *self + rhs;
    }
}

impl Sum for Macros {
    fn sum<I: Iterator<Item = Macros>>(iter: I) -> Macros {
        iter.fold(Macros::default(), Add::add)
    }
}

/// One ingredient line of a recipe draft
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct IngredientLine {
    pub name: String,
    pub quantity: f64,
    pub unit: String,
    /// Nutrients per 100 g/ml of the ingredient
    pub per_100: Macros,
}

impl IngredientLine {
    /// Nutrients contributed by this line; the quantity is read as grams
    pub fn contribution(&self) -> Macros {
        self.per_100.scale(self.quantity / 100.0)
    }

    /// Whether the line is persisted with the recipe
    pub fn is_filled(&self) -> bool {
        !self.name.trim().is_empty() && self.quantity > 0.0
    }
}

/// Total macros of a recipe: the plain sum of every line's contribution
pub fn recipe_totals(lines: &[IngredientLine]) -> Macros {
    lines.iter().map(IngredientLine::contribution).sum()
}

/// Nutrients for a quantity of an ingredient
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct QuantityNutrients {
    pub calories: i64,
    pub protein: f64,
    pub carbs: f64,
    pub fat: f64,
}

/// Scale per-100 g values to `quantity` of `unit`
///
/// Unknown units count as grams. Calories are rounded to whole numbers,
/// macros to one decimal.
pub fn nutrients_for_quantity(per_100: &Macros, quantity: f64, unit: &str) -> QuantityNutrients {
    let grams_per_unit = unit
        .parse::<KitchenUnit>()
        .map(|u| u.grams())
        .unwrap_or(1.0);
    let factor = quantity * grams_per_unit / 100.0;

    QuantityNutrients {
        calories: (per_100.calories * factor).round() as i64,
        protein: round_to(per_100.protein * factor, 1),
        carbs: round_to(per_100.carbs * factor, 1),
        fat: round_to(per_100.fat * factor, 1),
    }
}
