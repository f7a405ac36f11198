//! Culinary units and the gram-equivalence conversion table

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::NutritionError;

/// Base unit a catalog ingredient is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Unit {
    #[default]
    #[serde(rename = "g")]
    Grams,
    #[serde(rename = "ml")]
    Milliliters,
    #[serde(rename = "un")]
    Units,
}

impl Unit {
    /// Short form stored in the `unidade_padrao` column
    pub fn as_str(&self) -> &'static str {
        match self {
            Unit::Grams => "g",
            Unit::Milliliters => "ml",
            Unit::Units => "un",
        }
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Kitchen measures accepted by the converter and the nutrient calculator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KitchenUnit {
    Gram,
    Kilogram,
    Milligram,
    Milliliter,
    Liter,
    Cup,
    CupFlour,
    CupSugar,
    Tablespoon,
    Teaspoon,
}

impl KitchenUnit {
    pub const ALL: [KitchenUnit; 10] = [
        KitchenUnit::Gram,
        KitchenUnit::Kilogram,
        KitchenUnit::Milligram,
        KitchenUnit::Milliliter,
        KitchenUnit::Liter,
        KitchenUnit::Cup,
        KitchenUnit::CupFlour,
        KitchenUnit::CupSugar,
        KitchenUnit::Tablespoon,
        KitchenUnit::Teaspoon,
    ];

    /// Grams (or millilitres, taken as equal) in one of this unit
    pub fn grams(&self) -> f64 {
        match self {
            KitchenUnit::Gram => 1.0,
            KitchenUnit::Kilogram => 1000.0,
            KitchenUnit::Milligram => 0.001,
            KitchenUnit::Milliliter => 1.0,
            KitchenUnit::Liter => 1000.0,
            KitchenUnit::Cup => 120.0,
            KitchenUnit::CupFlour => 120.0,
            KitchenUnit::CupSugar => 200.0,
            KitchenUnit::Tablespoon => 15.0,
            KitchenUnit::Teaspoon => 5.0,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            KitchenUnit::Gram => "g",
            KitchenUnit::Kilogram => "kg",
            KitchenUnit::Milligram => "mg",
            KitchenUnit::Milliliter => "ml",
            KitchenUnit::Liter => "liter",
            KitchenUnit::Cup => "cup",
            KitchenUnit::CupFlour => "cup-flour",
            KitchenUnit::CupSugar => "cup-sugar",
            KitchenUnit::Tablespoon => "tablespoon",
            KitchenUnit::Teaspoon => "teaspoon",
        }
    }

    /// Plural label used when printing a conversion result
    pub fn label(&self) -> &'static str {
        match self {
            KitchenUnit::Gram => "grams",
            KitchenUnit::Kilogram => "kilograms",
            KitchenUnit::Milligram => "milligrams",
            KitchenUnit::Milliliter => "ml",
            KitchenUnit::Liter => "liters",
            KitchenUnit::Cup => "cups",
            KitchenUnit::CupFlour => "cups (flour)",
            KitchenUnit::CupSugar => "cups (sugar)",
            KitchenUnit::Tablespoon => "tablespoons",
            KitchenUnit::Teaspoon => "teaspoons",
        }
    }
}

impl fmt::Display for KitchenUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for KitchenUnit {
    type Err = NutritionError;

    // Portuguese keys are the ones stored by recipe forms.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unit = match s.trim().to_lowercase().as_str() {
            "g" | "gram" | "grams" | "grama" | "gramas" => KitchenUnit::Gram,
            "kg" | "kilogram" | "kilograms" | "quilograma" | "quilogramas" => KitchenUnit::Kilogram,
            "mg" | "milligram" | "milligrams" => KitchenUnit::Milligram,
            "ml" | "milliliter" | "milliliters" | "mililitro" | "mililitros" => {
                KitchenUnit::Milliliter
            }
            "l" | "liter" | "liters" | "litre" | "litro" | "litros" => KitchenUnit::Liter,
            "cup" | "xicara" | "xícara" => KitchenUnit::Cup,
            "cup-flour" | "xicara-farinha" => KitchenUnit::CupFlour,
            "cup-sugar" | "xicara-acucar" => KitchenUnit::CupSugar,
            "tablespoon" | "tbsp" | "colher-sopa" | "colher de sopa" => KitchenUnit::Tablespoon,
            "teaspoon" | "tsp" | "colher-cha" | "colher de chá" | "colher de cha" => {
                KitchenUnit::Teaspoon
            }
            _ => return Err(NutritionError::UnknownUnit(s.to_string())),
        };
        Ok(unit)
    }
}

/// Convert `value` between two kitchen units through their gram equivalents
pub fn convert(value: f64, from: KitchenUnit, to: KitchenUnit) -> f64 {
    value * from.grams() / to.grams()
}
