//! Daily calorie and macro targets

use std::str::FromStr;

use serde::Serialize;

use crate::NutritionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActivityLevel {
    Sedentary,
    Light,
    Moderate,
    Intense,
    VeryIntense,
}

impl ActivityLevel {
    pub fn multiplier(&self) -> f64 {
        match self {
            ActivityLevel::Sedentary => 1.2,
            ActivityLevel::Light => 1.375,
            ActivityLevel::Moderate => 1.55,
            ActivityLevel::Intense => 1.725,
            ActivityLevel::VeryIntense => 1.9,
        }
    }
}

impl FromStr for ActivityLevel {
    type Err = NutritionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "sedentary" | "sedentario" | "sedentário" => Ok(ActivityLevel::Sedentary),
            "light" | "leve" => Ok(ActivityLevel::Light),
            "moderate" | "moderado" => Ok(ActivityLevel::Moderate),
            "intense" | "intenso" => Ok(ActivityLevel::Intense),
            "very-intense" | "muito-intenso" => Ok(ActivityLevel::VeryIntense),
            _ => Err(NutritionError::UnknownActivityLevel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Goal {
    Lose,
    Maintain,
    Gain,
}

impl Goal {
    pub fn adjustment(&self) -> f64 {
        match self {
            Goal::Lose => 0.8,
            Goal::Maintain => 1.0,
            Goal::Gain => 1.2,
        }
    }
}

impl FromStr for Goal {
    type Err = NutritionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "lose" | "perder" => Ok(Goal::Lose),
            "maintain" | "manter" => Ok(Goal::Maintain),
            "gain" | "ganhar" => Ok(Goal::Gain),
            _ => Err(NutritionError::UnknownGoal(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyMetrics {
    pub age_years: f64,
    pub weight_kg: f64,
    pub height_cm: f64,
}

impl BodyMetrics {
    /// Basal metabolic rate, kcal per day
    pub fn basal_metabolic_rate(&self) -> f64 {
        10.0 * self.weight_kg + 6.25 * self.height_cm - 5.0 * self.age_years + 5.0
    }

    /// Daily calorie target with protein at 2 g/kg, fat at 25% of calories
    /// and carbohydrates filling the remainder
    pub fn macro_targets(&self, activity: ActivityLevel, goal: Goal) -> MacroTargets {
        let calories = self.basal_metabolic_rate() * activity.multiplier() * goal.adjustment();
        let protein = self.weight_kg * 2.0;
        let fat = calories * 0.25 / 9.0;
        let carbs = (calories - protein * 4.0 - fat * 9.0) / 4.0;

        MacroTargets {
            calories: calories.round() as i64,
            protein_g: protein.round() as i64,
            carbs_g: carbs.round() as i64,
            fat_g: fat.round() as i64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MacroTargets {
    pub calories: i64,
    pub protein_g: i64,
    pub carbs_g: i64,
    pub fat_g: i64,
}
