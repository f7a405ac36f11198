//! Body mass index

use serde::Serialize;

use crate::round_to;

/// Weight class for a BMI value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BmiClass {
    Underweight,
    NormalWeight,
    Overweight,
    Obesity,
}

impl BmiClass {
    /// Classify a BMI value. Each threshold belongs to the class above it.
    pub fn classify(value: f64) -> Self {
        if value < 18.5 {
            BmiClass::Underweight
        } else if value < 25.0 {
            BmiClass::NormalWeight
        } else if value < 30.0 {
            BmiClass::Overweight
        } else {
            BmiClass::Obesity
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BmiClass::Underweight => "underweight",
            BmiClass::NormalWeight => "normal weight",
            BmiClass::Overweight => "overweight",
            BmiClass::Obesity => "obesity",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bmi {
    pub value: f64,
    pub class: BmiClass,
}

impl Bmi {
    /// Compute BMI from weight in kilograms and height in metres
    pub fn compute(weight_kg: f64, height_m: f64) -> Self {
        let value = weight_kg / height_m.powi(2);
        Self {
            value,
            class: BmiClass::classify(value),
        }
    }

    /// Value rounded to one decimal, as displayed
    pub fn rounded(&self) -> f64 {
        round_to(self.value, 1)
    }
}
