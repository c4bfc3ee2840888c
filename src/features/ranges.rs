//! Accepted ranges and form defaults for the numeric fields

use std::fmt;

use crate::{Result, RiskError};

/// Inclusive range for one numeric field, plus the value the form offers
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldRange<T> {
    /// Canonical column name
    pub field: &'static str,
    pub min: T,
    pub max: T,
    pub default: T,
}

pub const AGE: FieldRange<u32> = FieldRange {
    field: "Age",
    min: 1,
    max: 110,
    default: 30,
};

pub const BMI: FieldRange<f64> = FieldRange {
    field: "BMI",
    min: 10.0,
    max: 70.0,
    default: 25.0,
};

pub const WAIST_CIRCUMFERENCE: FieldRange<u32> = FieldRange {
    field: "Waist_Circumference",
    min: 40,
    max: 150,
    default: 90,
};

pub const FASTING_BLOOD_GLUCOSE: FieldRange<u32> = FieldRange {
    field: "Fasting_Blood_Glucose",
    min: 0,
    max: 300,
    default: 100,
};

pub const HBA1C: FieldRange<f64> = FieldRange {
    field: "HbA1c",
    min: 0.0,
    max: 15.0,
    default: 5.7,
};

impl<T: PartialOrd + Copy + fmt::Display> FieldRange<T> {
    pub fn contains(&self, value: T) -> bool {
        // NaN fails both comparisons
        value >= self.min && value <= self.max
    }

    /// Return `value` unchanged if it lies inside the range
    pub fn check(&self, value: T) -> Result<T> {
        if self.contains(value) {
            Ok(value)
        } else {
            Err(RiskError::invalid_input(
                self.field,
                format!("{} is outside {}", value, self),
            ))
        }
    }
}

impl<T: fmt::Display> fmt::Display for FieldRange<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}
