//! The 8-column record submitted to the classifier

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::ranges;
use crate::{Result, RiskError};

/// Column names in training order. The model reads features by position.
pub const FEATURE_NAMES: [&str; FeatureRecord::DIM] = [
    "Age",
    "Sex",
    "BMI",
    "Waist_Circumference",
    "Fasting_Blood_Glucose",
    "HbA1c",
    "Family_History_of_Diabetes",
    "Previous_Gestational_Diabetes",
];

/// Sex as encoded at training time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Sex {
    Male = 0,
    Female = 1,
}

/// Two-choice history question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Answer {
    No = 0,
    Yes = 1,
}

impl Sex {
    pub const CHOICES: [Sex; 2] = [Sex::Male, Sex::Female];

    pub fn encoded(&self) -> u8 {
        *self as u8
    }
}

impl Answer {
    pub const CHOICES: [Answer; 2] = [Answer::No, Answer::Yes];

    pub fn encoded(&self) -> u8 {
        *self as u8
    }
}

impl From<Sex> for u8 {
    fn from(sex: Sex) -> u8 {
        sex.encoded()
    }
}

impl From<Answer> for u8 {
    fn from(answer: Answer) -> u8 {
        answer.encoded()
    }
}

impl TryFrom<u8> for Sex {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Sex::Male),
            1 => Ok(Sex::Female),
            other => Err(format!("Sex must be 0 or 1, got {}", other)),
        }
    }
}

impl TryFrom<u8> for Answer {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(Answer::No),
            1 => Ok(Answer::Yes),
            other => Err(format!("Answer must be 0 or 1, got {}", other)),
        }
    }
}

impl fmt::Display for Sex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sex::Male => write!(f, "Male"),
            Sex::Female => write!(f, "Female"),
        }
    }
}

impl fmt::Display for Answer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Answer::No => write!(f, "No"),
            Answer::Yes => write!(f, "Yes"),
        }
    }
}

impl FromStr for Sex {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "male" | "m" | "0" => Ok(Sex::Male),
            "female" | "f" | "1" => Ok(Sex::Female),
            _ => Err(format!("Unknown sex: {}. Use male or female.", s)),
        }
    }
}

impl FromStr for Answer {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "no" | "n" | "0" => Ok(Answer::No),
            "yes" | "y" | "1" => Ok(Answer::Yes),
            _ => Err(format!("Unknown answer: {}. Use yes or no.", s)),
        }
    }
}

/// One patient's measurements, serialized under the training column names
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    #[serde(rename = "Age")]
    pub age: u32,
    #[serde(rename = "Sex")]
    pub sex: Sex,
    #[serde(rename = "BMI")]
    pub bmi: f64,
    /// Waist circumference in cm
    #[serde(rename = "Waist_Circumference")]
    pub waist_circumference: u32,
    /// Fasting blood glucose in mg/dL
    #[serde(rename = "Fasting_Blood_Glucose")]
    pub fasting_blood_glucose: u32,
    /// HbA1c in percent
    #[serde(rename = "HbA1c")]
    pub hba1c: f64,
    #[serde(rename = "Family_History_of_Diabetes")]
    pub family_history: Answer,
    #[serde(rename = "Previous_Gestational_Diabetes")]
    pub gestational_diabetes: Answer,
}

impl FeatureRecord {
    /// Dimension of feature vector
    pub const DIM: usize = 8;

    /// Check every numeric field against its accepted range
    pub fn validate(&self) -> Result<()> {
        ranges::AGE.check(self.age)?;
        ranges::BMI.check(self.bmi)?;
        ranges::WAIST_CIRCUMFERENCE.check(self.waist_circumference)?;
        ranges::FASTING_BLOOD_GLUCOSE.check(self.fasting_blood_glucose)?;
        ranges::HBA1C.check(self.hba1c)?;
        Ok(())
    }

    /// Convert to a flat vector in [`FEATURE_NAMES`] order
    pub fn to_vec(&self) -> Vec<f64> {
        vec![
            self.age as f64,
            self.sex.encoded() as f64,
            self.bmi,
            self.waist_circumference as f64,
            self.fasting_blood_glucose as f64,
            self.hba1c,
            self.family_history.encoded() as f64,
            self.gestational_diabetes.encoded() as f64,
        ]
    }

    /// Column name and display value pairs, in training order
    pub fn columns(&self) -> Vec<(&'static str, String)> {
        let values = [
            self.age.to_string(),
            format!("{} ({})", self.sex, self.sex.encoded()),
            format!("{:.1}", self.bmi),
            self.waist_circumference.to_string(),
            self.fasting_blood_glucose.to_string(),
            format!("{:.1}", self.hba1c),
            format!("{} ({})", self.family_history, self.family_history.encoded()),
            format!(
                "{} ({})",
                self.gestational_diabetes,
                self.gestational_diabetes.encoded()
            ),
        ];
        FEATURE_NAMES.into_iter().zip(values).collect()
    }
}
