//! Diabetes risk prediction
//!
//! Assembles a patient's measurements into the feature record a pre-trained
//! binary classifier expects, and reports the predicted risk class.

pub mod features;
pub mod form;
pub mod model;
pub mod predict;

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Binary risk class produced by the classifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum RiskClass {
    Low = 0,
    High = 1,
}

impl RiskClass {
    /// Class label as used by the model (0 or 1)
    pub fn label(&self) -> u8 {
        *self as u8
    }

    /// Position of this class in a `[P(0), P(1)]` distribution
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl From<RiskClass> for u8 {
    fn from(class: RiskClass) -> u8 {
        class.label()
    }
}

impl TryFrom<u8> for RiskClass {
    type Error = String;

    fn try_from(value: u8) -> std::result::Result<Self, Self::Error> {
        match value {
            0 => Ok(RiskClass::Low),
            1 => Ok(RiskClass::High),
            other => Err(format!("Unknown risk class: {}", other)),
        }
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RiskClass::Low => write!(f, "Low"),
            RiskClass::High => write!(f, "High"),
        }
    }
}

/// Handler output for a single feature record
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub class: RiskClass,
    /// `[P(class = 0), P(class = 1)]`
    pub probabilities: [f64; 2],
}

impl Prediction {
    /// Probability of the predicted class
    pub fn probability(&self) -> f64 {
        self.probabilities[self.class.index()]
    }

    /// Probability of class 1 regardless of the prediction
    pub fn risk_probability(&self) -> f64 {
        self.probabilities[RiskClass::High.index()]
    }
}

/// Application-wide errors
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("Model unavailable at {path}: {reason}")]
    ModelUnavailable { path: String, reason: String },

    #[error("Invalid value for {field}: {message}")]
    InvalidInput { field: String, message: String },

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl RiskError {
    pub fn model_unavailable(path: impl Into<String>, reason: impl fmt::Display) -> Self {
        RiskError::ModelUnavailable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }

    pub fn invalid_input(field: impl Into<String>, message: impl Into<String>) -> Self {
        RiskError::InvalidInput {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RiskError>;

/// Application configuration loaded from config.toml
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub model: ModelConfig,
}

/// Which serialized classifier the artifact holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Random forest exported as JSON
    Forest,
    /// Feed-forward network stored as a burn record (`.mpk`)
    Mlp,
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Forest => write!(f, "forest"),
            ModelKind::Mlp => write!(f, "mlp"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    pub kind: ModelKind,
    /// Artifact path. For `mlp` burn appends the `.mpk` extension.
    pub path: String,
    /// Hidden layer widths, only read for `mlp`
    #[serde(default = "default_hidden_dims")]
    pub hidden_dims: Vec<usize>,
}

fn default_hidden_dims() -> Vec<usize> {
    vec![16, 8]
}

impl Default for Config {
    fn default() -> Self {
        Config {
            model: ModelConfig {
                kind: ModelKind::Forest,
                path: "model/random_forest_diabetes_model.json".to_string(),
                hidden_dims: default_hidden_dims(),
            },
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            RiskError::Config(format!("Failed to read config file {}: {}", path, e))
        })?;
        toml::from_str(&content)
            .map_err(|e| RiskError::Config(format!("Failed to parse config: {}", e)))
    }

    pub fn save(&self, path: &str) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| RiskError::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
