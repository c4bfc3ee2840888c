//! Prediction request handling

use crate::features::FeatureRecord;
use crate::model::Classifier;
use crate::{Prediction, Result, RiskClass, RiskError};

/// Runs one classifier, loaded once, against feature records
pub struct Predictor<C: Classifier> {
    classifier: C,
}

impl<C: Classifier> Predictor<C> {
    /// Create a predictor around an already loaded classifier
    pub fn new(classifier: C) -> Self {
        Predictor { classifier }
    }

    /// Predict the risk class for one record
    pub fn predict(&self, record: &FeatureRecord) -> Result<Prediction> {
        let features = record.to_vec();
        log::debug!("Features: {:?}", features);

        let class = self.classifier.predict(&features)?;
        let probabilities = self.classifier.predict_proba(&features)?;
        log::debug!(
            "Predicted class {} with probabilities {:?}",
            class.label(),
            probabilities
        );

        Ok(Prediction {
            class,
            probabilities,
        })
    }

    /// Get the classifier
    pub fn classifier(&self) -> &C {
        &self.classifier
    }
}

/// How a prediction is written to the terminal
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use table, json, or csv.", s)),
        }
    }
}

/// Headline, probability caption and advice for a risk class
fn outcome_text(class: RiskClass) -> (&'static str, &'static str, &'static str) {
    match class {
        RiskClass::High => (
            "HIGH risk of diabetes!",
            "Probability of diabetes:",
            "Please consult a doctor for advice and a thorough examination.",
        ),
        RiskClass::Low => (
            "LOW risk of diabetes.",
            "Probability of no diabetes:",
            "Keep up the healthy lifestyle!",
        ),
    }
}

/// Format a prediction and the values it was made from for display
pub fn format_prediction(record: &FeatureRecord, prediction: &Prediction) -> String {
    let (headline, caption, advice) = outcome_text(prediction.class);

    let mut out = format!(
        r#"
┌─────────────────────────────────────────────────┐
│  Prediction result
├─────────────────────────────────────────────────┤
│  {}
│  {} {:.2}%
│  {}
└─────────────────────────────────────────────────┘

Entered values
───────────────────────────────
"#,
        headline,
        caption,
        prediction.probability() * 100.0,
        advice
    );

    for (name, value) in record.columns() {
        out.push_str(&format!("  {:<31}{}\n", name, value));
    }
    out
}

/// Render in the requested output format
pub fn render(
    format: OutputFormat,
    record: &FeatureRecord,
    prediction: &Prediction,
) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(format_prediction(record, prediction)),
        OutputFormat::Json => {
            let json = serde_json::json!({
                "class": prediction.class,
                "label": prediction.class.to_string(),
                "probability": prediction.probability(),
                "probabilities": prediction.probabilities,
                "inputs": record,
            });
            serde_json::to_string_pretty(&json).map_err(RiskError::from)
        }
        OutputFormat::Csv => {
            let mut header: Vec<String> = record
                .columns()
                .into_iter()
                .map(|(name, _)| name.to_string())
                .collect();
            header.extend(["class".to_string(), "probability".to_string()]);

            let mut row: Vec<String> = record
                .to_vec()
                .into_iter()
                .map(|v| v.to_string())
                .collect();
            row.push(prediction.class.label().to_string());
            row.push(format!("{:.4}", prediction.probability()));

            Ok(format!("{}\n{}", header.join(","), row.join(",")))
        }
    }
}
