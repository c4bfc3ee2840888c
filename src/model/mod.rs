//! Pre-trained classifiers
//!
//! Two artifact formats can back the predictor:
//! - Forest: random forest exported as JSON (the shipped model)
//! - MLP: small feed-forward network stored as a burn record

pub mod forest;
pub mod mlp;

pub use forest::RandomForest;
pub use mlp::MlpClassifier;

use burn::backend::NdArray;

use crate::features::FeatureRecord;
use crate::{ModelConfig, ModelKind, Result, RiskClass, RiskError};

/// Backend used to run the network at inference time
pub type InferenceBackend = NdArray<f32>;

/// A binary classifier over the 8-column feature schema
pub trait Classifier {
    /// Human-readable model name
    fn name(&self) -> &str;

    /// `[P(class = 0), P(class = 1)]` for one feature vector
    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]>;

    /// Predicted label; ties go to class 0
    fn predict(&self, features: &[f64]) -> Result<RiskClass> {
        let [p_low, p_high] = self.predict_proba(features)?;
        Ok(if p_high > p_low {
            RiskClass::High
        } else {
            RiskClass::Low
        })
    }
}

impl<C: Classifier + ?Sized> Classifier for Box<C> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        (**self).predict_proba(features)
    }

    fn predict(&self, features: &[f64]) -> Result<RiskClass> {
        (**self).predict(features)
    }
}

/// Reject input that does not have one value per training column
pub(crate) fn check_dimension(features: &[f64]) -> Result<()> {
    if features.len() != FeatureRecord::DIM {
        return Err(RiskError::Inference(format!(
            "Expected {} features, got {}",
            FeatureRecord::DIM,
            features.len()
        )));
    }
    Ok(())
}

/// Load the configured classifier. Any failure is `ModelUnavailable`.
pub fn load_classifier(config: &ModelConfig) -> Result<Box<dyn Classifier>> {
    let classifier: Box<dyn Classifier> = match config.kind {
        ModelKind::Forest => Box::new(RandomForest::load(&config.path)?),
        ModelKind::Mlp => {
            let device = Default::default();
            Box::new(MlpClassifier::<InferenceBackend>::load(
                &device,
                &config.path,
                &config.hidden_dims,
            )?)
        }
    };
    log::info!(
        "Loaded {} model '{}' from {}",
        config.kind,
        classifier.name(),
        config.path
    );
    Ok(classifier)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed([f64; 2]);

    impl Classifier for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
            check_dimension(features)?;
            Ok(self.0)
        }
    }

    #[test]
    fn test_default_predict_takes_larger_probability() {
        let x = [0.0; FeatureRecord::DIM];
        assert_eq!(Fixed([0.2, 0.8]).predict(&x).unwrap(), RiskClass::High);
        assert_eq!(Fixed([0.9, 0.1]).predict(&x).unwrap(), RiskClass::Low);
        assert_eq!(Fixed([0.5, 0.5]).predict(&x).unwrap(), RiskClass::Low);
    }

    #[test]
    fn test_boxed_classifier_delegates() {
        let boxed: Box<dyn Classifier> = Box::new(Fixed([0.3, 0.7]));
        let x = [0.0; FeatureRecord::DIM];
        assert_eq!(boxed.name(), "fixed");
        assert_eq!(boxed.predict_proba(&x).unwrap(), [0.3, 0.7]);
        assert_eq!(boxed.predict(&x).unwrap(), RiskClass::High);
    }

    #[test]
    fn test_wrong_dimension_rejected() {
        let err = Fixed([0.5, 0.5]).predict_proba(&[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, RiskError::Inference(_)));
    }

    #[test]
    fn test_load_missing_forest() {
        let config = ModelConfig {
            kind: ModelKind::Forest,
            path: "/nonexistent/model.json".to_string(),
            hidden_dims: vec![16, 8],
        };
        let err = load_classifier(&config).err().unwrap();
        assert!(matches!(err, RiskError::ModelUnavailable { .. }));
    }

    #[test]
    fn test_load_missing_mlp() {
        let config = ModelConfig {
            kind: ModelKind::Mlp,
            path: "/nonexistent/model".to_string(),
            hidden_dims: vec![16, 8],
        };
        let err = load_classifier(&config).err().unwrap();
        assert!(matches!(err, RiskError::ModelUnavailable { .. }));
    }
}
