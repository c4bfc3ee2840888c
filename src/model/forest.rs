//! Random forest classifier read from a JSON export
//!
//! Each tree is a flat node array rooted at index 0. A split sends the sample
//! left when `x[feature] <= threshold`, otherwise right. Leaves hold the
//! (possibly unnormalized) class distribution `[class 0, class 1]`.

use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

use super::{check_dimension, Classifier};
use crate::features::{FeatureRecord, FEATURE_NAMES};
use crate::{Result, RiskError};

/// A single tree node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeNode {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        value: [f64; 2],
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Normalized class distribution of the leaf the sample lands in
    fn leaf_distribution(&self, features: &[f64]) -> [f64; 2] {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if features[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                TreeNode::Leaf { value } => {
                    let total = value[0] + value[1];
                    return [value[0] / total, value[1] / total];
                }
            }
        }
    }

    /// Structural checks that make `leaf_distribution` total. Children must
    /// point forward, so every walk terminates.
    fn validate(&self, tree: usize) -> std::result::Result<(), String> {
        if self.nodes.is_empty() {
            return Err(format!("tree {} has no nodes", tree));
        }
        let len = self.nodes.len();
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    if *feature >= FeatureRecord::DIM {
                        return Err(format!(
                            "tree {} node {} splits on unknown feature {}",
                            tree, idx, feature
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("tree {} node {} has a non-finite threshold", tree, idx));
                    }
                    for child in [*left, *right] {
                        if child <= idx || child >= len {
                            return Err(format!(
                                "tree {} node {} has invalid child {}",
                                tree, idx, child
                            ));
                        }
                    }
                }
                TreeNode::Leaf { value } => {
                    if value.iter().any(|v| !v.is_finite() || *v < 0.0) {
                        return Err(format!("tree {} leaf {} has invalid values", tree, idx));
                    }
                    if value[0] + value[1] <= 0.0 {
                        return Err(format!("tree {} leaf {} is empty", tree, idx));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Ensemble of decision trees voting by averaged leaf probabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    pub model_name: String,
    /// Training schema; must equal [`FEATURE_NAMES`]
    pub feature_names: Vec<String>,
    pub trees: Vec<DecisionTree>,
}

impl RandomForest {
    /// Read and validate a forest from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let shown = path.display().to_string();
        let content =
            read_to_string(path).map_err(|e| RiskError::model_unavailable(&shown, e))?;
        let forest: RandomForest =
            serde_json::from_str(&content).map_err(|e| RiskError::model_unavailable(&shown, e))?;
        forest
            .validate()
            .map_err(|reason| RiskError::model_unavailable(&shown, reason))?;
        log::debug!(
            "Forest '{}' has {} trees",
            forest.model_name,
            forest.trees.len()
        );
        Ok(forest)
    }

    /// Write the forest as pretty-printed JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.feature_names != FEATURE_NAMES {
            return Err(format!(
                "feature schema {:?} does not match expected {:?}",
                self.feature_names, FEATURE_NAMES
            ));
        }
        if self.trees.is_empty() {
            return Err("forest has no trees".to_string());
        }
        for (idx, tree) in self.trees.iter().enumerate() {
            tree.validate(idx)?;
        }
        Ok(())
    }
}

impl Classifier for RandomForest {
    fn name(&self) -> &str {
        &self.model_name
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        check_dimension(features)?;
        let mut sum = [0.0, 0.0];
        for tree in &self.trees {
            let [p0, p1] = tree.leaf_distribution(features);
            sum[0] += p0;
            sum[1] += p1;
        }
        let n = self.trees.len() as f64;
        Ok([sum[0] / n, sum[1] / n])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::record::tests::{at_risk, healthy};
    use crate::RiskClass;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn shipped_model_path() -> String {
        format!(
            "{}/model/random_forest_diabetes_model.json",
            env!("CARGO_MANIFEST_DIR")
        )
    }

    fn stump(feature: usize, threshold: f64, left: [f64; 2], right: [f64; 2]) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf { value: left },
                TreeNode::Leaf { value: right },
            ],
        }
    }

    fn tiny_forest() -> RandomForest {
        RandomForest {
            model_name: "tiny".into(),
            feature_names: FEATURE_NAMES.iter().map(|s| s.to_string()).collect(),
            trees: vec![
                // HbA1c
                stump(5, 6.45, [9.0, 1.0], [1.0, 9.0]),
                // Fasting glucose
                stump(4, 125.5, [3.0, 1.0], [1.0, 3.0]),
            ],
        }
    }

    #[test]
    fn test_split_goes_left_on_equal() {
        let tree = stump(0, 40.0, [1.0, 0.0], [0.0, 1.0]);
        let mut x = [0.0; FeatureRecord::DIM];
        x[0] = 40.0;
        assert_eq!(tree.leaf_distribution(&x), [1.0, 0.0]);
        x[0] = 40.5;
        assert_eq!(tree.leaf_distribution(&x), [0.0, 1.0]);
    }

    #[test]
    fn test_forest_averages_normalized_leaves() {
        let forest = tiny_forest();
        let proba = forest.predict_proba(&healthy().to_vec()).unwrap();
        // (0.1 + 0.25) / 2
        assert!((proba[1] - 0.175).abs() < 1e-12);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);
        assert_eq!(forest.predict(&healthy().to_vec()).unwrap(), RiskClass::Low);
        assert_eq!(forest.predict(&at_risk().to_vec()).unwrap(), RiskClass::High);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forest.json");
        tiny_forest().save(&path).unwrap();

        let loaded = RandomForest::load(&path).unwrap();
        assert_eq!(loaded.model_name, "tiny");
        assert_eq!(loaded.trees, tiny_forest().trees);
    }

    #[test]
    fn test_load_rejects_schema_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forest.json");
        let mut forest = tiny_forest();
        forest.feature_names.swap(0, 1);
        forest.save(&path).unwrap();

        let err = RandomForest::load(&path).unwrap_err();
        match err {
            RiskError::ModelUnavailable { reason, .. } => assert!(reason.contains("schema")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_load_rejects_backward_child() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forest.json");
        let mut forest = tiny_forest();
        forest.trees[0].nodes[0] = TreeNode::Split {
            feature: 5,
            threshold: 6.45,
            left: 0,
            right: 2,
        };
        forest.save(&path).unwrap();
        assert!(matches!(
            RandomForest::load(&path),
            Err(RiskError::ModelUnavailable { .. })
        ));
    }

    #[test]
    fn test_load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("forest.json");
        std::fs::write(&path, "not a model").unwrap();
        assert!(matches!(
            RandomForest::load(&path),
            Err(RiskError::ModelUnavailable { .. })
        ));
    }

    #[test]
    fn test_shipped_model_healthy_case() {
        let model = RandomForest::load(shipped_model_path()).unwrap();
        let proba = model.predict_proba(&healthy().to_vec()).unwrap();
        assert!(proba[1] < 0.5, "P(high) = {}", proba[1]);
        assert_eq!(model.predict(&healthy().to_vec()).unwrap(), RiskClass::Low);
    }

    #[test]
    fn test_shipped_model_at_risk_case() {
        let model = RandomForest::load(shipped_model_path()).unwrap();
        let proba = model.predict_proba(&at_risk().to_vec()).unwrap();
        assert!(proba[1] > 0.5, "P(high) = {}", proba[1]);
        assert_eq!(model.predict(&at_risk().to_vec()).unwrap(), RiskClass::High);
    }

    #[test]
    fn test_shipped_model_invariants_over_input_ranges() {
        use crate::features::{ranges, Answer, Sex};

        let model = RandomForest::load(shipped_model_path()).unwrap();
        let mut rng = StdRng::seed_from_u64(42);

        for _ in 0..500 {
            let record = FeatureRecord {
                age: rng.gen_range(ranges::AGE.min..=ranges::AGE.max),
                sex: Sex::CHOICES[rng.gen_range(0..2)],
                bmi: rng.gen_range(ranges::BMI.min..=ranges::BMI.max),
                waist_circumference: rng
                    .gen_range(ranges::WAIST_CIRCUMFERENCE.min..=ranges::WAIST_CIRCUMFERENCE.max),
                fasting_blood_glucose: rng.gen_range(
                    ranges::FASTING_BLOOD_GLUCOSE.min..=ranges::FASTING_BLOOD_GLUCOSE.max,
                ),
                hba1c: rng.gen_range(ranges::HBA1C.min..=ranges::HBA1C.max),
                family_history: Answer::CHOICES[rng.gen_range(0..2)],
                gestational_diabetes: Answer::CHOICES[rng.gen_range(0..2)],
            };
            let x = record.to_vec();
            let proba = model.predict_proba(&x).unwrap();
            assert!((proba[0] + proba[1] - 1.0).abs() < 1e-9);
            assert!(proba.iter().all(|p| (0.0..=1.0).contains(p)));

            let label = model.predict(&x).unwrap().label();
            assert!(label == 0 || label == 1);
        }
    }
}
