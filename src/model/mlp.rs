//! Feed-forward risk classifier
//!
//! Architecture: Input(8) → [Linear → ReLU] × n → Linear(2) → softmax
//!
//! Weights are stored with burn's named MessagePack recorder, which appends
//! `.mpk` to the configured path.

use burn::module::Module;
use burn::nn::{Linear, LinearConfig};
use burn::record::{FullPrecisionSettings, Recorder};
use burn::tensor::activation::{relu, softmax};
use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::{check_dimension, Classifier};
use crate::features::FeatureRecord;
use crate::{Result, RiskError};

/// Configuration for the network shape
#[derive(Debug, Clone)]
pub struct MlpConfig {
    /// Input dimension (feature record columns)
    pub input_dim: usize,
    /// Hidden layer widths, e.g. [16, 8] for two layers
    pub hidden_dims: Vec<usize>,
}

impl MlpConfig {
    /// Weight shapes `[in, out]` of every layer, hidden layers first, head last
    fn layer_dims(&self) -> Vec<[usize; 2]> {
        let mut dims = Vec::with_capacity(self.hidden_dims.len() + 1);
        let mut in_dim = self.input_dim;
        for &out_dim in &self.hidden_dims {
            dims.push([in_dim, out_dim]);
            in_dim = out_dim;
        }
        dims.push([in_dim, 2]);
        dims
    }
}

impl Default for MlpConfig {
    fn default() -> Self {
        MlpConfig {
            input_dim: FeatureRecord::DIM,
            hidden_dims: vec![16, 8],
        }
    }
}

/// A single hidden layer block: Linear → ReLU
#[derive(Module, Debug)]
pub struct HiddenBlock<B: Backend> {
    linear: Linear<B>,
}

impl<B: Backend> HiddenBlock<B> {
    pub fn new(device: &B::Device, in_dim: usize, out_dim: usize) -> Self {
        HiddenBlock {
            linear: LinearConfig::new(in_dim, out_dim).init(device),
        }
    }

    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        relu(self.linear.forward(x))
    }
}

/// The network itself; outputs class logits [batch, 2]
#[derive(Module, Debug)]
pub struct MlpNet<B: Backend> {
    hidden: Vec<HiddenBlock<B>>,
    head: Linear<B>,
}

impl<B: Backend> MlpNet<B> {
    pub fn new(device: &B::Device, config: &MlpConfig) -> Self {
        let mut hidden = Vec::with_capacity(config.hidden_dims.len());
        let mut in_dim = config.input_dim;
        for &out_dim in &config.hidden_dims {
            hidden.push(HiddenBlock::new(device, in_dim, out_dim));
            in_dim = out_dim;
        }

        MlpNet {
            hidden,
            head: LinearConfig::new(in_dim, 2).init(device),
        }
    }

    /// Forward pass
    ///
    /// # Arguments
    /// * `x` - Feature rows [batch, input_dim]
    ///
    /// # Returns
    /// Class logits [batch, 2]
    pub fn forward(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        let x = self.hidden.iter().fold(x, |x, block| block.forward(x));
        self.head.forward(x)
    }
}

/// Classifier wrapper holding the network and the device it runs on
#[derive(Debug)]
pub struct MlpClassifier<B: Backend> {
    net: MlpNet<B>,
    device: B::Device,
    name: String,
}

impl<B: Backend> MlpClassifier<B> {
    /// Create a classifier with freshly initialized weights
    pub fn new(device: &B::Device, config: MlpConfig) -> Self {
        MlpClassifier {
            net: MlpNet::new(device, &config),
            device: device.clone(),
            name: "mlp".to_string(),
        }
    }

    /// Class probabilities [batch, 2]
    pub fn probabilities(&self, x: Tensor<B, 2>) -> Tensor<B, 2> {
        softmax(self.net.forward(x), 1)
    }

    /// Save weights to `path` (burn adds `.mpk`)
    pub fn save(&self, path: &str) -> Result<()>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        recorder
            .record(self.net.clone().into_record(), path.into())
            .map_err(|e| RiskError::Io(std::io::Error::other(e.to_string())))
    }

    /// Load weights saved by [`MlpClassifier::save`]
    pub fn load(device: &B::Device, path: &str, hidden_dims: &[usize]) -> Result<Self>
    where
        B::FloatElem: serde::Serialize + serde::de::DeserializeOwned,
        B::IntElem: serde::Serialize + serde::de::DeserializeOwned,
    {
        let model_file = format!("{}.mpk", path);
        if !std::path::Path::new(&model_file).exists() {
            return Err(RiskError::model_unavailable(&model_file, "file not found"));
        }

        let recorder = burn::record::NamedMpkFileRecorder::<FullPrecisionSettings>::new();
        let record: MlpNetRecord<B> = recorder
            .load(path.into(), device)
            .map_err(|e| RiskError::model_unavailable(&model_file, e))?;

        let config = MlpConfig {
            input_dim: FeatureRecord::DIM,
            hidden_dims: hidden_dims.to_vec(),
        };
        check_record_shape(&record, &config)
            .map_err(|reason| RiskError::model_unavailable(&model_file, reason))?;

        let mut classifier = Self::new(device, config);
        classifier.net = classifier.net.load_record(record);
        classifier.name = std::path::Path::new(path)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or(classifier.name);
        Ok(classifier)
    }
}

/// The saved record must have exactly the layers the config describes.
/// burn's `load_record` asserts on a layer count mismatch and silently takes
/// the record's widths otherwise.
fn check_record_shape<B: Backend>(
    record: &MlpNetRecord<B>,
    config: &MlpConfig,
) -> std::result::Result<(), String> {
    if record.hidden.len() != config.hidden_dims.len() {
        return Err(format!(
            "saved network has {} hidden layer(s), config expects {}",
            record.hidden.len(),
            config.hidden_dims.len()
        ));
    }

    let saved = record
        .hidden
        .iter()
        .map(|block| block.linear.weight.val().dims())
        .chain(std::iter::once(record.head.weight.val().dims()));

    for (idx, (found, expected)) in saved.zip(config.layer_dims()).enumerate() {
        if found != expected {
            return Err(format!(
                "layer {} has shape {:?}, config expects {:?}",
                idx, found, expected
            ));
        }
    }
    Ok(())
}

impl<B: Backend> Classifier for MlpClassifier<B> {
    fn name(&self) -> &str {
        &self.name
    }

    fn predict_proba(&self, features: &[f64]) -> Result<[f64; 2]> {
        check_dimension(features)?;
        let data: Vec<f32> = features.iter().map(|&x| x as f32).collect();
        let x = Tensor::<B, 1>::from_floats(data.as_slice(), &self.device)
            .reshape([1, FeatureRecord::DIM]);

        let probs = self
            .probabilities(x)
            .into_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| RiskError::Inference(format!("{:?}", e)))?;

        match probs.as_slice() {
            [p0, p1] => Ok([*p0 as f64, *p1 as f64]),
            other => Err(RiskError::Inference(format!(
                "Expected 2 class probabilities, got {}",
                other.len()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::record::tests::{at_risk, healthy};
    use burn::backend::NdArray;

    type TestBackend = NdArray<f32>;

    #[test]
    fn test_mlp_output_shape() {
        let device = Default::default();
        let model = MlpClassifier::<TestBackend>::new(&device, MlpConfig::default());

        let x = Tensor::random(
            [4, FeatureRecord::DIM],
            burn::tensor::Distribution::Normal(0.0, 1.0),
            &device,
        );
        let probs = model.probabilities(x);
        assert_eq!(probs.dims(), [4, 2]);

        let data = probs.to_data();
        for val in data.as_slice::<f32>().unwrap() {
            assert!(*val >= 0.0 && *val <= 1.0);
        }
    }

    #[test]
    fn test_probabilities_sum_to_one() {
        let device = Default::default();
        let model = MlpClassifier::<TestBackend>::new(&device, MlpConfig::default());

        for record in [healthy(), at_risk()] {
            let proba = model.predict_proba(&record.to_vec()).unwrap();
            assert!((proba[0] + proba[1] - 1.0).abs() < 1e-5);
            let label = model.predict(&record.to_vec()).unwrap().label();
            assert!(label == 0 || label == 1);
        }
    }

    #[test]
    fn test_single_hidden_layer() {
        let device = Default::default();
        let config = MlpConfig {
            input_dim: FeatureRecord::DIM,
            hidden_dims: vec![4],
        };
        let model = MlpClassifier::<TestBackend>::new(&device, config);
        assert!(model.predict_proba(&healthy().to_vec()).is_ok());
    }

    #[test]
    fn test_save_and_load_keep_outputs() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("risk_net");
        let path = path.to_str().unwrap();

        let model = MlpClassifier::<TestBackend>::new(&device, MlpConfig::default());
        model.save(path).unwrap();

        let loaded = MlpClassifier::<TestBackend>::load(&device, path, &[16, 8]).unwrap();
        assert_eq!(loaded.name(), "risk_net");

        let x = at_risk().to_vec();
        let before = model.predict_proba(&x).unwrap();
        let after = loaded.predict_proba(&x).unwrap();
        assert!((before[0] - after[0]).abs() < 1e-6);
        assert!((before[1] - after[1]).abs() < 1e-6);
    }

    #[test]
    fn test_load_missing_file() {
        let device = Default::default();
        let err = MlpClassifier::<TestBackend>::load(&device, "/nonexistent/net", &[16, 8])
            .unwrap_err();
        assert!(matches!(err, RiskError::ModelUnavailable { .. }));
    }

    fn saved_default(dir: &tempfile::TempDir) -> String {
        let device = Default::default();
        let path = dir.path().join("risk_net");
        let path = path.to_str().unwrap().to_string();
        MlpClassifier::<TestBackend>::new(&device, MlpConfig::default())
            .save(&path)
            .unwrap();
        path
    }

    #[test]
    fn test_load_rejects_layer_count_mismatch() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();
        let path = saved_default(&dir);

        let err = MlpClassifier::<TestBackend>::load(&device, &path, &[4]).unwrap_err();
        match err {
            RiskError::ModelUnavailable { path: file, reason } => {
                assert!(file.ends_with("risk_net.mpk"));
                assert!(reason.contains("2 hidden layer(s), config expects 1"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_load_rejects_width_mismatch() {
        let device = Default::default();
        let dir = tempfile::tempdir().unwrap();
        let path = saved_default(&dir);

        let err = MlpClassifier::<TestBackend>::load(&device, &path, &[32, 8]).unwrap_err();
        match err {
            RiskError::ModelUnavailable { reason, .. } => {
                assert!(reason.contains("layer 0 has shape [8, 16]"));
            }
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_layer_dims() {
        let dims = MlpConfig::default().layer_dims();
        assert_eq!(dims, vec![[8, 16], [16, 8], [8, 2]]);
    }
}
