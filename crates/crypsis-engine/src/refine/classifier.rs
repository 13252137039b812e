//! Pretrained binary classifier for pocket boundary decisions.
//!
//! The production model is a three-layer MLP trained on concatenated
//! residue/context embeddings. Weights are exported once from the training
//! pipeline as an `.npz` archive and loaded once per worker; inference is
//! a pure function of the loaded parameters, safe to share read-only
//! across concurrent jobs.

use crypsis_core::{CrypsisError, Result};
use ndarray::{Array1, Array2, ArrayView2, Axis};
use ndarray_npy::NpzReader;
use std::fs::File;
use std::path::Path;

/// Stateless classification interface over a feature matrix.
///
/// One probability in `[0, 1]` per input row.
pub trait Classifier {
    /// Expected feature-vector length.
    fn input_dim(&self) -> usize;

    /// Score every row of the feature matrix.
    fn classify(&self, features: ArrayView2<f32>) -> Result<Array1<f32>>;
}

/// Inference-only MLP: `input -> hidden -> hidden -> 1`, ReLU between
/// layers, sigmoid on the output logit. Dropout exists only at training
/// time and has no inference counterpart.
#[derive(Debug, Clone)]
pub struct BoundaryClassifier {
    // torch convention: weight shape is (out_features, in_features)
    w1: Array2<f32>,
    b1: Array1<f32>,
    w2: Array2<f32>,
    b2: Array1<f32>,
    w3: Array2<f32>,
    b3: Array1<f32>,
}

impl BoundaryClassifier {
    /// Load weights from an `.npz` archive with entries
    /// `layer_{1,2,3}.weight` / `layer_{1,2,3}.bias`.
    pub fn from_npz(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut npz = NpzReader::new(file)
            .map_err(|e| CrypsisError::shape(format!("failed to open {}: {}", path.display(), e)))?;

        let mut matrix = |name: &str| -> Result<Array2<f32>> {
            npz.by_name(&format!("{}.npy", name))
                .map_err(|e| CrypsisError::shape(format!("missing weight {}: {}", name, e)))
        };
        let w1 = matrix("layer_1.weight")?;
        let w2 = matrix("layer_2.weight")?;
        let w3 = matrix("layer_3.weight")?;

        let mut vector = |name: &str| -> Result<Array1<f32>> {
            npz.by_name(&format!("{}.npy", name))
                .map_err(|e| CrypsisError::shape(format!("missing bias {}: {}", name, e)))
        };
        let b1 = vector("layer_1.bias")?;
        let b2 = vector("layer_2.bias")?;
        let b3 = vector("layer_3.bias")?;

        Self::from_parts(w1, b1, w2, b2, w3, b3)
    }

    /// Assemble a classifier from in-memory parameters, shape-checked.
    pub fn from_parts(
        w1: Array2<f32>,
        b1: Array1<f32>,
        w2: Array2<f32>,
        b2: Array1<f32>,
        w3: Array2<f32>,
        b3: Array1<f32>,
    ) -> Result<Self> {
        if w1.nrows() != b1.len() || w2.nrows() != b2.len() || w3.nrows() != b3.len() {
            return Err(CrypsisError::shape(
                "classifier bias lengths disagree with weight rows",
            ));
        }
        if w2.ncols() != w1.nrows() || w3.ncols() != w2.nrows() {
            return Err(CrypsisError::shape(
                "classifier layer dimensions do not chain",
            ));
        }
        if w3.nrows() != 1 {
            return Err(CrypsisError::shape(format!(
                "classifier output layer must have 1 unit, got {}",
                w3.nrows()
            )));
        }
        Ok(Self { w1, b1, w2, b2, w3, b3 })
    }
}

impl Classifier for BoundaryClassifier {
    fn input_dim(&self) -> usize {
        self.w1.ncols()
    }

    fn classify(&self, features: ArrayView2<f32>) -> Result<Array1<f32>> {
        if features.ncols() != self.input_dim() {
            return Err(CrypsisError::shape(format!(
                "feature matrix has {} columns, classifier expects {}",
                features.ncols(),
                self.input_dim()
            )));
        }

        let h1 = relu(features.dot(&self.w1.t()) + &self.b1);
        let h2 = relu(h1.dot(&self.w2.t()) + &self.b2);
        let logits = h2.dot(&self.w3.t()) + &self.b3;

        Ok(logits.index_axis(Axis(1), 0).mapv(sigmoid))
    }
}

fn relu(x: Array2<f32>) -> Array2<f32> {
    x.mapv(|v| v.max(0.0))
}

fn sigmoid(z: f32) -> f32 {
    1.0 / (1.0 + (-z).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use ndarray_npy::NpzWriter;

    /// 2 -> 2 -> 2 -> 1 network that passes its first input through
    /// unchanged: probability = sigmoid(max(x0, 0)).
    fn passthrough_classifier() -> BoundaryClassifier {
        BoundaryClassifier::from_parts(
            array![[1.0, 0.0], [0.0, 1.0]],
            array![0.0, 0.0],
            array![[1.0, 0.0], [0.0, 1.0]],
            array![0.0, 0.0],
            array![[1.0, 0.0]],
            array![0.0],
        )
        .expect("valid parts")
    }

    #[test]
    fn test_forward_pass() {
        let classifier = passthrough_classifier();
        assert_eq!(classifier.input_dim(), 2);

        let features = array![[0.0f32, 5.0], [2.0, 0.0], [-3.0, 0.0]];
        let probs = classifier.classify(features.view()).expect("classify");

        assert!((probs[0] - 0.5).abs() < 1e-6); // sigmoid(0)
        assert!((probs[1] - sigmoid(2.0)).abs() < 1e-6);
        assert!((probs[2] - 0.5).abs() < 1e-6); // relu clamps -3 to 0
    }

    #[test]
    fn test_rejects_wrong_feature_width() {
        let classifier = passthrough_classifier();
        let features = Array2::<f32>::zeros((2, 3));
        assert!(classifier.classify(features.view()).is_err());
    }

    #[test]
    fn test_rejects_mismatched_parts() {
        let bad = BoundaryClassifier::from_parts(
            array![[1.0, 0.0], [0.0, 1.0]],
            array![0.0, 0.0],
            array![[1.0, 0.0, 0.0]], // ncols 3 != 2
            array![0.0],
            array![[1.0]],
            array![0.0],
        );
        assert!(bad.is_err());
    }

    #[test]
    fn test_npz_round_trip() {
        let path = std::env::temp_dir().join("crypsis_classifier_test.npz");
        {
            let reference = passthrough_classifier();
            let mut npz = NpzWriter::new(File::create(&path).expect("create npz"));
            npz.add_array("layer_1.weight", &reference.w1).expect("w1");
            npz.add_array("layer_1.bias", &reference.b1).expect("b1");
            npz.add_array("layer_2.weight", &reference.w2).expect("w2");
            npz.add_array("layer_2.bias", &reference.b2).expect("b2");
            npz.add_array("layer_3.weight", &reference.w3).expect("w3");
            npz.add_array("layer_3.bias", &reference.b3).expect("b3");
            npz.finish().expect("finish npz");
        }

        let loaded = BoundaryClassifier::from_npz(&path).expect("load npz");
        let features = array![[1.5f32, 0.0]];
        let probs = loaded.classify(features.view()).expect("classify");
        assert!((probs[0] - sigmoid(1.5)).abs() < 1e-6);
    }
}
