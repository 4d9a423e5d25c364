//! Linear classifiers over the 31-slot feature vector.

use serde::{Deserialize, Serialize};

use super::{Classifier, ModelOutput};
use crate::error::ModelError;

fn dot(weights: &[f64], bias: f64, x: &[f32]) -> Result<f64, ModelError> {
    if weights.len() != x.len() {
        return Err(ModelError::FeatureCount {
            expected: weights.len(),
            got: x.len(),
        });
    }
    Ok(weights.iter().zip(x).map(|(w, &v)| w * v as f64).sum::<f64>() + bias)
}

pub fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

/// Logistic regression: reports a class-1 probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogisticModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl Classifier for LogisticModel {
    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn output(&self, x: &[f32]) -> Result<ModelOutput, ModelError> {
        dot(&self.weights, self.bias, x).map(|z| ModelOutput::Probability(sigmoid(z)))
    }
}

/// Margin classifier (e.g. a linear SVM): reports only a signed decision
/// score, no probability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarginModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl Classifier for MarginModel {
    fn n_features(&self) -> usize {
        self.weights.len()
    }

    fn output(&self, x: &[f32]) -> Result<ModelOutput, ModelError> {
        dot(&self.weights, self.bias, x).map(ModelOutput::Decision)
    }
}
