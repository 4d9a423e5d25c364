//! On-the-fly placeholder classifier.
//!
//! Trained on standard-normal rows with random labels, so it carries no real
//! signal: its probabilities hover around the positive rate. It exists so the
//! model code path stays exercised when no trained artifact is shipped.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::StandardNormal;
use tracing::debug;

use super::linear::{sigmoid, LogisticModel};
use crate::config::PlaceholderConfig;
use crate::error::ModelError;

/// Fit a logistic model with full-batch gradient descent on log loss.
pub fn train_placeholder(n_features: usize, cfg: &PlaceholderConfig) -> Result<LogisticModel, ModelError> {
    if cfg.samples == 0 || n_features == 0 {
        return Err(ModelError::Training("empty training set".into()));
    }

    let mut rng = StdRng::seed_from_u64(cfg.seed);
    let rows: Vec<Vec<f64>> = (0..cfg.samples)
        .map(|_| (0..n_features).map(|_| rng.sample(StandardNormal)).collect())
        .collect();
    let labels: Vec<f64> = (0..cfg.samples)
        .map(|_| if rng.gen::<f64>() < cfg.positive_rate { 1.0 } else { 0.0 })
        .collect();

    let n = cfg.samples as f64;
    let mut weights = vec![0.0; n_features];
    let mut bias = 0.0;

    for _ in 0..cfg.epochs {
        let mut grad_w = vec![0.0; n_features];
        let mut grad_b = 0.0;
        for (row, &y) in rows.iter().zip(&labels) {
            let z = row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f64>() + bias;
            let err = sigmoid(z) - y;
            for (g, x) in grad_w.iter_mut().zip(row) {
                *g += err * x;
            }
            grad_b += err;
        }
        for (w, g) in weights.iter_mut().zip(&grad_w) {
            *w -= cfg.learning_rate * g / n;
        }
        bias -= cfg.learning_rate * grad_b / n;
    }

    if !bias.is_finite() || weights.iter().any(|w| !w.is_finite()) {
        return Err(ModelError::Training("gradient descent diverged".into()));
    }

    let positives = labels.iter().filter(|&&y| y > 0.5).count();
    debug!(samples = cfg.samples, positives, epochs = cfg.epochs, bias, "placeholder trained");
    Ok(LogisticModel { weights, bias })
}
