//! Classifier lifecycle.
//!
//! The model is resolved exactly once at startup:
//!
//! ```text
//! Uninitialized ─┬─ artifact loads ──────────────→ Trained { origin: Artifact }
//!                ├─ artifact missing → train ok ──→ Trained { origin: Placeholder }
//!                └─ artifact corrupt / train fails → Fallback (heuristic only)
//! ```
//!
//! After the transition the state is read-only; scoring never retries it.

pub mod linear;
pub mod train;

use std::fmt;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::EmberConfig;
use crate::error::ModelError;
use crate::vector::FEATURE_COUNT;

pub use linear::{LogisticModel, MarginModel};

/// Decision threshold used when an artifact does not persist one.
pub const DEFAULT_THRESHOLD: f64 = 0.5;

/// Raw classifier output for one vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ModelOutput {
    /// Probability of the fire class.
    Probability(f64),
    /// Signed distance from the decision boundary.
    Decision(f64),
}

/// Anything that can score a feature vector.
pub trait Classifier: fmt::Debug + Send + Sync {
    fn n_features(&self) -> usize;
    fn output(&self, x: &[f32]) -> Result<ModelOutput, ModelError>;
}

/// Serialized classifier variants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelKind {
    Logistic(LogisticModel),
    LinearMargin(MarginModel),
}

impl Classifier for ModelKind {
    fn n_features(&self) -> usize {
        match self {
            ModelKind::Logistic(m) => m.n_features(),
            ModelKind::LinearMargin(m) => m.n_features(),
        }
    }

    fn output(&self, x: &[f32]) -> Result<ModelOutput, ModelError> {
        match self {
            ModelKind::Logistic(m) => m.output(x),
            ModelKind::LinearMargin(m) => m.output(x),
        }
    }
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

/// On-disk model bundle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub model: ModelKind,
    #[serde(rename = "thr", default = "default_threshold")]
    pub threshold: f64,
    /// Number of training rows, informational only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub train_transitions: Option<usize>,
}

impl ModelArtifact {
    pub fn load(path: &Path) -> Result<Self, ModelError> {
        let text = fs::read_to_string(path)?;
        let artifact: Self = serde_json::from_str(&text)?;
        Ok(artifact)
    }

    pub fn save(&self, path: &Path) -> Result<(), ModelError> {
        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }
}

/// Where a trained model came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelOrigin {
    Artifact,
    Placeholder,
}

/// One-shot model lifecycle state.
#[derive(Debug, Default)]
pub enum ModelState {
    #[default]
    Uninitialized,
    Trained {
        model: Box<dyn Classifier>,
        threshold: f64,
        origin: ModelOrigin,
    },
    /// No usable model; every score takes the heuristic path.
    Fallback,
}

impl ModelState {
    /// Resolve the model from configuration. Consumes nothing but the file
    /// system; never fails, only degrades.
    pub fn initialize(config: &EmberConfig) -> Self {
        let path = config.model_path.as_path();

        if path.exists() {
            return match ModelArtifact::load(path) {
                Ok(artifact) => {
                    info!(
                        path = %path.display(),
                        threshold = artifact.threshold,
                        "loaded model artifact"
                    );
                    ModelState::trained(artifact.model, artifact.threshold, ModelOrigin::Artifact)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "model artifact unusable, using heuristic fallback");
                    ModelState::Fallback
                }
            };
        }

        warn!(path = %path.display(), "model artifact not found, training placeholder");
        match train::train_placeholder(FEATURE_COUNT, &config.placeholder) {
            Ok(model) => {
                let artifact = ModelArtifact {
                    model: ModelKind::Logistic(model),
                    threshold: DEFAULT_THRESHOLD,
                    train_transitions: Some(config.placeholder.samples),
                };
                if config.persist_placeholder {
                    match artifact.save(path) {
                        Ok(()) => info!(path = %path.display(), "saved placeholder model"),
                        Err(e) => warn!(path = %path.display(), error = %e, "could not save placeholder model"),
                    }
                }
                ModelState::trained(artifact.model, artifact.threshold, ModelOrigin::Placeholder)
            }
            Err(e) => {
                warn!(error = %e, "placeholder training failed, using heuristic fallback");
                ModelState::Fallback
            }
        }
    }

    pub fn trained(model: impl Classifier + 'static, threshold: f64, origin: ModelOrigin) -> Self {
        ModelState::Trained {
            model: Box::new(model),
            threshold,
            origin,
        }
    }

    /// The usable classifier, if any.
    pub fn classifier(&self) -> Option<&dyn Classifier> {
        match self {
            ModelState::Trained { model, .. } => Some(model.as_ref()),
            _ => None,
        }
    }

    pub fn status(&self) -> ModelStatus {
        match self {
            ModelState::Uninitialized => ModelStatus {
                state: "uninitialized",
                origin: None,
                threshold: None,
                feature_count: None,
            },
            ModelState::Trained { model, threshold, origin } => ModelStatus {
                state: "trained",
                origin: Some(*origin),
                threshold: Some(*threshold),
                feature_count: Some(model.n_features()),
            },
            ModelState::Fallback => ModelStatus {
                state: "fallback",
                origin: None,
                threshold: None,
                feature_count: None,
            },
        }
    }
}

/// Model summary for diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStatus {
    pub state: &'static str,
    pub origin: Option<ModelOrigin>,
    pub threshold: Option<f64>,
    pub feature_count: Option<usize>,
}
