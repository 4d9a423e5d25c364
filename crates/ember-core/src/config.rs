use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{EmberError, Result};

/// Service configuration. Every field has a default, so a config file only
/// needs to list what it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmberConfig {
    /// JSON model artifact; a placeholder is trained when it does not exist.
    pub model_path: PathBuf,
    /// Write a freshly trained placeholder back to `model_path`.
    pub persist_placeholder: bool,
    /// Seed for synthetic-feature noise. `None` draws from OS entropy.
    pub seed: Option<u64>,
    pub placeholder: PlaceholderConfig,
}

impl Default for EmberConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("models/ember_model.json"),
            persist_placeholder: true,
            seed: None,
            placeholder: PlaceholderConfig::default(),
        }
    }
}

impl EmberConfig {
    /// Load a JSON config file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.placeholder.validate()
    }
}

/// Parameters for the on-the-fly placeholder classifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaceholderConfig {
    /// Number of synthetic training rows.
    pub samples: usize,
    /// Full-batch gradient descent passes.
    pub epochs: usize,
    pub learning_rate: f64,
    /// Fraction of rows labelled as fire.
    pub positive_rate: f64,
    pub seed: u64,
}

impl Default for PlaceholderConfig {
    fn default() -> Self {
        Self {
            samples: 1000,
            epochs: 200,
            learning_rate: 0.1,
            positive_rate: 0.2,
            seed: 42,
        }
    }
}

impl PlaceholderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(EmberError::Config("placeholder.samples must be > 0".into()));
        }
        if !(self.learning_rate.is_finite() && self.learning_rate > 0.0) {
            return Err(EmberError::Config(
                "placeholder.learning_rate must be a positive number".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.positive_rate) {
            return Err(EmberError::Config(
                "placeholder.positive_rate must be within [0, 1]".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let c = EmberConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.placeholder.samples, 1000);
        assert_eq!(c.placeholder.seed, 42);
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"seed": 7, "placeholder": {{"epochs": 10}}}}"#).unwrap();
        let c = EmberConfig::from_file(f.path()).unwrap();
        assert_eq!(c.seed, Some(7));
        assert_eq!(c.placeholder.epochs, 10);
        assert_eq!(c.placeholder.samples, 1000);
        assert_eq!(c.model_path, PathBuf::from("models/ember_model.json"));
    }

    #[test]
    fn invalid_values_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, r#"{{"placeholder": {{"positive_rate": 1.5}}}}"#).unwrap();
        assert!(matches!(EmberConfig::from_file(f.path()), Err(EmberError::Config(_))));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        write!(f, "not json").unwrap();
        assert!(matches!(EmberConfig::from_file(f.path()), Err(EmberError::Json(_))));
    }
}
