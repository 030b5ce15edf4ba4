//! Trainer configuration loaded from TOML.
//!
//! Every key is optional; an empty file (or no file) reproduces the stock
//! training setup: `chatbot/intents.json` in, `model/` out, a 128/64 MLP
//! trained for 200 epochs.

mod defaults;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize, de::Error as SerdeDeError};
use thiserror::Error;

use crate::app_dirs;
use crate::ml::mlp::TrainOptions;
use defaults::*;

/// Config file picked up from the working directory when no path is given.
pub const LOCAL_CONFIG_FILE_NAME: &str = "parley.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config at {path}: {source}")]
    ParseToml {
        path: PathBuf,
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainConfig {
    #[serde(default = "default_intents_path")]
    pub intents_path: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Optional `form,lemma` file extending the built-in lemmatizer.
    #[serde(default)]
    pub lemma_exceptions: Option<PathBuf>,
    /// Optional word list; suffix rules may only produce listed lemmas.
    #[serde(default)]
    pub lemma_words: Option<PathBuf>,
    #[serde(default)]
    pub text: TextSettings,
    #[serde(default)]
    pub training: TrainingSettings,
}

/// Pattern tokenization settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextSettings {
    /// Whole tokens dropped from patterns.
    #[serde(default = "default_ignore_tokens")]
    pub ignore_tokens: Vec<String>,
}

/// Network shape and optimizer settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSettings {
    #[serde(default = "default_hidden_sizes")]
    pub hidden_sizes: Vec<usize>,
    #[serde(default = "default_dropout")]
    pub dropout: f32,
    #[serde(default = "default_epochs")]
    pub epochs: usize,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f32,
    /// Time-based learning-rate decay per optimizer step.
    #[serde(default = "default_decay")]
    pub decay: f32,
    #[serde(default = "default_momentum")]
    pub momentum: f32,
    #[serde(default = "default_true")]
    pub nesterov: bool,
    /// Fixed RNG seed; drawn from OS entropy when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            intents_path: default_intents_path(),
            output_dir: default_output_dir(),
            lemma_exceptions: None,
            lemma_words: None,
            text: TextSettings::default(),
            training: TrainingSettings::default(),
        }
    }
}

impl Default for TextSettings {
    fn default() -> Self {
        Self {
            ignore_tokens: default_ignore_tokens(),
        }
    }
}

impl Default for TrainingSettings {
    fn default() -> Self {
        Self {
            hidden_sizes: default_hidden_sizes(),
            dropout: default_dropout(),
            epochs: default_epochs(),
            batch_size: default_batch_size(),
            learning_rate: default_learning_rate(),
            decay: default_decay(),
            momentum: default_momentum(),
            nesterov: true,
            seed: None,
        }
    }
}

impl TrainConfig {
    /// Parse a TOML document; `path` is used for error reporting only.
    pub fn from_toml_str(text: &str, path: &Path) -> Result<Self, ConfigError> {
        toml::from_str::<Self>(text)
            .map(Self::normalized)
            .map_err(|source| ConfigError::ParseToml {
                path: path.to_path_buf(),
                source,
            })
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let text = String::from_utf8(bytes).map_err(|source| ConfigError::ParseToml {
            path: path.to_path_buf(),
            source: SerdeDeError::custom(source),
        })?;
        Self::from_toml_str(&text, path)
    }

    /// Load the first config found: `explicit`, then `parley.toml` in the
    /// working directory, then `.parley/config.toml`. Falls back to defaults.
    ///
    /// Returns the config together with the file it came from.
    pub fn resolve(explicit: Option<&Path>) -> Result<(Self, Option<PathBuf>), ConfigError> {
        if let Some(path) = explicit {
            return Ok((Self::load_from(path)?, Some(path.to_path_buf())));
        }
        let candidates = [Some(PathBuf::from(LOCAL_CONFIG_FILE_NAME)), app_dirs::fallback_config_path()];
        for path in candidates.into_iter().flatten() {
            if path.is_file() {
                return Ok((Self::load_from(&path)?, Some(path)));
            }
        }
        Ok((Self::default(), None))
    }

    /// Clamp values into ranges the trainer accepts.
    pub fn normalized(mut self) -> Self {
        let training = &mut self.training;
        training.dropout = clamp_dropout(training.dropout);
        training.epochs = training.epochs.max(1);
        training.batch_size = training.batch_size.max(1);
        training.hidden_sizes.retain(|&width| width > 0);
        if !training.learning_rate.is_finite() || training.learning_rate <= 0.0 {
            training.learning_rate = default_learning_rate();
        }
        if !training.decay.is_finite() || training.decay < 0.0 {
            training.decay = 0.0;
        }
        if !training.momentum.is_finite() {
            training.momentum = default_momentum();
        }
        training.momentum = training.momentum.clamp(0.0, 0.999);
        self
    }

    /// MLP options for this config with the RNG seed chosen for the run.
    pub fn train_options(&self, seed: u64) -> TrainOptions {
        let training = &self.training;
        TrainOptions {
            hidden_sizes: training.hidden_sizes.clone(),
            dropout: training.dropout,
            epochs: training.epochs,
            batch_size: training.batch_size,
            learning_rate: training.learning_rate,
            decay: training.decay,
            momentum: training.momentum,
            nesterov: training.nesterov,
            seed,
        }
    }
}
