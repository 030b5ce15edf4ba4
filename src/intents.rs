//! Intent definitions loaded from the chatbot's `intents.json`.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IntentsError {
    #[error("Failed to read intents file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse intents file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Top-level `{"intents": [...]}` document.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntentsFile {
    pub intents: Vec<Intent>,
}

/// A labeled group of example utterances.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Intent {
    pub tag: String,
    pub patterns: Vec<String>,
    /// Canned replies; carried through for the chatbot but unused in training.
    #[serde(default)]
    pub responses: Vec<String>,
}

impl Intent {
    pub fn new(tag: impl Into<String>, patterns: &[&str]) -> Self {
        Self {
            tag: tag.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            responses: Vec::new(),
        }
    }
}

impl IntentsFile {
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn pattern_count(&self) -> usize {
        self.intents.iter().map(|intent| intent.patterns.len()).sum()
    }
}

/// Read and parse an intents file.
pub fn load_intents(path: &Path) -> Result<IntentsFile, IntentsError> {
    let bytes = std::fs::read(path).map_err(|source| IntentsError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| IntentsError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
