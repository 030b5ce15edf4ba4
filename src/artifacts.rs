//! JSON artifacts written by a training run and read back by the chatbot.

use std::path::{Path, PathBuf};

use serde::{Serialize, de::DeserializeOwned};
use thiserror::Error;

use crate::dataset::TrainingSet;
use crate::ml::TrainingHistory;

pub const WORDS_FILE_NAME: &str = "words.json";
pub const CLASSES_FILE_NAME: &str = "classes.json";
pub const MODEL_FILE_NAME: &str = "chatbot_model.json";
pub const TRAINING_DATA_FILE_NAME: &str = "training_data.json";
pub const HISTORY_FILE_NAME: &str = "training_history.json";

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("Failed to save model to {path}: {message}")]
    Model { path: PathBuf, message: String },
}

/// File locations inside one output directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub dir: PathBuf,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn words(&self) -> PathBuf {
        self.dir.join(WORDS_FILE_NAME)
    }

    pub fn classes(&self) -> PathBuf {
        self.dir.join(CLASSES_FILE_NAME)
    }

    pub fn model(&self) -> PathBuf {
        self.dir.join(MODEL_FILE_NAME)
    }

    pub fn training_data(&self) -> PathBuf {
        self.dir.join(TRAINING_DATA_FILE_NAME)
    }

    pub fn history(&self) -> PathBuf {
        self.dir.join(HISTORY_FILE_NAME)
    }

    pub fn ensure_dir(&self) -> Result<(), ArtifactError> {
        std::fs::create_dir_all(&self.dir).map_err(|source| ArtifactError::CreateDir {
            path: self.dir.clone(),
            source,
        })
    }

    pub fn write_words(&self, words: &[String]) -> Result<PathBuf, ArtifactError> {
        write_json(&self.words(), &words)
    }

    pub fn write_classes(&self, classes: &[String]) -> Result<PathBuf, ArtifactError> {
        write_json(&self.classes(), &classes)
    }

    pub fn write_training_data(&self, set: &TrainingSet) -> Result<PathBuf, ArtifactError> {
        write_json(&self.training_data(), set)
    }

    pub fn write_history(&self, history: &TrainingHistory) -> Result<PathBuf, ArtifactError> {
        write_json(&self.history(), history)
    }

    pub fn read_words(&self) -> Result<Vec<String>, ArtifactError> {
        read_json(&self.words())
    }

    pub fn read_classes(&self) -> Result<Vec<String>, ArtifactError> {
        read_json(&self.classes())
    }

    pub fn read_training_data(&self) -> Result<TrainingSet, ArtifactError> {
        read_json(&self.training_data())
    }

    pub fn read_history(&self) -> Result<TrainingHistory, ArtifactError> {
        read_json(&self.history())
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<PathBuf, ArtifactError> {
    let json = serde_json::to_vec(value).map_err(|source| ArtifactError::Encode {
        path: path.to_path_buf(),
        source,
    })?;
    std::fs::write(path, json).map_err(|source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    tracing::debug!("Wrote {}", path.display());
    Ok(path.to_path_buf())
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let bytes = std::fs::read(path).map_err(|source| ArtifactError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_slice(&bytes).map_err(|source| ArtifactError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn writes_into_nested_output_dir() {
        let dir = tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path().join("out").join("model"));
        paths.ensure_dir().unwrap();
        let words = vec!["goodbye".to_string(), "hello".to_string()];
        let written = paths.write_words(&words).unwrap();
        assert_eq!(written, paths.words());
        assert_eq!(paths.read_words().unwrap(), words);

        let raw = std::fs::read_to_string(paths.words()).unwrap();
        assert_eq!(raw, r#"["goodbye","hello"]"#);
    }

    #[test]
    fn history_file_uses_metric_keys() {
        let dir = tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        let history = TrainingHistory {
            loss: vec![0.9, 0.4],
            accuracy: vec![0.5, 1.0],
        };
        paths.write_history(&history).unwrap();
        let value: serde_json::Value =
            serde_json::from_slice(&std::fs::read(paths.history()).unwrap()).unwrap();
        assert_eq!(value["accuracy"][1], 1.0);
        assert_eq!(paths.read_history().unwrap(), history);
    }

    #[test]
    fn missing_and_corrupt_files_name_the_path() {
        let dir = tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path());
        assert!(matches!(
            paths.read_classes(),
            Err(ArtifactError::Read { path, .. }) if path == paths.classes()
        ));
        std::fs::write(paths.classes(), "not json").unwrap();
        assert!(matches!(
            paths.read_classes(),
            Err(ArtifactError::Decode { path, .. }) if path == paths.classes()
        ));
    }
}
