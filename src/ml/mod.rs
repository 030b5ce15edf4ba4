//! Classifier training, evaluation and the backend seam used by the pipeline.

pub mod backend;
pub mod history;
pub mod metrics;
pub mod mlp;

pub use backend::{ClassifierBackend, MlpBackend};
pub use history::{EpochStats, TrainingHistory};
