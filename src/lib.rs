//! Offline trainer for the chatbot's intent classifier.
//!
//! Patterns grouped by intent tag become a sorted vocabulary, a sorted label
//! set and bag-of-words training rows; a small MLP is fitted on them and the
//! results are written as JSON artifacts for the chatbot to load.

/// Application directories for logs and the fallback config.
pub mod app_dirs;
/// Training artifact files.
pub mod artifacts;
/// TOML trainer configuration.
pub mod config;
/// Vocabulary, labels and vectorization.
pub mod dataset;
/// Intent definitions.
pub mod intents;
/// Tracing setup for binaries.
pub mod logging;
/// Classifier backend, MLP and metrics.
pub mod ml;
/// End-to-end training run.
pub mod pipeline;
/// Tokenization and lemmatization.
pub mod text;
