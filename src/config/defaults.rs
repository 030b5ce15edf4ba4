use std::path::PathBuf;

use crate::text::DEFAULT_IGNORE_TOKENS;

pub(super) const MAX_DROPOUT: f32 = 0.9;

pub(super) fn clamp_dropout(value: f32) -> f32 {
    if value.is_finite() {
        value.clamp(0.0, MAX_DROPOUT)
    } else {
        default_dropout()
    }
}

pub(super) fn default_intents_path() -> PathBuf {
    PathBuf::from("chatbot").join("intents.json")
}

pub(super) fn default_output_dir() -> PathBuf {
    PathBuf::from("model")
}

pub(super) fn default_ignore_tokens() -> Vec<String> {
    DEFAULT_IGNORE_TOKENS.iter().map(|t| t.to_string()).collect()
}

pub(super) fn default_hidden_sizes() -> Vec<usize> {
    vec![128, 64]
}

pub(super) fn default_dropout() -> f32 {
    0.5
}

pub(super) fn default_epochs() -> usize {
    200
}

pub(super) fn default_batch_size() -> usize {
    5
}

pub(super) fn default_learning_rate() -> f32 {
    0.01
}

pub(super) fn default_decay() -> f32 {
    1e-6
}

pub(super) fn default_momentum() -> f32 {
    0.9
}

pub(super) fn default_true() -> bool {
    true
}
