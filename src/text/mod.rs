//! Pattern tokenization and word normalization.

mod lemmatize;
mod tokenize;

use std::sync::Arc;

pub use lemmatize::{EnglishLemmatizer, IdentityLemmatizer, LemmaError, Lemmatizer};
pub use tokenize::{DEFAULT_IGNORE_TOKENS, Tokenizer};

/// Tokenizer plus lemmatizer, shared by vocabulary building and vectorization.
#[derive(Clone)]
pub struct Normalizer {
    tokenizer: Tokenizer,
    lemmatizer: Arc<dyn Lemmatizer>,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(Tokenizer::default(), Arc::new(EnglishLemmatizer::default()))
    }
}

impl Normalizer {
    pub fn new(tokenizer: Tokenizer, lemmatizer: Arc<dyn Lemmatizer>) -> Self {
        Self {
            tokenizer,
            lemmatizer,
        }
    }

    pub fn tokenize(&self, pattern: &str) -> Vec<String> {
        self.tokenizer.tokenize(pattern)
    }

    /// Lowercase then lemmatize a single token.
    pub fn normalize_token(&self, token: &str) -> String {
        self.lemmatizer.lemmatize(&token.to_lowercase())
    }

    pub fn normalize_tokens(&self, tokens: &[String]) -> Vec<String> {
        tokens.iter().map(|token| self.normalize_token(token)).collect()
    }
}
