use std::collections::BTreeSet;

/// Tokens dropped from patterns before normalization.
pub const DEFAULT_IGNORE_TOKENS: [&str; 5] = ["?", "!", ".", "/", "@"];

/// Whitespace tokenizer with a whole-token ignore set.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    ignore: BTreeSet<String>,
}

impl Default for Tokenizer {
    fn default() -> Self {
        Self::new(DEFAULT_IGNORE_TOKENS.iter().copied())
    }
}

impl Tokenizer {
    pub fn new<I, S>(ignore: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ignore: ignore.into_iter().map(Into::into).collect(),
        }
    }

    /// Split `pattern` on whitespace, dropping ignored tokens.
    ///
    /// Ignored tokens must match exactly; `"hi?"` is kept as-is.
    pub fn tokenize(&self, pattern: &str) -> Vec<String> {
        pattern
            .split_whitespace()
            .filter(|token| !self.is_ignored(token))
            .map(str::to_string)
            .collect()
    }

    pub fn is_ignored(&self, token: &str) -> bool {
        self.ignore.contains(token)
    }
}
