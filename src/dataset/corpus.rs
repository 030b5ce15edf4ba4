use std::collections::BTreeSet;

use thiserror::Error;

use crate::intents::Intent;
use crate::text::Normalizer;

/// Tokens of one pattern together with its intent tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// Raw pattern tokens after ignore-set filtering (not yet normalized).
    pub tokens: Vec<String>,
    pub tag: String,
}

/// Vocabulary, label set and per-pattern documents for one training run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    /// Sorted, deduplicated normalized words.
    pub words: Vec<String>,
    /// Sorted, deduplicated intent tags.
    pub classes: Vec<String>,
    /// One entry per pattern, in input order.
    pub documents: Vec<Document>,
}

/// Inputs that cannot produce a usable classifier.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CorpusError {
    #[error("No intent has any training pattern")]
    NoPatterns,
    #[error("Vocabulary is empty; every pattern is blank or ignored")]
    EmptyVocabulary,
    #[error("Need at least 2 distinct intent tags, found only {tag:?}")]
    SingleClass { tag: String },
}

/// Build the vocabulary, label set and documents for `intents`.
///
/// Only tags that own at least one pattern become classes.
pub fn build_corpus(intents: &[Intent], normalizer: &Normalizer) -> Corpus {
    let mut words = BTreeSet::new();
    let mut classes = BTreeSet::new();
    let mut documents = Vec::with_capacity(intents.iter().map(|i| i.patterns.len()).sum());

    for intent in intents {
        for pattern in &intent.patterns {
            let tokens = normalizer.tokenize(pattern);
            words.extend(tokens.iter().map(|token| normalizer.normalize_token(token)));
            classes.insert(intent.tag.clone());
            documents.push(Document {
                tokens,
                tag: intent.tag.clone(),
            });
        }
    }

    Corpus {
        words: words.into_iter().collect(),
        classes: classes.into_iter().collect(),
        documents,
    }
}

impl Corpus {
    /// Check the dataset can train a multi-class model.
    pub fn validate(&self) -> Result<(), CorpusError> {
        if self.documents.is_empty() {
            return Err(CorpusError::NoPatterns);
        }
        if self.words.is_empty() {
            return Err(CorpusError::EmptyVocabulary);
        }
        if self.classes.len() < 2 {
            let tag = self.classes.first().cloned().unwrap_or_default();
            return Err(CorpusError::SingleClass { tag });
        }
        Ok(())
    }

    pub fn class_index(&self, tag: &str) -> Option<usize> {
        self.classes
            .binary_search_by(|class| class.as_str().cmp(tag))
            .ok()
    }
}
