use std::collections::HashSet;

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use super::corpus::Corpus;
use crate::text::Normalizer;

/// Feature and label rows, index-aligned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingSet {
    #[serde(rename = "train_x")]
    pub x: Vec<Vec<f32>>,
    #[serde(rename = "train_y")]
    pub y: Vec<Vec<f32>>,
}

impl TrainingSet {
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Shuffle rows, keeping each feature row paired with its label row.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        let mut order: Vec<usize> = (0..self.x.len()).collect();
        order.shuffle(rng);
        let mut x = std::mem::take(&mut self.x).into_iter().map(Some).collect::<Vec<_>>();
        let mut y = std::mem::take(&mut self.y).into_iter().map(Some).collect::<Vec<_>>();
        for idx in order {
            if let (Some(features), Some(label)) = (x[idx].take(), y[idx].take()) {
                self.x.push(features);
                self.y.push(label);
            }
        }
    }

    /// Index of the hot entry in every label row.
    pub fn label_indices(&self) -> Vec<usize> {
        self.y.iter().map(|row| argmax(row)).collect()
    }
}

/// Presence vector over `words`: 1.0 where the word occurs in `tokens`.
pub fn bag_of_words(words: &[String], tokens: &[String]) -> Vec<f32> {
    let present: HashSet<&str> = tokens.iter().map(String::as_str).collect();
    words
        .iter()
        .map(|word| if present.contains(word.as_str()) { 1.0 } else { 0.0 })
        .collect()
}

/// One-hot row for `index` among `len` classes.
pub fn one_hot(len: usize, index: usize) -> Vec<f32> {
    let mut row = vec![0.0f32; len];
    if let Some(slot) = row.get_mut(index) {
        *slot = 1.0;
    }
    row
}

/// Convert every document of `corpus` into a training example, in document order.
///
/// Documents whose tag is missing from `corpus.classes` are skipped; a corpus
/// produced by `build_corpus` has none.
pub fn vectorize(corpus: &Corpus, normalizer: &Normalizer) -> TrainingSet {
    let mut set = TrainingSet {
        x: Vec::with_capacity(corpus.documents.len()),
        y: Vec::with_capacity(corpus.documents.len()),
    };
    for document in &corpus.documents {
        let Some(class_idx) = corpus.class_index(&document.tag) else {
            continue;
        };
        let normalized = normalizer.normalize_tokens(&document.tokens);
        set.x.push(bag_of_words(&corpus.words, &normalized));
        set.y.push(one_hot(corpus.classes.len(), class_idx));
    }
    set
}

pub(crate) fn argmax(values: &[f32]) -> usize {
    let mut best = 0usize;
    let mut best_val = f32::NEG_INFINITY;
    for (idx, &value) in values.iter().enumerate() {
        if value > best_val {
            best_val = value;
            best = idx;
        }
    }
    best
}
