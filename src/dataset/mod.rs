//! Vocabulary, label set and bag-of-words training examples.

mod corpus;
mod vectorize;

pub use corpus::{Corpus, CorpusError, Document, build_corpus};
pub use vectorize::{TrainingSet, bag_of_words, one_hot, vectorize};
pub(crate) use vectorize::argmax;
