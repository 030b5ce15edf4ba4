//! End-to-end training run: intents in, artifacts out.

use std::path::PathBuf;
use std::sync::Arc;

use rand::{Rng, SeedableRng, rngs::StdRng};
use thiserror::Error;
use tracing::{info, warn};

use crate::artifacts::{ArtifactError, ArtifactPaths};
use crate::config::TrainConfig;
use crate::dataset::{CorpusError, build_corpus, vectorize};
use crate::intents::{IntentsError, load_intents};
use crate::ml::metrics::{ConfusionMatrix, IntentFit, accuracy, fit_by_intent};
use crate::ml::{ClassifierBackend, EpochStats, MlpBackend};
use crate::text::{EnglishLemmatizer, LemmaError, Normalizer, Tokenizer};

/// Offset separating the example-shuffle RNG from the model RNG.
const SHUFFLE_STREAM: u64 = 0x5eed_5eed;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Intents(#[from] IntentsError),
    #[error(transparent)]
    Lemmas(#[from] LemmaError),
    #[error("Unusable training data: {0}")]
    Corpus(#[from] CorpusError),
    #[error(transparent)]
    Artifacts(#[from] ArtifactError),
    #[error("Training failed: {0}")]
    Training(String),
}

/// Outcome of a completed run.
#[derive(Debug, Clone)]
pub struct TrainSummary {
    pub seed: u64,
    pub examples: usize,
    pub vocabulary_len: usize,
    pub classes: Vec<String>,
    pub epochs: usize,
    /// Last-epoch training accuracy (dropout active).
    pub final_accuracy: f32,
    /// Last-epoch training loss (dropout active).
    pub final_loss: f32,
    /// Accuracy of the finished model on the training rows, dropout off.
    pub fit_accuracy: f32,
    pub per_class: Vec<IntentFit>,
    pub artifacts: ArtifactPaths,
}

/// Train the stock MLP as described by `config`.
pub fn run(
    config: &TrainConfig,
    progress: Option<&mut dyn FnMut(&EpochStats)>,
) -> Result<TrainSummary, PipelineError> {
    let seed = resolve_seed(config);
    let mut backend = MlpBackend::new(config.train_options(seed));
    run_with_backend(config, seed, &mut backend, progress)
}

/// Train with an arbitrary backend; `seed` drives the example shuffle.
pub fn run_with_backend<B: ClassifierBackend>(
    config: &TrainConfig,
    seed: u64,
    backend: &mut B,
    progress: Option<&mut dyn FnMut(&EpochStats)>,
) -> Result<TrainSummary, PipelineError> {
    let intents = load_intents(&config.intents_path)?;
    info!(
        "Loaded {} intents ({} patterns) from {}",
        intents.intents.len(),
        intents.pattern_count(),
        config.intents_path.display()
    );

    let normalizer = build_normalizer(config)?;
    let corpus = build_corpus(&intents.intents, &normalizer);
    info!(
        "{} documents, {} classes, {} unique lemmatized words",
        corpus.documents.len(),
        corpus.classes.len(),
        corpus.words.len()
    );
    corpus.validate()?;

    let mut training = vectorize(&corpus, &normalizer);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(SHUFFLE_STREAM));
    training.shuffle(&mut rng);

    let artifacts = ArtifactPaths::new(&config.output_dir);
    artifacts.ensure_dir()?;
    artifacts.write_words(&corpus.words)?;
    artifacts.write_classes(&corpus.classes)?;

    let epochs = config.training.epochs;
    let batch_size = config.training.batch_size;
    info!(
        "Training on {} examples for {epochs} epochs (batch size {batch_size}, seed {seed})",
        training.len()
    );
    let mut model = backend
        .build(corpus.words.len(), &corpus.classes)
        .map_err(PipelineError::Training)?;
    let history = backend
        .train(&mut model, &training.x, &training.y, epochs, batch_size, progress)
        .map_err(PipelineError::Training)?;
    let (Some(final_accuracy), Some(final_loss)) =
        (history.final_accuracy(), history.final_loss())
    else {
        return Err(PipelineError::Training("No epochs were run".to_string()));
    };

    let model_path = artifacts.model();
    backend
        .save(&model, &model_path)
        .map_err(|message| ArtifactError::Model {
            path: model_path.clone(),
            message,
        })?;
    artifacts.write_training_data(&training)?;
    artifacts.write_history(&history)?;
    info!("Artifacts written to {}", artifacts.dir.display());

    let truths = training.label_indices();
    let cm = ConfusionMatrix::from_pairs(
        corpus.classes.len(),
        training
            .x
            .iter()
            .zip(truths)
            .map(|(row, truth)| (truth, backend.predict(&model, row))),
    );
    let fit_accuracy = accuracy(&cm);
    let per_class = fit_by_intent(&cm, &corpus.classes);
    for stats in per_class.iter().filter(|stats| stats.recall < 1.0) {
        warn!(
            "Intent {:?} only fits {:.0}% of its {} patterns",
            stats.tag,
            stats.recall * 100.0,
            stats.support
        );
    }

    Ok(TrainSummary {
        seed,
        examples: training.len(),
        vocabulary_len: corpus.words.len(),
        classes: corpus.classes,
        epochs: history.epochs(),
        final_accuracy,
        final_loss,
        fit_accuracy,
        per_class,
        artifacts,
    })
}

fn build_normalizer(config: &TrainConfig) -> Result<Normalizer, PipelineError> {
    let mut lemmatizer = EnglishLemmatizer::default();
    if let Some(path) = &config.lemma_exceptions {
        lemmatizer = lemmatizer.with_exceptions_file(path)?;
        info!("Loaded lemma exceptions from {}", path.display());
    }
    if let Some(path) = &config.lemma_words {
        lemmatizer = lemmatizer.with_lemma_list_file(path)?;
        info!("Suffix rules restricted to lemmas listed in {}", path.display());
    }
    let tokenizer = Tokenizer::new(config.text.ignore_tokens.iter().cloned());
    Ok(Normalizer::new(tokenizer, Arc::new(lemmatizer)))
}

fn resolve_seed(config: &TrainConfig) -> u64 {
    config
        .training
        .seed
        .unwrap_or_else(|| rand::rng().random())
}

impl TrainSummary {
    pub fn model_path(&self) -> PathBuf {
        self.artifacts.model()
    }
}
