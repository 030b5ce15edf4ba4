mod support;

use std::path::{Path, PathBuf};

use parley::artifacts::ArtifactPaths;
use parley::config::TrainConfig;
use parley::dataset::{CorpusError, build_corpus};
use parley::intents::load_intents;
use parley::ml::mlp::MlpModel;
use parley::ml::{ClassifierBackend, EpochStats, TrainingHistory};
use parley::pipeline::{self, PipelineError};
use parley::text::Normalizer;
use support::parley_env::ParleyEnvGuard;
use tempfile::tempdir;

const INTENTS: &str = r#"{
  "intents": [
    {"tag": "greeting", "patterns": ["Hi", "Hello there", "Hey", "Good morning"], "responses": ["Hello!"]},
    {"tag": "goodbye", "patterns": ["Bye", "See you later", "Goodbye", "I am leaving"], "responses": ["Bye!"]},
    {"tag": "thanks", "patterns": ["Thanks", "Thank you", "Thanks a lot !", "Much appreciated"], "responses": []},
    {"tag": "jokes", "patterns": ["Tell me a joke", "Tell me some jokes", "Make me laugh"], "responses": []}
  ]
}"#;

fn write_intents(dir: &Path, text: &str) -> PathBuf {
    let path = dir.join("intents.json");
    std::fs::write(&path, text).unwrap();
    path
}

fn small_config(dir: &Path, intents_path: PathBuf) -> TrainConfig {
    let mut config = TrainConfig::default();
    config.intents_path = intents_path;
    config.output_dir = dir.join("model");
    config.training.hidden_sizes = vec![32, 16];
    config.training.epochs = 120;
    config.training.learning_rate = 0.05;
    config.training.dropout = 0.2;
    config.training.seed = Some(1234);
    config.normalized()
}

#[test]
fn full_run_writes_consistent_artifacts() {
    let dir = tempdir().unwrap();
    let intents_path = write_intents(dir.path(), INTENTS);
    let config = small_config(dir.path(), intents_path.clone());

    let mut epochs_seen = 0usize;
    let mut progress = |_: &EpochStats| epochs_seen += 1;
    let summary = pipeline::run(&config, Some(&mut progress)).unwrap();
    assert_eq!(epochs_seen, 120);

    let intents = load_intents(&intents_path).unwrap();
    let corpus = build_corpus(&intents.intents, &Normalizer::default());
    let paths = ArtifactPaths::new(dir.path().join("model"));

    let words = paths.read_words().unwrap();
    let classes = paths.read_classes().unwrap();
    assert_eq!(words, corpus.words);
    assert_eq!(classes, vec!["goodbye", "greeting", "jokes", "thanks"]);
    assert_eq!(summary.classes, classes);
    assert_eq!(summary.vocabulary_len, words.len());

    let training = paths.read_training_data().unwrap();
    assert_eq!(training.len(), 15);
    assert_eq!(summary.examples, 15);
    for (bag, label) in training.x.iter().zip(&training.y) {
        assert_eq!(bag.len(), words.len());
        assert_eq!(label.len(), classes.len());
        assert_eq!(label.iter().filter(|&&v| v == 1.0).count(), 1);
    }

    let history: TrainingHistory = paths.read_history().unwrap();
    assert_eq!(history.loss.len(), 120);
    assert_eq!(history.accuracy.len(), 120);
    assert_eq!(history.final_accuracy(), Some(summary.final_accuracy));
    assert_eq!(history.final_loss(), Some(summary.final_loss));

    let model = MlpModel::load_json(&paths.model()).unwrap();
    assert_eq!(model.classes, classes);
    assert_eq!(model.input_len, words.len());
    assert!(summary.fit_accuracy >= 0.9, "fit accuracy {}", summary.fit_accuracy);
}

#[test]
fn fixed_seed_reproduces_run() {
    let dir = tempdir().unwrap();
    let intents_path = write_intents(dir.path(), INTENTS);
    let mut config = small_config(dir.path(), intents_path);
    config.training.epochs = 5;

    let first = pipeline::run(&config, None).unwrap();
    let first_data = ArtifactPaths::new(&config.output_dir).read_training_data().unwrap();
    let second = pipeline::run(&config, None).unwrap();
    let second_data = ArtifactPaths::new(&config.output_dir).read_training_data().unwrap();

    assert_eq!(first.final_loss, second.final_loss);
    assert_eq!(first_data, second_data);
}

#[test]
fn single_intent_is_rejected_before_writing() {
    let dir = tempdir().unwrap();
    let intents_path = write_intents(
        dir.path(),
        r#"{"intents": [{"tag": "greeting", "patterns": ["hi", "hello"], "responses": []}]}"#,
    );
    let config = small_config(dir.path(), intents_path);
    let err = pipeline::run(&config, None).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Corpus(CorpusError::SingleClass { ref tag }) if tag == "greeting"
    ));
    assert!(!config.output_dir.exists());
}

#[test]
fn malformed_intents_surface_parse_error() {
    let dir = tempdir().unwrap();
    let intents_path = write_intents(dir.path(), r#"{"intents": [{"tag": "x", "patterns": "hi"}]}"#);
    let config = small_config(dir.path(), intents_path);
    let err = pipeline::run(&config, None).unwrap_err();
    assert!(matches!(err, PipelineError::Intents(_)));
    assert!(err.to_string().contains("intents.json"));
}

#[test]
fn lemma_exceptions_file_changes_vocabulary() {
    let dir = tempdir().unwrap();
    let intents_path = write_intents(dir.path(), INTENTS);
    let lemmas = dir.path().join("lemmas.txt");
    std::fs::write(&lemmas, "# map laugh onto joke\nlaugh,joke\n").unwrap();
    let mut config = small_config(dir.path(), intents_path);
    config.lemma_exceptions = Some(lemmas);
    config.training.epochs = 1;

    pipeline::run(&config, None).unwrap();
    let words = ArtifactPaths::new(&config.output_dir).read_words().unwrap();
    assert!(words.contains(&"joke".to_string()));
    assert!(!words.contains(&"laugh".to_string()));
    assert!(words.contains(&"thanks".to_string()));
    assert!(words.contains(&"thank".to_string()));
}

#[test]
fn lemma_word_list_limits_suffix_rules() {
    let dir = tempdir().unwrap();
    let intents_path = write_intents(dir.path(), INTENTS);
    let list = dir.path().join("words.txt");
    std::fs::write(&list, "tell\nhello\n").unwrap();
    let mut config = small_config(dir.path(), intents_path);
    config.lemma_words = Some(list);
    config.training.epochs = 1;

    pipeline::run(&config, None).unwrap();
    let words = ArtifactPaths::new(&config.output_dir).read_words().unwrap();
    // "joke" is not a listed lemma, so "jokes" stays as written.
    assert!(words.contains(&"jokes".to_string()));
    assert!(words.contains(&"joke".to_string()));
}

#[test]
fn malformed_lemma_exceptions_stop_the_run() {
    let dir = tempdir().unwrap();
    let intents_path = write_intents(dir.path(), INTENTS);
    let lemmas = dir.path().join("lemmas.txt");
    std::fs::write(&lemmas, "people,person,extra\n").unwrap();
    let mut config = small_config(dir.path(), intents_path);
    config.lemma_exceptions = Some(lemmas);

    let err = pipeline::run(&config, None).unwrap_err();
    assert!(matches!(err, PipelineError::Lemmas(_)));
    assert!(!config.output_dir.exists());
}

/// Backend that predicts the most frequent class and never learns.
struct MajorityBackend;

impl ClassifierBackend for MajorityBackend {
    type Model = usize;

    fn build(&mut self, _input_len: usize, _classes: &[String]) -> Result<usize, String> {
        Ok(0)
    }

    fn train(
        &mut self,
        model: &mut usize,
        _x: &[Vec<f32>],
        y: &[Vec<f32>],
        epochs: usize,
        _batch_size: usize,
        _progress: Option<&mut dyn FnMut(&EpochStats)>,
    ) -> Result<TrainingHistory, String> {
        let mut counts = vec![0usize; y[0].len()];
        for row in y {
            let hot = row.iter().position(|&v| v == 1.0).unwrap();
            counts[hot] += 1;
        }
        *model = (0..counts.len()).max_by_key(|&i| (counts[i], usize::MAX - i)).unwrap();
        Ok(TrainingHistory {
            loss: vec![1.0; epochs],
            accuracy: vec![0.25; epochs],
        })
    }

    fn predict(&self, model: &usize, _features: &[f32]) -> usize {
        *model
    }

    fn save(&self, model: &usize, path: &Path) -> Result<(), String> {
        std::fs::write(path, model.to_string()).map_err(|err| err.to_string())
    }
}

#[test]
fn pipeline_accepts_custom_backend() {
    let dir = tempdir().unwrap();
    let intents_path = write_intents(dir.path(), INTENTS);
    let config = small_config(dir.path(), intents_path);
    let summary = pipeline::run_with_backend(&config, 5, &mut MajorityBackend, None).unwrap();

    // goodbye and greeting both have 4 patterns; the lower index wins.
    assert_eq!(std::fs::read_to_string(summary.model_path()).unwrap(), "0");
    assert_eq!(summary.epochs, 120);
    assert!((summary.fit_accuracy - 4.0 / 15.0).abs() < 1e-6);
    assert_eq!(summary.per_class[0].recall, 1.0);
    assert_eq!(summary.per_class[1].recall, 0.0);
}

#[test]
fn resolve_falls_back_to_app_dir_config() {
    let base = tempdir().unwrap();
    let _guard = ParleyEnvGuard::set_config_home(base.path());
    let app_dir = base.path().join(".parley");
    std::fs::create_dir_all(&app_dir).unwrap();
    std::fs::write(app_dir.join("config.toml"), "[training]\nepochs = 3\n").unwrap();

    let (config, source) = TrainConfig::resolve(None).unwrap();
    assert_eq!(config.training.epochs, 3);
    assert_eq!(source, Some(app_dir.join("config.toml")));
}
