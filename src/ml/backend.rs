use std::path::Path;

use super::history::{EpochStats, TrainingHistory};
use super::mlp::{MlpModel, TrainOptions, build_mlp, train_mlp};

/// Model construction, fitting and persistence used by the training pipeline.
///
/// The pipeline treats `Model` as opaque: it only builds, trains, scores and
/// writes it.
pub trait ClassifierBackend {
    type Model;

    fn build(&mut self, input_len: usize, classes: &[String]) -> Result<Self::Model, String>;

    fn train(
        &mut self,
        model: &mut Self::Model,
        x: &[Vec<f32>],
        y: &[Vec<f32>],
        epochs: usize,
        batch_size: usize,
        progress: Option<&mut dyn FnMut(&EpochStats)>,
    ) -> Result<TrainingHistory, String>;

    /// Index into the class list for one feature row, in inference mode.
    fn predict(&self, model: &Self::Model, features: &[f32]) -> usize;

    fn save(&self, model: &Self::Model, path: &Path) -> Result<(), String>;
}

/// Backend running the in-crate MLP.
#[derive(Debug, Clone, Default)]
pub struct MlpBackend {
    options: TrainOptions,
}

impl MlpBackend {
    pub fn new(options: TrainOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &TrainOptions {
        &self.options
    }
}

impl ClassifierBackend for MlpBackend {
    type Model = MlpModel;

    fn build(&mut self, input_len: usize, classes: &[String]) -> Result<MlpModel, String> {
        build_mlp(input_len, classes, &self.options)
    }

    fn train(
        &mut self,
        model: &mut MlpModel,
        x: &[Vec<f32>],
        y: &[Vec<f32>],
        epochs: usize,
        batch_size: usize,
        progress: Option<&mut dyn FnMut(&EpochStats)>,
    ) -> Result<TrainingHistory, String> {
        let options = TrainOptions {
            epochs,
            batch_size,
            ..self.options.clone()
        };
        train_mlp(model, x, y, &options, progress)
    }

    fn predict(&self, model: &MlpModel, features: &[f32]) -> usize {
        model.predict_class_index(features)
    }

    fn save(&self, model: &MlpModel, path: &Path) -> Result<(), String> {
        model.save_json(path)
    }
}
