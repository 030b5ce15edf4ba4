use rand::rngs::StdRng;
use rand::{Rng, SeedableRng, seq::SliceRandom};

use super::MlpModel;
use super::model::softmax_into;
use super::optim::Sgd;
use crate::dataset::argmax;
use crate::ml::history::{EpochStats, TrainingHistory};

/// Probabilities are clipped to `[EPSILON, 1 - EPSILON]` before taking logs.
const EPSILON: f32 = 1e-7;
/// Offset between the init and training RNG streams for one seed.
const TRAIN_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub hidden_sizes: Vec<usize>,
    pub dropout: f32,
    pub epochs: usize,
    pub batch_size: usize,
    pub learning_rate: f32,
    pub decay: f32,
    pub momentum: f32,
    pub nesterov: bool,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            hidden_sizes: vec![128, 64],
            dropout: 0.5,
            epochs: 200,
            batch_size: 5,
            learning_rate: 0.01,
            decay: 1e-6,
            momentum: 0.9,
            nesterov: true,
            seed: 42,
        }
    }
}

/// Freshly initialized model for `input_len` bag-of-words features.
pub fn build_mlp(
    input_len: usize,
    classes: &[String],
    options: &TrainOptions,
) -> Result<MlpModel, String> {
    if input_len == 0 {
        return Err("Input width must be positive".to_string());
    }
    if classes.len() < 2 {
        return Err("Need at least 2 classes".to_string());
    }
    if options.hidden_sizes.iter().any(|&width| width == 0) {
        return Err("Hidden layer sizes must be positive".to_string());
    }
    let mut rng = StdRng::seed_from_u64(options.seed);
    Ok(MlpModel::new(
        input_len,
        classes.to_vec(),
        &options.hidden_sizes,
        options.dropout.clamp(0.0, 0.9),
        &mut rng,
    ))
}

/// Fit `model` on one-hot targets `y` with categorical cross-entropy.
///
/// Rows are reshuffled every epoch; gradients are averaged per mini-batch.
pub fn train_mlp(
    model: &mut MlpModel,
    x: &[Vec<f32>],
    y: &[Vec<f32>],
    options: &TrainOptions,
    mut progress: Option<&mut dyn FnMut(&EpochStats)>,
) -> Result<TrainingHistory, String> {
    if x.len() != y.len() {
        return Err("Mismatched X/Y lengths".to_string());
    }
    if x.is_empty() {
        return Err("Empty dataset".to_string());
    }
    model.validate()?;
    let n_classes = model.classes.len();
    if let Some(row) = x.iter().find(|row| row.len() != model.input_len) {
        return Err(format!(
            "Feature row has {} values but model expects {}",
            row.len(),
            model.input_len
        ));
    }
    if let Some(row) = y.iter().find(|row| row.len() != n_classes) {
        return Err(format!(
            "Label row has {} values but model has {} classes",
            row.len(),
            n_classes
        ));
    }

    let dropout = model.dropout.clamp(0.0, 0.9);
    let batch_size = options.batch_size.max(1);
    let mut rng = StdRng::seed_from_u64(options.seed.wrapping_add(TRAIN_STREAM));
    let mut optimizer = Sgd::new(
        options.learning_rate,
        options.momentum,
        options.decay,
        options.nesterov,
    );
    let mut scratch = Scratch::new(model);
    let mut indices: Vec<usize> = (0..x.len()).collect();
    let mut history = TrainingHistory::default();

    for epoch in 0..options.epochs {
        indices.shuffle(&mut rng);
        let mut loss_sum = 0.0f64;
        let mut correct = 0usize;

        for batch in indices.chunks(batch_size) {
            scratch.zero_grads();
            for &idx in batch {
                scratch.forward(model, &x[idx], dropout, &mut rng);
                let probs = scratch.output();
                let target = &y[idx];
                loss_sum += cross_entropy(probs, target) as f64;
                if argmax(probs) == argmax(target) {
                    correct += 1;
                }
                scratch.backward(model, &x[idx], target);
            }

            let scale = 1.0 / batch.len() as f32;
            for (layer_idx, (layer, grads)) in
                model.layers.iter_mut().zip(&mut scratch.grads).enumerate()
            {
                grads.weights.iter_mut().for_each(|g| *g *= scale);
                grads.bias.iter_mut().for_each(|g| *g *= scale);
                optimizer.update(2 * layer_idx, &mut layer.weights, &grads.weights);
                optimizer.update(2 * layer_idx + 1, &mut layer.bias, &grads.bias);
            }
            optimizer.finish_step();
        }

        let stats = EpochStats {
            epoch,
            epochs: options.epochs,
            loss: (loss_sum / x.len() as f64) as f32,
            accuracy: correct as f32 / x.len() as f32,
        };
        history.record(&stats);
        if let Some(callback) = progress.as_deref_mut() {
            callback(&stats);
        }
    }

    Ok(history)
}

fn cross_entropy(probs: &[f32], target: &[f32]) -> f32 {
    probs
        .iter()
        .zip(target)
        .filter(|(_, t)| **t != 0.0)
        .map(|(p, t)| -t * p.clamp(EPSILON, 1.0 - EPSILON).ln())
        .sum()
}

struct LayerGrads {
    weights: Vec<f32>,
    bias: Vec<f32>,
}

/// Per-sample activations and per-batch gradient accumulators.
struct Scratch {
    /// Pre-activation values per layer.
    pre: Vec<Vec<f32>>,
    /// Post-activation (and post-dropout) outputs per layer; the last is softmax.
    act: Vec<Vec<f32>>,
    /// Dropout scale per hidden unit: 0 or `1 / (1 - p)`.
    mask: Vec<Vec<f32>>,
    /// Error signal per layer output.
    delta: Vec<Vec<f32>>,
    grads: Vec<LayerGrads>,
}

impl Scratch {
    fn new(model: &MlpModel) -> Self {
        let widths = || model.layers.iter().map(|layer| vec![0.0f32; layer.outputs]);
        Self {
            pre: widths().collect(),
            act: widths().collect(),
            mask: widths().collect(),
            delta: widths().collect(),
            grads: model
                .layers
                .iter()
                .map(|layer| LayerGrads {
                    weights: vec![0.0; layer.weights.len()],
                    bias: vec![0.0; layer.bias.len()],
                })
                .collect(),
        }
    }

    fn zero_grads(&mut self) {
        for grads in &mut self.grads {
            grads.weights.iter_mut().for_each(|g| *g = 0.0);
            grads.bias.iter_mut().for_each(|g| *g = 0.0);
        }
    }

    fn output(&self) -> &[f32] {
        self.act.last().map(Vec::as_slice).unwrap_or(&[])
    }

    fn forward<R: Rng>(&mut self, model: &MlpModel, input: &[f32], dropout: f32, rng: &mut R) {
        let last = model.layers.len() - 1;
        for (idx, layer) in model.layers.iter().enumerate() {
            let (done, rest) = self.act.split_at_mut(idx);
            let layer_input = if idx == 0 { input } else { done[idx - 1].as_slice() };
            layer.forward_into(layer_input, &mut self.pre[idx]);
            let out = &mut rest[0];
            if idx == last {
                softmax_into(&self.pre[idx], out);
                continue;
            }
            let keep_scale = 1.0 / (1.0 - dropout);
            for ((slot, &z), m) in out.iter_mut().zip(&self.pre[idx]).zip(&mut self.mask[idx]) {
                *m = if dropout > 0.0 && rng.random::<f32>() < dropout {
                    0.0
                } else if dropout > 0.0 {
                    keep_scale
                } else {
                    1.0
                };
                *slot = z.max(0.0) * *m;
            }
        }
    }

    fn backward(&mut self, model: &MlpModel, input: &[f32], target: &[f32]) {
        let last = model.layers.len() - 1;
        for ((d, &p), &t) in self.delta[last].iter_mut().zip(&self.act[last]).zip(target) {
            *d = p - t;
        }
        for idx in (0..model.layers.len()).rev() {
            let layer = &model.layers[idx];
            let layer_input = if idx == 0 { input } else { self.act[idx - 1].as_slice() };
            let grads = &mut self.grads[idx];
            for (o, &d) in self.delta[idx].iter().enumerate() {
                if d == 0.0 {
                    continue;
                }
                grads.bias[o] += d;
                let row = &mut grads.weights[o * layer.inputs..(o + 1) * layer.inputs];
                for (g, &a) in row.iter_mut().zip(layer_input) {
                    *g += d * a;
                }
            }
            if idx == 0 {
                break;
            }
            let (below, above) = self.delta.split_at_mut(idx);
            let prev = &mut below[idx - 1];
            prev.iter_mut().for_each(|v| *v = 0.0);
            for (o, &d) in above[0].iter().enumerate() {
                if d == 0.0 {
                    continue;
                }
                let row = &layer.weights[o * layer.inputs..(o + 1) * layer.inputs];
                for (p, &w) in prev.iter_mut().zip(row) {
                    *p += d * w;
                }
            }
            for ((p, &z), &m) in prev
                .iter_mut()
                .zip(&self.pre[idx - 1])
                .zip(&self.mask[idx - 1])
            {
                if z <= 0.0 {
                    *p = 0.0;
                } else {
                    *p *= m;
                }
            }
        }
    }
}
