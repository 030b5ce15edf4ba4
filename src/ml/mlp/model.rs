use std::path::Path;

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Current serialized model layout.
pub const MODEL_VERSION: i64 = 1;

/// Fully connected layer; `weights` is row-major `[outputs][inputs]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DenseLayer {
    pub inputs: usize,
    pub outputs: usize,
    pub weights: Vec<f32>,
    pub bias: Vec<f32>,
}

impl DenseLayer {
    /// Glorot-uniform weights and zero bias.
    pub fn glorot<R: Rng + ?Sized>(inputs: usize, outputs: usize, rng: &mut R) -> Self {
        let limit = (6.0 / (inputs + outputs).max(1) as f32).sqrt();
        let weights = (0..inputs * outputs)
            .map(|_| rng.random_range(-limit..=limit))
            .collect();
        Self {
            inputs,
            outputs,
            weights,
            bias: vec![0.0; outputs],
        }
    }

    /// `out = W * input + b`.
    pub fn forward_into(&self, input: &[f32], out: &mut [f32]) {
        for (o, slot) in out.iter_mut().enumerate().take(self.outputs) {
            let row = &self.weights[o * self.inputs..(o + 1) * self.inputs];
            *slot = self.bias[o] + row.iter().zip(input).map(|(w, x)| w * x).sum::<f32>();
        }
    }
}

/// Feed-forward intent classifier: ReLU hidden layers, softmax output.
///
/// Dropout is a training-time setting and is not applied at inference.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MlpModel {
    pub model_version: i64,
    /// Bag-of-words width (vocabulary size).
    pub input_len: usize,
    /// Ordered intent tags; output index `i` scores `classes[i]`.
    pub classes: Vec<String>,
    pub dropout: f32,
    pub layers: Vec<DenseLayer>,
}

impl MlpModel {
    /// Randomly initialized model with the given hidden layer widths.
    pub fn new<R: Rng + ?Sized>(
        input_len: usize,
        classes: Vec<String>,
        hidden_sizes: &[usize],
        dropout: f32,
        rng: &mut R,
    ) -> Self {
        let mut layers = Vec::with_capacity(hidden_sizes.len() + 1);
        let mut inputs = input_len;
        for &width in hidden_sizes {
            layers.push(DenseLayer::glorot(inputs, width, rng));
            inputs = width;
        }
        layers.push(DenseLayer::glorot(inputs, classes.len(), rng));
        Self {
            model_version: MODEL_VERSION,
            input_len,
            classes,
            dropout,
            layers,
        }
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {})",
                self.model_version, MODEL_VERSION
            ));
        }
        if self.classes.len() < 2 {
            return Err("Model must contain at least 2 classes".to_string());
        }
        if self.input_len == 0 {
            return Err("Model input_len must be positive".to_string());
        }
        let Some(last) = self.layers.last() else {
            return Err("Model has no layers".to_string());
        };
        if last.outputs != self.classes.len() {
            return Err(format!(
                "Output layer has {} units but {} classes",
                last.outputs,
                self.classes.len()
            ));
        }
        let mut expected_inputs = self.input_len;
        for (idx, layer) in self.layers.iter().enumerate() {
            if layer.inputs != expected_inputs {
                return Err(format!(
                    "Layer {idx} expects {} inputs but receives {expected_inputs}",
                    layer.inputs
                ));
            }
            if layer.weights.len() != layer.inputs * layer.outputs {
                return Err(format!("Layer {idx} weights length mismatch"));
            }
            if layer.bias.len() != layer.outputs {
                return Err(format!("Layer {idx} bias length mismatch"));
            }
            expected_inputs = layer.outputs;
        }
        Ok(())
    }

    /// Class probabilities for a bag-of-words row; empty on width mismatch.
    pub fn predict_proba(&self, features: &[f32]) -> Vec<f32> {
        if features.len() != self.input_len || self.layers.is_empty() {
            return Vec::new();
        }
        let last = self.layers.len() - 1;
        let mut current = features.to_vec();
        for (idx, layer) in self.layers.iter().enumerate() {
            let mut next = vec![0.0f32; layer.outputs];
            layer.forward_into(&current, &mut next);
            if idx < last {
                for value in &mut next {
                    *value = value.max(0.0);
                }
            }
            current = next;
        }
        softmax(&current)
    }

    pub fn predict_class_index(&self, features: &[f32]) -> usize {
        crate::dataset::argmax(&self.predict_proba(features))
    }

    pub fn save_json(&self, path: &Path) -> Result<(), String> {
        let json = serde_json::to_string(self).map_err(|err| err.to_string())?;
        std::fs::write(path, json).map_err(|err| format!("{}: {err}", path.display()))
    }

    pub fn load_json(path: &Path) -> Result<Self, String> {
        let bytes = std::fs::read(path).map_err(|err| format!("{}: {err}", path.display()))?;
        let model: Self = serde_json::from_slice(&bytes).map_err(|err| err.to_string())?;
        model.validate()?;
        Ok(model)
    }
}

/// Numerically stable softmax; uniform when every exponent underflows.
pub fn softmax(raw: &[f32]) -> Vec<f32> {
    let mut out = vec![0.0f32; raw.len()];
    softmax_into(raw, &mut out);
    out
}

pub(crate) fn softmax_into(raw: &[f32], out: &mut [f32]) {
    if raw.is_empty() || out.is_empty() {
        return;
    }
    let max = raw
        .iter()
        .copied()
        .fold(f32::NEG_INFINITY, |a, b| a.max(b));
    let mut sum = 0.0f32;
    for (slot, &v) in out.iter_mut().zip(raw) {
        *slot = (v - max).exp();
        sum += *slot;
    }
    if sum == 0.0 || !sum.is_finite() {
        let uniform = 1.0 / raw.len() as f32;
        out.iter_mut().for_each(|v| *v = uniform);
        return;
    }
    out.iter_mut().for_each(|v| *v /= sum);
}
