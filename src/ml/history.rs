use serde::{Deserialize, Serialize};

/// Per-epoch training metrics, measured with dropout active.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrainingHistory {
    pub loss: Vec<f32>,
    pub accuracy: Vec<f32>,
}

/// Snapshot passed to progress callbacks after each epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochStats {
    /// Zero-based epoch index.
    pub epoch: usize,
    pub epochs: usize,
    pub loss: f32,
    pub accuracy: f32,
}

impl TrainingHistory {
    pub fn record(&mut self, stats: &EpochStats) {
        self.loss.push(stats.loss);
        self.accuracy.push(stats.accuracy);
    }

    pub fn epochs(&self) -> usize {
        self.loss.len()
    }

    pub fn final_loss(&self) -> Option<f32> {
        self.loss.last().copied()
    }

    pub fn final_accuracy(&self) -> Option<f32> {
        self.accuracy.last().copied()
    }
}
