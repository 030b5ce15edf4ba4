/// Mini-batch SGD with momentum, optional Nesterov look-ahead and
/// time-based learning-rate decay.
///
/// ```text
/// lr_t = lr / (1 + decay * iterations)
/// v    = momentum * v - lr_t * grad
/// p   += v                              (classic)
/// p   += momentum * v - lr_t * grad     (nesterov)
/// ```
#[derive(Debug, Clone)]
pub struct Sgd {
    learning_rate: f32,
    momentum: f32,
    decay: f32,
    nesterov: bool,
    iterations: u64,
    velocities: Vec<Vec<f32>>,
}

impl Sgd {
    pub fn new(learning_rate: f32, momentum: f32, decay: f32, nesterov: bool) -> Self {
        Self {
            learning_rate,
            momentum,
            decay,
            nesterov,
            iterations: 0,
            velocities: Vec::new(),
        }
    }

    /// Learning rate used by the next update.
    pub fn current_learning_rate(&self) -> f32 {
        self.learning_rate / (1.0 + self.decay * self.iterations as f32)
    }

    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Apply one update to the parameter buffer identified by `slot`.
    pub fn update(&mut self, slot: usize, params: &mut [f32], grads: &[f32]) {
        let lr = self.current_learning_rate();
        let (momentum, nesterov) = (self.momentum, self.nesterov);
        if slot >= self.velocities.len() {
            self.velocities.resize(slot + 1, Vec::new());
        }
        let velocity = &mut self.velocities[slot];
        if velocity.len() != params.len() {
            *velocity = vec![0.0; params.len()];
        }
        for ((param, &grad), v) in params.iter_mut().zip(grads).zip(velocity.iter_mut()) {
            if momentum == 0.0 {
                *param -= lr * grad;
                continue;
            }
            *v = momentum * *v - lr * grad;
            if nesterov {
                *param += momentum * *v - lr * grad;
            } else {
                *param += *v;
            }
        }
    }

    /// Close the current batch; advances the decay schedule.
    pub fn finish_step(&mut self) {
        self.iterations += 1;
    }
}
