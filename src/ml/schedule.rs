use burn::optim::LearningRate;

/// `lr(epoch) = initial · gamma^epoch`
///
/// Computed in closed form, so asking for the same epoch twice
/// (several batches per epoch) always gives the same rate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExponentialDecay {
    pub initial: LearningRate,
    pub gamma:   f64,
}

impl ExponentialDecay {
    pub fn new(initial: LearningRate, gamma: f64) -> Self {
        Self { initial, gamma }
    }

    pub fn learning_rate(&self, epoch: usize) -> LearningRate {
        self.initial * self.gamma.powi(epoch.min(i32::MAX as usize) as i32)
    }
}
