use rand::Rng;

/// Uniform randomness behind a seam so the stochastic seller policy can be
/// scripted in tests while production draws real entropy.
pub trait RandomSource: Send + Sync {
    /// Uniform value in [0, 1).
    fn next_f64(&mut self) -> f64;

    /// Uniform value in [low, high).
    fn in_range(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_f64()
    }

    /// True with probability `p`.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }
}

/// Production source: a fresh thread-rng draw per call, unseeded.
#[derive(Clone, Copy, Debug, Default)]
pub struct EntropySource;

impl RandomSource for EntropySource {
    fn next_f64(&mut self) -> f64 {
        rand::thread_rng().gen::<f64>()
    }
}

/// Scripted source for tests: replays the given values, cycling when
/// exhausted.
#[derive(Clone, Debug)]
pub struct SequenceSource {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceSource {
    pub fn new(values: Vec<f64>) -> Self {
        assert!(!values.is_empty(), "sequence source needs at least one value");
        Self { values, cursor: 0 }
    }
}

impl RandomSource for SequenceSource {
    fn next_f64(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        value
    }
}
