// file: src/random.rs
// description: injectable randomness for the stream simulation

/// Source of uniform draws in `[0, 1)`.
///
/// The simulation only ever consumes draws through this trait, so a service can
/// be driven by a seeded generator or by a fixed script in tests.
pub trait RandomSource: Send {
    fn next_f64(&mut self) -> f64;

    /// Index into a collection of `len` items. `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> usize {
        let scaled = (self.next_f64() * len as f64) as usize;
        scaled.min(len.saturating_sub(1))
    }

    /// Integer in `[low, low + span)`, floored like a scaled uniform draw.
    fn next_in(&mut self, low: i64, span: u32) -> i64 {
        let offset = (self.next_f64() * f64::from(span)).floor() as i64;
        low + offset.min(i64::from(span).saturating_sub(1)).max(0)
    }
}

impl RandomSource for fastrand::Rng {
    fn next_f64(&mut self) -> f64 {
        self.f64()
    }
}

/// Seeded generator when a seed is given, otherwise entropy-seeded.
pub fn from_seed(seed: Option<u64>) -> Box<dyn RandomSource> {
    match seed {
        Some(seed) => Box::new(fastrand::Rng::with_seed(seed)),
        None => Box::new(fastrand::Rng::new()),
    }
}

/// Replays a fixed list of draws, cycling once exhausted.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    draws: Vec<f64>,
    cursor: usize,
}

impl ScriptedRandom {
    /// Draws are clamped into `[0, 1)`. An empty script always yields `0.0`.
    pub fn new(draws: impl IntoIterator<Item = f64>) -> Self {
        let draws = draws
            .into_iter()
            .map(|d| d.clamp(0.0, 1.0 - f64::EPSILON))
            .collect();
        Self { draws, cursor: 0 }
    }

    pub fn consumed(&self) -> usize {
        self.cursor
    }
}

impl RandomSource for ScriptedRandom {
    fn next_f64(&mut self) -> f64 {
        if self.draws.is_empty() {
            return 0.0;
        }
        let draw = self.draws[self.cursor % self.draws.len()];
        self.cursor += 1;
        draw
    }
}
