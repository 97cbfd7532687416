//! Random source used to pick token types during fill and refill.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform integer source: `random_int(n)` returns a value in `0..n`.
pub trait TokenSource {
    fn random_int(&mut self, upper: usize) -> usize;
}

/// `StdRng`-backed source; seeded for reproducible boards, entropy otherwise.
#[derive(Debug, Clone)]
pub struct SeededSource {
    rng: StdRng,
}

impl SeededSource {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self { rng }
    }
}

impl TokenSource for SeededSource {
    fn random_int(&mut self, upper: usize) -> usize {
        if upper <= 1 {
            return 0;
        }
        self.rng.gen_range(0..upper)
    }
}

/// Replays a fixed sequence of values (wrapping), reduced modulo `upper`.
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct ScriptedSource {
    values: Vec<usize>,
    pos: usize,
}

#[cfg(test)]
impl ScriptedSource {
    pub fn new(values: impl IntoIterator<Item = usize>) -> Self {
        let values: Vec<usize> = values.into_iter().collect();
        assert!(!values.is_empty(), "scripted source needs at least one value");
        Self { values, pos: 0 }
    }
}

#[cfg(test)]
impl TokenSource for ScriptedSource {
    fn random_int(&mut self, upper: usize) -> usize {
        let v = self.values[self.pos % self.values.len()];
        self.pos += 1;
        v % upper.max(1)
    }
}
