use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

pub trait RandomSource: Send {
    fn next_unit(&mut self) -> f64;

    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        low + (high - low) * self.next_unit()
    }
}

pub type SharedRandom = Arc<Mutex<dyn RandomSource>>;

pub fn shared<R: RandomSource + 'static>(source: R) -> SharedRandom {
    Arc::new(Mutex::new(source))
}

pub struct ThreadRandom {
    rng: StdRng,
}

impl ThreadRandom {
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl RandomSource for ThreadRandom {
    fn next_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

#[derive(Debug, Clone)]
pub struct SequenceRandom {
    values: Vec<f64>,
    cursor: usize,
}

impl SequenceRandom {
    pub fn new(values: Vec<f64>) -> Self {
        let values = if values.is_empty() { vec![0.5] } else { values };
        Self { values, cursor: 0 }
    }

    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for SequenceRandom {
    fn next_unit(&mut self) -> f64 {
        let value = self.values[self.cursor % self.values.len()];
        self.cursor = (self.cursor + 1) % self.values.len();
        value.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_wraps_around() {
        let mut source = SequenceRandom::new(vec![0.1, 0.9]);
        assert_eq!(source.next_unit(), 0.1);
        assert_eq!(source.next_unit(), 0.9);
        assert_eq!(source.next_unit(), 0.1);
    }

    #[test]
    fn uniform_maps_unit_interval_onto_range() {
        let mut source = SequenceRandom::new(vec![0.0, 0.5, 0.25]);
        assert_eq!(source.uniform(-1.0, 1.0), -1.0);
        assert_eq!(source.uniform(-1.0, 1.0), 0.0);
        assert_eq!(source.uniform(0.0, 8.0), 2.0);
    }

    #[test]
    fn seeded_thread_random_is_reproducible() {
        let mut first = ThreadRandom::seeded(7);
        let mut second = ThreadRandom::seeded(7);
        for _ in 0..16 {
            let value = first.next_unit();
            assert!((0.0..1.0).contains(&value));
            assert_eq!(value, second.next_unit());
        }
    }
}
