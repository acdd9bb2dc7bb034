//! Injectable randomness.

use rand::Rng;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Picks an index uniformly from `0..len`.
pub trait RandomSource: Send + Sync {
    /// Returns an index below `len`. `len` is never zero.
    fn pick(&self, len: usize) -> usize;
}

/// Thread-local RNG.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Replays a fixed sequence of indices, cycling when exhausted.
///
/// Each value is reduced modulo `len`.
#[derive(Debug)]
pub struct SequenceRandom {
    values: Vec<usize>,
    next: AtomicUsize,
}

impl SequenceRandom {
    /// Creates a source that yields `values` in order.
    #[must_use]
    pub fn new(values: Vec<usize>) -> Self {
        Self {
            values,
            next: AtomicUsize::new(0),
        }
    }
}

impl RandomSource for SequenceRandom {
    fn pick(&self, len: usize) -> usize {
        if self.values.is_empty() {
            return 0;
        }
        let i = self.next.fetch_add(1, Ordering::Relaxed) % self.values.len();
        self.values[i] % len
    }
}
