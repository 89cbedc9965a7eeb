//! Local quantum register sampler
//!
//! Models the in-process simulator: every qubit of a fresh register goes
//! through a Hadamard gate and is measured once. A measured qubit reads `1`
//! with probability |1/√2|² = ½, so each shot is a string of fair bits. The
//! bit string is read most significant bit first and cut into 3-bit draws.

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use qs_slot::{DRAW_BITS, DRAW_RANGE, REEL_COUNT, Symbol, Triple};

use crate::error::EntropyResult;
use crate::kind::SourceKind;
use crate::source::RandomSource;

/// Probability of reading `1` from a qubit in equal superposition
const SUPERPOSITION_ONE_PROBABILITY: f64 = 0.5;

/// In-process sampler, always available
pub struct LocalSampler {
    rng: Mutex<StdRng>,
}

impl LocalSampler {
    /// Sampler seeded from the OS
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Reproducible sampler
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// Measure a `width`-qubit register once
    pub fn measure_register(&self, width: usize) -> Vec<bool> {
        let mut rng = self.rng.lock();
        (0..width)
            .map(|_| rng.random_bool(SUPERPOSITION_ONE_PROBABILITY))
            .collect()
    }

    /// `count` draws in `0..8` from a single shot of a `3 * count` qubit register
    pub fn sample_draws(&self, count: usize) -> Vec<u8> {
        let bits = self.measure_register(count * DRAW_BITS as usize);
        bits.chunks(DRAW_BITS as usize)
            .map(|group| group.iter().fold(0u8, |acc, &bit| (acc << 1) | bit as u8))
            .collect()
    }

    /// One triple from a 9-qubit shot
    pub fn next_triple(&self) -> Triple {
        let faces: Vec<Symbol> = self
            .sample_draws(REEL_COUNT)
            .into_iter()
            .map(|d| Symbol::REEL[(d & (DRAW_RANGE - 1)) as usize])
            .collect();
        Triple::new(faces[0], faces[1], faces[2])
    }
}

impl Default for LocalSampler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RandomSource for LocalSampler {
    fn kind(&self) -> SourceKind {
        SourceKind::LocalSimulator
    }

    async fn draw(&self, count: usize) -> EntropyResult<Vec<u8>> {
        Ok(self.sample_draws(count))
    }
}
