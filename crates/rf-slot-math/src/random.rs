//! Injected random sources
//!
//! Every random decision in the engine goes through a [`RandomSource`] handle
//! passed in by the caller. There is no global generator, so a spin is a pure
//! function of its configuration and the values the source produced.
//!
//! All helpers map a draw `f ∈ [0, 1)` onto half-open buckets, so each branch
//! is reachable from an interval of positive width and no outcome depends on
//! hitting an exact float like `1.0`.

use std::collections::VecDeque;

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::error::{SlotError, SlotResult};

/// Source of uniform randomness in `[0, 1)`
pub trait RandomSource {
    /// Next uniform value in `[0, 1)`
    fn next_float(&mut self) -> SlotResult<f64>;

    /// Uniform index in `[0, len)`.
    ///
    /// `len` must be non-zero.
    fn next_index(&mut self, len: usize) -> SlotResult<usize> {
        debug_assert!(len > 0, "next_index on empty range");
        let f = self.next_float()?;
        let idx = (f * len as f64) as usize;
        Ok(idx.min(len.saturating_sub(1)))
    }

    /// Bernoulli trial: true when the draw falls in `[0, probability)`
    fn chance(&mut self, probability: f64) -> SlotResult<bool> {
        Ok(self.next_float()? < probability)
    }

    /// Cumulative-weight pick. Returns the index of the chosen entry.
    ///
    /// Entry `i` owns the half-open slice `[cum_{i-1}, cum_i)` of the total
    /// weight. Zero-weight entries are never chosen. `weights` must have a
    /// positive sum.
    fn pick_weighted(&mut self, weights: &[u32]) -> SlotResult<usize> {
        let total: u64 = weights.iter().map(|&w| w as u64).sum();
        debug_assert!(total > 0, "pick_weighted with zero total weight");
        let target = self.next_float()? * total as f64;

        let mut cumulative = 0u64;
        let mut last_positive = 0;
        for (i, &w) in weights.iter().enumerate() {
            if w == 0 {
                continue;
            }
            cumulative += w as u64;
            last_positive = i;
            if target < cumulative as f64 {
                return Ok(i);
            }
        }
        Ok(last_positive)
    }
}

impl<R: RandomSource + ?Sized> RandomSource for &mut R {
    fn next_float(&mut self) -> SlotResult<f64> {
        (**self).next_float()
    }
}

impl<R: RandomSource + ?Sized> RandomSource for Box<R> {
    fn next_float(&mut self) -> SlotResult<f64> {
        (**self).next_float()
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SEEDED (ChaCha8)
// ═══════════════════════════════════════════════════════════════════════════════

/// Statistically sound PRNG source backed by ChaCha8
#[derive(Debug, Clone)]
pub struct SeededRandom {
    rng: ChaCha8Rng,
}

impl SeededRandom {
    /// Deterministic source for a seed
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Deterministic source on an independent stream of the same seed.
    ///
    /// Parallel simulation workers use one stream each.
    pub fn with_stream(seed: u64, stream: u64) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(stream);
        Self { rng }
    }

    /// Source seeded from the operating system
    pub fn from_os_rng() -> Self {
        Self {
            rng: ChaCha8Rng::from_os_rng(),
        }
    }
}

impl RandomSource for SeededRandom {
    fn next_float(&mut self) -> SlotResult<f64> {
        Ok(self.rng.random::<f64>())
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// SCRIPTED
// ═══════════════════════════════════════════════════════════════════════════════

/// Replays a fixed sequence of values.
///
/// Running past the end is an error, never a fallback to live randomness.
#[derive(Debug, Clone)]
pub struct ScriptedRandom {
    values: VecDeque<f64>,
    drawn: usize,
}

impl ScriptedRandom {
    /// Create from a sequence. Every value must lie in `[0, 1)`.
    pub fn new(values: impl IntoIterator<Item = f64>) -> SlotResult<Self> {
        let values: VecDeque<f64> = values.into_iter().collect();
        if let Some((index, &value)) = values
            .iter()
            .enumerate()
            .find(|(_, v)| !(0.0..1.0).contains(*v))
        {
            return Err(SlotError::InvalidRandomValue { index, value });
        }
        Ok(Self { values, drawn: 0 })
    }

    /// Values not yet consumed
    pub fn remaining(&self) -> usize {
        self.values.len()
    }

    /// Values consumed so far
    pub fn drawn(&self) -> usize {
        self.drawn
    }
}

impl RandomSource for ScriptedRandom {
    fn next_float(&mut self) -> SlotResult<f64> {
        match self.values.pop_front() {
            Some(v) => {
                self.drawn += 1;
                Ok(v)
            }
            None => Err(SlotError::RandomSourceExhausted { drawn: self.drawn }),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// RECORDING
// ═══════════════════════════════════════════════════════════════════════════════

/// Wraps a source and keeps every value it hands out.
///
/// Feeding [`RecordingRandom::into_script`] back into the engine reproduces
/// the recorded spins exactly.
#[derive(Debug, Clone)]
pub struct RecordingRandom<R> {
    inner: R,
    recorded: Vec<f64>,
}

impl<R: RandomSource> RecordingRandom<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            recorded: Vec::new(),
        }
    }

    /// Values drawn so far
    pub fn recorded(&self) -> &[f64] {
        &self.recorded
    }

    /// Scripted source replaying everything recorded
    pub fn into_script(self) -> SlotResult<ScriptedRandom> {
        ScriptedRandom::new(self.recorded)
    }
}

impl<R: RandomSource> RandomSource for RecordingRandom<R> {
    fn next_float(&mut self) -> SlotResult<f64> {
        let v = self.inner.next_float()?;
        self.recorded.push(v);
        Ok(v)
    }
}
