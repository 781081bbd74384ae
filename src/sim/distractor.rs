//! Random wrong answers for a round
//!
//! Sampling is bounded: a pool that is too small is reported as
//! `InsufficientDistractors` instead of being retried forever.

use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::error::{EngineError, Result};

/// Draws unique distractors from a line's pool of wrong signals
#[derive(Debug, Clone)]
pub struct DistractorPicker {
    rng: Pcg32,
}

impl DistractorPicker {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Pick `count` distinct entries of `pool` that are not in `exclude`
    pub fn pick(
        &mut self,
        pool: &BTreeSet<String>,
        exclude: &[&str],
        count: usize,
    ) -> Result<Vec<String>> {
        sample_distractors(&mut self.rng, pool, exclude, count)
    }
}

/// Uniform sampling without replacement from `pool \ exclude`
///
/// The pool is walked in sorted order so a given RNG state always yields the
/// same picks.
pub fn sample_distractors<R: Rng + ?Sized>(
    rng: &mut R,
    pool: &BTreeSet<String>,
    exclude: &[&str],
    count: usize,
) -> Result<Vec<String>> {
    let candidates: Vec<&String> = pool
        .iter()
        .filter(|candidate| !exclude.contains(&candidate.as_str()))
        .collect();

    if candidates.len() < count {
        return Err(EngineError::InsufficientDistractors {
            available: candidates.len(),
            requested: count,
        });
    }

    Ok(rand::seq::index::sample(rng, candidates.len(), count)
        .into_iter()
        .map(|i| candidates[i].clone())
        .collect())
}
