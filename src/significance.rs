//! Resampling test for a difference in group means.
//!
//! Both resampled groups are drawn independently from the pooled values
//! rather than as a partition of the pool, so this is not a true
//! permutation test. Results stay comparable with historical reports that
//! were computed the same way.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use tokio::task::JoinError;
use tracing::debug;

use crate::aggregate::mean;
use crate::error::DomainError;

pub const DEFAULT_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SignificanceResult {
    pub observed_diff: f64,
    pub p_value: f64,
    pub iterations: usize,
    pub alpha: f64,
    pub significant: bool,
}

/// Estimated p-value for "both samples come from the same distribution".
pub fn bootstrap_two_sample_test<R: Rng + ?Sized>(
    sample_a: &[f64],
    sample_b: &[f64],
    iterations: usize,
    rng: &mut R,
) -> Result<f64, DomainError> {
    if iterations == 0 {
        return Err(DomainError::ZeroIterations);
    }
    let observed = observed_difference(sample_a, sample_b)?;
    let universal = [sample_a, sample_b].concat();
    let exceeded = count_exceedances(
        &universal,
        sample_a.len(),
        sample_b.len(),
        observed,
        iterations,
        rng,
    )?;
    Ok(exceeded as f64 / iterations as f64)
}

pub fn observed_difference(sample_a: &[f64], sample_b: &[f64]) -> Result<f64, DomainError> {
    if sample_a.is_empty() {
        return Err(DomainError::EmptySample("first comparison sample"));
    }
    if sample_b.is_empty() {
        return Err(DomainError::EmptySample("second comparison sample"));
    }
    Ok((mean(sample_a)? - mean(sample_b)?).abs())
}

/// Mean of `n` values drawn without replacement from `pool`.
pub fn resample_mean<R: Rng + ?Sized>(pool: &[f64], n: usize, rng: &mut R) -> Result<f64, DomainError> {
    if n > pool.len() {
        return Err(DomainError::SampleExceedsPool {
            requested: n,
            available: pool.len(),
        });
    }
    if n == 0 {
        return Err(DomainError::EmptySample("resample"));
    }
    Ok(pool.choose_multiple(rng, n).sum::<f64>() / n as f64)
}

fn count_exceedances<R: Rng + ?Sized>(
    universal: &[f64],
    n_a: usize,
    n_b: usize,
    observed: f64,
    iterations: usize,
    rng: &mut R,
) -> Result<usize, DomainError> {
    let mut counter = 0;
    for _ in 0..iterations {
        let resampled_a = resample_mean(universal, n_a, rng)?;
        let resampled_b = resample_mean(universal, n_b, rng)?;
        if (resampled_a - resampled_b).abs() > observed {
            counter += 1;
        }
    }
    Ok(counter)
}

/// Runs the resampling test, optionally split across blocking worker tasks.
///
/// Each worker owns its own generator. With a seed, worker `i` is seeded with
/// `seed + i`, so a given (seed, workers) pair always reproduces the same
/// p-value.
#[derive(Debug, Clone)]
pub struct SignificanceTester {
    pub iterations: usize,
    pub workers: usize,
    pub seed: Option<u64>,
    pub alpha: f64,
}

impl Default for SignificanceTester {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
            workers: 1,
            seed: None,
            alpha: 0.05,
        }
    }
}

impl SignificanceTester {
    pub async fn run(
        &self,
        sample_a: &[f64],
        sample_b: &[f64],
    ) -> Result<SignificanceResult, DomainError> {
        if self.iterations == 0 {
            return Err(DomainError::ZeroIterations);
        }
        let observed = observed_difference(sample_a, sample_b)?;
        let workers = self.workers.clamp(1, self.iterations);

        let p_value = if workers == 1 {
            let mut rng = self.rng_for(0);
            bootstrap_two_sample_test(sample_a, sample_b, self.iterations, &mut rng)?
        } else {
            let universal = [sample_a, sample_b].concat();
            let (n_a, n_b) = (sample_a.len(), sample_b.len());
            let mut handles = Vec::with_capacity(workers);
            for (worker, share) in split_iterations(self.iterations, workers).into_iter().enumerate() {
                let pool = universal.clone();
                let mut rng = self.rng_for(worker as u64);
                handles.push(tokio::task::spawn_blocking(move || {
                    count_exceedances(&pool, n_a, n_b, observed, share, &mut rng)
                }));
            }

            let mut exceeded = 0;
            for handle in handles {
                exceeded += join_worker(handle.await)??;
            }
            exceeded as f64 / self.iterations as f64
        };

        debug!(observed, p_value, iterations = self.iterations, workers, "resampling finished");

        Ok(SignificanceResult {
            observed_diff: observed,
            p_value,
            iterations: self.iterations,
            alpha: self.alpha,
            significant: p_value < self.alpha,
        })
    }

    fn rng_for(&self, worker: u64) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(worker)),
            None => StdRng::from_entropy(),
        }
    }
}

/// Re-raises a worker panic on the caller. A cancelled worker becomes an error.
fn join_worker<T>(joined: Result<T, JoinError>) -> Result<T, DomainError> {
    match joined {
        Ok(value) => Ok(value),
        Err(err) => match err.try_into_panic() {
            Ok(payload) => std::panic::resume_unwind(payload),
            Err(err) => Err(DomainError::WorkerCancelled(err.to_string())),
        },
    }
}

fn split_iterations(iterations: usize, workers: usize) -> Vec<usize> {
    let base = iterations / workers;
    let extra = iterations % workers;
    (0..workers)
        .map(|worker| base + usize::from(worker < extra))
        .collect()
}
