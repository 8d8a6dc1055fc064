use serde::Serialize;
use statrs::distribution::{ContinuousCDF, Normal};

use crate::aggregate::{mean, std_dev};
use crate::error::DomainError;

/// Beta posterior over "a member of this group beats the threshold".
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BetaPosterior {
    pub alpha: u64,
    pub beta: u64,
    /// Share of the whole tournament at or above the threshold.
    pub prior_rate: f64,
    pub prior_alpha: u64,
    pub prior_beta: u64,
    pub observed_alpha: u64,
    pub observed_beta: u64,
}

impl BetaPosterior {
    pub fn mean(&self) -> Option<f64> {
        let total = self.alpha + self.beta;
        (total > 0).then(|| self.alpha as f64 / total as f64)
    }
}

/// Prior pseudo-counts come from the tournament-wide rate at or above the
/// threshold, scaled to the group size and floored. Observed counts use a
/// strict `>` comparison.
pub fn beta_posterior(
    sample: &[f64],
    threshold: f64,
    tournament_wide_sample: &[f64],
) -> Result<BetaPosterior, DomainError> {
    if tournament_wide_sample.is_empty() {
        return Err(DomainError::EmptySample("tournament-wide prior sample"));
    }

    let n = sample.len() as u64;
    let total = tournament_wide_sample.len() as u64;
    let prior_hits = tournament_wide_sample
        .iter()
        .filter(|value| **value >= threshold)
        .count() as u64;

    let prior_alpha = n * prior_hits / total;
    let prior_beta = n - prior_alpha;
    let observed_alpha = sample.iter().filter(|value| **value > threshold).count() as u64;
    let observed_beta = n - observed_alpha;

    Ok(BetaPosterior {
        alpha: prior_alpha + observed_alpha,
        beta: prior_beta + observed_beta,
        prior_rate: prior_hits as f64 / total as f64,
        prior_alpha,
        prior_beta,
        observed_alpha,
        observed_beta,
    })
}

/// `P(X > cutoff)` assuming the values are normally distributed with their
/// own mean and population standard deviation.
pub fn normal_exceedance(values: &[f64], cutoff: f64) -> Result<f64, DomainError> {
    let mu = mean(values)?;
    let sigma = std_dev(values)?;
    if sigma == 0.0 {
        return Ok(if mu > cutoff { 1.0 } else { 0.0 });
    }
    let normal =
        Normal::new(mu, sigma).map_err(|err| DomainError::InvalidDistribution(err.to_string()))?;
    Ok(1.0 - normal.cdf(cutoff))
}
