//! Conversion of clinical event statistics into instantaneous hazard rates.
//!
//! Every function assumes exponential survival: the probability of no event
//! over an interval `t` at constant hazard `λ` is `exp(-λ·t)`, so an annual
//! event probability `p` corresponds to `λ = -ln(1 - p)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance for split proportions summing to one.
pub const PROPORTION_SUM_TOLERANCE: f64 = 1e-9;

/// Invalid input to a hazard derivation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("probability {0} is outside [0, 1); hazard rate is undefined")]
    ProbabilityOutOfRange(f64),

    #[error("proportion {0} is outside [0, 1]")]
    ProportionOutOfRange(f64),

    #[error("split proportions must sum to 1, got {0}")]
    ProportionSum(f64),

    #[error("population must be positive and finite, got {0}")]
    InvalidPopulation(f64),

    #[error("duration must be positive and finite, got {0}")]
    InvalidDuration(f64),

    #[error("hazard rate must be non-negative and finite, got {0}")]
    InvalidRate(f64),
}

/// Result type for hazard derivations.
pub type Result<T> = std::result::Result<T, DomainError>;

fn check_probability(p: f64) -> Result<f64> {
    if !p.is_finite() || !(0.0..1.0).contains(&p) {
        return Err(DomainError::ProbabilityOutOfRange(p));
    }
    Ok(p)
}

fn check_duration(t: f64) -> Result<f64> {
    if !t.is_finite() || t <= 0.0 {
        return Err(DomainError::InvalidDuration(t));
    }
    Ok(t)
}

/// Hazard rate of an event with annual probability `p`: `-ln(1 - p)`.
pub fn probability_to_rate(p: f64) -> Result<f64> {
    let p = check_probability(p)?;
    Ok(-(-p).ln_1p())
}

/// Probability of at least one event over `interval` at constant `rate`.
///
/// Inverse of [`probability_to_rate`] for a unit interval.
pub fn rate_to_probability(rate: f64, interval: f64) -> Result<f64> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(DomainError::InvalidRate(rate));
    }
    let interval = check_duration(interval)?;
    Ok(-(-rate * interval).exp_m1())
}

/// Background mortality excluding stroke-attributable deaths.
///
/// `crude_per_1000 × scale` is the crude death count in the reference
/// population, from which `stroke_deaths` are removed before converting the
/// remaining annual probability into a rate.
pub fn background_mortality_rate(
    crude_per_1000: f64,
    scale: f64,
    stroke_deaths: f64,
    population: f64,
) -> Result<f64> {
    if !population.is_finite() || population <= 0.0 {
        return Err(DomainError::InvalidPopulation(population));
    }
    probability_to_rate((crude_per_1000 * scale - stroke_deaths) / population)
}

/// Cause-specific mortality rate from a death count in a population.
pub fn cause_specific_mortality_rate(deaths: f64, population: f64) -> Result<f64> {
    if !population.is_finite() || population <= 0.0 {
        return Err(DomainError::InvalidPopulation(population));
    }
    probability_to_rate(deaths / population)
}

/// Incidence rate of a first event with annual probability `p`.
pub fn incidence_rate(annual_probability: f64) -> Result<f64> {
    probability_to_rate(annual_probability)
}

/// Split a source rate into destination rates by fixed proportions.
///
/// Proportions must each lie in `[0, 1]` and sum to 1.
pub fn split_rate(rate: f64, proportions: &[f64]) -> Result<Vec<f64>> {
    if !rate.is_finite() || rate < 0.0 {
        return Err(DomainError::InvalidRate(rate));
    }
    if let Some(&bad) = proportions
        .iter()
        .find(|p| !p.is_finite() || !(0.0..=1.0).contains(*p))
    {
        return Err(DomainError::ProportionOutOfRange(bad));
    }
    let sum: f64 = proportions.iter().sum();
    if (sum - 1.0).abs() > PROPORTION_SUM_TOLERANCE {
        return Err(DomainError::ProportionSum(sum));
    }
    Ok(proportions.iter().map(|p| p * rate).collect())
}

/// Annual recurrence rate from a multi-year cumulative incidence.
///
/// `cumulative_incidence` is the probability of recurrence within `years`;
/// only `attributable_fraction` of those events are assigned to the modelled
/// cause:
///
///   λ = -ln(1 - c) · f / (c · years)
///
/// As `c → 0` the expression tends to `f / years`, which is returned for
/// `c == 0`.
pub fn recurrence_rate(cumulative_incidence: f64, attributable_fraction: f64, years: f64) -> Result<f64> {
    let c = check_probability(cumulative_incidence)?;
    if !attributable_fraction.is_finite() || !(0.0..=1.0).contains(&attributable_fraction) {
        return Err(DomainError::ProportionOutOfRange(attributable_fraction));
    }
    let years = check_duration(years)?;
    if c == 0.0 {
        return Ok(attributable_fraction / years);
    }
    Ok(probability_to_rate(c)? * attributable_fraction / (c * years))
}

/// Rate for a state that always clears after exactly `duration` time units.
pub fn fixed_duration_rate(duration: f64) -> Result<f64> {
    Ok(1.0 / check_duration(duration)?)
}

/// Two-way split of a rate, as used for competing destinations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RateSplit {
    /// Rate toward the primary destination.
    pub primary: f64,
    /// Rate toward the secondary destination.
    pub secondary: f64,
}

impl RateSplit {
    /// Split `rate` with `primary_share` toward the primary destination.
    pub fn new(rate: f64, primary_share: f64) -> Result<Self> {
        let parts = split_rate(rate, &[primary_share, 1.0 - primary_share])?;
        Ok(Self {
            primary: parts[0],
            secondary: parts[1],
        })
    }

    /// Sum of both destination rates.
    pub fn total(&self) -> f64 {
        self.primary + self.secondary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tol: f64) -> bool {
        (a - b).abs() <= tol
    }

    #[test]
    fn background_mortality_scenario() {
        let rate = background_mortality_rate(18.0, 100.0, 36.2, 100_000.0).unwrap();
        assert!(close(rate, 0.01779, 1e-5), "rate = {rate}");
    }

    #[test]
    fn stroke_mortality_scenario() {
        let rate = cause_specific_mortality_rate(36.2, 100_000.0).unwrap();
        assert!(close(rate, 0.000362, 1e-6), "rate = {rate}");
    }

    #[test]
    fn first_stroke_incidence_and_split() {
        let rate = incidence_rate(15.0 / 1000.0).unwrap();
        assert!(close(rate, 0.015113, 1e-6), "rate = {rate}");

        let split = RateSplit::new(rate, 0.9).unwrap();
        assert!(close(split.primary, 0.013601, 2e-6), "primary = {}", split.primary);
        assert!(close(split.secondary, 0.0015113, 1e-7), "secondary = {}", split.secondary);
        assert!(close(split.total(), rate, 1e-15));
    }

    #[test]
    fn recurrence_scenario() {
        let rate = recurrence_rate(1.0 - 0.83, 0.17, 5.0).unwrap();
        assert!(close(rate, 0.037266, 1e-6), "rate = {rate}");

        let split = RateSplit::new(rate, 0.8).unwrap();
        assert!(close(split.primary, 0.029813, 1e-6), "primary = {}", split.primary);
        assert!(close(split.secondary, 0.0074532, 1e-7), "secondary = {}", split.secondary);
    }

    #[test]
    fn recurrence_limit_at_zero_incidence() {
        let rate = recurrence_rate(0.0, 0.5, 2.0).unwrap();
        assert!(close(rate, 0.25, 1e-15));
        let near = recurrence_rate(1e-9, 0.5, 2.0).unwrap();
        assert!(close(near, 0.25, 1e-9));
    }

    #[test]
    fn fixed_duration_one_week() {
        let rate = fixed_duration_rate(1.0 / 52.0).unwrap();
        assert!(close(rate, 52.0, 52.0 * f64::EPSILON), "rate = {rate}");
    }

    #[test]
    fn probability_domain_errors() {
        assert_eq!(
            probability_to_rate(1.0),
            Err(DomainError::ProbabilityOutOfRange(1.0))
        );
        assert!(probability_to_rate(1.5).is_err());
        assert!(probability_to_rate(-0.01).is_err());
        assert!(probability_to_rate(f64::NAN).is_err());
        assert_eq!(probability_to_rate(0.0).unwrap(), 0.0);
    }

    #[test]
    fn background_deaths_exceeding_population_is_domain_error() {
        assert!(matches!(
            background_mortality_rate(1000.0, 100.0, 0.0, 100_000.0),
            Err(DomainError::ProbabilityOutOfRange(_))
        ));
        assert!(matches!(
            background_mortality_rate(1.0, 1.0, 5.0, 100.0),
            Err(DomainError::ProbabilityOutOfRange(_))
        ));
        assert_eq!(
            cause_specific_mortality_rate(1.0, 0.0),
            Err(DomainError::InvalidPopulation(0.0))
        );
    }

    #[test]
    fn split_rejects_bad_proportions() {
        assert!(matches!(
            split_rate(1.0, &[0.5, 0.4]),
            Err(DomainError::ProportionSum(_))
        ));
        assert!(matches!(
            split_rate(1.0, &[1.2, -0.2]),
            Err(DomainError::ProportionOutOfRange(_))
        ));
        assert!(matches!(
            split_rate(-1.0, &[1.0]),
            Err(DomainError::InvalidRate(_))
        ));
        let parts = split_rate(2.0, &[0.25, 0.25, 0.5]).unwrap();
        assert_eq!(parts, vec![0.5, 0.5, 1.0]);
    }

    #[test]
    fn rate_probability_inverse() {
        let rate = probability_to_rate(0.2).unwrap();
        let p = rate_to_probability(rate, 1.0).unwrap();
        assert!(close(p, 0.2, 1e-15));
        assert!(rate_to_probability(0.1, 0.0).is_err());
        assert!(rate_to_probability(-0.1, 1.0).is_err());
    }

    #[test]
    fn fixed_duration_rejects_non_positive() {
        assert!(fixed_duration_rate(0.0).is_err());
        assert!(fixed_duration_rate(-1.0).is_err());
        assert!(fixed_duration_rate(f64::INFINITY).is_err());
    }
}
