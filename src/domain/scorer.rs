//! Logistic scoring: linear predictor, sigmoid and display transforms.
//!
//! Everything here is pure arithmetic. The functions are total over finite
//! inputs; non-finite inputs propagate per IEEE-754 and must be filtered by
//! the caller (see [`crate::domain::parse_number`]).

use serde::{Deserialize, Serialize};

/// Smallest probability ever reported.
const PROBABILITY_FLOOR: f64 = f64::MIN_POSITIVE;

/// Largest probability ever reported (the last double below 1.0).
const PROBABILITY_CEIL: f64 = 1.0 - f64::EPSILON / 2.0;

/// Result of evaluating the logistic model once.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Linear predictor (log-odds), unbounded
    pub logit: f64,

    /// Sigmoid of the logit, in (0, 1)
    pub probability: f64,
}

impl ScoreResult {
    /// Build a result from an already computed logit.
    #[must_use]
    pub fn from_logit(logit: f64) -> Self {
        Self {
            logit,
            probability: sigmoid(logit),
        }
    }
}

/// `coefficient * value`, saturated to the finite range.
#[must_use]
pub fn contribution(coefficient: f64, value: f64) -> f64 {
    saturate(coefficient * value)
}

fn saturate(x: f64) -> f64 {
    x.clamp(-f64::MAX, f64::MAX)
}

/// Evaluate `constant + Σ coefficient * value` and its probability.
///
/// Terms are `(coefficient, value)` pairs and are accumulated in order.
/// Products and partial sums saturate at `±f64::MAX`, so finite inputs
/// always give a finite logit.
#[must_use]
pub fn score(constant: f64, terms: &[(f64, f64)]) -> ScoreResult {
    let logit = terms.iter().fold(constant, |acc, &(coefficient, value)| {
        saturate(acc + contribution(coefficient, value))
    });
    ScoreResult::from_logit(logit)
}

/// Logistic function `1 / (1 + exp(-x))`.
///
/// Evaluated on the side that cannot overflow and kept strictly inside
/// (0, 1) for every finite `x`. `sigmoid(0.0)` is exactly 0.5.
#[must_use]
pub fn sigmoid(x: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let p = if x >= 0.0 {
        1.0 / (1.0 + (-x).exp())
    } else {
        let e = x.exp();
        e / (1.0 + e)
    };
    if x.is_finite() {
        p.clamp(PROBABILITY_FLOOR, PROBABILITY_CEIL)
    } else {
        p
    }
}

/// Probability as a percentage clamped to `[0, 100]`, usable as a bar width.
#[must_use]
pub fn to_display_percent(result: &ScoreResult) -> f64 {
    (result.probability * 100.0).clamp(0.0, 100.0)
}

/// Bar width in `[0, 100]` for a logit term, centred on 50.
///
/// Normalizes against `max(1, |logit| + 5)`. Purely cosmetic.
#[must_use]
pub fn bar_width(value: f64, logit: f64) -> f64 {
    let scale = (logit.abs() + 5.0).max(1.0);
    ((value / scale) * 100.0 + 50.0).clamp(0.0, 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_zero_logit_is_half() {
        let result = score(0.0, &[]);
        assert_eq!(result.logit, 0.0);
        assert!((result.probability - 0.5).abs() <= f64::EPSILON);
    }

    #[test]
    fn test_primary_sample_patient() {
        let result = score(-9.079, &[(0.934, 3.0), (0.099, 10.0), (0.131, 12.0)]);
        assert!((result.logit - -3.715).abs() < 1e-9);
        assert!((result.probability - 0.023_776).abs() < 1e-6);
        assert!((to_display_percent(&result) - 2.3776).abs() < 1e-4);
    }

    #[test]
    fn test_secondary_sample_patient() {
        let result = score(-4.346, &[(0.029, 50.0), (0.538, 7.0)]);
        assert!((result.logit - 0.87).abs() < 1e-9);
        assert!((result.probability - 0.704_746).abs() < 1e-6);
    }

    #[test]
    fn test_probability_stays_open_interval() {
        for logit in [-1.0e300, -800.0, -40.0, -1.0, 1.0, 40.0, 800.0, 1.0e300] {
            let p = ScoreResult::from_logit(logit).probability;
            assert!(p > 0.0 && p < 1.0, "logit {logit} gave {p}");
        }
    }

    #[test]
    fn test_overflowing_terms_saturate() {
        let huge = score(0.0, &[(1e200, 1e200)]);
        assert_eq!(huge.logit, f64::MAX);
        assert!(huge.probability > 0.0 && huge.probability < 1.0);

        let cancelling = score(0.0, &[(1e200, 1e200), (-1e200, 1e200)]);
        assert!(cancelling.logit.is_finite());
        assert!(cancelling.probability > 0.0 && cancelling.probability < 1.0);

        let tiny = score(-f64::MAX, &[(-1e200, 1e200)]);
        assert_eq!(tiny.logit, -f64::MAX);
        assert!(tiny.probability > 0.0);

        assert_eq!(contribution(-1e300, 1e300), -f64::MAX);
    }

    #[test]
    fn test_random_terms_stay_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..1_000 {
            let constant = rng.gen_range(-50.0..50.0);
            let terms: Vec<(f64, f64)> = (0..rng.gen_range(0..6))
                .map(|_| (rng.gen_range(-5.0..5.0), rng.gen_range(-100.0..100.0)))
                .collect();
            let p = score(constant, &terms).probability;
            assert!(p > 0.0 && p < 1.0);
        }
    }

    #[test]
    fn test_monotonic_in_each_covariate() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let constant = rng.gen_range(-3.0..3.0);
            let coefficient = rng.gen_range(-1.0..1.0);
            let other = (rng.gen_range(-1.0..1.0), rng.gen_range(-5.0..5.0));
            let x = rng.gen_range(-5.0..5.0);
            let step = rng.gen_range(0.1..2.0);

            let low = score(constant, &[(coefficient, x), other]).probability;
            let high = score(constant, &[(coefficient, x + step), other]).probability;

            if coefficient > 0.0 {
                assert!(high > low);
            } else if coefficient < 0.0 {
                assert!(high < low);
            }
        }

        let flat_low = score(1.0, &[(0.0, 1.0)]).probability;
        let flat_high = score(1.0, &[(0.0, 99.0)]).probability;
        assert_eq!(flat_low, flat_high);
    }

    #[test]
    fn test_negated_model_is_complement() {
        let mut rng = StdRng::seed_from_u64(3);
        for _ in 0..500 {
            let constant = rng.gen_range(-10.0..10.0);
            let terms: Vec<(f64, f64)> = (0..3)
                .map(|_| (rng.gen_range(-2.0..2.0), rng.gen_range(0.0..20.0)))
                .collect();
            let negated: Vec<(f64, f64)> = terms.iter().map(|&(c, v)| (-c, v)).collect();

            let p = score(constant, &terms).probability;
            let q = score(-constant, &negated).probability;
            assert!((p + q - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_nan_propagates() {
        assert!(score(f64::NAN, &[]).probability.is_nan());
    }

    #[test]
    fn test_bar_width_centre_and_clamp() {
        assert_eq!(bar_width(0.0, 0.0), 50.0);
        // scale = |-3.715| + 5 = 8.715
        assert!((bar_width(2.802, -3.715) - (2.802 / 8.715 * 100.0 + 50.0)).abs() < 1e-9);
        assert_eq!(bar_width(1_000.0, 0.0), 100.0);
        assert_eq!(bar_width(-1_000.0, 0.0), 0.0);
    }
}
