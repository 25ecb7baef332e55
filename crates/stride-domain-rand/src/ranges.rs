//! Sampling ranges for randomized parameters.
//!
//! Event configs store plain `(low, high)` pairs; [`RandomizationRange`] is
//! what a pair (or a richer distribution) turns into when a value is drawn.
//! Deserialized ranges skip the checked constructors, so callers run
//! [`RandomizationRange::check`] before sampling them.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};
use stride_core::error::ConfigError;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a range cannot be sampled.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RangeError {
    #[error("bounds ({low}, {high}) are reversed or not finite")]
    InvalidBounds { low: f32, high: f32 },

    #[error("spread {0} must be finite and >= 0")]
    InvalidSpread(f32),

    #[error("log-uniform bounds ({low}, {high}) must be > 0")]
    NonPositiveBounds { low: f32, high: f32 },

    #[error("{0} is not finite")]
    NonFinite(f32),
}

impl RangeError {
    /// Report against the config field the range came from.
    pub fn at(self, field: &str) -> ConfigError {
        ConfigError::invalid(field, self.to_string())
    }
}

fn finite(v: f32) -> Result<(), RangeError> {
    if v.is_finite() { Ok(()) } else { Err(RangeError::NonFinite(v)) }
}

fn spread(v: f32) -> Result<(), RangeError> {
    if v.is_finite() && v >= 0.0 { Ok(()) } else { Err(RangeError::InvalidSpread(v)) }
}

fn ordered(low: f32, high: f32) -> Result<(), RangeError> {
    if low.is_finite() && high.is_finite() && low <= high {
        Ok(())
    } else {
        Err(RangeError::InvalidBounds { low, high })
    }
}

// ---------------------------------------------------------------------------
// RandomizationRange
// ---------------------------------------------------------------------------

/// Distribution a scalar is drawn from.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RandomizationRange {
    Fixed { value: f32 },
    /// Inclusive on both ends; `low == high` always yields `low`.
    Uniform { low: f32, high: f32 },
    Gaussian { mean: f32, std: f32 },
    /// Uniform in log space, for parameters spanning orders of magnitude.
    LogUniform { low: f32, high: f32 },
    /// `nominal` times a factor in `[1 - fraction, 1 + fraction]`.
    Scaling { nominal: f32, fraction: f32 },
}

impl RandomizationRange {
    fn checked(self) -> Result<Self, RangeError> {
        self.check().map(|()| self)
    }

    pub fn fixed(value: f32) -> Result<Self, RangeError> {
        Self::Fixed { value }.checked()
    }

    pub fn uniform(low: f32, high: f32) -> Result<Self, RangeError> {
        Self::Uniform { low, high }.checked()
    }

    pub fn gaussian(mean: f32, std: f32) -> Result<Self, RangeError> {
        Self::Gaussian { mean, std }.checked()
    }

    pub fn log_uniform(low: f32, high: f32) -> Result<Self, RangeError> {
        Self::LogUniform { low, high }.checked()
    }

    pub fn scaling(nominal: f32, fraction: f32) -> Result<Self, RangeError> {
        Self::Scaling { nominal, fraction }.checked()
    }

    /// Uniform over a config `(low, high)` pair.
    pub fn from_pair((low, high): (f32, f32)) -> Result<Self, RangeError> {
        Self::uniform(low, high)
    }

    pub fn check(&self) -> Result<(), RangeError> {
        match *self {
            Self::Fixed { value } => finite(value),
            Self::Uniform { low, high } => ordered(low, high),
            Self::Gaussian { mean, std } => finite(mean).and_then(|()| spread(std)),
            Self::LogUniform { low, high } if low <= 0.0 || high <= 0.0 => {
                Err(RangeError::NonPositiveBounds { low, high })
            }
            Self::LogUniform { low, high } => ordered(low, high),
            Self::Scaling { nominal, fraction } => finite(nominal).and_then(|()| spread(fraction)),
        }
    }

    /// Draw one value. Assumes [`check`](Self::check) passed.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f32 {
        match *self {
            Self::Fixed { value } => value,
            Self::Uniform { low, high } => rng.gen_range(low..=high),
            Self::Gaussian { mean, std } if std == 0.0 => mean,
            Self::Gaussian { mean, std } => Normal::new(mean, std).map_or(mean, |n| n.sample(rng)),
            Self::LogUniform { low, high } => rng.gen_range(low.ln()..=high.ln()).exp(),
            Self::Scaling { nominal, fraction } => {
                nominal * rng.gen_range(1.0 - fraction..=1.0 + fraction)
            }
        }
    }

    /// Value used when randomization is off.
    pub fn nominal(&self) -> f32 {
        match *self {
            Self::Fixed { value } => value,
            Self::Uniform { low, high } => 0.5 * (low + high),
            Self::Gaussian { mean, .. } => mean,
            Self::LogUniform { low, high } => (low * high).sqrt(),
            Self::Scaling { nominal, .. } => nominal,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(7)
    }

    #[test]
    fn friction_pair_draws_inside_bounds() {
        let range = RandomizationRange::from_pair((0.6, 1.0)).unwrap();
        let mut rng = rng();
        let draws: Vec<f32> = (0..200).map(|_| range.sample(&mut rng)).collect();
        assert!(draws.iter().all(|v| (0.6..=1.0).contains(v)));
        assert!((range.nominal() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn zero_width_pair_is_constant() {
        let range = RandomizationRange::from_pair((0.0, 0.0)).unwrap();
        let mut rng = rng();
        assert!((0..10).all(|_| range.sample(&mut rng).abs() < f32::EPSILON));
    }

    #[test]
    fn reversed_or_infinite_pairs_rejected() {
        assert_eq!(
            RandomizationRange::from_pair((1.5, 0.5)),
            Err(RangeError::InvalidBounds { low: 1.5, high: 0.5 })
        );
        assert!(RandomizationRange::uniform(f32::NEG_INFINITY, 0.0).is_err());
        assert!(RandomizationRange::fixed(f32::NAN).is_err());
    }

    #[test]
    fn gaussian_mass_noise() {
        let range = RandomizationRange::gaussian(3.0, 0.05).unwrap();
        let mut rng = rng();
        assert!((0..100).all(|_| (range.sample(&mut rng) - 3.0).abs() < 0.5));
        let exact = RandomizationRange::gaussian(3.0, 0.0).unwrap();
        assert!((exact.sample(&mut rng) - 3.0).abs() < f32::EPSILON);
        assert_eq!(
            RandomizationRange::gaussian(3.0, -0.1),
            Err(RangeError::InvalidSpread(-0.1))
        );
    }

    #[test]
    fn log_uniform_spans_decades() {
        let range = RandomizationRange::log_uniform(0.01, 1.0).unwrap();
        assert!((range.nominal() - 0.1).abs() < 1e-6);
        let mut rng = rng();
        assert!((0..100).all(|_| (0.0099..=1.0001).contains(&range.sample(&mut rng))));
        assert!(matches!(
            RandomizationRange::log_uniform(0.0, 1.0),
            Err(RangeError::NonPositiveBounds { .. })
        ));
    }

    #[test]
    fn scaling_around_nominal_gain() {
        let range = RandomizationRange::scaling(40.0, 0.2).unwrap();
        let mut rng = rng();
        assert!((0..100).all(|_| (31.99..=48.01).contains(&range.sample(&mut rng))));
        assert!(RandomizationRange::scaling(40.0, f32::INFINITY).is_err());
    }

    #[test]
    fn seeded_draws_repeat() {
        let range = RandomizationRange::from_pair((-5.0, 5.0)).unwrap();
        let (mut a, mut b) = (rng(), rng());
        let first: Vec<f32> = (0..8).map(|_| range.sample(&mut a)).collect();
        let second: Vec<f32> = (0..8).map(|_| range.sample(&mut b)).collect();
        assert_eq!(first, second);
    }

    #[test]
    fn file_ranges_need_an_explicit_check() {
        let range: RandomizationRange =
            toml::from_str("kind = \"uniform\"\nlow = 2.0\nhigh = 1.0").unwrap();
        let err = range.check().unwrap_err().at("domain_rand.physics_material.static_friction_range");
        assert_eq!(
            err.field(),
            Some("domain_rand.physics_material.static_friction_range")
        );
        let ok: RandomizationRange = toml::from_str("kind = \"fixed\"\nvalue = 0.5").unwrap();
        assert!(ok.check().is_ok());
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn range_is_send_sync() {
        assert_send_sync::<RandomizationRange>();
    }
}
