//! Tuning constants of the trust engine.

use super::errors::{TrustError, TrustResult};
use serde::{Deserialize, Serialize};

/// Trust engine configuration.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrustConfig {
    /// Weight of the propagated trust against the previous iterate.
    pub alpha: f64,
    /// Stop once the mean absolute change drops below this.
    pub epsilon: f64,
    /// Hard cap on iterations.
    pub max_iterations: usize,
    /// Fixed-point scale: a score of `max_score` is full trust.
    pub max_score: u64,
}

impl Default for TrustConfig {
    fn default() -> Self {
        Self {
            alpha: 0.5,
            epsilon: 1e-4,
            max_iterations: 100,
            max_score: 100,
        }
    }
}

impl TrustConfig {
    /// Reject values the iteration cannot work with.
    pub fn validate(&self) -> TrustResult<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(TrustError::InvalidAlpha(self.alpha));
        }
        if self.epsilon.is_nan() || self.epsilon <= 0.0 {
            return Err(TrustError::InvalidEpsilon(self.epsilon));
        }
        if self.max_iterations == 0 {
            return Err(TrustError::NoIterations);
        }
        if self.max_score == 0 {
            return Err(TrustError::ZeroScale);
        }
        Ok(())
    }

    /// Fixed-point score to `[0, 1]`.
    pub fn normalize(&self, score: u64) -> f64 {
        (score as f64 / self.max_score as f64).min(1.0)
    }

    /// `[0, 1]` back to the fixed-point scale, rounded.
    pub fn denormalize(&self, trust: f64) -> u64 {
        (trust.max(0.0) * self.max_score as f64).round() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(TrustConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let bad = TrustConfig {
            alpha: 1.5,
            ..Default::default()
        };
        assert_eq!(bad.validate(), Err(TrustError::InvalidAlpha(1.5)));
        let bad = TrustConfig {
            epsilon: f64::NAN,
            ..Default::default()
        };
        assert!(bad.validate().is_err());
        let bad = TrustConfig {
            max_score: 0,
            ..Default::default()
        };
        assert_eq!(bad.validate(), Err(TrustError::ZeroScale));
    }

    #[test]
    fn test_scale_roundtrip() {
        let config = TrustConfig::default();
        assert_eq!(config.normalize(50), 0.5);
        assert_eq!(config.normalize(250), 1.0);
        assert_eq!(config.denormalize(0.6), 60);
        assert_eq!(config.denormalize(-0.2), 0);
    }
}
