//! One Health Index
//!
//! Weighted blend of human, zoonotic and environmental sub-scores (each
//! 0-100). Weights are normalized, so they only need to be relative.

use serde::{Deserialize, Serialize};

use crate::types::OneHealthScores;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneHealthWeights {
    pub human: f64,
    pub zoonotic: f64,
    pub environmental: f64,
}

impl Default for OneHealthWeights {
    fn default() -> Self {
        Self {
            human: 0.4,
            zoonotic: 0.3,
            environmental: 0.3,
        }
    }
}

impl OneHealthWeights {
    /// Scale to sum 1.0; negative weights count as zero, all-zero falls back to defaults
    pub fn normalized(&self) -> Self {
        let h = self.human.max(0.0);
        let z = self.zoonotic.max(0.0);
        let e = self.environmental.max(0.0);
        let total = h + z + e;
        if total <= f64::EPSILON {
            return Self::default();
        }
        Self {
            human: h / total,
            zoonotic: z / total,
            environmental: e / total,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskBand {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskBand {
    pub fn from_score(score: f64) -> Self {
        if score < 25.0 {
            RiskBand::Low
        } else if score < 50.0 {
            RiskBand::Moderate
        } else if score < 75.0 {
            RiskBand::High
        } else {
            RiskBand::Critical
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskBand::Low => "low",
            RiskBand::Moderate => "moderate",
            RiskBand::High => "high",
            RiskBand::Critical => "critical",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OneHealthIndex {
    pub score: f64,
    pub band: RiskBand,
    /// Sub-scores after clamping
    pub components: OneHealthScores,
}

fn clamp_score(v: f64) -> f64 {
    if v.is_nan() {
        0.0
    } else {
        v.clamp(0.0, 100.0)
    }
}

pub fn compute(scores: &OneHealthScores, weights: &OneHealthWeights) -> OneHealthIndex {
    let w = weights.normalized();
    let components = OneHealthScores {
        human: clamp_score(scores.human),
        zoonotic: clamp_score(scores.zoonotic),
        environmental: clamp_score(scores.environmental),
    };
    let score = components.human * w.human
        + components.zoonotic * w.zoonotic
        + components.environmental * w.environmental;

    OneHealthIndex {
        score,
        band: RiskBand::from_score(score),
        components,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(h: f64, z: f64, e: f64) -> OneHealthScores {
        OneHealthScores {
            human: h,
            zoonotic: z,
            environmental: e,
        }
    }

    #[test]
    fn test_default_weights() {
        let idx = compute(&scores(60.0, 80.0, 20.0), &OneHealthWeights::default());
        assert!((idx.score - 54.0).abs() < 1e-9);
        assert_eq!(idx.band, RiskBand::High);
    }

    #[test]
    fn test_weights_are_normalized() {
        let w = OneHealthWeights {
            human: 2.0,
            zoonotic: 1.0,
            environmental: 1.0,
        };
        let idx = compute(&scores(100.0, 0.0, 0.0), &w);
        assert!((idx.score - 50.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_weights_fall_back() {
        let w = OneHealthWeights {
            human: 0.0,
            zoonotic: 0.0,
            environmental: 0.0,
        };
        assert_eq!(w.normalized(), OneHealthWeights::default());
    }

    #[test]
    fn test_out_of_range_scores_clamped() {
        let idx = compute(&scores(250.0, -10.0, f64::NAN), &OneHealthWeights::default());
        assert_eq!(idx.components.human, 100.0);
        assert_eq!(idx.components.zoonotic, 0.0);
        assert_eq!(idx.components.environmental, 0.0);
        assert!((idx.score - 40.0).abs() < 1e-9);
        assert_eq!(idx.band, RiskBand::Moderate);
    }

    #[test]
    fn test_band_edges() {
        assert_eq!(RiskBand::from_score(24.99), RiskBand::Low);
        assert_eq!(RiskBand::from_score(25.0), RiskBand::Moderate);
        assert_eq!(RiskBand::from_score(75.0), RiskBand::Critical);
    }
}
