//! Relationship outcome predictions derived from dimension scores.

use serde::{Deserialize, Serialize};

/// Derived predictions, each in `[0, 1]`.
///
/// These are independent formulas over the dimension scores, not a second
/// weighted model.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Predictions {
    pub relationship_success: f64,
    /// Lower means commitment is expected sooner
    pub time_to_commitment: f64,
    pub conflict_probability: f64,
    pub longterm_stability: f64,
    pub growth_potential: f64,
}

/// Dimension scores a prediction is derived from
#[derive(Debug, Clone, Copy)]
pub struct PredictionInputs {
    pub overall: f64,
    pub attachment: f64,
    pub communication: f64,
    pub values: f64,
    pub personality: f64,
    pub emotional: f64,
    pub growth: f64,
}

impl Predictions {
    pub fn derive(s: &PredictionInputs) -> Self {
        let relationship_success = 0.8 * s.overall
            + 0.3 * s.attachment
            + 0.3 * s.communication
            + 0.2 * s.values
            + 0.2 * s.emotional;

        let time_to_commitment = (1.0 - (s.attachment + s.emotional) / 2.0).max(0.1);

        let conflict_probability = 0.4 * (1.0 - s.communication)
            + 0.3 * (1.0 - s.personality)
            + 0.3 * (1.0 - s.values);

        let longterm_stability =
            0.3 * s.attachment + 0.3 * s.values + 0.2 * s.emotional + 0.2 * s.growth;

        Self {
            relationship_success: relationship_success.clamp(0.0, 1.0),
            time_to_commitment: time_to_commitment.clamp(0.0, 1.0),
            conflict_probability: conflict_probability.clamp(0.0, 1.0),
            longterm_stability: longterm_stability.clamp(0.0, 1.0),
            growth_potential: s.growth.clamp(0.0, 1.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(v: f64) -> PredictionInputs {
        PredictionInputs {
            overall: v,
            attachment: v,
            communication: v,
            values: v,
            personality: v,
            emotional: v,
            growth: v,
        }
    }

    #[test]
    fn test_success_is_clamped() {
        let p = Predictions::derive(&uniform(0.9));
        // 0.72 + 0.27 + 0.27 + 0.18 + 0.18 > 1
        assert_eq!(p.relationship_success, 1.0);
    }

    #[test]
    fn test_commitment_floor() {
        let p = Predictions::derive(&uniform(1.0));
        assert_eq!(p.time_to_commitment, 0.1);
        assert_eq!(p.conflict_probability, 0.0);
    }

    #[test]
    fn test_neutral_inputs() {
        let p = Predictions::derive(&uniform(0.5));
        assert!((p.conflict_probability - 0.5).abs() < 1e-9);
        assert!((p.longterm_stability - 0.5).abs() < 1e-9);
        assert!((p.time_to_commitment - 0.5).abs() < 1e-9);
        assert_eq!(p.growth_potential, 0.5);
    }
}
