//! Compatibility scorer: two personality vectors in, one assessment out.
//!
//! The scorer holds no state and performs no I/O, so any number of pairs can
//! be scored concurrently.

use std::collections::BTreeMap;

use harmony_core::{Error, PersonalityVector, ProfileId, Result, Timestamp};
use serde::{Deserialize, Serialize};

use crate::dimensions::{all_finite, score_dimension, CompatibilityDimension, DimensionScore};
use crate::insights::{self, Recommendation, RiskFactor, Strength};
use crate::predictions::{PredictionInputs, Predictions};

/// Per-dimension confidence reported by the fallback result
pub const FALLBACK_CONFIDENCE: f64 = 0.1;

/// Complete compatibility assessment for one pair. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityResult {
    pub overall: f64,
    /// Weight-averaged dimension confidence
    pub confidence: f64,
    pub dimensions: BTreeMap<CompatibilityDimension, DimensionScore>,
    pub predictions: Predictions,
    pub recommendations: Vec<Recommendation>,
    pub risk_factors: Vec<RiskFactor>,
    pub strengths: Vec<Strength>,
    pub computed_at: Timestamp,
    pub profile_ids: (ProfileId, ProfileId),
    pub vector_versions: (u64, u64),
    /// Set when this is the documented default after a scoring failure
    #[serde(default)]
    pub is_fallback: bool,
}

impl CompatibilityResult {
    pub fn score(&self, dimension: CompatibilityDimension) -> f64 {
        self.dimensions
            .get(&dimension)
            .map(|d| d.score)
            .unwrap_or(0.5)
    }

    /// Overall score as a 0-100 percentage
    pub fn percent(&self) -> u8 {
        to_percent(self.overall)
    }

    /// Default result returned when scoring fails: overall 0.5 and every
    /// dimension 0.5 with confidence 0.1.
    pub fn fallback(a: &PersonalityVector, b: &PersonalityVector, computed_at: Timestamp) -> Self {
        let dimensions: BTreeMap<_, _> = CompatibilityDimension::ALL
            .into_iter()
            .map(|d| (d, DimensionScore::neutral(FALLBACK_CONFIDENCE)))
            .collect();

        Self {
            overall: 0.5,
            confidence: FALLBACK_CONFIDENCE,
            predictions: Predictions::derive(&prediction_inputs(0.5, &dimensions)),
            dimensions,
            recommendations: Vec::new(),
            risk_factors: Vec::new(),
            strengths: Vec::new(),
            computed_at,
            profile_ids: (a.id().clone(), b.id().clone()),
            vector_versions: (a.version(), b.version()),
            is_fallback: true,
        }
    }
}

/// Convert a `[0, 1]` score to an integer percentage
pub fn to_percent(score: f64) -> u8 {
    if score.is_finite() {
        (score.clamp(0.0, 1.0) * 100.0).round() as u8
    } else {
        50
    }
}

fn prediction_inputs(
    overall: f64,
    dims: &BTreeMap<CompatibilityDimension, DimensionScore>,
) -> PredictionInputs {
    let s = |d: CompatibilityDimension| dims.get(&d).map(|x| x.score).unwrap_or(0.5);
    PredictionInputs {
        overall,
        attachment: s(CompatibilityDimension::Attachment),
        communication: s(CompatibilityDimension::Communication),
        values: s(CompatibilityDimension::Values),
        personality: s(CompatibilityDimension::Personality),
        emotional: s(CompatibilityDimension::Emotional),
        growth: s(CompatibilityDimension::Growth),
    }
}

/// Stateless weighted multi-dimensional scorer
#[derive(Debug, Clone, Copy, Default)]
pub struct CompatibilityScorer;

impl CompatibilityScorer {
    pub fn new() -> Self {
        Self
    }

    pub fn score(&self, a: &PersonalityVector, b: &PersonalityVector) -> Result<CompatibilityResult> {
        self.score_at(a, b, Timestamp::now())
    }

    /// Score a pair, stamping the result with `computed_at`.
    pub fn score_at(
        &self,
        a: &PersonalityVector,
        b: &PersonalityVector,
        computed_at: Timestamp,
    ) -> Result<CompatibilityResult> {
        let dimensions: BTreeMap<_, _> = CompatibilityDimension::ALL
            .into_iter()
            .map(|d| (d, score_dimension(d, a, b)))
            .collect();

        if !all_finite(&dimensions) {
            return Err(Error::Compute(format!(
                "non-finite dimension score for pair ({}, {})",
                a.id(),
                b.id()
            )));
        }

        let weighted: f64 = dimensions
            .iter()
            .map(|(d, s)| s.score * d.weight())
            .sum();
        let overall = weighted.clamp(0.0, 1.0);
        let confidence = dimensions
            .iter()
            .map(|(d, s)| s.confidence * d.weight())
            .sum::<f64>()
            .clamp(0.0, 1.0);

        let predictions = Predictions::derive(&prediction_inputs(overall, &dimensions));
        let insights = insights::evaluate(
            |d| dimensions.get(&d).map(|s| s.score).unwrap_or(0.5),
            &predictions,
        );

        Ok(CompatibilityResult {
            overall,
            confidence,
            dimensions,
            predictions,
            recommendations: insights.recommendations,
            risk_factors: insights.risk_factors,
            strengths: insights.strengths,
            computed_at,
            profile_ids: (a.id().clone(), b.id().clone()),
            vector_versions: (a.version(), b.version()),
            is_fallback: false,
        })
    }

    /// Score a pair, degrading to [`CompatibilityResult::fallback`] on failure.
    pub fn score_or_default(
        &self,
        a: &PersonalityVector,
        b: &PersonalityVector,
        computed_at: Timestamp,
    ) -> CompatibilityResult {
        match self.score_at(a, b, computed_at) {
            Ok(result) => result,
            Err(e) => {
                tracing::error!(
                    profile_a = %a.id(),
                    profile_b = %b.id(),
                    error = %e,
                    "compatibility scoring failed, returning default result"
                );
                CompatibilityResult::fallback(a, b, computed_at)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony_core::TraitGroup;
    use serde_json::json;

    fn full_vector(id: &str, seed: f64) -> PersonalityVector {
        let mut v = PersonalityVector::create_default(id);
        let traits = json!({
            "big_five": {
                "openness": seed, "conscientiousness": 1.0 - seed, "extraversion": seed * 0.5,
                "agreeableness": 0.6, "neuroticism": seed * 0.8
            },
            "attachment": { "secure": 1.0 - seed, "anxious": seed },
            "communication": {
                "directness": seed, "emotional_expression": 0.5,
                "active_listening": 0.7, "conflict_style": seed
            },
            "values": { "family": seed, "career": 1.0 - seed, "adventure": 0.4 },
            "emotional_intelligence": { "empathy": 0.8, "emotional_regulation": seed },
            "confidence": {
                "big_five": 0.9, "attachment": 0.8, "communication": 0.7,
                "values": 0.6, "emotional_intelligence": 0.7
            }
        });
        v.load_partial(&traits).unwrap();
        v
    }

    #[test]
    fn test_overall_in_range_and_symmetric() {
        let scorer = CompatibilityScorer::new();
        let ts = Timestamp::from_nanos(0);
        for (x, y) in [(0.1, 0.9), (0.0, 1.0), (0.5, 0.5), (0.3, 0.35)] {
            let a = full_vector("a", x);
            let b = full_vector("b", y);
            let ab = scorer.score_at(&a, &b, ts).unwrap();
            let ba = scorer.score_at(&b, &a, ts).unwrap();
            assert!((0.0..=1.0).contains(&ab.overall));
            assert_eq!(ab.overall, ba.overall);
            assert_eq!(ab.predictions, ba.predictions);
        }
    }

    #[test]
    fn test_overall_is_weighted_sum() {
        let scorer = CompatibilityScorer::new();
        let a = full_vector("a", 0.2);
        let b = full_vector("b", 0.6);
        let r = scorer.score(&a, &b).unwrap();
        let expected: f64 = CompatibilityDimension::ALL
            .iter()
            .map(|d| r.score(*d) * d.weight())
            .sum();
        assert!((r.overall - expected).abs() < 1e-12);
        assert_eq!(r.dimensions.len(), 7);
        assert!(!r.is_fallback);
    }

    #[test]
    fn test_secure_pair_scores_attachment_095() {
        let scorer = CompatibilityScorer::new();
        let a = full_vector("a", 0.1);
        let b = full_vector("b", 0.2);
        let r = scorer.score(&a, &b).unwrap();
        assert_eq!(r.score(CompatibilityDimension::Attachment), 0.95);
        assert!(r
            .strengths
            .iter()
            .any(|s| s.category == crate::insights::InsightCategory::Attachment));
    }

    #[test]
    fn test_versions_recorded() {
        let scorer = CompatibilityScorer::new();
        let mut a = full_vector("a", 0.3);
        a.set_confidence(TraitGroup::Values, 0.9);
        let b = PersonalityVector::create_default("b");
        let r = scorer.score(&a, &b).unwrap();
        assert_eq!(r.vector_versions, (2, 0));
        assert_eq!(r.profile_ids.0.as_str(), "a");
    }

    #[test]
    fn test_fallback_shape() {
        let a = PersonalityVector::create_default("a");
        let b = PersonalityVector::create_default("b");
        let r = CompatibilityResult::fallback(&a, &b, Timestamp::from_nanos(1));
        assert_eq!(r.overall, 0.5);
        assert!(r.is_fallback);
        assert!(r
            .dimensions
            .values()
            .all(|d| d.score == 0.5 && d.confidence == FALLBACK_CONFIDENCE));
        assert_eq!(r.percent(), 50);
    }

    #[test]
    fn test_percent_rounding() {
        assert_eq!(to_percent(0.874), 87);
        assert_eq!(to_percent(0.875), 88);
        assert_eq!(to_percent(f64::NAN), 50);
    }
}
