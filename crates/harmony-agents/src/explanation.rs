//! Explanation assembly: ranked key factors and templated narrative.

use harmony_scoring::{CompatibilityDimension, CompatibilityResult, STRENGTH_THRESHOLD};
use serde::{Deserialize, Serialize};

/// Maximum number of key factors attached to an assessment
pub const MAX_KEY_FACTORS: usize = 5;

/// Dimension score below which a factor is reported as a risk
pub const RISK_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FactorKind {
    Strength,
    Risk,
    Neutral,
}

/// One contributing dimension of an assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyFactor {
    pub dimension: CompatibilityDimension,
    pub kind: FactorKind,
    pub score: f64,
    /// `score * weight`
    pub contribution: f64,
    pub description: String,
}

/// Rank the dimensions of `result`: strengths by score descending, then
/// risks by score ascending, then the rest by weighted contribution.
pub fn rank_key_factors(result: &CompatibilityResult, limit: usize) -> Vec<KeyFactor> {
    let mut strengths = Vec::new();
    let mut risks = Vec::new();
    let mut neutral = Vec::new();

    for (dimension, dim_score) in &result.dimensions {
        let kind = if dim_score.score > STRENGTH_THRESHOLD {
            FactorKind::Strength
        } else if dim_score.score < RISK_THRESHOLD {
            FactorKind::Risk
        } else {
            FactorKind::Neutral
        };
        let factor = KeyFactor {
            dimension: *dimension,
            kind,
            score: dim_score.score,
            contribution: dim_score.score * dimension.weight(),
            description: dim_score.analysis.clone(),
        };
        match kind {
            FactorKind::Strength => strengths.push(factor),
            FactorKind::Risk => risks.push(factor),
            FactorKind::Neutral => neutral.push(factor),
        }
    }

    // BTreeMap iteration gives dimension order; stable sorts keep it on ties.
    strengths.sort_by(|a, b| b.score.total_cmp(&a.score));
    risks.sort_by(|a, b| a.score.total_cmp(&b.score));
    neutral.sort_by(|a, b| b.contribution.total_cmp(&a.contribution));

    strengths
        .into_iter()
        .chain(risks)
        .chain(neutral)
        .take(limit)
        .collect()
}

/// Explanation attached to every cached assessment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub headline: String,
    pub key_factors: Vec<KeyFactor>,
    pub detailed: String,
    pub suggestions: Vec<String>,
}

impl Explanation {
    pub fn from_result(result: &CompatibilityResult) -> Self {
        let key_factors = rank_key_factors(result, MAX_KEY_FACTORS);
        let headline = headline(result, key_factors.first());
        let detailed = key_factors
            .iter()
            .map(|f| format!("{} ({}%): {}", f.dimension.label(), percent(f.score), f.description))
            .collect::<Vec<_>>()
            .join("\n");

        let mut suggestions: Vec<String> = result
            .recommendations
            .iter()
            .flat_map(|r| r.actions.iter().cloned())
            .collect();
        if suggestions.is_empty() {
            suggestions.push("Start with what you both enjoy and see where it leads".to_string());
        }

        Self {
            headline,
            key_factors,
            detailed,
            suggestions,
        }
    }

    /// Most significant factor, if any
    pub fn top_factor(&self) -> Option<&KeyFactor> {
        self.key_factors.first()
    }
}

fn percent(score: f64) -> u8 {
    harmony_scoring::to_percent(score)
}

fn headline(result: &CompatibilityResult, top: Option<&KeyFactor>) -> String {
    let overall = percent(result.overall);
    match top {
        Some(f) if f.kind == FactorKind::Strength => format!(
            "{overall}% compatible, with {} as a standout",
            f.dimension.label().to_lowercase()
        ),
        Some(f) if f.kind == FactorKind::Risk => format!(
            "{overall}% compatible, though {} may need attention",
            f.dimension.label().to_lowercase()
        ),
        _ => format!("{overall}% compatible overall"),
    }
}

/// Cached assessment of one pair
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assessment {
    pub result: CompatibilityResult,
    pub explanation: Explanation,
}

impl Assessment {
    pub fn new(result: CompatibilityResult) -> Self {
        let explanation = Explanation::from_result(&result);
        Self {
            result,
            explanation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony_core::{PersonalityVector, Timestamp};
    use harmony_scoring::{CompatibilityScorer, DimensionScore};

    fn result_with(scores: &[(CompatibilityDimension, f64)]) -> CompatibilityResult {
        let a = PersonalityVector::create_default("a");
        let b = PersonalityVector::create_default("b");
        let mut result = CompatibilityResult::fallback(&a, &b, Timestamp::from_nanos(0));
        for (dim, score) in scores {
            result.dimensions.insert(
                *dim,
                DimensionScore {
                    score: *score,
                    ..DimensionScore::neutral(0.5)
                },
            );
        }
        result
    }

    #[test]
    fn test_factor_ordering() {
        let result = result_with(&[
            (CompatibilityDimension::Attachment, 0.95),
            (CompatibilityDimension::Communication, 0.85),
            (CompatibilityDimension::Values, 0.3),
            (CompatibilityDimension::Personality, 0.45),
            (CompatibilityDimension::Emotional, 0.6),
            (CompatibilityDimension::Lifestyle, 0.7),
            (CompatibilityDimension::Growth, 0.7),
        ]);
        let factors = rank_key_factors(&result, MAX_KEY_FACTORS);
        let dims: Vec<_> = factors.iter().map(|f| f.dimension).collect();
        assert_eq!(
            dims,
            vec![
                CompatibilityDimension::Attachment,
                CompatibilityDimension::Communication,
                CompatibilityDimension::Values,
                CompatibilityDimension::Personality,
                // 0.7 * 0.10 beats 0.6 * 0.10 and 0.7 * 0.05
                CompatibilityDimension::Lifestyle,
            ]
        );
        assert_eq!(factors[2].kind, FactorKind::Risk);
    }

    #[test]
    fn test_explanation_from_scored_pair() {
        let a = PersonalityVector::create_default("a");
        let b = PersonalityVector::create_default("b");
        let result = CompatibilityScorer::new()
            .score_at(&a, &b, Timestamp::from_nanos(0))
            .unwrap();
        let assessment = Assessment::new(result);
        assert_eq!(assessment.explanation.key_factors.len(), MAX_KEY_FACTORS);
        assert!(assessment.explanation.headline.contains('%'));
        assert!(!assessment.explanation.suggestions.is_empty());
    }
}
