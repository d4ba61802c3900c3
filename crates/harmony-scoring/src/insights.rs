//! Threshold rules turning scores into recommendations, risks and strengths.

use serde::{Deserialize, Serialize};

use crate::dimensions::CompatibilityDimension;
use crate::predictions::Predictions;

/// Area an insight concerns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightCategory {
    Attachment,
    Communication,
    Values,
    Personality,
    Emotional,
    Lifestyle,
    Growth,
    Conflict,
}

impl From<CompatibilityDimension> for InsightCategory {
    fn from(dim: CompatibilityDimension) -> Self {
        match dim {
            CompatibilityDimension::Attachment => InsightCategory::Attachment,
            CompatibilityDimension::Communication => InsightCategory::Communication,
            CompatibilityDimension::Values => InsightCategory::Values,
            CompatibilityDimension::Personality => InsightCategory::Personality,
            CompatibilityDimension::Emotional => InsightCategory::Emotional,
            CompatibilityDimension::Lifestyle => InsightCategory::Lifestyle,
            CompatibilityDimension::Growth => InsightCategory::Growth,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub category: InsightCategory,
    pub priority: Priority,
    pub description: String,
    pub actions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskFactor {
    pub category: InsightCategory,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Strength {
    pub category: InsightCategory,
    pub score: f64,
    pub description: String,
}

/// Dimension score above which a strength is reported
pub const STRENGTH_THRESHOLD: f64 = 0.8;

/// Conflict probability above which a high-severity risk is reported
pub const CONFLICT_RISK_THRESHOLD: f64 = 0.7;

struct RecommendationRule {
    dimension: CompatibilityDimension,
    below: f64,
    priority: Priority,
    description: &'static str,
    actions: &'static [&'static str],
}

const RECOMMENDATION_RULES: &[RecommendationRule] = &[
    RecommendationRule {
        dimension: CompatibilityDimension::Communication,
        below: 0.6,
        priority: Priority::High,
        description: "Build shared communication habits early",
        actions: &[
            "Agree on how you each prefer to raise concerns",
            "Practice reflecting back what you heard before responding",
            "Schedule a low-stakes weekly check-in",
        ],
    },
    RecommendationRule {
        dimension: CompatibilityDimension::Attachment,
        below: 0.7,
        priority: Priority::Medium,
        description: "Invest in trust-building and reassurance",
        actions: &[
            "Be explicit about plans and follow through consistently",
            "Talk about what makes each of you feel secure",
            "Give space and closeness on request without judgement",
        ],
    },
    RecommendationRule {
        dimension: CompatibilityDimension::Values,
        below: 0.6,
        priority: Priority::Medium,
        description: "Explore your core values together",
        actions: &[
            "Share what family, career and independence mean to you",
            "Identify one non-negotiable each and discuss it openly",
        ],
    },
    RecommendationRule {
        dimension: CompatibilityDimension::Emotional,
        below: 0.5,
        priority: Priority::Low,
        description: "Grow emotional awareness as a pair",
        actions: &[
            "Name feelings out loud during calm moments",
            "Pause and regroup when conversations get heated",
        ],
    },
];

struct RiskRule {
    dimension: CompatibilityDimension,
    below: f64,
    severity: Severity,
    description: &'static str,
}

const RISK_RULES: &[RiskRule] = &[
    RiskRule {
        dimension: CompatibilityDimension::Attachment,
        below: 0.5,
        severity: Severity::Medium,
        description: "Attachment patterns may trigger insecurity or distance",
    },
    RiskRule {
        dimension: CompatibilityDimension::Values,
        below: 0.4,
        severity: Severity::Medium,
        description: "Core values differ in ways that affect long-term plans",
    },
];

/// Insights for one assessment
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Insights {
    pub recommendations: Vec<Recommendation>,
    pub risk_factors: Vec<RiskFactor>,
    pub strengths: Vec<Strength>,
}

/// Evaluate every rule against dimension scores and predictions.
///
/// `score` must return the score of each dimension.
pub fn evaluate<F>(score: F, predictions: &Predictions) -> Insights
where
    F: Fn(CompatibilityDimension) -> f64,
{
    let recommendations = RECOMMENDATION_RULES
        .iter()
        .filter(|rule| score(rule.dimension) < rule.below)
        .map(|rule| Recommendation {
            category: rule.dimension.into(),
            priority: rule.priority,
            description: rule.description.to_string(),
            actions: rule.actions.iter().map(|a| a.to_string()).collect(),
        })
        .collect();

    let mut risk_factors = Vec::new();
    if predictions.conflict_probability > CONFLICT_RISK_THRESHOLD {
        risk_factors.push(RiskFactor {
            category: InsightCategory::Conflict,
            severity: Severity::High,
            description: format!(
                "High likelihood of recurring conflict ({:.0}%)",
                predictions.conflict_probability * 100.0
            ),
        });
    }
    risk_factors.extend(
        RISK_RULES
            .iter()
            .filter(|rule| score(rule.dimension) < rule.below)
            .map(|rule| RiskFactor {
                category: rule.dimension.into(),
                severity: rule.severity,
                description: rule.description.to_string(),
            }),
    );

    let strengths = CompatibilityDimension::ALL
        .iter()
        .filter(|dim| score(**dim) > STRENGTH_THRESHOLD)
        .map(|dim| Strength {
            category: (*dim).into(),
            score: score(*dim),
            description: format!("{} is a standout strength", dim.label()),
        })
        .collect();

    Insights {
        recommendations,
        risk_factors,
        strengths,
    }
}
