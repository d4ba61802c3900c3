//! Weighted compatibility dimensions and their per-dimension scorers.
//!
//! | Dimension | Weight | Basis |
//! |-----------|--------|-------|
//! | Attachment | 0.25 | style matrix |
//! | Communication | 0.20 | similarity, listening floor, conflict-style bucket |
//! | Values | 0.15 | mean similarity over eight values |
//! | Personality | 0.15 | Big Five similarity/complementarity blend |
//! | Emotional | 0.10 | weaker partner's emotional intelligence |
//! | Lifestyle | 0.10 | proxy heuristic, low confidence |
//! | Growth | 0.05 | proxy heuristic, low confidence |
//!
//! Every scorer is symmetric in its two arguments.

use std::collections::BTreeMap;

use harmony_core::{Dimension, PersonalityVector, TraitGroup};
use serde::{Deserialize, Serialize};

use crate::attachment::{pair_compatibility, pairing_analysis, AttachmentStyle, UNKNOWN_PAIR_SCORE};

/// Confidence ceiling for the proxy-based dimensions
pub const EXTENSION_CONFIDENCE_CAP: f64 = 0.4;

/// One of the seven weighted scoring axes
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompatibilityDimension {
    Attachment,
    Communication,
    Values,
    Personality,
    Emotional,
    Lifestyle,
    Growth,
}

impl CompatibilityDimension {
    pub const ALL: [CompatibilityDimension; 7] = [
        CompatibilityDimension::Attachment,
        CompatibilityDimension::Communication,
        CompatibilityDimension::Values,
        CompatibilityDimension::Personality,
        CompatibilityDimension::Emotional,
        CompatibilityDimension::Lifestyle,
        CompatibilityDimension::Growth,
    ];

    pub fn weight(&self) -> f64 {
        match self {
            CompatibilityDimension::Attachment => 0.25,
            CompatibilityDimension::Communication => 0.20,
            CompatibilityDimension::Values => 0.15,
            CompatibilityDimension::Personality => 0.15,
            CompatibilityDimension::Emotional => 0.10,
            CompatibilityDimension::Lifestyle => 0.10,
            CompatibilityDimension::Growth => 0.05,
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            CompatibilityDimension::Attachment => "attachment",
            CompatibilityDimension::Communication => "communication",
            CompatibilityDimension::Values => "values",
            CompatibilityDimension::Personality => "personality",
            CompatibilityDimension::Emotional => "emotional",
            CompatibilityDimension::Lifestyle => "lifestyle",
            CompatibilityDimension::Growth => "growth",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            CompatibilityDimension::Attachment => "Attachment styles",
            CompatibilityDimension::Communication => "Communication",
            CompatibilityDimension::Values => "Shared values",
            CompatibilityDimension::Personality => "Personality fit",
            CompatibilityDimension::Emotional => "Emotional intelligence",
            CompatibilityDimension::Lifestyle => "Lifestyle",
            CompatibilityDimension::Growth => "Growth potential",
        }
    }

    /// Vector dimensions that feed this axis
    pub fn vector_dimensions(&self) -> &'static [Dimension] {
        match self {
            CompatibilityDimension::Attachment => TraitGroup::Attachment.dimensions(),
            CompatibilityDimension::Communication => TraitGroup::Communication.dimensions(),
            CompatibilityDimension::Values => TraitGroup::Values.dimensions(),
            CompatibilityDimension::Personality => TraitGroup::BigFive.dimensions(),
            CompatibilityDimension::Emotional => TraitGroup::EmotionalIntelligence.dimensions(),
            CompatibilityDimension::Lifestyle => {
                &[Dimension::Extraversion, Dimension::Adventure, Dimension::Career]
            }
            CompatibilityDimension::Growth => &[Dimension::Openness, Dimension::SelfAwareness],
        }
    }

    /// Proxy-scored axes awaiting richer input signals
    pub fn is_extension_point(&self) -> bool {
        matches!(
            self,
            CompatibilityDimension::Lifestyle | CompatibilityDimension::Growth
        )
    }
}

/// Score of a single compatibility dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub score: f64,
    pub confidence: f64,
    pub analysis: String,
    pub details: BTreeMap<String, f64>,
}

impl DimensionScore {
    pub fn neutral(confidence: f64) -> Self {
        Self {
            score: 0.5,
            confidence,
            analysis: "Not enough information to assess this area yet".to_string(),
            details: BTreeMap::new(),
        }
    }

    fn is_finite(&self) -> bool {
        self.score.is_finite()
            && self.confidence.is_finite()
            && self.details.values().all(|v| v.is_finite())
    }
}

/// Score one dimension for a pair of vectors
pub fn score_dimension(
    dimension: CompatibilityDimension,
    a: &PersonalityVector,
    b: &PersonalityVector,
) -> DimensionScore {
    match dimension {
        CompatibilityDimension::Attachment => score_attachment(a, b),
        CompatibilityDimension::Communication => score_communication(a, b),
        CompatibilityDimension::Values => score_values(a, b),
        CompatibilityDimension::Personality => score_personality(a, b),
        CompatibilityDimension::Emotional => score_emotional(a, b),
        CompatibilityDimension::Lifestyle => score_lifestyle(a, b),
        CompatibilityDimension::Growth => score_growth(a, b),
    }
}

pub(crate) fn all_finite(scores: &BTreeMap<CompatibilityDimension, DimensionScore>) -> bool {
    scores.values().all(DimensionScore::is_finite)
}

fn similarity(a: f64, b: f64) -> f64 {
    1.0 - (a - b).abs()
}

fn group_confidence(a: &PersonalityVector, b: &PersonalityVector, group: TraitGroup) -> f64 {
    a.confidence(group).min(b.confidence(group))
}

fn band(score: f64) -> &'static str {
    if score > 0.8 {
        "excellent"
    } else if score > 0.6 {
        "good"
    } else if score > 0.4 {
        "moderate"
    } else {
        "challenging"
    }
}

pub fn score_attachment(a: &PersonalityVector, b: &PersonalityVector) -> DimensionScore {
    let confidence = group_confidence(a, b, TraitGroup::Attachment);
    if !a.is_observed(TraitGroup::Attachment) || !b.is_observed(TraitGroup::Attachment) {
        let mut neutral = DimensionScore::neutral(confidence);
        neutral.score = UNKNOWN_PAIR_SCORE;
        return neutral;
    }

    let style_a = AttachmentStyle::of(a);
    let style_b = AttachmentStyle::of(b);
    let score = pair_compatibility(style_a, style_b);

    let mut details = BTreeMap::new();
    details.insert("matrix_score".to_string(), score);

    DimensionScore {
        score,
        confidence,
        analysis: pairing_analysis(style_a, style_b),
        details,
    }
}

/// Conflict-style distance bucket
pub fn conflict_bucket(distance: f64) -> f64 {
    if distance < 0.3 {
        0.8
    } else if distance > 0.7 {
        0.4
    } else {
        0.6
    }
}

pub fn score_communication(a: &PersonalityVector, b: &PersonalityVector) -> DimensionScore {
    use Dimension::*;

    let directness = similarity(a.get(Directness), b.get(Directness));
    let expression = similarity(a.get(EmotionalExpression), b.get(EmotionalExpression));
    let listening = a.get(ActiveListening).min(b.get(ActiveListening));
    let conflict = conflict_bucket((a.get(ConflictStyle) - b.get(ConflictStyle)).abs());

    let score = 0.25 * directness + 0.25 * expression + 0.25 * listening + 0.25 * conflict;

    let mut details = BTreeMap::new();
    details.insert("directness".to_string(), directness);
    details.insert("emotional_expression".to_string(), expression);
    details.insert("active_listening".to_string(), listening);
    details.insert("conflict_style".to_string(), conflict);

    let weakest = if listening <= conflict.min(directness).min(expression) {
        "listening"
    } else if conflict <= directness.min(expression) {
        "handling disagreements"
    } else if directness <= expression {
        "how directly you each speak"
    } else {
        "how openly you each share feelings"
    };

    DimensionScore {
        score,
        confidence: group_confidence(a, b, TraitGroup::Communication),
        analysis: format!(
            "{} communication fit; the area to watch is {}",
            capitalize(band(score)),
            weakest
        ),
        details,
    }
}

pub fn score_values(a: &PersonalityVector, b: &PersonalityVector) -> DimensionScore {
    let dims = TraitGroup::Values.dimensions();
    let mut details = BTreeMap::new();
    let mut total = 0.0;
    for &dim in dims {
        let s = similarity(a.get(dim), b.get(dim));
        details.insert(dim.key().to_string(), s);
        total += s;
    }
    let score = total / dims.len() as f64;

    let shared: Vec<&str> = dims
        .iter()
        .filter(|d| a.get(**d) > 0.65 && b.get(**d) > 0.65)
        .map(|d| d.key())
        .collect();

    let analysis = if shared.is_empty() {
        format!("{} values alignment", capitalize(band(score)))
    } else {
        format!(
            "{} values alignment; you both prioritise {}",
            capitalize(band(score)),
            shared.join(", ")
        )
    };

    DimensionScore {
        score,
        confidence: group_confidence(a, b, TraitGroup::Values),
        analysis,
        details,
    }
}

pub fn score_personality(a: &PersonalityVector, b: &PersonalityVector) -> DimensionScore {
    let dims = TraitGroup::BigFive.dimensions();
    let mut details = BTreeMap::new();
    let mut total = 0.0;

    for &dim in dims {
        let (x, y) = (a.get(dim), b.get(dim));
        let delta = (x - y).abs();
        let s = match dim {
            Dimension::Agreeableness | Dimension::Conscientiousness => 1.0 - delta,
            Dimension::Neuroticism => ((1.0 - x.max(y)) + 0.3 * (1.0 - delta)).clamp(0.0, 1.0),
            _ => 0.7 * (1.0 - delta) + 0.3 * delta,
        };
        details.insert(dim.key().to_string(), s);
        total += s;
    }
    let score = total / dims.len() as f64;

    DimensionScore {
        score,
        confidence: group_confidence(a, b, TraitGroup::BigFive),
        analysis: format!("{} personality fit", capitalize(band(score))),
        details,
    }
}

pub fn score_emotional(a: &PersonalityVector, b: &PersonalityVector) -> DimensionScore {
    use Dimension::*;

    let empathy = a.get(Empathy).min(b.get(Empathy));
    let regulation = a.get(EmotionalRegulation).min(b.get(EmotionalRegulation));
    let awareness = a.get(SelfAwareness).min(b.get(SelfAwareness));
    let social = a.get(SocialSkills).min(b.get(SocialSkills));

    let score = 0.3 * empathy + 0.3 * regulation + 0.2 * awareness + 0.2 * social;

    let mut details = BTreeMap::new();
    details.insert("empathy".to_string(), empathy);
    details.insert("emotional_regulation".to_string(), regulation);
    details.insert("self_awareness".to_string(), awareness);
    details.insert("social_skills".to_string(), social);

    DimensionScore {
        score,
        confidence: group_confidence(a, b, TraitGroup::EmotionalIntelligence),
        analysis: format!(
            "{} shared emotional intelligence",
            capitalize(band(score))
        ),
        details,
    }
}

/// Proxy: similarity of social energy, novelty seeking and work focus.
pub fn score_lifestyle(a: &PersonalityVector, b: &PersonalityVector) -> DimensionScore {
    let dims = CompatibilityDimension::Lifestyle.vector_dimensions();
    let mut details = BTreeMap::new();
    let mut total = 0.0;
    for &dim in dims {
        let s = similarity(a.get(dim), b.get(dim));
        details.insert(dim.key().to_string(), s);
        total += s;
    }
    let score = total / dims.len() as f64;

    let confidence = EXTENSION_CONFIDENCE_CAP
        * group_confidence(a, b, TraitGroup::BigFive).min(group_confidence(a, b, TraitGroup::Values));

    DimensionScore {
        score,
        confidence,
        analysis: format!("{} day-to-day rhythm (estimated)", capitalize(band(score))),
        details,
    }
}

/// Proxy: shared openness and self-awareness.
pub fn score_growth(a: &PersonalityVector, b: &PersonalityVector) -> DimensionScore {
    let openness = (a.get(Dimension::Openness) + b.get(Dimension::Openness)) / 2.0;
    let awareness = (a.get(Dimension::SelfAwareness) + b.get(Dimension::SelfAwareness)) / 2.0;
    let score = 0.5 * openness + 0.5 * awareness;

    let mut details = BTreeMap::new();
    details.insert("openness".to_string(), openness);
    details.insert("self_awareness".to_string(), awareness);

    let confidence = EXTENSION_CONFIDENCE_CAP
        * group_confidence(a, b, TraitGroup::BigFive)
            .min(group_confidence(a, b, TraitGroup::EmotionalIntelligence));

    DimensionScore {
        score,
        confidence,
        analysis: format!("{} potential to grow together (estimated)", capitalize(band(score))),
        details,
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
