//! Personality vector: named trait dimensions grouped by psychological model.
//!
//! Every scalar lives in `[0, 1]`. Dimensions that were never observed hold
//! the neutral value 0.5 and their group reports confidence 0. Each mutation
//! bumps a version that downstream caches key on.
//!
//! Versions come from one process-wide counter, so two vectors built for the
//! same id with different content never share a version. Only the neutral
//! default sits at version 0.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{Error, Result};
use crate::types::ProfileId;

/// Neutral value for an unobserved dimension
pub const NEUTRAL: f64 = 0.5;

/// Confidence given to a group that received values without an explicit confidence
pub const OBSERVED_CONFIDENCE: f64 = 0.5;

/// Named sub-group of dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitGroup {
    BigFive,
    Attachment,
    Communication,
    Values,
    EmotionalIntelligence,
}

impl TraitGroup {
    pub const ALL: [TraitGroup; 5] = [
        TraitGroup::BigFive,
        TraitGroup::Attachment,
        TraitGroup::Communication,
        TraitGroup::Values,
        TraitGroup::EmotionalIntelligence,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            TraitGroup::BigFive => "big_five",
            TraitGroup::Attachment => "attachment",
            TraitGroup::Communication => "communication",
            TraitGroup::Values => "values",
            TraitGroup::EmotionalIntelligence => "emotional_intelligence",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        let wanted = normalize_key(key);
        Self::ALL.into_iter().find(|g| normalize_key(g.key()) == wanted)
    }

    /// Dimensions of the group in tie-break priority order.
    pub fn dimensions(&self) -> &'static [Dimension] {
        use Dimension::*;
        match self {
            TraitGroup::BigFive => &[
                Openness,
                Conscientiousness,
                Extraversion,
                Agreeableness,
                Neuroticism,
            ],
            TraitGroup::Attachment => &[Secure, Anxious, Avoidant, Disorganized],
            TraitGroup::Communication => &[
                Directness,
                EmotionalExpression,
                ActiveListening,
                ConflictStyle,
            ],
            TraitGroup::Values => &[
                Family,
                Career,
                Adventure,
                Security,
                Creativity,
                Helping,
                Independence,
                Spirituality,
            ],
            TraitGroup::EmotionalIntelligence => &[
                Empathy,
                EmotionalRegulation,
                SelfAwareness,
                SocialSkills,
            ],
        }
    }
}

/// A single scalar trait dimension
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    // Big Five
    Openness,
    Conscientiousness,
    Extraversion,
    Agreeableness,
    Neuroticism,
    // Attachment
    Secure,
    Anxious,
    Avoidant,
    Disorganized,
    // Communication
    Directness,
    EmotionalExpression,
    ActiveListening,
    ConflictStyle,
    // Values
    Family,
    Career,
    Adventure,
    Security,
    Creativity,
    Helping,
    Independence,
    Spirituality,
    // Emotional intelligence
    Empathy,
    EmotionalRegulation,
    SelfAwareness,
    SocialSkills,
}

impl Dimension {
    pub const COUNT: usize = 25;

    pub fn all() -> impl Iterator<Item = Dimension> {
        TraitGroup::ALL
            .into_iter()
            .flat_map(|g| g.dimensions().iter().copied())
    }

    pub fn group(&self) -> TraitGroup {
        use Dimension::*;
        match self {
            Openness | Conscientiousness | Extraversion | Agreeableness | Neuroticism => {
                TraitGroup::BigFive
            }
            Secure | Anxious | Avoidant | Disorganized => TraitGroup::Attachment,
            Directness | EmotionalExpression | ActiveListening | ConflictStyle => {
                TraitGroup::Communication
            }
            Family | Career | Adventure | Security | Creativity | Helping | Independence
            | Spirituality => TraitGroup::Values,
            Empathy | EmotionalRegulation | SelfAwareness | SocialSkills => {
                TraitGroup::EmotionalIntelligence
            }
        }
    }

    pub fn key(&self) -> &'static str {
        use Dimension::*;
        match self {
            Openness => "openness",
            Conscientiousness => "conscientiousness",
            Extraversion => "extraversion",
            Agreeableness => "agreeableness",
            Neuroticism => "neuroticism",
            Secure => "secure",
            Anxious => "anxious",
            Avoidant => "avoidant",
            Disorganized => "disorganized",
            Directness => "directness",
            EmotionalExpression => "emotional_expression",
            ActiveListening => "active_listening",
            ConflictStyle => "conflict_style",
            Family => "family",
            Career => "career",
            Adventure => "adventure",
            Security => "security",
            Creativity => "creativity",
            Helping => "helping",
            Independence => "independence",
            Spirituality => "spirituality",
            Empathy => "empathy",
            EmotionalRegulation => "emotional_regulation",
            SelfAwareness => "self_awareness",
            SocialSkills => "social_skills",
        }
    }

    /// Human-readable label
    pub fn label(&self) -> String {
        let key = self.key().replace('_', " ");
        let mut chars = key.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }

    /// Parse `openness`, `emotionalExpression` or `big_five.openness`.
    pub fn from_key(key: &str) -> Option<Self> {
        if let Some((group_key, dim_key)) = key.split_once('.') {
            let group = TraitGroup::from_key(group_key)?;
            return Self::from_key(dim_key).filter(|d| d.group() == group);
        }
        let wanted = normalize_key(key);
        Self::all().find(|d| normalize_key(d.key()) == wanted)
    }
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| !matches!(c, '_' | '-' | ' '))
        .flat_map(char::to_lowercase)
        .collect()
}

/// Typed personality representation of one profile
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawVector")]
pub struct PersonalityVector {
    id: ProfileId,
    values: BTreeMap<Dimension, f64>,
    confidence: BTreeMap<TraitGroup, f64>,
    version: u64,
}

/// Highest version handed out (or imported) so far
static VERSION_CLOCK: AtomicU64 = AtomicU64::new(0);

impl PersonalityVector {
    /// Neutral vector: every scalar 0.5, every group confidence 0.
    pub fn create_default(id: impl Into<ProfileId>) -> Self {
        Self {
            id: id.into(),
            values: Dimension::all().map(|d| (d, NEUTRAL)).collect(),
            confidence: TraitGroup::ALL.into_iter().map(|g| (g, 0.0)).collect(),
            version: 0,
        }
    }

    pub fn id(&self) -> &ProfileId {
        &self.id
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Reassign ownership, e.g. when a stored vector is attached to another record.
    pub(crate) fn rebind(&mut self, id: ProfileId) {
        self.id = id;
        self.bump_version();
    }

    /// Move to a fresh version above both this vector's and every other one.
    fn bump_version(&mut self) {
        let next = VERSION_CLOCK.fetch_add(1, Ordering::Relaxed) + 1;
        self.version = next.max(self.version + 1);
        VERSION_CLOCK.fetch_max(self.version, Ordering::Relaxed);
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        self.values.get(&dimension).copied().unwrap_or(NEUTRAL)
    }

    pub fn confidence(&self, group: TraitGroup) -> f64 {
        self.confidence.get(&group).copied().unwrap_or(0.0)
    }

    /// Whether any data was observed for the group
    pub fn is_observed(&self, group: TraitGroup) -> bool {
        self.confidence(group) > 0.0
    }

    pub fn group_values(&self, group: TraitGroup) -> Vec<(Dimension, f64)> {
        group
            .dimensions()
            .iter()
            .map(|&d| (d, self.get(d)))
            .collect()
    }

    /// Fraction of groups with confidence above 0.5
    pub fn completeness(&self) -> f64 {
        let confident = TraitGroup::ALL
            .iter()
            .filter(|g| self.confidence(**g) > 0.5)
            .count();
        confident as f64 / TraitGroup::ALL.len() as f64
    }

    /// Merge the supplied dimensions, leaving all others untouched.
    ///
    /// Returns whether anything changed. On error the vector is unchanged.
    pub fn load_partial(&mut self, traits: &Value) -> Result<bool> {
        let obj = traits
            .as_object()
            .ok_or_else(|| Error::Data("trait input must be an object".to_string()))?;

        let mut values: Vec<(Dimension, f64)> = Vec::new();
        let mut confidences: Vec<(TraitGroup, f64)> = Vec::new();

        for (key, value) in obj {
            if key == "confidence" {
                let groups = value.as_object().ok_or_else(|| {
                    Error::Data("'confidence' must map group names to numbers".to_string())
                })?;
                for (group_key, c) in groups {
                    if let Some(group) = TraitGroup::from_key(group_key) {
                        confidences.push((group, numeric(&format!("confidence.{group_key}"), c)?));
                    }
                }
            } else if let Some(group) = TraitGroup::from_key(key) {
                let dims = value.as_object().ok_or_else(|| {
                    Error::Data(format!("group '{key}' must be an object"))
                })?;
                for (dim_key, v) in dims {
                    if dim_key == "confidence" {
                        confidences.push((group, numeric(&format!("{key}.confidence"), v)?));
                        continue;
                    }
                    match Dimension::from_key(dim_key) {
                        Some(dim) if dim.group() == group => {
                            values.push((dim, numeric(&format!("{key}.{dim_key}"), v)?));
                        }
                        _ => tracing::debug!(group = %key, key = %dim_key, "ignoring unknown dimension"),
                    }
                }
            } else if let Some(dim) = Dimension::from_key(key) {
                values.push((dim, numeric(key, value)?));
            } else {
                tracing::debug!(key = %key, "ignoring unknown trait key");
            }
        }

        if values.is_empty() && confidences.is_empty() {
            return Ok(false);
        }

        for (dim, v) in &values {
            self.values.insert(*dim, v.clamp(0.0, 1.0));
        }
        for (dim, _) in &values {
            let group = dim.group();
            let explicit = confidences.iter().any(|(g, _)| *g == group);
            if !explicit && self.confidence(group) == 0.0 {
                self.confidence.insert(group, OBSERVED_CONFIDENCE);
            }
        }
        for (group, c) in confidences {
            self.confidence.insert(group, c.clamp(0.0, 1.0));
        }

        self.bump_version();
        Ok(true)
    }

    /// Overwrite each supplied dimension with its clamped value.
    ///
    /// Returns the version after the update.
    pub fn update_dimensions(&mut self, delta: &BTreeMap<Dimension, f64>) -> u64 {
        let mut changed = false;
        for (&dim, &value) in delta {
            if !value.is_finite() {
                tracing::warn!(dimension = dim.key(), "skipping non-finite dimension update");
                continue;
            }
            self.values.insert(dim, value.clamp(0.0, 1.0));
            changed = true;
        }
        if changed {
            self.bump_version();
        }
        self.version
    }

    pub fn set_confidence(&mut self, group: TraitGroup, confidence: f64) {
        let c = if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 };
        self.confidence.insert(group, c);
        self.bump_version();
    }

    /// Highest-valued dimension of a group; exact ties resolve to the
    /// earlier dimension in [`TraitGroup::dimensions`] order.
    pub fn primary_style(&self, group: TraitGroup) -> Dimension {
        let dims = group.dimensions();
        let mut best = dims[0];
        for &dim in &dims[1..] {
            if self.get(dim) > self.get(best) {
                best = dim;
            }
        }
        best
    }

    /// Read-only projection for display
    pub fn summary(&self) -> VectorSummary {
        VectorSummary {
            profile_id: self.id.clone(),
            version: self.version,
            traits: TraitGroup::ALL
                .into_iter()
                .map(|g| (g, self.group_values(g).into_iter().collect()))
                .collect(),
            confidence: self.confidence.clone(),
            primary_styles: TraitGroup::ALL
                .into_iter()
                .map(|g| (g, self.primary_style(g)))
                .collect(),
            completeness: self.completeness(),
        }
    }
}

fn numeric(key: &str, value: &Value) -> Result<f64> {
    value
        .as_f64()
        .filter(|v| v.is_finite())
        .ok_or_else(|| Error::NonNumeric { key: key.to_string() })
}

/// Display projection of a [`PersonalityVector`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VectorSummary {
    pub profile_id: ProfileId,
    pub version: u64,
    pub traits: BTreeMap<TraitGroup, BTreeMap<Dimension, f64>>,
    pub confidence: BTreeMap<TraitGroup, f64>,
    pub primary_styles: BTreeMap<TraitGroup, Dimension>,
    pub completeness: f64,
}

/// Unvalidated wire form of a vector
#[derive(Deserialize)]
struct RawVector {
    id: ProfileId,
    #[serde(default)]
    values: BTreeMap<Dimension, f64>,
    #[serde(default)]
    confidence: BTreeMap<TraitGroup, f64>,
    #[serde(default)]
    version: u64,
}

impl TryFrom<RawVector> for PersonalityVector {
    type Error = Error;

    fn try_from(raw: RawVector) -> Result<Self> {
        let mut vector = PersonalityVector::create_default(raw.id);
        for (dim, v) in raw.values {
            if !v.is_finite() {
                return Err(Error::NonNumeric { key: dim.key().to_string() });
            }
            vector.values.insert(dim, v.clamp(0.0, 1.0));
        }
        for (group, c) in raw.confidence {
            if !c.is_finite() {
                return Err(Error::NonNumeric { key: format!("confidence.{}", group.key()) });
            }
            vector.confidence.insert(group, c.clamp(0.0, 1.0));
        }
        vector.version = raw.version;
        VERSION_CLOCK.fetch_max(raw.version, Ordering::Relaxed);
        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_is_neutral() {
        let v = PersonalityVector::create_default("u1");
        assert!(Dimension::all().all(|d| v.get(d) == NEUTRAL));
        assert!(TraitGroup::ALL.iter().all(|g| v.confidence(*g) == 0.0));
        assert_eq!(v.version(), 0);
        assert_eq!(Dimension::all().count(), Dimension::COUNT);
    }

    #[test]
    fn test_load_partial_merges_supplied_only() {
        let mut v = PersonalityVector::create_default("u1");
        let changed = v
            .load_partial(&json!({
                "big_five": { "openness": 0.9, "agreeableness": 1.4 },
                "values.family": 0.2,
                "emotionalExpression": 0.7,
                "favourite_colour": "blue",
                "confidence": { "big_five": 0.8 }
            }))
            .unwrap();

        assert!(changed);
        assert_eq!(v.get(Dimension::Openness), 0.9);
        assert_eq!(v.get(Dimension::Agreeableness), 1.0);
        assert_eq!(v.get(Dimension::Family), 0.2);
        assert_eq!(v.get(Dimension::EmotionalExpression), 0.7);
        assert_eq!(v.get(Dimension::Neuroticism), NEUTRAL);
        assert_eq!(v.confidence(TraitGroup::BigFive), 0.8);
        assert_eq!(v.confidence(TraitGroup::Values), OBSERVED_CONFIDENCE);
        assert_eq!(v.confidence(TraitGroup::Attachment), 0.0);
        assert!(v.version() > 0);
    }

    #[test]
    fn test_load_partial_rejects_non_numeric_without_mutation() {
        let mut v = PersonalityVector::create_default("u1");
        let before = v.clone();
        let err = v
            .load_partial(&json!({ "openness": 0.9, "neuroticism": "high" }))
            .unwrap_err();
        assert!(matches!(err, Error::NonNumeric { .. }));
        assert_eq!(v, before);

        assert!(v.load_partial(&json!([1, 2, 3])).is_err());
    }

    #[test]
    fn test_load_partial_missing_fields_is_not_an_error() {
        let mut v = PersonalityVector::create_default("u1");
        assert!(!v.load_partial(&json!({})).unwrap());
        assert_eq!(v.version(), 0);
    }

    #[test]
    fn test_update_dimensions_overwrites_and_versions() {
        let mut v = PersonalityVector::create_default("u1");
        let mut delta = BTreeMap::new();
        delta.insert(Dimension::Empathy, 1.7);
        delta.insert(Dimension::Career, -0.3);
        delta.insert(Dimension::Helping, 0.65);

        let version = v.update_dimensions(&delta);
        assert!(version > 0);
        assert_eq!(v.version(), version);
        assert_eq!(v.get(Dimension::Empathy), 1.0);
        assert_eq!(v.get(Dimension::Career), 0.0);
        assert_eq!(v.get(Dimension::Helping), 0.65);

        assert_eq!(v.update_dimensions(&BTreeMap::new()), version);
        assert!(v.update_dimensions(&delta) > version);
    }

    #[test]
    fn test_rebuilt_vectors_get_distinct_versions() {
        let build = |openness: f64| {
            let mut v = PersonalityVector::create_default("u1");
            v.load_partial(&json!({ "openness": openness })).unwrap();
            v
        };
        let first = build(0.9);
        let rebuilt = build(0.1);
        assert_ne!(first.version(), rebuilt.version());
        assert!(rebuilt.version() > first.version());
    }

    #[test]
    fn test_imported_version_stays_monotonic() {
        let mut v: PersonalityVector =
            serde_json::from_value(json!({ "id": "u9", "version": 1_000_000_000u64 })).unwrap();
        v.set_confidence(TraitGroup::Values, 0.6);
        assert!(v.version() > 1_000_000_000);

        let mut fresh = PersonalityVector::create_default("u10");
        fresh.set_confidence(TraitGroup::Values, 0.6);
        assert!(fresh.version() > 1_000_000_000);
    }

    #[test]
    fn test_primary_style_tie_break() {
        let mut v = PersonalityVector::create_default("u1");
        assert_eq!(v.primary_style(TraitGroup::Attachment), Dimension::Secure);

        v.load_partial(&json!({ "attachment": {
            "secure": 0.3, "anxious": 0.7, "avoidant": 0.7, "disorganized": 0.1
        }}))
        .unwrap();
        assert_eq!(v.primary_style(TraitGroup::Attachment), Dimension::Anxious);

        v.load_partial(&json!({ "attachment": { "disorganized": 0.9 } }))
            .unwrap();
        assert_eq!(v.primary_style(TraitGroup::Attachment), Dimension::Disorganized);
    }

    #[test]
    fn test_dimension_key_parsing() {
        assert_eq!(Dimension::from_key("big_five.openness"), Some(Dimension::Openness));
        assert_eq!(Dimension::from_key("attachment.openness"), None);
        assert_eq!(Dimension::from_key("Self-Awareness"), Some(Dimension::SelfAwareness));
        assert_eq!(Dimension::from_key("charisma"), None);
        assert_eq!(Dimension::ActiveListening.label(), "Active listening");
    }

    #[test]
    fn test_summary_and_serde() {
        let mut v = PersonalityVector::create_default("u1");
        v.set_confidence(TraitGroup::BigFive, 0.9);
        v.set_confidence(TraitGroup::Values, 0.6);

        let summary = v.summary();
        assert_eq!(summary.completeness, 0.4);
        assert_eq!(summary.traits[&TraitGroup::Values].len(), 8);

        let json = serde_json::to_value(&v).unwrap();
        let back: PersonalityVector = serde_json::from_value(json).unwrap();
        assert_eq!(back, v);
    }
}
