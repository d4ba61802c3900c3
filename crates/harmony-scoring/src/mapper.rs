//! Profile questionnaire to personality vector mapping.
//!
//! ## Sources, strongest first
//!
//! | Input | Groups | Confidence |
//! |-------|--------|------------|
//! | Big Five percentiles | big_five | 0.9 |
//! | MBTI type | big_five, communication seeds | 0.7 |
//! | Interests and stated values | values | 0.6 |
//! | Combination rules over Big Five | attachment, communication, emotional_intelligence | 0.55 |
//!
//! Sections that are missing or malformed leave the affected dimensions
//! neutral. Nothing here fails the caller.

use std::collections::BTreeMap;

use harmony_core::{
    Dimension, LifestyleInput, PersonalityVector, ProfileInput, TraitGroup,
};
use serde::{Deserialize, Serialize};

use crate::rules::{evaluate_rules, COMBINATION_RULES};

/// Confidence levels and keyword tuning for the mapper
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProfileMapperConfig {
    pub big_five_confidence: f64,
    pub mbti_confidence: f64,
    /// Confidence of a Big Five group inferred only from social frequency
    pub lifestyle_confidence: f64,
    pub keyword_confidence: f64,
    pub derived_confidence: f64,
    /// Level given to a value the user explicitly named
    pub stated_value_level: f64,
    /// Level given to the other values once any value was named
    pub unstated_value_level: f64,
    pub interest_boost: f64,
    pub interest_cap: f64,
}

impl Default for ProfileMapperConfig {
    fn default() -> Self {
        Self {
            big_five_confidence: 0.9,
            mbti_confidence: 0.7,
            lifestyle_confidence: 0.3,
            keyword_confidence: 0.6,
            derived_confidence: 0.55,
            stated_value_level: 0.85,
            unstated_value_level: 0.4,
            interest_boost: 0.08,
            interest_cap: 0.95,
        }
    }
}

use Dimension::*;

/// Seeds per MBTI letter. A type is the union of its four letters.
const MBTI_LETTERS: &[(char, &[(Dimension, f64)])] = &[
    ('E', &[(Extraversion, 0.75), (EmotionalExpression, 0.6)]),
    ('I', &[(Extraversion, 0.3), (EmotionalExpression, 0.45)]),
    ('N', &[(Openness, 0.75)]),
    ('S', &[(Openness, 0.4)]),
    ('F', &[(Agreeableness, 0.7), (Directness, 0.4)]),
    ('T', &[(Agreeableness, 0.45), (Directness, 0.7)]),
    ('J', &[(Conscientiousness, 0.7)]),
    ('P', &[(Conscientiousness, 0.4)]),
];

/// Neuroticism implied by the `-A`/`-T` identity suffix
const MBTI_IDENTITY: &[(char, f64)] = &[('A', 0.35), ('T', 0.65)];

const MBTI_AXES: [[char; 2]; 4] = [['E', 'I'], ['N', 'S'], ['F', 'T'], ['J', 'P']];

/// Keywords naming a value outright
const VALUE_KEYWORDS: &[(&str, Dimension)] = &[
    ("family", Family),
    ("children", Family),
    ("kids", Family),
    ("career", Career),
    ("ambition", Career),
    ("success", Career),
    ("achievement", Career),
    ("adventure", Adventure),
    ("travel", Adventure),
    ("exploration", Adventure),
    ("security", Security),
    ("stability", Security),
    ("safety", Security),
    ("financial", Security),
    ("creativity", Creativity),
    ("art", Creativity),
    ("innovation", Creativity),
    ("helping", Helping),
    ("kindness", Helping),
    ("compassion", Helping),
    ("community", Helping),
    ("service", Helping),
    ("independence", Independence),
    ("freedom", Independence),
    ("autonomy", Independence),
    ("spirituality", Spirituality),
    ("faith", Spirituality),
    ("religion", Spirituality),
];

/// Interest keywords and the value they hint at
const INTEREST_KEYWORDS: &[(&str, Dimension)] = &[
    ("hik", Adventure),
    ("travel", Adventure),
    ("climb", Adventure),
    ("camp", Adventure),
    ("surf", Adventure),
    ("ski", Adventure),
    ("backpack", Adventure),
    ("paint", Creativity),
    ("music", Creativity),
    ("writ", Creativity),
    ("photo", Creativity),
    ("design", Creativity),
    ("danc", Creativity),
    ("theat", Creativity),
    ("volunteer", Helping),
    ("charity", Helping),
    ("mentor", Helping),
    ("teach", Helping),
    ("rescue", Helping),
    ("meditat", Spirituality),
    ("yoga", Spirituality),
    ("church", Spirituality),
    ("temple", Spirituality),
    ("startup", Career),
    ("business", Career),
    ("entrepreneur", Career),
    ("invest", Security),
    ("saving", Security),
    ("budget", Security),
    ("cook", Family),
    ("garden", Family),
    ("bak", Family),
    ("solo", Independence),
];

/// Result of mapping one profile
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileMapping {
    pub vector: PersonalityVector,
    /// Names of the combination rules that fired, in table order
    pub fired_rules: Vec<&'static str>,
}

/// Lookup-table mapper from questionnaire answers to a personality vector
#[derive(Debug, Clone, Default)]
pub struct ProfileMapper {
    config: ProfileMapperConfig,
}

impl ProfileMapper {
    pub fn new(config: ProfileMapperConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProfileMapperConfig {
        &self.config
    }

    /// Map a profile to a fresh vector owned by `profile.id`.
    pub fn map(&self, profile: &ProfileInput) -> ProfileMapping {
        let mut seeds: BTreeMap<Dimension, f64> = BTreeMap::new();
        let mut confidence: BTreeMap<TraitGroup, f64> = BTreeMap::new();

        if let Some(mbti) = profile.mbti_type.as_deref() {
            match parse_mbti(mbti) {
                Some(letter_seeds) => {
                    for (dim, value) in letter_seeds {
                        seeds.insert(dim, value);
                        raise(&mut confidence, dim.group(), self.config.mbti_confidence);
                    }
                }
                None => tracing::warn!(
                    profile = %profile.id,
                    mbti = %mbti,
                    "unrecognized MBTI type, ignoring"
                ),
            }
        }

        if let Some(big_five) = &profile.big_five {
            let percentiles = [
                (Openness, big_five.openness),
                (Conscientiousness, big_five.conscientiousness),
                (Extraversion, big_five.extraversion),
                (Agreeableness, big_five.agreeableness),
                (Neuroticism, big_five.neuroticism),
            ];
            if percentiles.iter().all(|(_, p)| p.is_finite()) {
                for (dim, p) in percentiles {
                    seeds.insert(dim, (p / 100.0).clamp(0.0, 1.0));
                }
                confidence.insert(TraitGroup::BigFive, self.config.big_five_confidence);
            } else {
                tracing::warn!(profile = %profile.id, "non-finite Big Five scores, ignoring");
            }
        }

        if let Some(lifestyle) = &profile.lifestyle {
            self.apply_lifestyle(lifestyle, &mut seeds, &mut confidence);
        }

        if self.apply_keywords(profile, &mut seeds) {
            raise(&mut confidence, TraitGroup::Values, self.config.keyword_confidence);
        }

        let mut vector = PersonalityVector::create_default(profile.id.clone());
        vector.update_dimensions(&seeds);

        let mut fired_rules = Vec::new();
        if confidence.contains_key(&TraitGroup::BigFive) {
            let outcome = evaluate_rules(&vector, COMBINATION_RULES);
            if !outcome.fired.is_empty() {
                for group in outcome.groups() {
                    raise(&mut confidence, group, self.config.derived_confidence);
                }
                vector.update_dimensions(&outcome.patch);
                fired_rules = outcome.fired;
            }
        }

        for (group, c) in confidence {
            vector.set_confidence(group, c);
        }

        tracing::debug!(
            profile = %profile.id,
            completeness = vector.completeness(),
            rules = fired_rules.len(),
            "mapped profile to personality vector"
        );

        ProfileMapping { vector, fired_rules }
    }

    fn apply_lifestyle(
        &self,
        lifestyle: &LifestyleInput,
        seeds: &mut BTreeMap<Dimension, f64>,
        confidence: &mut BTreeMap<TraitGroup, f64>,
    ) {
        if let Some(activity) = lifestyle.activity_level.filter(|a| a.is_finite()) {
            let current = seeds.get(&Adventure).copied().unwrap_or(0.5);
            seeds.insert(Adventure, (current + (activity / 100.0).clamp(0.0, 1.0)) / 2.0);
        }

        // Social frequency only stands in for extraversion when nothing
        // stronger described it.
        if let Some(per_week) = lifestyle.social_frequency.filter(|f| f.is_finite()) {
            if !seeds.contains_key(&Extraversion) {
                seeds.insert(Extraversion, (per_week / 7.0).clamp(0.0, 1.0));
                raise(confidence, TraitGroup::BigFive, self.config.lifestyle_confidence);
            }
        }

        match lifestyle.wants_children {
            Some(true) => {
                let family = seeds.get(&Family).copied().unwrap_or(0.5);
                seeds.insert(Family, family.max(0.8));
            }
            Some(false) => {
                let family = seeds.get(&Family).copied().unwrap_or(0.5);
                seeds.insert(Family, family.min(0.3));
            }
            None => {}
        }
    }

    /// Returns whether any keyword matched.
    fn apply_keywords(&self, profile: &ProfileInput, seeds: &mut BTreeMap<Dimension, f64>) -> bool {
        let stated: Vec<Dimension> = profile
            .values
            .iter()
            .filter_map(|v| match_keyword(v, VALUE_KEYWORDS))
            .collect();

        let mut matched = false;
        if !stated.is_empty() {
            for &dim in TraitGroup::Values.dimensions() {
                let level = if stated.contains(&dim) {
                    self.config.stated_value_level
                } else {
                    self.config.unstated_value_level
                };
                seeds.entry(dim).or_insert(level);
            }
            matched = true;
        }

        for interest in &profile.interests {
            match match_keyword(interest, INTEREST_KEYWORDS) {
                Some(dim) => {
                    let current = seeds.get(&dim).copied().unwrap_or(0.5);
                    let boosted = (current + self.config.interest_boost).min(self.config.interest_cap);
                    seeds.insert(dim, boosted.max(current));
                    matched = true;
                }
                None => tracing::debug!(interest = %interest, "interest matched no keyword"),
            }
        }

        matched
    }
}

fn raise(confidence: &mut BTreeMap<TraitGroup, f64>, group: TraitGroup, c: f64) {
    let entry = confidence.entry(group).or_insert(0.0);
    if c > *entry {
        *entry = c;
    }
}

fn match_keyword(text: &str, table: &[(&str, Dimension)]) -> Option<Dimension> {
    let lower = text.to_lowercase();
    lower.split(|c: char| !c.is_alphanumeric()).find_map(|word| {
        table
            .iter()
            .find(|(keyword, _)| word.starts_with(keyword))
            .map(|(_, dim)| *dim)
    })
}

/// Parse `ENFP`, `infj-t` and the like into dimension seeds.
fn parse_mbti(raw: &str) -> Option<Vec<(Dimension, f64)>> {
    let upper = raw.trim().to_uppercase();
    let (letters, identity) = match upper.split_once('-') {
        Some((letters, suffix)) => (letters, suffix.chars().next()),
        None => (upper.as_str(), None),
    };

    let chars: Vec<char> = letters.chars().collect();
    if chars.len() != 4 {
        return None;
    }

    let mut seeds = Vec::new();
    for (letter, axis) in chars.iter().zip(MBTI_AXES) {
        if !axis.contains(letter) {
            return None;
        }
        let (_, patch) = MBTI_LETTERS.iter().find(|(l, _)| l == letter)?;
        seeds.extend_from_slice(patch);
    }

    if let Some(suffix) = identity {
        let (_, neuroticism) = MBTI_IDENTITY.iter().find(|(s, _)| *s == suffix)?;
        seeds.push((Neuroticism, *neuroticism));
    }

    Some(seeds)
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony_core::BigFiveInput;

    fn profile() -> ProfileInput {
        ProfileInput::new("u1", "Avery", 31)
    }

    #[test]
    fn test_empty_profile_stays_neutral() {
        let mapping = ProfileMapper::default().map(&profile());
        let v = &mapping.vector;
        assert!(Dimension::all().all(|d| v.get(d) == 0.5));
        assert!(TraitGroup::ALL.iter().all(|g| v.confidence(*g) == 0.0));
        assert!(mapping.fired_rules.is_empty());
    }

    #[test]
    fn test_mbti_letters() {
        let mut p = profile();
        p.mbti_type = Some("enfp-t".to_string());
        let v = ProfileMapper::default().map(&p).vector;

        assert_eq!(v.get(Extraversion), 0.75);
        assert_eq!(v.get(Openness), 0.75);
        assert_eq!(v.get(Agreeableness), 0.7);
        assert_eq!(v.get(Conscientiousness), 0.4);
        assert_eq!(v.get(Neuroticism), 0.65);
        assert_eq!(v.get(Directness), 0.4);
        assert_eq!(v.confidence(TraitGroup::BigFive), 0.7);
        assert_eq!(v.confidence(TraitGroup::Communication), 0.7);
    }

    #[test]
    fn test_invalid_mbti_is_ignored() {
        for bad in ["XNFP", "ENF", "ENFPX", "ENFP-Q", ""] {
            assert!(parse_mbti(bad).is_none(), "{bad} should not parse");
        }
        let mut p = profile();
        p.mbti_type = Some("ABCD".to_string());
        let v = ProfileMapper::default().map(&p).vector;
        assert_eq!(v.confidence(TraitGroup::BigFive), 0.0);
    }

    #[test]
    fn test_big_five_overrides_mbti_and_fires_rules() {
        let mut p = profile();
        p.mbti_type = Some("ISTJ".to_string());
        p.big_five = Some(BigFiveInput {
            openness: 70.0,
            conscientiousness: 50.0,
            extraversion: 70.0,
            agreeableness: 80.0,
            neuroticism: 20.0,
        });
        let mapping = ProfileMapper::default().map(&p);
        let v = &mapping.vector;

        assert_eq!(v.get(Extraversion), 0.7);
        assert_eq!(v.confidence(TraitGroup::BigFive), 0.9);
        assert_eq!(
            mapping.fired_rules,
            vec!["stable_agreeable", "warm_expressive", "calm_listener", "reflective"]
        );
        assert_eq!(v.get(Secure), 0.75);
        assert_eq!(v.primary_style(TraitGroup::Attachment), Secure);
        assert_eq!(v.confidence(TraitGroup::Attachment), 0.55);
        // MBTI seeded communication at 0.7 confidence, rules do not lower it
        assert_eq!(v.confidence(TraitGroup::Communication), 0.7);
        assert_eq!(v.confidence(TraitGroup::EmotionalIntelligence), 0.55);
    }

    #[test]
    fn test_values_and_interests() {
        let mut p = profile();
        p.values = vec!["Family".to_string(), "financial stability".to_string()];
        p.interests = vec!["Rock climbing".to_string(), "knitting".to_string()];
        let v = ProfileMapper::default().map(&p).vector;

        assert_eq!(v.get(Family), 0.85);
        assert_eq!(v.get(Security), 0.85);
        assert!((v.get(Adventure) - 0.48).abs() < 1e-12);
        assert_eq!(v.get(Career), 0.4);
        assert_eq!(v.confidence(TraitGroup::Values), 0.6);
        assert_eq!(v.confidence(TraitGroup::BigFive), 0.0);
    }

    #[test]
    fn test_interest_boost_is_capped() {
        let mut p = profile();
        p.values = vec!["adventure".to_string()];
        p.interests = vec!["hiking".into(), "surfing".into(), "skiing".into()];
        let v = ProfileMapper::default().map(&p).vector;
        assert_eq!(v.get(Adventure), 0.95);
    }

    #[test]
    fn test_lifestyle() {
        let mut p = profile();
        p.lifestyle = Some(LifestyleInput {
            activity_level: Some(90.0),
            social_frequency: Some(7.0),
            wants_children: Some(false),
        });
        let v = ProfileMapper::default().map(&p).vector;
        assert!((v.get(Adventure) - 0.7).abs() < 1e-12);
        assert_eq!(v.get(Extraversion), 1.0);
        assert_eq!(v.get(Family), 0.3);
        assert_eq!(v.confidence(TraitGroup::BigFive), 0.3);
    }
}
