//! Personality combination rules.
//!
//! Each rule pairs a predicate over the Big Five with a patch of derived
//! attachment, communication and emotional-intelligence values. Predicates
//! are evaluated against the vector as it was before any rule ran; patches
//! are then applied in table order, so a later rule overrides an earlier one
//! on the dimensions they share.

use std::collections::BTreeMap;

use harmony_core::{Dimension, PersonalityVector, TraitGroup};

/// One `{predicate, patch}` entry
pub struct CombinationRule {
    pub name: &'static str,
    pub predicate: fn(&PersonalityVector) -> bool,
    pub patch: &'static [(Dimension, f64)],
}

impl std::fmt::Debug for CombinationRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CombinationRule")
            .field("name", &self.name)
            .field("patch", &self.patch)
            .finish()
    }
}

use Dimension::*;

pub const COMBINATION_RULES: &[CombinationRule] = &[
    CombinationRule {
        name: "stable_agreeable",
        predicate: |v| v.get(Neuroticism) < 0.4 && v.get(Agreeableness) > 0.55,
        patch: &[(Secure, 0.75), (Anxious, 0.3), (Avoidant, 0.3), (Disorganized, 0.2)],
    },
    CombinationRule {
        name: "preoccupied",
        predicate: |v| v.get(Neuroticism) > 0.6 && v.get(Extraversion) >= 0.5,
        patch: &[(Anxious, 0.7), (Secure, 0.45)],
    },
    CombinationRule {
        name: "self_reliant",
        predicate: |v| v.get(Extraversion) < 0.4 && v.get(Agreeableness) < 0.5,
        patch: &[(Avoidant, 0.7), (Secure, 0.4)],
    },
    CombinationRule {
        name: "fearful",
        predicate: |v| v.get(Neuroticism) > 0.65 && v.get(Extraversion) < 0.4,
        patch: &[(Disorganized, 0.6), (Avoidant, 0.6), (Secure, 0.3)],
    },
    CombinationRule {
        name: "warm_expressive",
        predicate: |v| v.get(Extraversion) > 0.6 && v.get(Agreeableness) > 0.6,
        patch: &[(EmotionalExpression, 0.75), (SocialSkills, 0.75), (Empathy, 0.7)],
    },
    CombinationRule {
        name: "direct_organized",
        predicate: |v| v.get(Conscientiousness) > 0.6 && v.get(Agreeableness) < 0.5,
        patch: &[(Directness, 0.75), (ConflictStyle, 0.7)],
    },
    CombinationRule {
        name: "calm_listener",
        predicate: |v| v.get(Neuroticism) < 0.4 && v.get(Agreeableness) > 0.6,
        patch: &[(ActiveListening, 0.75), (EmotionalRegulation, 0.75), (ConflictStyle, 0.35)],
    },
    CombinationRule {
        name: "reflective",
        predicate: |v| v.get(Openness) > 0.65,
        patch: &[(SelfAwareness, 0.7)],
    },
    CombinationRule {
        name: "reactive",
        predicate: |v| v.get(Neuroticism) > 0.65,
        patch: &[(EmotionalRegulation, 0.35)],
    },
];

/// Outcome of running a rule set
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RuleOutcome {
    pub fired: Vec<&'static str>,
    pub patch: BTreeMap<Dimension, f64>,
}

impl RuleOutcome {
    /// Groups touched by the combined patch
    pub fn groups(&self) -> Vec<TraitGroup> {
        let mut groups: Vec<TraitGroup> = self.patch.keys().map(|d| d.group()).collect();
        groups.sort();
        groups.dedup();
        groups
    }
}

/// Evaluate `rules` against `vector` and merge the patches of those that fire.
pub fn evaluate_rules(vector: &PersonalityVector, rules: &[CombinationRule]) -> RuleOutcome {
    let mut outcome = RuleOutcome::default();
    for rule in rules {
        if (rule.predicate)(vector) {
            outcome.fired.push(rule.name);
            for &(dim, value) in rule.patch {
                outcome.patch.insert(dim, value);
            }
        }
    }
    outcome
}
