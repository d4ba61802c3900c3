//! Reply classification for chat messages.
//!
//! Checks run in a fixed order so ambiguous replies resolve predictably:
//! quick replies, then negated or explicit pass phrases, then requests for
//! more detail, then affirmations about the candidate, then stated
//! preferences. Anything left over is free text.
//!
//! Preference keywords are whole words (plural `s` allowed) unless the table
//! entry ends in `*`, which marks an explicit stem. Like and pass replies
//! carry any preference signals found alongside them. An affirmation aimed at
//! a hypothetical partner ("I'd like someone calm") is a preference, not a
//! like.

use std::collections::BTreeMap;

use harmony_core::Dimension;
use serde::{Deserialize, Serialize};

use crate::harmony::FeedbackKind;

/// Quick replies offered with every follow-up question
pub const QUICK_REPLIES: [&str; 3] = ["Like", "Tell me more", "Pass"];

const NEGATIONS: &[&str] = &[
    "not", "no", "don't", "dont", "doesn't", "isn't", "never", "nah", "without", "less",
];

const PASS_PHRASES: &[&str] = &[
    "pass",
    "skip",
    "next",
    "nope",
    "not for me",
    "no thanks",
    "not interested",
    "not my type",
];

const MORE_PHRASES: &[&str] = &[
    "tell me more",
    "more about",
    "more info",
    "why",
    "explain",
    "details",
    "what makes",
];

const LIKE_WORDS: &[&str] = &[
    "like", "love", "yes", "yeah", "yep", "interested", "great", "cute", "sure", "match",
    "perfect", "into",
];

use Dimension::*;

/// Words that turn an affirmation into a stated preference
const PREFERENCE_CUES: &[&str] = &[
    "someone", "somebody", "person", "people", "partner", "prefer", "looking", "want",
    "hoping", "wish",
];

/// Preference keywords and the value they imply
const PREFERENCE_KEYWORDS: &[(&str, Dimension, f64)] = &[
    ("adventur*", Adventure, 0.85),
    ("outdoors", Adventure, 0.8),
    ("travel*", Adventure, 0.8),
    ("homebody", Adventure, 0.3),
    ("family", Family, 0.85),
    ("kids", Family, 0.85),
    ("ambitious", Career, 0.85),
    ("career", Career, 0.8),
    ("creative", Creativity, 0.85),
    ("artist", Creativity, 0.8),
    ("spiritual", Spirituality, 0.8),
    ("faith", Spirituality, 0.8),
    ("stable", Security, 0.8),
    ("independent", Independence, 0.8),
    ("kind", Helping, 0.8),
    ("caring", Empathy, 0.8),
    ("empath*", Empathy, 0.85),
    ("outgoing", Extraversion, 0.8),
    ("extrovert*", Extraversion, 0.8),
    ("introvert*", Extraversion, 0.3),
    ("quiet", Extraversion, 0.3),
    ("calm", EmotionalRegulation, 0.8),
    ("listener", ActiveListening, 0.85),
    ("honest", Directness, 0.8),
    ("honesty", Directness, 0.8),
    ("direct", Directness, 0.8),
];

/// Classified reply
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Classification {
    pub kind: FeedbackKind,
    /// Preference targets detected in free text
    pub signals: BTreeMap<Dimension, f64>,
}

impl Classification {
    fn of(kind: FeedbackKind) -> Self {
        Self {
            kind,
            signals: BTreeMap::new(),
        }
    }
}

/// Word-list reply classifier
#[derive(Debug, Clone, Copy, Default)]
pub struct ReplyClassifier;

impl ReplyClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn classify(&self, text: &str) -> Classification {
        let trimmed = text.trim();
        if trimmed.eq_ignore_ascii_case(QUICK_REPLIES[0]) {
            return Classification::of(FeedbackKind::Like);
        }
        if trimmed.eq_ignore_ascii_case(QUICK_REPLIES[1]) {
            return Classification::of(FeedbackKind::TellMeMore);
        }
        if trimmed.eq_ignore_ascii_case(QUICK_REPLIES[2]) {
            return Classification::of(FeedbackKind::Pass);
        }

        let words = tokenize(trimmed);
        let phrase = format!(" {} ", words.join(" "));
        let contains = |p: &str| phrase.contains(&format!(" {p} "));

        let signals = preference_signals(&words);
        let with = |kind| Classification {
            kind,
            signals: signals.clone(),
        };

        if PASS_PHRASES.iter().any(|p| contains(p)) || negated_affirmation(&words) {
            return with(FeedbackKind::Pass);
        }
        if MORE_PHRASES.iter().any(|p| contains(p)) {
            return Classification::of(FeedbackKind::TellMeMore);
        }

        let affirmed = words.iter().any(|w| LIKE_WORDS.contains(&w.as_str()));
        let hypothetical = words.iter().any(|w| PREFERENCE_CUES.contains(&w.as_str()));
        if affirmed && (signals.is_empty() || !hypothetical) {
            return with(FeedbackKind::Like);
        }
        with(FeedbackKind::FreeText)
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn keyword_matches(word: &str, keyword: &str) -> bool {
    match keyword.strip_suffix('*') {
        Some(stem) => word.starts_with(stem),
        None => word == keyword || word.strip_suffix('s') == Some(keyword),
    }
}

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word)
}

/// A like word directly preceded (within two words) by a negation.
fn negated_affirmation(words: &[String]) -> bool {
    words.iter().enumerate().any(|(i, w)| {
        LIKE_WORDS.contains(&w.as_str())
            && words[i.saturating_sub(2)..i].iter().any(|p| is_negation(p))
    })
}

/// Preference targets; a negation right before a keyword inverts it.
fn preference_signals(words: &[String]) -> BTreeMap<Dimension, f64> {
    let mut signals = BTreeMap::new();
    for (i, word) in words.iter().enumerate() {
        let Some(&(_, dim, value)) = PREFERENCE_KEYWORDS
            .iter()
            .find(|(keyword, _, _)| keyword_matches(word, keyword))
        else {
            continue;
        };
        let negated = i > 0 && is_negation(&words[i - 1]);
        signals.insert(dim, if negated { 1.0 - value } else { value });
    }
    signals
}
