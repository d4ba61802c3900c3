//! Structured profile and candidate records supplied by external collaborators.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;
use crate::types::ProfileId;
use crate::vector::PersonalityVector;

/// Profile questionnaire input used to initialize a session.
///
/// Only `id`, `name` and `age` are required; every trait section is optional
/// and falls back to neutral vector values when absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileInput {
    pub id: ProfileId,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub mbti_type: Option<String>,
    #[serde(default)]
    pub big_five: Option<BigFiveInput>,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub values: Vec<String>,
    #[serde(default)]
    pub lifestyle: Option<LifestyleInput>,
}

impl ProfileInput {
    pub fn new(id: impl Into<ProfileId>, name: impl Into<String>, age: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
            mbti_type: None,
            big_five: None,
            interests: Vec::new(),
            values: Vec::new(),
            lifestyle: None,
        }
    }
}

/// Big Five percentile scores on a 0-100 scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BigFiveInput {
    pub openness: f64,
    pub conscientiousness: f64,
    pub extraversion: f64,
    pub agreeableness: f64,
    pub neuroticism: f64,
}

/// Optional lifestyle answers
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LifestyleInput {
    /// Self-reported activity level, 0-100
    #[serde(default)]
    pub activity_level: Option<f64>,
    /// Preferred social outings per week
    #[serde(default)]
    pub social_frequency: Option<f64>,
    #[serde(default)]
    pub wants_children: Option<bool>,
}

/// Candidate profile as served by the candidate store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub id: ProfileId,
    pub name: String,
    pub age: u32,
    #[serde(default)]
    pub photos: Vec<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub interests: Vec<String>,
    #[serde(default)]
    pub personality_vector: Option<PersonalityVector>,
    #[serde(default)]
    pub raw_traits: Option<Value>,
}

impl CandidateRecord {
    pub fn new(id: impl Into<ProfileId>, name: impl Into<String>, age: u32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            age,
            photos: Vec::new(),
            bio: String::new(),
            interests: Vec::new(),
            personality_vector: None,
            raw_traits: None,
        }
    }

    pub fn with_vector(mut self, vector: PersonalityVector) -> Self {
        self.personality_vector = Some(vector);
        self
    }

    pub fn with_raw_traits(mut self, traits: Value) -> Self {
        self.raw_traits = Some(traits);
        self
    }

    /// Build the candidate's vector from a stored vector or raw traits.
    pub fn try_vector(&self) -> Result<PersonalityVector> {
        if let Some(vector) = &self.personality_vector {
            let mut vector = vector.clone();
            if vector.id() != &self.id {
                tracing::warn!(
                    candidate = %self.id,
                    vector_owner = %vector.id(),
                    "stored vector owner differs from candidate id"
                );
                vector.rebind(self.id.clone());
            }
            return Ok(vector);
        }

        let mut vector = PersonalityVector::create_default(self.id.clone());
        if let Some(traits) = &self.raw_traits {
            vector.load_partial(traits)?;
        }
        Ok(vector)
    }

    /// Like [`try_vector`](Self::try_vector) but malformed traits degrade to a
    /// neutral vector.
    pub fn vector(&self) -> PersonalityVector {
        self.try_vector().unwrap_or_else(|e| {
            tracing::warn!(candidate = %self.id, error = %e, "malformed traits, using neutral vector");
            PersonalityVector::create_default(self.id.clone())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vector::Dimension;
    use serde_json::json;

    #[test]
    fn test_profile_input_camel_case() {
        let profile: ProfileInput = serde_json::from_value(json!({
            "id": "u1",
            "name": "Avery",
            "age": 31,
            "mbtiType": "ENFP",
            "bigFive": {
                "openness": 80.0, "conscientiousness": 40.0, "extraversion": 70.0,
                "agreeableness": 65.0, "neuroticism": 30.0
            },
            "interests": ["hiking"]
        }))
        .unwrap();

        assert_eq!(profile.mbti_type.as_deref(), Some("ENFP"));
        assert_eq!(profile.big_five.unwrap().openness, 80.0);
        assert!(profile.values.is_empty());
        assert!(profile.lifestyle.is_none());
    }

    #[test]
    fn test_candidate_raw_traits() {
        let candidate = CandidateRecord::new("c1", "Blake", 29)
            .with_raw_traits(json!({ "values": { "family": 0.9 } }));
        let v = candidate.vector();
        assert_eq!(v.id().as_str(), "c1");
        assert_eq!(v.get(Dimension::Family), 0.9);
    }

    #[test]
    fn test_candidate_malformed_traits_degrade_to_neutral() {
        let candidate = CandidateRecord::new("c2", "Casey", 35)
            .with_raw_traits(json!({ "openness": "very" }));
        assert!(candidate.try_vector().is_err());

        let v = candidate.vector();
        assert_eq!(v.get(Dimension::Openness), 0.5);
        assert_eq!(v.version(), 0);
    }

    #[test]
    fn test_candidate_vector_rebound_to_record_id() {
        let candidate = CandidateRecord::new("c3", "Devon", 40)
            .with_vector(PersonalityVector::create_default("someone-else"));
        assert_eq!(candidate.vector().id().as_str(), "c3");
    }
}
