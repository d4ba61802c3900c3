//! Chat messages emitted to the external chat UI.

use harmony_core::{CandidateRecord, MessageId, ProfileId, Timestamp};
use serde::{Deserialize, Serialize};

use crate::classifier::QUICK_REPLIES;
use crate::explanation::Assessment;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    ProfilePresentation,
    CompatibilityExplanation,
    FollowUpQuestion,
    Suggestion,
}

/// Sender of a message; the core only ever speaks as the assistant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    Ai,
}

/// Candidate card shown with a presentation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateData {
    pub id: ProfileId,
    pub name: String,
    pub age: u32,
    pub photos: Vec<String>,
    pub bio: String,
    pub interests: Vec<String>,
}

impl From<&CandidateRecord> for CandidateData {
    fn from(record: &CandidateRecord) -> Self {
        Self {
            id: record.id.clone(),
            name: record.name.clone(),
            age: record.age,
            photos: record.photos.clone(),
            bio: record.bio.clone(),
            interests: record.interests.clone(),
        }
    }
}

/// Compatibility badge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibilitySnippet {
    /// 0-100
    pub score: u8,
    pub confidence: f64,
    pub top_factor: Option<String>,
}

impl From<&Assessment> for CompatibilitySnippet {
    fn from(assessment: &Assessment) -> Self {
        Self {
            score: assessment.result.percent(),
            confidence: assessment.result.confidence,
            top_factor: assessment
                .explanation
                .top_factor()
                .map(|f| f.dimension.label().to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatMessage {
    pub id: String,
    pub from: Sender,
    /// ISO 8601
    pub timestamp: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_data: Option<CandidateData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compatibility: Option<CompatibilitySnippet>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quick_replies: Option<Vec<String>>,
}

impl ChatMessage {
    pub fn new(message_type: MessageType, text: impl Into<String>, at: Timestamp) -> Self {
        Self {
            id: MessageId::new().to_string(),
            from: Sender::Ai,
            timestamp: at.to_iso8601(),
            message_type,
            text: text.into(),
            candidate_data: None,
            compatibility: None,
            quick_replies: None,
        }
    }

    pub fn suggestion(text: impl Into<String>, at: Timestamp) -> Self {
        Self::new(MessageType::Suggestion, text, at)
    }

    pub fn with_candidate(mut self, candidate: &CandidateRecord) -> Self {
        self.candidate_data = Some(candidate.into());
        self
    }

    pub fn with_compatibility(mut self, assessment: &Assessment) -> Self {
        self.compatibility = Some(assessment.into());
        self
    }

    pub fn with_quick_replies(mut self) -> Self {
        self.quick_replies = Some(QUICK_REPLIES.iter().map(|r| r.to_string()).collect());
        self
    }
}
