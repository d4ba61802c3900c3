//! Recommendation session orchestrator.
//!
//! One orchestrator drives one user's session through
//! `Uninitialized -> Profiling -> Presenting -> AwaitingResponse ->
//! {Presenting | Refining} -> SessionEnded`. It owns the conversation state
//! and is the only writer to it; callers serialize access per user.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use harmony_core::{
    CandidateRecord, Error, PersonalityVector, ProfileId, ProfileInput, Result, TraitGroup,
    VectorSummary,
};
use harmony_scoring::{AttachmentStyle, ProfileMapper};
use serde::{Deserialize, Serialize};

use crate::agent::{
    explain_with_fallback, AgentConfig, Explainer, ExplanationDepth, ExplanationRequest,
    TemplateExplainer,
};
use crate::classifier::ReplyClassifier;
use crate::explanation::{Assessment, KeyFactor};
use crate::harmony::{FeedbackEvent, FeedbackKind, HarmonyLayer, LearningUpdate};
use crate::messages::{CandidateData, ChatMessage, CompatibilitySnippet, MessageType};
use crate::store::CandidateStore;

/// Factors shown with each presentation
const BRIEF_FACTORS: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    Uninitialized,
    Profiling,
    Presenting,
    AwaitingResponse,
    Refining,
    SessionEnded,
}

/// Session behaviour settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Candidates previewed in the initialize response
    pub initial_batch: usize,
    /// Emit a follow-up question with quick replies after each presentation
    pub follow_up_questions: bool,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            initial_batch: 3,
            follow_up_questions: true,
        }
    }
}

/// Everything the session knows about the conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    pub user_id: ProfileId,
    pub user_name: String,
    pub user_vector: PersonalityVector,
    pub phase: SessionPhase,
    /// Not-yet-presented candidates, best first
    pub candidate_queue: Vec<ProfileId>,
    pub seen_ids: BTreeSet<ProfileId>,
    pub liked_ids: Vec<ProfileId>,
    pub passed_ids: Vec<ProfileId>,
    pub current_candidate_id: Option<ProfileId>,
    pub message_history: Vec<ChatMessage>,
    pub accumulated_learning: Vec<LearningUpdate>,
}

impl ConversationState {
    fn new(profile: &ProfileInput, user_vector: PersonalityVector) -> Self {
        Self {
            user_id: profile.id.clone(),
            user_name: profile.name.clone(),
            user_vector,
            phase: SessionPhase::Profiling,
            candidate_queue: Vec::new(),
            seen_ids: BTreeSet::new(),
            liked_ids: Vec::new(),
            passed_ids: Vec::new(),
            current_candidate_id: None,
            message_history: Vec::new(),
            accumulated_learning: Vec::new(),
        }
    }

    /// Whether feedback on `id` refers to a presented candidate
    pub fn knows(&self, id: &ProfileId) -> bool {
        self.current_candidate_id.as_ref() == Some(id) || self.seen_ids.contains(id)
    }
}

/// Candidate preview returned by [`RecommendationOrchestrator::initialize`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidatePreview {
    pub candidate: CandidateData,
    pub compatibility: CompatibilitySnippet,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeResponse {
    pub profile_completeness: f64,
    pub welcome_message: ChatMessage,
    pub initial_recommendations: Vec<CandidatePreview>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRefresh {
    pub queued: usize,
    /// Set only when the pool is exhausted
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageResponse {
    pub messages: Vec<ChatMessage>,
    /// Whether a different candidate is now being presented
    pub candidate_update: bool,
    pub learning_update: Option<LearningUpdate>,
}

/// Direct feedback on a match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Feedback {
    pub liked: bool,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackResponse {
    pub learning_update: LearningUpdate,
    pub message: ChatMessage,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchExplanation {
    /// 0-100
    pub compatibility_score: u8,
    pub confidence: f64,
    pub key_factors: Vec<KeyFactor>,
    pub detailed_explanation: String,
    pub suggestions: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSummary {
    pub user_id: ProfileId,
    pub presented: usize,
    pub liked: usize,
    pub passed: usize,
    pub learning_updates: usize,
    pub final_vector: VectorSummary,
    pub ended_at: String,
}

/// Stateful recommendation session for one user
pub struct RecommendationOrchestrator {
    harmony: Arc<HarmonyLayer>,
    store: Arc<dyn CandidateStore>,
    explainer: Arc<dyn Explainer>,
    explainer_config: AgentConfig,
    mapper: ProfileMapper,
    classifier: ReplyClassifier,
    config: OrchestratorConfig,
    state: Option<ConversationState>,
    records: BTreeMap<ProfileId, CandidateRecord>,
    vectors: BTreeMap<ProfileId, PersonalityVector>,
}

impl RecommendationOrchestrator {
    pub fn new(harmony: Arc<HarmonyLayer>, store: Arc<dyn CandidateStore>) -> Self {
        Self {
            harmony,
            store,
            explainer: Arc::new(TemplateExplainer),
            explainer_config: AgentConfig::default(),
            mapper: ProfileMapper::default(),
            classifier: ReplyClassifier::new(),
            config: OrchestratorConfig::default(),
            state: None,
            records: BTreeMap::new(),
            vectors: BTreeMap::new(),
        }
    }

    pub fn with_explainer(mut self, explainer: Arc<dyn Explainer>, config: AgentConfig) -> Self {
        self.explainer = explainer;
        self.explainer_config = config;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_mapper(mut self, mapper: ProfileMapper) -> Self {
        self.mapper = mapper;
        self
    }

    pub fn phase(&self) -> SessionPhase {
        self.state
            .as_ref()
            .map(|s| s.phase)
            .unwrap_or(SessionPhase::Uninitialized)
    }

    pub fn state(&self) -> Option<&ConversationState> {
        self.state.as_ref()
    }

    /// Map the profile, rank the store and start the session.
    pub async fn initialize(&mut self, profile: ProfileInput) -> Result<InitializeResponse> {
        if self.phase() == SessionPhase::SessionEnded {
            return Err(Error::SessionEnded);
        }

        let mapping = self.mapper.map(&profile);
        tracing::info!(
            user = %profile.id,
            completeness = mapping.vector.completeness(),
            rules = ?mapping.fired_rules,
            "initializing recommendation session"
        );
        // A restart must not see assessments of the previous answers.
        let purged = self.harmony.invalidate(&profile.id);
        if purged > 0 {
            tracing::debug!(user = %profile.id, purged, "dropped assessments of previous session");
        }
        self.records.clear();
        self.vectors.clear();
        self.state = Some(ConversationState::new(&profile, mapping.vector));

        let refresh = self.refresh_queue().await?;

        let state = self.state_ref()?;
        let completeness = state.user_vector.completeness();
        let welcome_text = welcome_text(&state.user_name, &state.user_vector, refresh.queued);
        let queue: Vec<ProfileId> = state
            .candidate_queue
            .iter()
            .take(self.config.initial_batch)
            .cloned()
            .collect();

        let welcome_message = ChatMessage::suggestion(welcome_text, self.harmony.now());
        let mut initial_recommendations = Vec::new();
        for id in &queue {
            if let Some(preview) = self.preview(id) {
                initial_recommendations.push(preview);
            }
        }

        let state = self.state_mut()?;
        state.message_history.insert(0, welcome_message.clone());
        if refresh.queued > 0 {
            state.phase = SessionPhase::Presenting;
        }

        Ok(InitializeResponse {
            profile_completeness: completeness,
            welcome_message,
            initial_recommendations,
        })
    }

    /// Re-rank every candidate not yet seen and rebuild the queue.
    pub async fn refresh_queue(&mut self) -> Result<QueueRefresh> {
        self.active()?;

        match self.store.load_candidates().await {
            Ok(records) => self.reload(records),
            Err(e) => tracing::warn!(
                error = %e,
                cached = self.records.len(),
                "candidate store unavailable, ranking cached candidates"
            ),
        }

        let harmony = Arc::clone(&self.harmony);
        let state = self.state_ref()?;
        let user = state.user_vector.clone();
        let unseen: Vec<PersonalityVector> = self
            .vectors
            .values()
            .filter(|v| v.id() != &state.user_id && !state.seen_ids.contains(v.id()))
            .cloned()
            .collect();

        // Ranking fans out over rayon; keep it off the async workers.
        let ranker = Arc::clone(&harmony);
        let ranked = tokio::task::spawn_blocking(move || ranker.rank(&user, &unseen))
            .await
            .map_err(|e| Error::Compute(format!("ranking task failed: {e}")))?;

        let state = self.state_mut()?;
        state.candidate_queue = ranked.into_iter().map(|r| r.id).collect();
        let queued = state.candidate_queue.len();
        tracing::debug!(user = %state.user_id, queued, "refreshed candidate queue");

        let mut messages = Vec::new();
        if queued == 0 && state.current_candidate_id.is_none() {
            let msg = ChatMessage::suggestion(
                "You've seen everyone who is available right now. Try telling me more about \
                 what you're looking for, or check back later for new people.",
                harmony.now(),
            );
            state.message_history.push(msg.clone());
            messages.push(msg);
            state.phase = SessionPhase::AwaitingResponse;
        } else if state.current_candidate_id.is_none() && state.phase != SessionPhase::Profiling {
            state.phase = SessionPhase::Presenting;
        }

        Ok(QueueRefresh { queued, messages })
    }

    /// Present the current candidate, advancing the queue if nobody is shown.
    pub async fn present_current(&mut self) -> Result<Vec<ChatMessage>> {
        self.active()?;

        if self.state_ref()?.current_candidate_id.is_none() {
            if self.state_ref()?.candidate_queue.is_empty() {
                let refresh = self.refresh_queue().await?;
                if refresh.queued == 0 {
                    return Ok(refresh.messages);
                }
            }
            let state = self.state_mut()?;
            let next = state.candidate_queue.remove(0);
            state.seen_ids.insert(next.clone());
            state.current_candidate_id = Some(next);
        }

        let current = self
            .state_ref()?
            .current_candidate_id
            .clone()
            .ok_or(Error::NotInitialized)?;
        let messages = self.presentation(&current).await?;

        let state = self.state_mut()?;
        state.message_history.extend(messages.iter().cloned());
        state.phase = SessionPhase::AwaitingResponse;
        Ok(messages)
    }

    /// Interpret a chat reply and act on it.
    pub async fn process_message(&mut self, text: &str) -> Result<MessageResponse> {
        self.active()?;
        let classification = self.classifier.classify(text);
        let current = self.state_ref()?.current_candidate_id.clone();
        tracing::debug!(kind = ?classification.kind, "classified reply");

        match (classification.kind, current) {
            (FeedbackKind::Like | FeedbackKind::Pass, Some(current)) => {
                let update = self.apply_feedback(&current, classification.kind)?;
                self.apply_signals(&classification.signals)?;
                let ack = ChatMessage::suggestion(
                    acknowledgement(classification.kind, self.candidate_name(&current)),
                    self.harmony.now(),
                );
                self.state_mut()?.message_history.push(ack.clone());

                let mut messages = vec![ack];
                messages.extend(self.present_current().await?);
                Ok(MessageResponse {
                    candidate_update: self.state_ref()?.current_candidate_id.is_some(),
                    messages,
                    learning_update: Some(update),
                })
            }
            (FeedbackKind::TellMeMore, Some(current)) => {
                let assessment = self.assessment(&current)?;
                let request = self.explanation_request(
                    &current,
                    &assessment,
                    ExplanationDepth::Detailed,
                    assessment.explanation.key_factors.clone(),
                )?;
                let text =
                    explain_with_fallback(&*self.explainer, &request, &self.explainer_config).await;
                let now = self.harmony.now();
                let mut messages = vec![
                    ChatMessage::new(MessageType::CompatibilityExplanation, text.text, now)
                        .with_compatibility(&assessment),
                ];
                if let Some(suggestion) = assessment.explanation.suggestions.first() {
                    messages.push(
                        ChatMessage::suggestion(format!("A good place to start: {suggestion}"), now)
                            .with_quick_replies(),
                    );
                }
                let state = self.state_mut()?;
                state.message_history.extend(messages.iter().cloned());
                state.phase = SessionPhase::AwaitingResponse;
                Ok(MessageResponse {
                    messages,
                    candidate_update: false,
                    learning_update: None,
                })
            }
            (FeedbackKind::FreeText, _) if !classification.signals.is_empty() => {
                self.state_mut()?.phase = SessionPhase::Refining;
                let update = self
                    .apply_signals(&classification.signals)?
                    .ok_or_else(|| Error::Compute("no preference signals".to_string()))?;

                let refresh = self.refresh_queue().await?;
                let text = format!(
                    "Got it. I'll weigh {} more when picking people for you.",
                    describe_signals(&classification.signals)
                );
                let msg = ChatMessage::suggestion(text, self.harmony.now());
                let state = self.state_mut()?;
                state.message_history.push(msg.clone());
                if state.current_candidate_id.is_some() {
                    state.phase = SessionPhase::AwaitingResponse;
                }
                let mut messages = vec![msg];
                messages.extend(refresh.messages);
                Ok(MessageResponse {
                    messages,
                    candidate_update: false,
                    learning_update: Some(update),
                })
            }
            (kind, current) => {
                let text = if current.is_none() && kind != FeedbackKind::FreeText {
                    "There's nobody on screen right now. Tell me what you're looking for and \
                     I'll find someone."
                } else {
                    "I didn't quite catch that. You can reply Like, Tell me more or Pass."
                };
                let mut msg = ChatMessage::suggestion(text, self.harmony.now());
                if current.is_some() {
                    msg = msg.with_quick_replies();
                }
                self.state_mut()?.message_history.push(msg.clone());
                Ok(MessageResponse {
                    messages: vec![msg],
                    candidate_update: false,
                    learning_update: None,
                })
            }
        }
    }

    /// Record explicit feedback on a presented candidate.
    ///
    /// An id that was never presented yields [`Error::UnknownMatch`] and leaves
    /// the conversation state untouched.
    pub async fn provide_feedback(
        &mut self,
        match_id: &ProfileId,
        feedback: Feedback,
    ) -> Result<FeedbackResponse> {
        let state = self.active()?;
        if !state.knows(match_id) || !self.vectors.contains_key(match_id) {
            return Err(Error::UnknownMatch(match_id.to_string()));
        }

        let kind = if feedback.liked {
            FeedbackKind::Like
        } else {
            FeedbackKind::Pass
        };
        let learning_update = self.apply_feedback(match_id, kind)?;

        if let Some(text) = feedback.text.as_deref() {
            let signals = self.classifier.classify(text).signals;
            self.apply_signals(&signals)?;
        }

        let message = ChatMessage::suggestion(
            acknowledgement(kind, self.candidate_name(match_id)),
            self.harmony.now(),
        );
        self.state_mut()?.message_history.push(message.clone());

        Ok(FeedbackResponse {
            learning_update,
            message,
        })
    }

    /// Full explanation of the user's compatibility with `match_id`.
    pub async fn explain_match(&self, match_id: &ProfileId) -> Result<MatchExplanation> {
        let state = self.active()?;

        let vector = match self.vectors.get(match_id) {
            Some(v) => v.clone(),
            None => self
                .store
                .get_candidate(match_id)
                .await?
                .map(|r| r.vector())
                .ok_or_else(|| Error::UnknownMatch(match_id.to_string()))?,
        };
        if vector.id() == &state.user_id {
            return Err(Error::UnknownMatch(match_id.to_string()));
        }

        let assessment = self.harmony.calculate(&state.user_vector, &vector);
        let request = ExplanationRequest {
            user_name: state.user_name.clone(),
            candidate_name: self.candidate_name(match_id),
            overall_percent: assessment.result.percent(),
            factors: assessment.explanation.key_factors.clone(),
            depth: ExplanationDepth::Detailed,
        };
        let text = explain_with_fallback(&*self.explainer, &request, &self.explainer_config).await;

        Ok(MatchExplanation {
            compatibility_score: assessment.result.percent(),
            confidence: assessment.result.confidence,
            key_factors: assessment.explanation.key_factors.clone(),
            detailed_explanation: text.text,
            suggestions: assessment.explanation.suggestions.clone(),
        })
    }

    /// Close the session. Every later call fails with [`Error::SessionEnded`].
    pub async fn end_session(&mut self) -> Result<SessionSummary> {
        let user = self.active()?.user_id.clone();
        self.harmony.release_user(&user);
        let ended_at = self.harmony.now().to_iso8601();
        let state = self.state_mut()?;
        state.phase = SessionPhase::SessionEnded;

        let summary = SessionSummary {
            user_id: state.user_id.clone(),
            presented: state.seen_ids.len(),
            liked: state.liked_ids.len(),
            passed: state.passed_ids.len(),
            learning_updates: state.accumulated_learning.len(),
            final_vector: state.user_vector.summary(),
            ended_at,
        };
        tracing::info!(
            user = %summary.user_id,
            presented = summary.presented,
            liked = summary.liked,
            passed = summary.passed,
            "session ended"
        );
        Ok(summary)
    }

    /// Swap in freshly loaded records, rebuilding only vectors whose record
    /// changed and dropping cached assessments of changed or removed ones.
    fn reload(&mut self, records: Vec<CandidateRecord>) {
        let mut old_records = std::mem::take(&mut self.records);
        let mut old_vectors = std::mem::take(&mut self.vectors);

        for record in records {
            let previous = old_records.remove(&record.id);
            let kept = old_vectors.remove(&record.id);
            let vector = match (previous, kept) {
                (Some(previous), Some(vector)) if previous == record => vector,
                (previous, _) => {
                    if previous.is_some() {
                        let purged = self.harmony.invalidate(&record.id);
                        tracing::debug!(candidate = %record.id, purged, "candidate record changed");
                    }
                    record.vector()
                }
            };
            self.vectors.insert(record.id.clone(), vector);
            self.records.insert(record.id.clone(), record);
        }

        for id in old_records.keys() {
            self.harmony.invalidate(id);
        }
    }

    fn active(&self) -> Result<&ConversationState> {
        match &self.state {
            None => Err(Error::NotInitialized),
            Some(s) if s.phase == SessionPhase::SessionEnded => Err(Error::SessionEnded),
            Some(s) => Ok(s),
        }
    }

    fn state_ref(&self) -> Result<&ConversationState> {
        self.state.as_ref().ok_or(Error::NotInitialized)
    }

    fn state_mut(&mut self) -> Result<&mut ConversationState> {
        self.state.as_mut().ok_or(Error::NotInitialized)
    }

    fn candidate_name(&self, id: &ProfileId) -> String {
        self.records
            .get(id)
            .map(|r| r.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    fn assessment(&self, id: &ProfileId) -> Result<Arc<Assessment>> {
        let state = self.state_ref()?;
        let vector = self
            .vectors
            .get(id)
            .ok_or_else(|| Error::UnknownMatch(id.to_string()))?;
        Ok(self.harmony.calculate(&state.user_vector, vector))
    }

    fn preview(&self, id: &ProfileId) -> Option<CandidatePreview> {
        let record = self.records.get(id)?;
        let assessment = self.assessment(id).ok()?;
        Some(CandidatePreview {
            candidate: CandidateData::from(record),
            compatibility: CompatibilitySnippet::from(&*assessment),
        })
    }

    fn explanation_request(
        &self,
        id: &ProfileId,
        assessment: &Assessment,
        depth: ExplanationDepth,
        factors: Vec<KeyFactor>,
    ) -> Result<ExplanationRequest> {
        Ok(ExplanationRequest {
            user_name: self.state_ref()?.user_name.clone(),
            candidate_name: self.candidate_name(id),
            overall_percent: assessment.result.percent(),
            factors,
            depth,
        })
    }

    async fn presentation(&self, id: &ProfileId) -> Result<Vec<ChatMessage>> {
        let record = self
            .records
            .get(id)
            .ok_or_else(|| Error::UnknownMatch(id.to_string()))?;
        let assessment = self.assessment(id)?;
        let now = self.harmony.now();

        let mut messages = vec![ChatMessage::new(
            MessageType::ProfilePresentation,
            format!(
                "Meet {}, {}. {}",
                record.name, record.age, assessment.explanation.headline
            ),
            now,
        )
        .with_candidate(record)
        .with_compatibility(&assessment)];

        let factors = assessment
            .explanation
            .key_factors
            .iter()
            .take(BRIEF_FACTORS)
            .cloned()
            .collect();
        let request = self.explanation_request(id, &assessment, ExplanationDepth::Brief, factors)?;
        let text = explain_with_fallback(&*self.explainer, &request, &self.explainer_config).await;
        messages.push(
            ChatMessage::new(MessageType::CompatibilityExplanation, text.text, now)
                .with_compatibility(&assessment),
        );

        if self.config.follow_up_questions {
            messages.push(
                ChatMessage::new(
                    MessageType::FollowUpQuestion,
                    format!("What do you think of {}?", record.name),
                    now,
                )
                .with_quick_replies(),
            );
        }
        Ok(messages)
    }

    /// Nudge the user toward stated preferences, if any were detected.
    fn apply_signals(
        &mut self,
        signals: &BTreeMap<harmony_core::Dimension, f64>,
    ) -> Result<Option<LearningUpdate>> {
        if signals.is_empty() {
            return Ok(None);
        }
        let harmony = Arc::clone(&self.harmony);
        let state = self.state_mut()?;
        let update = harmony.apply_preferences(&mut state.user_vector, signals);
        state.accumulated_learning.push(update.clone());
        Ok(Some(update))
    }

    /// Learning step plus bookkeeping for like or pass on `match_id`.
    fn apply_feedback(&mut self, match_id: &ProfileId, kind: FeedbackKind) -> Result<LearningUpdate> {
        let event = FeedbackEvent {
            match_id: match_id.clone(),
            kind,
            text: None,
            timestamp: self.harmony.now(),
        };
        let candidate = self
            .vectors
            .get(&event.match_id)
            .ok_or_else(|| Error::UnknownMatch(event.match_id.to_string()))?;

        let state = self.state.as_mut().ok_or(Error::NotInitialized)?;
        let update = self
            .harmony
            .update_from_feedback(&mut state.user_vector, candidate, event.kind);

        let (add_to, remove_from) = match event.kind {
            FeedbackKind::Like => (&mut state.liked_ids, &mut state.passed_ids),
            _ => (&mut state.passed_ids, &mut state.liked_ids),
        };
        remove_from.retain(|id| id != &event.match_id);
        if !add_to.contains(&event.match_id) {
            add_to.push(event.match_id.clone());
        }

        if state.current_candidate_id.as_ref() == Some(&event.match_id) {
            state.current_candidate_id = None;
            state.phase = SessionPhase::Presenting;
        }
        state.accumulated_learning.push(update.clone());
        Ok(update)
    }
}

fn welcome_text(name: &str, vector: &PersonalityVector, queued: usize) -> String {
    let completeness = (vector.completeness() * 100.0).round();
    let mut text = format!("Welcome, {name}! Your profile is {completeness:.0}% complete.");
    if vector.is_observed(TraitGroup::Attachment) {
        text.push_str(&format!(
            " You come across as {} in relationships.",
            AttachmentStyle::of(vector).name().to_lowercase()
        ));
    }
    if queued > 0 {
        text.push_str(&format!(" I found {queued} people you might click with."));
    }
    text
}

fn acknowledgement(kind: FeedbackKind, name: String) -> String {
    match kind {
        FeedbackKind::Like => format!("Great, I've noted that you like {name}. I'll look for more people like them."),
        _ => format!("No problem, I'll move on from {name} and adjust what I show you."),
    }
}

fn describe_signals(signals: &BTreeMap<harmony_core::Dimension, f64>) -> String {
    let labels: Vec<String> = signals.keys().map(|d| d.label().to_lowercase()).collect();
    match labels.as_slice() {
        [] => "your preferences".to_string(),
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryCandidateStore;
    use harmony_core::{BigFiveInput, ErrorKind, FixedClock, Timestamp};
    use crate::harmony::LearningConfig;
    use serde_json::json;

    fn profile() -> ProfileInput {
        let mut p = ProfileInput::new("user", "Avery", 31);
        p.big_five = Some(BigFiveInput {
            openness: 70.0,
            conscientiousness: 60.0,
            extraversion: 65.0,
            agreeableness: 80.0,
            neuroticism: 25.0,
        });
        p.values = vec!["family".to_string(), "adventure".to_string()];
        p
    }

    fn candidate(id: &str, name: &str, family: f64, secure: f64) -> CandidateRecord {
        CandidateRecord::new(id, name, 30).with_raw_traits(json!({
            "values": { "family": family, "adventure": family },
            "attachment": { "secure": secure, "anxious": 1.0 - secure },
        }))
    }

    fn store() -> Arc<InMemoryCandidateStore> {
        Arc::new(InMemoryCandidateStore::with_candidates([
            candidate("c1", "Blake", 0.9, 0.9),
            candidate("c2", "Casey", 0.2, 0.2),
            candidate("c3", "Devon", 0.7, 0.8),
            CandidateRecord::new("user", "Avery", 31),
        ]))
    }

    fn orchestrator(store: Arc<InMemoryCandidateStore>) -> RecommendationOrchestrator {
        let harmony = Arc::new(HarmonyLayer::new(
            LearningConfig::default(),
            Arc::new(FixedClock(Timestamp::from_nanos(1_700_000_000_000_000_000))),
        ));
        RecommendationOrchestrator::new(harmony, store)
    }

    async fn started() -> RecommendationOrchestrator {
        let mut orch = orchestrator(store());
        orch.initialize(profile()).await.unwrap();
        orch
    }

    #[tokio::test]
    async fn test_operations_require_initialize() {
        let mut orch = orchestrator(store());
        assert_eq!(orch.phase(), SessionPhase::Uninitialized);
        assert_eq!(orch.present_current().await.unwrap_err(), Error::NotInitialized);
        assert_eq!(orch.process_message("Like").await.unwrap_err(), Error::NotInitialized);
        let err = orch
            .provide_feedback(&"c1".into(), Feedback { liked: true, text: None })
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StateError);
    }

    #[tokio::test]
    async fn test_initialize_ranks_store() {
        let mut orch = orchestrator(store());
        let response = orch.initialize(profile()).await.unwrap();

        assert_eq!(orch.phase(), SessionPhase::Presenting);
        assert!(response.profile_completeness >= 0.4);
        assert!(response.welcome_message.text.starts_with("Welcome, Avery!"));
        assert_eq!(response.initial_recommendations.len(), 3);

        let state = orch.state().unwrap();
        assert_eq!(state.candidate_queue.len(), 3);
        assert!(!state.candidate_queue.contains(&"user".into()));
        let previewed: Vec<_> = response
            .initial_recommendations
            .iter()
            .map(|p| p.candidate.id.clone())
            .collect();
        assert_eq!(previewed, state.candidate_queue);
        let scores: Vec<_> = response
            .initial_recommendations
            .iter()
            .map(|p| p.compatibility.score)
            .collect();
        assert!(scores.windows(2).all(|w| w[0] >= w[1]));
    }

    #[tokio::test]
    async fn test_present_current_message_sequence() {
        let mut orch = started().await;
        let first = orch.state().unwrap().candidate_queue[0].clone();
        let messages = orch.present_current().await.unwrap();
        let types: Vec<_> = messages.iter().map(|m| m.message_type).collect();
        assert_eq!(
            types,
            vec![
                MessageType::ProfilePresentation,
                MessageType::CompatibilityExplanation,
                MessageType::FollowUpQuestion
            ]
        );
        assert_eq!(messages[0].candidate_data.as_ref().unwrap().id, first);
        assert!(messages[0].compatibility.as_ref().unwrap().score <= 100);
        assert_eq!(messages[2].quick_replies.as_ref().unwrap().len(), 3);
        assert_eq!(orch.phase(), SessionPhase::AwaitingResponse);
        let state = orch.state().unwrap();
        assert_eq!(state.current_candidate_id, Some(first.clone()));
        assert!(state.seen_ids.contains(&first));
        assert!(!state.candidate_queue.contains(&first));
    }

    #[tokio::test]
    async fn test_like_learns_and_advances() {
        let mut orch = started().await;
        orch.present_current().await.unwrap();
        let first = orch.state().unwrap().current_candidate_id.clone().unwrap();
        let next = orch.state().unwrap().candidate_queue[0].clone();
        let version = orch.state().unwrap().user_vector.version();

        let response = orch.process_message("I really like them!").await.unwrap();
        assert!(response.candidate_update);
        let update = response.learning_update.unwrap();
        assert_eq!(update.kind, FeedbackKind::Like);
        assert!(!update.is_empty());

        let state = orch.state().unwrap();
        assert!(state.user_vector.version() > version);
        assert_eq!(state.liked_ids, vec![first]);
        assert_eq!(state.current_candidate_id, Some(next));
        assert!(response
            .messages
            .iter()
            .any(|m| m.message_type == MessageType::ProfilePresentation));
    }

    #[tokio::test]
    async fn test_like_with_preferences_records_both_updates() {
        let mut orch = started().await;
        orch.present_current().await.unwrap();
        let first = orch.state().unwrap().current_candidate_id.clone().unwrap();

        let response = orch.process_message("I really like them, so caring").await.unwrap();
        assert_eq!(response.learning_update.unwrap().kind, FeedbackKind::Like);

        let state = orch.state().unwrap();
        assert_eq!(state.liked_ids, vec![first]);
        assert_eq!(state.accumulated_learning.len(), 2);
        let nudge = &state.accumulated_learning[1];
        assert_eq!(nudge.kind, FeedbackKind::FreeText);
        assert!(nudge.changes.contains_key(&harmony_core::Dimension::Empathy));
        assert_eq!(nudge.version_before, state.accumulated_learning[0].version_after);
    }

    #[tokio::test]
    async fn test_tell_me_more_does_not_advance() {
        let mut orch = started().await;
        orch.present_current().await.unwrap();
        let first = orch.state().unwrap().current_candidate_id.clone().unwrap();
        let response = orch.process_message("Tell me more").await.unwrap();
        assert!(!response.candidate_update);
        assert!(response.learning_update.is_none());
        assert_eq!(
            response.messages[0].message_type,
            MessageType::CompatibilityExplanation
        );
        assert_eq!(orch.state().unwrap().current_candidate_id, Some(first));
    }

    #[tokio::test]
    async fn test_free_text_adjusts_vector_and_keeps_candidate() {
        let mut orch = started().await;
        orch.present_current().await.unwrap();
        let first = orch.state().unwrap().current_candidate_id.clone().unwrap();
        let response = orch
            .process_message("I'm hoping for someone creative and calm")
            .await
            .unwrap();
        let update = response.learning_update.unwrap();
        assert_eq!(update.kind, FeedbackKind::FreeText);
        assert!(update.changes.contains_key(&harmony_core::Dimension::Creativity));
        assert_eq!(orch.phase(), SessionPhase::AwaitingResponse);
        assert_eq!(orch.state().unwrap().current_candidate_id, Some(first));
    }

    #[tokio::test]
    async fn test_exhausted_pool_is_graceful() {
        let mut orch = started().await;
        orch.present_current().await.unwrap();
        for _ in 0..3 {
            orch.process_message("Pass").await.unwrap();
        }
        assert_eq!(orch.state().unwrap().passed_ids.len(), 3);

        let refresh = orch.refresh_queue().await.unwrap();
        assert_eq!(refresh.queued, 0);
        assert_eq!(refresh.messages.len(), 1);
        assert_eq!(refresh.messages[0].message_type, MessageType::Suggestion);
        assert_eq!(orch.phase(), SessionPhase::AwaitingResponse);

        let messages = orch.present_current().await.unwrap();
        assert_eq!(messages[0].message_type, MessageType::Suggestion);
    }

    #[tokio::test]
    async fn test_unknown_match_leaves_state_unchanged() {
        let mut orch = started().await;
        orch.present_current().await.unwrap();
        let before = serde_json::to_string(orch.state().unwrap()).unwrap();
        // queued in the store but never presented
        let unseen = orch.state().unwrap().candidate_queue[0].clone();

        for id in [ProfileId::from("nobody"), unseen] {
            let err = orch
                .provide_feedback(&id, Feedback { liked: true, text: None })
                .await
                .unwrap_err();
            assert_eq!(err.kind(), ErrorKind::DataError);
        }

        let after = serde_json::to_string(orch.state().unwrap()).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_provide_feedback_on_current() {
        let mut orch = started().await;
        orch.present_current().await.unwrap();
        let first = orch.state().unwrap().current_candidate_id.clone().unwrap();
        let response = orch
            .provide_feedback(
                &first,
                Feedback {
                    liked: false,
                    text: Some("looking for someone more outgoing".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(response.learning_update.kind, FeedbackKind::Pass);
        let state = orch.state().unwrap();
        assert_eq!(state.passed_ids, vec![first]);
        assert_eq!(state.current_candidate_id, None);
        assert_eq!(state.accumulated_learning.len(), 2);
    }

    #[tokio::test]
    async fn test_explain_match() {
        let orch = started().await;
        let explanation = orch.explain_match(&"c3".into()).await.unwrap();
        assert!(explanation.compatibility_score <= 100);
        assert!(!explanation.key_factors.is_empty() && explanation.key_factors.len() <= 5);
        assert!(explanation.detailed_explanation.contains("Devon"));
        assert!(!explanation.suggestions.is_empty());

        let err = orch.explain_match(&"ghost".into()).await.unwrap_err();
        assert!(matches!(err, Error::UnknownMatch(_)));
    }

    #[tokio::test]
    async fn test_refresh_rescores_updated_candidates() {
        let store = store();
        let mut orch = orchestrator(Arc::clone(&store));
        orch.initialize(profile()).await.unwrap();
        let before = orch.explain_match(&"c1".into()).await.unwrap();

        store.upsert(candidate("c1", "Blake", 0.1, 0.1)).await;
        orch.refresh_queue().await.unwrap();
        let after = orch.explain_match(&"c1".into()).await.unwrap();

        let mut fresh = orchestrator(Arc::clone(&store));
        fresh.initialize(profile()).await.unwrap();
        let expected = fresh.explain_match(&"c1".into()).await.unwrap();

        assert_eq!(after.compatibility_score, expected.compatibility_score);
        assert_eq!(after.key_factors, expected.key_factors);
        assert_ne!(after.compatibility_score, before.compatibility_score);
    }

    #[tokio::test]
    async fn test_refresh_keeps_unchanged_candidates_cached() {
        let mut orch = started().await;
        orch.explain_match(&"c3".into()).await.unwrap();
        let misses = orch.harmony.cache_stats().misses;

        orch.refresh_queue().await.unwrap();
        orch.explain_match(&"c3".into()).await.unwrap();
        assert_eq!(orch.harmony.cache_stats().misses, misses);
    }

    #[tokio::test]
    async fn test_end_session() {
        let mut orch = started().await;
        orch.present_current().await.unwrap();
        orch.process_message("Like").await.unwrap();

        let summary = orch.end_session().await.unwrap();
        assert_eq!(summary.presented, 2);
        assert_eq!(summary.liked, 1);
        assert_eq!(summary.learning_updates, 1);
        assert_eq!(orch.phase(), SessionPhase::SessionEnded);

        assert_eq!(orch.present_current().await.unwrap_err(), Error::SessionEnded);
        assert_eq!(orch.end_session().await.unwrap_err(), Error::SessionEnded);
    }
}
