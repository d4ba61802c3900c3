//! Matchmaking service facade.

use std::sync::Arc;

use harmony_agents::{
    Assessment, CacheStats, CandidateStore, ChatMessage, ConversationState, Explainer, Feedback,
    FeedbackResponse, HarmonyLayer, InitializeResponse, MatchExplanation, MessageResponse,
    RecommendationOrchestrator, SessionSummary, TemplateExplainer,
};
use harmony_core::{Clock, Error, PersonalityVector, ProfileId, ProfileInput, Result, SystemClock};
use harmony_scoring::ProfileMapper;

use crate::config::HarmonyConfig;
use crate::state::{SessionHandle, SessionRegistry};

/// Entry point for embedding applications.
///
/// Owns the shared [`HarmonyLayer`] so every session reuses one result cache,
/// and routes each call to the caller's session.
pub struct MatchmakingService {
    config: HarmonyConfig,
    harmony: Arc<HarmonyLayer>,
    store: Arc<dyn CandidateStore>,
    explainer: Arc<dyn Explainer>,
    sessions: SessionRegistry,
}

impl MatchmakingService {
    pub fn new(config: HarmonyConfig, store: Arc<dyn CandidateStore>) -> Self {
        Self::with_clock(config, store, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: HarmonyConfig,
        store: Arc<dyn CandidateStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let harmony = Arc::new(HarmonyLayer::new(config.learning.clone(), clock));
        Self {
            config,
            harmony,
            store,
            explainer: Arc::new(TemplateExplainer),
            sessions: SessionRegistry::new(),
        }
    }

    /// Replace the explainer used by sessions started afterwards
    pub fn with_explainer(mut self, explainer: Arc<dyn Explainer>) -> Self {
        self.explainer = explainer;
        self
    }

    pub fn config(&self) -> &HarmonyConfig {
        &self.config
    }

    /// Stateless pair assessment, shared with session ranking through the cache
    pub fn calculate_compatibility(
        &self,
        a: &PersonalityVector,
        b: &PersonalityVector,
    ) -> Arc<Assessment> {
        self.harmony.calculate(a, b)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.harmony.cache_stats()
    }

    /// Start (or restart) the session for `profile.id`.
    pub async fn start_session(&self, profile: ProfileInput) -> Result<InitializeResponse> {
        let orchestrator = RecommendationOrchestrator::new(
            Arc::clone(&self.harmony),
            Arc::clone(&self.store),
        )
        .with_explainer(Arc::clone(&self.explainer), self.config.explainer.clone())
        .with_config(self.config.session.clone())
        .with_mapper(ProfileMapper::new(self.config.mapper.clone()));

        let handle = self.sessions.insert(profile.id.clone(), orchestrator);
        let mut session = handle.lock().await;
        session.initialize(profile).await
    }

    pub async fn present(&self, user: &ProfileId) -> Result<Vec<ChatMessage>> {
        let handle = self.session(user)?;
        let mut session = handle.lock().await;
        session.present_current().await
    }

    pub async fn send_message(&self, user: &ProfileId, text: &str) -> Result<MessageResponse> {
        let handle = self.session(user)?;
        let mut session = handle.lock().await;
        session.process_message(text).await
    }

    pub async fn provide_feedback(
        &self,
        user: &ProfileId,
        match_id: &ProfileId,
        feedback: Feedback,
    ) -> Result<FeedbackResponse> {
        let handle = self.session(user)?;
        let mut session = handle.lock().await;
        session.provide_feedback(match_id, feedback).await
    }

    pub async fn explain_match(
        &self,
        user: &ProfileId,
        match_id: &ProfileId,
    ) -> Result<MatchExplanation> {
        let handle = self.session(user)?;
        let session = handle.lock().await;
        session.explain_match(match_id).await
    }

    /// End the user's session. The ended session stays registered so later
    /// calls report [`Error::SessionEnded`] until a new session starts.
    pub async fn end_session(&self, user: &ProfileId) -> Result<SessionSummary> {
        let handle = self.session(user)?;
        let mut session = handle.lock().await;
        session.end_session().await
    }

    /// Drop the user's session entirely
    pub fn remove_session(&self, user: &ProfileId) -> bool {
        self.sessions.remove(user).is_some()
    }

    /// Snapshot of the user's conversation state
    pub async fn snapshot(&self, user: &ProfileId) -> Result<ConversationState> {
        let handle = self.session(user)?;
        let session = handle.lock().await;
        session.state().cloned().ok_or(Error::NotInitialized)
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }

    fn session(&self, user: &ProfileId) -> Result<SessionHandle> {
        self.sessions.get(user).ok_or(Error::NotInitialized)
    }
}
