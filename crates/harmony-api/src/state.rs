//! Per-user session registry.

use std::sync::Arc;

use dashmap::DashMap;
use harmony_agents::RecommendationOrchestrator;
use harmony_core::ProfileId;
use tokio::sync::Mutex;

/// Shared handle to one user's session
pub type SessionHandle = Arc<Mutex<RecommendationOrchestrator>>;

/// Live sessions keyed by user.
///
/// Each orchestrator sits behind its own async mutex, so one user's
/// operations run one at a time while different users proceed in parallel.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<ProfileId, SessionHandle>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `orchestrator` for `user`, replacing any previous session.
    pub fn insert(&self, user: ProfileId, orchestrator: RecommendationOrchestrator) -> SessionHandle {
        let handle = Arc::new(Mutex::new(orchestrator));
        if self.sessions.insert(user.clone(), Arc::clone(&handle)).is_some() {
            tracing::info!(user = %user, "replaced existing session");
        }
        handle
    }

    pub fn get(&self, user: &ProfileId) -> Option<SessionHandle> {
        self.sessions.get(user).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, user: &ProfileId) -> Option<SessionHandle> {
        self.sessions.remove(user).map(|(_, handle)| handle)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
