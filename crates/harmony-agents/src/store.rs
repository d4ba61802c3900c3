//! Candidate store collaborator.

use std::collections::BTreeMap;

use async_trait::async_trait;
use harmony_core::{CandidateRecord, ProfileId, Result};
use tokio::sync::RwLock;

/// Source of candidate profiles.
///
/// Persistence is the store's concern; the session only reads through it.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Every candidate currently available
    async fn load_candidates(&self) -> Result<Vec<CandidateRecord>>;

    async fn get_candidate(&self, id: &ProfileId) -> Result<Option<CandidateRecord>>;
}

/// In-process store, ordered by id
#[derive(Debug, Default)]
pub struct InMemoryCandidateStore {
    records: RwLock<BTreeMap<ProfileId, CandidateRecord>>,
}

impl InMemoryCandidateStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_candidates(candidates: impl IntoIterator<Item = CandidateRecord>) -> Self {
        let records = candidates.into_iter().map(|c| (c.id.clone(), c)).collect();
        Self {
            records: RwLock::new(records),
        }
    }

    /// Insert or replace a candidate
    pub async fn upsert(&self, candidate: CandidateRecord) {
        let mut records = self.records.write().await;
        records.insert(candidate.id.clone(), candidate);
    }

    pub async fn remove(&self, id: &ProfileId) -> Option<CandidateRecord> {
        let mut records = self.records.write().await;
        records.remove(id)
    }

    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl CandidateStore for InMemoryCandidateStore {
    async fn load_candidates(&self) -> Result<Vec<CandidateRecord>> {
        let records = self.records.read().await;
        Ok(records.values().cloned().collect())
    }

    async fn get_candidate(&self, id: &ProfileId) -> Result<Option<CandidateRecord>> {
        let records = self.records.read().await;
        Ok(records.get(id).cloned())
    }
}
