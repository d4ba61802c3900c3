//! Harmony layer: cached pair assessments, ranking and feedback learning.
//!
//! The layer owns the shared [`ResultCache`] and is the only place vectors are
//! adjusted in response to feedback. Every adjustment purges the user's cached
//! assessments.
//!
//! Learning takes `&mut PersonalityVector`, so one copy of a vector is never
//! adjusted twice at once. The per-user lock additionally serializes the
//! learn-then-purge step across callers holding different copies of the same
//! user's vector (a restarted session racing its predecessor), so a purge can
//! never interleave with the other copy's update. Entries are dropped with
//! [`HarmonyLayer::release_user`] when a session ends.

use std::collections::BTreeMap;
use std::sync::Arc;

use dashmap::DashMap;
use harmony_core::{Clock, Dimension, PersonalityVector, ProfileId, SystemClock, Timestamp};
use harmony_scoring::{CompatibilityDimension, CompatibilityScorer};
use parking_lot::Mutex;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::cache::{CacheKey, CacheStats, ResultCache};
use crate::explanation::Assessment;

/// Feedback learning parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LearningConfig {
    pub learning_rate: f64,
    /// Pass deltas are this fraction of a like delta, with opposite sign
    pub pass_factor: f64,
    /// Candidate values at or above this count as dominant
    pub dominant_threshold: f64,
    /// Dominant dimensions used when none clears the threshold
    pub fallback_top_n: usize,
    /// Lowest-scoring compatibility dimensions a pass acts on
    pub pass_dimensions: usize,
}

impl Default for LearningConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            pass_factor: 0.5,
            dominant_threshold: 0.6,
            fallback_top_n: 3,
            pass_dimensions: 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackKind {
    Like,
    Pass,
    TellMeMore,
    FreeText,
}

/// A single feedback event on a presented candidate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackEvent {
    pub match_id: ProfileId,
    pub kind: FeedbackKind,
    #[serde(default)]
    pub text: Option<String>,
    pub timestamp: Timestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DimensionChange {
    pub before: f64,
    pub after: f64,
    pub delta: f64,
}

/// Transparency record of one learning step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LearningUpdate {
    pub user_id: ProfileId,
    pub match_id: Option<ProfileId>,
    pub kind: FeedbackKind,
    pub changes: BTreeMap<Dimension, DimensionChange>,
    pub version_before: u64,
    pub version_after: u64,
    /// Cached assessments invalidated by this update
    pub purged: usize,
    pub applied_at: Timestamp,
}

impl LearningUpdate {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Largest absolute delta in the update
    pub fn max_delta(&self) -> f64 {
        self.changes
            .values()
            .map(|c| c.delta.abs())
            .fold(0.0, f64::max)
    }
}

/// Candidate with its assessment against the ranking user
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub id: ProfileId,
    pub assessment: Arc<Assessment>,
}

impl RankedCandidate {
    pub fn overall(&self) -> f64 {
        self.assessment.result.overall
    }
}

/// Cached scoring, ranking and learning service
pub struct HarmonyLayer {
    scorer: CompatibilityScorer,
    cache: ResultCache,
    learning: LearningConfig,
    clock: Arc<dyn Clock>,
    user_locks: DashMap<ProfileId, Arc<Mutex<()>>>,
}

impl HarmonyLayer {
    pub fn new(learning: LearningConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            scorer: CompatibilityScorer::new(),
            cache: ResultCache::new(),
            learning,
            clock,
            user_locks: DashMap::new(),
        }
    }

    pub fn learning(&self) -> &LearningConfig {
        &self.learning
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    /// Assessment of a pair, computed at most once per version pair.
    pub fn calculate(
        &self,
        a: &PersonalityVector,
        b: &PersonalityVector,
    ) -> Arc<Assessment> {
        let key = CacheKey::for_pair(a, b);
        if let Some(hit) = self.cache.get(&key) {
            return hit;
        }

        // Score in id order so both request directions build the same entry.
        let (low, high) = if a.id() <= b.id() { (a, b) } else { (b, a) };
        let result = self.scorer.score_or_default(low, high, self.clock.now());
        tracing::debug!(
            profile_a = %low.id(),
            profile_b = %high.id(),
            overall = result.overall,
            "computed compatibility"
        );
        self.cache
            .insert(key, Arc::new(Assessment::new(result)))
    }

    /// Rank `candidates` against `user`: overall descending, id ascending.
    pub fn rank(
        &self,
        user: &PersonalityVector,
        candidates: &[PersonalityVector],
    ) -> Vec<RankedCandidate> {
        let mut ranked: Vec<RankedCandidate> = candidates
            .par_iter()
            .filter(|c| c.id() != user.id())
            .map(|c| RankedCandidate {
                id: c.id().clone(),
                assessment: self.calculate(user, c),
            })
            .collect();

        ranked.sort_by(|a, b| {
            b.overall()
                .total_cmp(&a.overall())
                .then_with(|| a.id.cmp(&b.id))
        });
        ranked
    }

    /// Adjust `user` after like or pass feedback on `candidate`.
    ///
    /// Tell-me-more and free-text feedback produce an empty update here; free
    /// text goes through [`apply_preferences`](Self::apply_preferences).
    pub fn update_from_feedback(
        &self,
        user: &mut PersonalityVector,
        candidate: &PersonalityVector,
        kind: FeedbackKind,
    ) -> LearningUpdate {
        let lock = self.user_lock(user.id());
        let _guard = lock.lock();

        let lr = self.learning.learning_rate;
        let deltas: BTreeMap<Dimension, f64> = match kind {
            FeedbackKind::Like => self
                .dominant_dimensions(candidate)
                .into_iter()
                .map(|d| (d, lr * (candidate.get(d) - user.get(d))))
                .collect(),
            FeedbackKind::Pass => self
                .weakest_dimensions(user, candidate)
                .into_iter()
                .map(|d| (d, -self.learning.pass_factor * lr * (candidate.get(d) - user.get(d))))
                .collect(),
            FeedbackKind::TellMeMore | FeedbackKind::FreeText => BTreeMap::new(),
        };

        let update = self.apply_locked(user, Some(candidate.id().clone()), kind, deltas);
        tracing::info!(
            user = %user.id(),
            candidate = %candidate.id(),
            ?kind,
            changed = update.changes.len(),
            max_delta = update.max_delta(),
            version = update.version_after,
            "applied feedback"
        );
        update
    }

    /// Nudge `user` toward `targets` by the learning rate.
    pub fn apply_preferences(
        &self,
        user: &mut PersonalityVector,
        targets: &BTreeMap<Dimension, f64>,
    ) -> LearningUpdate {
        let lock = self.user_lock(user.id());
        let _guard = lock.lock();

        let lr = self.learning.learning_rate;
        let deltas = targets
            .iter()
            .filter(|(_, t)| t.is_finite())
            .map(|(&d, &t)| (d, lr * (t.clamp(0.0, 1.0) - user.get(d))))
            .collect();
        self.apply_locked(user, None, FeedbackKind::FreeText, deltas)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    /// Drop cached assessments involving `id`
    pub fn invalidate(&self, id: &ProfileId) -> usize {
        self.cache.purge_profile(id)
    }

    /// Forget the learning lock of a user whose session ended
    pub fn release_user(&self, id: &ProfileId) -> bool {
        self.user_locks.remove(id).is_some()
    }

    /// Users that currently hold a learning lock entry
    pub fn tracked_users(&self) -> usize {
        self.user_locks.len()
    }

    fn user_lock(&self, id: &ProfileId) -> Arc<Mutex<()>> {
        Arc::clone(&self.user_locks.entry(id.clone()).or_default())
    }

    fn apply_locked(
        &self,
        user: &mut PersonalityVector,
        match_id: Option<ProfileId>,
        kind: FeedbackKind,
        deltas: BTreeMap<Dimension, f64>,
    ) -> LearningUpdate {
        let version_before = user.version();
        let mut targets = BTreeMap::new();
        let mut changes = BTreeMap::new();

        for (dim, delta) in deltas {
            if !delta.is_finite() || delta == 0.0 {
                continue;
            }
            let before = user.get(dim);
            let after = (before + delta).clamp(0.0, 1.0);
            if after == before {
                continue;
            }
            targets.insert(dim, after);
            changes.insert(
                dim,
                DimensionChange {
                    before,
                    after,
                    delta: after - before,
                },
            );
        }

        let version_after = user.update_dimensions(&targets);
        let purged = if changes.is_empty() {
            0
        } else {
            self.cache.purge_profile(user.id())
        };

        LearningUpdate {
            user_id: user.id().clone(),
            match_id,
            kind,
            changes,
            version_before,
            version_after,
            purged,
            applied_at: self.clock.now(),
        }
    }

    /// Candidate dimensions at or above the dominant threshold, else the
    /// top few, drawn only from groups the candidate was observed in.
    fn dominant_dimensions(&self, candidate: &PersonalityVector) -> Vec<Dimension> {
        let observed: Vec<Dimension> = Dimension::all()
            .filter(|d| candidate.is_observed(d.group()))
            .collect();

        let dominant: Vec<Dimension> = observed
            .iter()
            .copied()
            .filter(|d| candidate.get(*d) >= self.learning.dominant_threshold)
            .collect();
        if !dominant.is_empty() {
            return dominant;
        }

        let mut by_value = observed;
        by_value.sort_by(|a, b| candidate.get(*b).total_cmp(&candidate.get(*a)));
        by_value.truncate(self.learning.fallback_top_n);
        by_value
    }

    /// Vector dimensions behind the lowest-scoring compatibility dimensions
    /// the candidate has data for.
    fn weakest_dimensions(
        &self,
        user: &PersonalityVector,
        candidate: &PersonalityVector,
    ) -> Vec<Dimension> {
        let assessment = self.calculate(user, candidate);
        let mut scored: Vec<(CompatibilityDimension, f64)> = CompatibilityDimension::ALL
            .into_iter()
            .filter(|d| !d.is_extension_point())
            .filter(|d| {
                d.vector_dimensions()
                    .first()
                    .is_some_and(|v| candidate.is_observed(v.group()))
            })
            .map(|d| (d, assessment.result.score(d)))
            .collect();
        scored.sort_by(|a, b| a.1.total_cmp(&b.1));

        let mut dims: Vec<Dimension> = scored
            .into_iter()
            .take(self.learning.pass_dimensions)
            .flat_map(|(d, _)| d.vector_dimensions().iter().copied())
            .collect();
        dims.sort();
        dims.dedup();
        dims
    }
}

impl Default for HarmonyLayer {
    fn default() -> Self {
        Self::new(LearningConfig::default(), Arc::new(SystemClock))
    }
}
