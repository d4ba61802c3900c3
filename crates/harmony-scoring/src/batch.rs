//! Parallel scoring of one vector against many candidates.

use harmony_core::{PersonalityVector, Timestamp};
use rayon::prelude::*;

use crate::scorer::{CompatibilityResult, CompatibilityScorer};

/// Batch scorer fanning pair evaluations out across the rayon pool.
///
/// Results are returned in the same order as the input candidates.
#[derive(Debug, Clone, Copy, Default)]
pub struct BatchScorer {
    scorer: CompatibilityScorer,
}

impl BatchScorer {
    pub fn new() -> Self {
        Self {
            scorer: CompatibilityScorer::new(),
        }
    }

    pub fn scorer(&self) -> &CompatibilityScorer {
        &self.scorer
    }

    /// Score `user` against every candidate in parallel.
    pub fn score_against(
        &self,
        user: &PersonalityVector,
        candidates: &[PersonalityVector],
        computed_at: Timestamp,
    ) -> Vec<CompatibilityResult> {
        candidates
            .par_iter()
            .map(|candidate| self.scorer.score_or_default(user, candidate, computed_at))
            .collect()
    }
}
