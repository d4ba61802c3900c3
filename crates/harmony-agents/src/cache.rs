//! Versioned compatibility result cache.
//!
//! Entries are keyed by the ordered id pair together with the vector version
//! of each side, so a mutated vector simply stops matching its old entries.
//! Nothing expires on a timer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use harmony_core::{PersonalityVector, ProfileId};
use serde::{Deserialize, Serialize};

use crate::explanation::Assessment;

/// `(min id, max id, version of min, version of max)`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    low: ProfileId,
    high: ProfileId,
    low_version: u64,
    high_version: u64,
}

impl CacheKey {
    pub fn for_pair(a: &PersonalityVector, b: &PersonalityVector) -> Self {
        let (low, high) = if a.id() <= b.id() { (a, b) } else { (b, a) };
        Self {
            low: low.id().clone(),
            high: high.id().clone(),
            low_version: low.version(),
            high_version: high.version(),
        }
    }

    pub fn involves(&self, id: &ProfileId) -> bool {
        &self.low == id || &self.high == id
    }
}

/// Cache statistics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheStats {
    pub entries: usize,
    pub hits: u64,
    pub misses: u64,
}

/// Shared, read-mostly assessment cache
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: DashMap<CacheKey, Arc<Assessment>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &CacheKey) -> Option<Arc<Assessment>> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store `assessment` unless another caller got there first; either way
    /// the cached value is returned.
    pub fn insert(&self, key: CacheKey, assessment: Arc<Assessment>) -> Arc<Assessment> {
        Arc::clone(self.entries.entry(key).or_insert(assessment).value())
    }

    /// Drop every entry involving `id`. Returns the number removed.
    pub fn purge_profile(&self, id: &ProfileId) -> usize {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.involves(id));
        let removed = before.saturating_sub(self.entries.len());
        if removed > 0 {
            tracing::debug!(profile = %id, removed, "purged cached assessments");
        }
        removed
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            entries: self.entries.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use harmony_core::{TraitGroup, Timestamp};
    use harmony_scoring::CompatibilityScorer;

    fn assessment(a: &PersonalityVector, b: &PersonalityVector) -> Arc<Assessment> {
        let result = CompatibilityScorer::new()
            .score_at(a, b, Timestamp::from_nanos(0))
            .unwrap();
        Arc::new(Assessment::new(result))
    }

    #[test]
    fn test_key_is_order_independent() {
        let a = PersonalityVector::create_default("alice");
        let mut b = PersonalityVector::create_default("bob");
        b.set_confidence(TraitGroup::Values, 0.7);
        assert_eq!(CacheKey::for_pair(&a, &b), CacheKey::for_pair(&b, &a));
    }

    #[test]
    fn test_version_change_misses() {
        let cache = ResultCache::new();
        let a = PersonalityVector::create_default("alice");
        let mut b = PersonalityVector::create_default("bob");

        let stored = cache.insert(CacheKey::for_pair(&a, &b), assessment(&a, &b));
        let hit = cache.get(&CacheKey::for_pair(&b, &a)).unwrap();
        assert!(Arc::ptr_eq(&stored, &hit));

        b.set_confidence(TraitGroup::Values, 0.7);
        assert!(cache.get(&CacheKey::for_pair(&a, &b)).is_none());

        let stats = cache.stats();
        assert_eq!((stats.entries, stats.hits, stats.misses), (1, 1, 1));
    }

    #[test]
    fn test_first_insert_wins_and_purge() {
        let cache = ResultCache::new();
        let a = PersonalityVector::create_default("alice");
        let b = PersonalityVector::create_default("bob");
        let c = PersonalityVector::create_default("carol");

        let first = cache.insert(CacheKey::for_pair(&a, &b), assessment(&a, &b));
        let second = cache.insert(CacheKey::for_pair(&a, &b), assessment(&a, &b));
        assert!(Arc::ptr_eq(&first, &second));

        cache.insert(CacheKey::for_pair(&b, &c), assessment(&b, &c));
        assert_eq!(cache.purge_profile(&"alice".into()), 1);
        assert_eq!(cache.stats().entries, 1);
    }
}
