// src/suggest/memo.rs

//! Bounded per-seed memoization of upstream retrievals.
//!
//! Keyed by the seed's normalized text, capped with least-recently-used
//! eviction. Independent of the TTL-based aggregate-result tiers.

use crate::gateway::Candidate;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

/// A seed's resolved candidate plus its enriched related candidates.
pub type SeedRetrieval = (Candidate, Vec<Candidate>);

pub struct SeedMemo {
    inner: Mutex<LruCache<String, SeedRetrieval>>,
}

impl SeedMemo {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).unwrap();
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn get(&self, normalized_seed: &str) -> Option<SeedRetrieval> {
        self.inner.lock().ok()?.get(normalized_seed).cloned()
    }

    pub fn put(&self, normalized_seed: String, retrieval: SeedRetrieval) {
        if let Ok(mut cache) = self.inner.lock() {
            cache.put(normalized_seed, retrieval);
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().map(|c| c.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: &str) -> Candidate {
        Candidate {
            video_id: id.to_string(),
            title: id.to_string(),
            channel: "c".to_string(),
            description: String::new(),
            tags: Vec::new(),
            view_count: 0,
            duration_secs: Some(200),
        }
    }

    #[test]
    fn evicts_least_recently_used_beyond_capacity() {
        let memo = SeedMemo::new(2);
        memo.put("a".into(), (candidate("a"), vec![]));
        memo.put("b".into(), (candidate("b"), vec![]));
        // Touch "a" so "b" becomes the eviction victim.
        assert!(memo.get("a").is_some());
        memo.put("c".into(), (candidate("c"), vec![]));

        assert_eq!(memo.len(), 2);
        assert!(memo.get("a").is_some());
        assert!(memo.get("b").is_none());
        assert!(memo.get("c").is_some());
    }
}
