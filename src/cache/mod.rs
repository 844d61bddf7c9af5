// src/cache/mod.rs

//! Aggregate-result cache in front of the suggestion engine.
//!
//! Lookup order: fast distributed tier, then the process-local TTL tier.
//! A local hit backfills the fast tier; a computed result is written to
//! both with the same TTL. Losing a tier degrades latency, nothing else.

pub mod fast;
pub mod local;

use crate::suggest::{ScoredSuggestion, normalize_seed};
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, warn};

pub use fast::FastCache;
pub use local::LocalCache;

pub struct SuggestionCache {
    fast: Option<FastCache>,
    local: LocalCache,
    ttl: Duration,
}

impl SuggestionCache {
    pub fn new(fast: Option<FastCache>, ttl: Duration) -> Self {
        Self {
            fast,
            local: LocalCache::new(),
            ttl,
        }
    }

    /// Deterministic key over the normalized, order-independent seed set.
    pub fn cache_key(seeds: &[String]) -> String {
        let mut normalized: Vec<String> = seeds
            .iter()
            .map(|s| normalize_seed(s))
            .filter(|s| !s.is_empty())
            .collect();
        normalized.sort();
        normalized.dedup();
        let mut hasher = Sha256::new();
        for seed in &normalized {
            hasher.update(seed.as_bytes());
            hasher.update([0u8]);
        }
        format!("encore:suggest:{:x}", hasher.finalize())
    }

    pub async fn get(&self, key: &str) -> Option<Vec<ScoredSuggestion>> {
        if let Some(fast) = &self.fast {
            if let Some(raw) = fast.get(key).await {
                match serde_json::from_slice::<Vec<ScoredSuggestion>>(&raw) {
                    Ok(payload) => {
                        debug!(key, "fast tier hit");
                        return Some(payload);
                    }
                    Err(e) => warn!(key, error = %e, "fast tier payload undecodable, ignoring"),
                }
            }
        }

        if let Some(payload) = self.local.get(key) {
            debug!(key, "local tier hit");
            if let Some(fast) = &self.fast {
                if let Ok(raw) = serde_json::to_vec(&payload) {
                    fast.set(key, &raw, self.ttl).await;
                }
            }
            return Some(payload);
        }
        None
    }

    pub async fn put(&self, key: &str, payload: &[ScoredSuggestion]) {
        self.local.insert(key.to_string(), payload.to_vec(), self.ttl);
        if let Some(fast) = &self.fast {
            match serde_json::to_vec(payload) {
                Ok(raw) => fast.set(key, &raw, self.ttl).await,
                Err(e) => warn!(error = %e, "failed to serialize cache payload"),
            }
        }
    }
}
