// src/service.rs

//! Caller-facing facade: cache in front, engine on miss, stores for likes.

use crate::cache::SuggestionCache;
use crate::store::{LikeReceipt, PersistenceError, UserLikeRecord, WriteThroughStore};
use crate::suggest::{SuggestionEngine, SuggestionResponse};
use std::sync::Arc;
use tracing::{debug, info};

pub struct SuggestionService {
    cache: SuggestionCache,
    engine: SuggestionEngine,
    store: Arc<WriteThroughStore>,
}

impl SuggestionService {
    pub fn new(
        cache: SuggestionCache,
        engine: SuggestionEngine,
        store: Arc<WriteThroughStore>,
    ) -> Self {
        Self {
            cache,
            engine,
            store,
        }
    }

    /// Ranked suggestions for the caller's seed set. Served from the cache
    /// tiers when possible; a freshly ranked result is written back through
    /// them before returning.
    pub async fn get_suggestions(&self, user_id: &str, seeds: &[String]) -> SuggestionResponse {
        let key = SuggestionCache::cache_key(seeds);
        if let Some(hit) = self.cache.get(&key).await {
            debug!(user_id, "suggestion cache hit");
            return SuggestionResponse::Ranked(hit);
        }

        info!(user_id, seeds = seeds.len(), "computing suggestions");
        let response = self.engine.rank(seeds).await;
        if let SuggestionResponse::Ranked(ranked) = &response {
            self.cache.put(&key, ranked).await;
        }
        response
    }

    pub async fn record_like(
        &self,
        user_id: &str,
        seed_text: &str,
    ) -> Result<LikeReceipt, PersistenceError> {
        self.store.record_like(user_id, seed_text).await
    }

    pub async fn load_likes(&self, user_id: &str) -> Vec<UserLikeRecord> {
        self.store.load_likes(user_id).await
    }
}
