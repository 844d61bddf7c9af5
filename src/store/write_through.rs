// src/store/write_through.rs

use super::{DurableStore, UserLikeRecord, VideoFeatureRecord};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Outcome of a write-through like: which stores committed and which did
/// not. A partial failure is a diagnostic, not an error.
#[derive(Debug, Clone, Serialize)]
pub struct LikeReceipt {
    pub committed: Vec<String>,
    pub failed: Vec<StoreFailure>,
}

#[derive(Debug, Clone, Serialize)]
pub struct StoreFailure {
    pub store: String,
    pub reason: String,
}

/// Raised only when every configured store failed the write.
#[derive(Debug, thiserror::Error)]
#[error("all configured durable stores failed the write")]
pub struct PersistenceError {
    pub failures: Vec<StoreFailure>,
}

/// Fans every write out across all configured stores, one independent
/// transaction each, and reads from the designated read-preferred store
/// with a fallback scan over the rest. A process-lifetime in-memory mirror
/// keeps reads usable when no store is reachable.
pub struct WriteThroughStore {
    stores: Vec<Arc<dyn DurableStore>>,
    read_preferred: usize,
    memory: Mutex<HashMap<String, Vec<UserLikeRecord>>>,
}

impl WriteThroughStore {
    pub fn new(stores: Vec<Arc<dyn DurableStore>>, read_preferred: &str) -> Self {
        let read_preferred = stores
            .iter()
            .position(|s| s.name() == read_preferred)
            .unwrap_or(0);
        Self {
            stores,
            read_preferred,
            memory: Mutex::new(HashMap::new()),
        }
    }

    pub fn store_names(&self) -> Vec<String> {
        self.stores.iter().map(|s| s.name().to_string()).collect()
    }

    /// Stores in read order: the preferred one first, then the rest in
    /// configuration order.
    fn read_order(&self) -> impl Iterator<Item = &Arc<dyn DurableStore>> {
        let preferred = self.stores.get(self.read_preferred);
        let rest = self
            .stores
            .iter()
            .enumerate()
            .filter(move |(i, _)| *i != self.read_preferred)
            .map(|(_, s)| s);
        preferred.into_iter().chain(rest)
    }

    fn mirror_like(&self, user_id: &str, seed_text: &str) {
        if let Ok(mut memory) = self.memory.lock() {
            let likes = memory.entry(user_id.to_string()).or_default();
            if !likes.iter().any(|l| l.seed_text == seed_text) {
                likes.push(UserLikeRecord {
                    user_id: user_id.to_string(),
                    seed_text: seed_text.to_string(),
                    created_at: Utc::now(),
                });
            }
        }
    }

    /// Records a like in every configured store. Succeeds as long as at
    /// least one store commits; fails with [`PersistenceError`] only when
    /// all of them fail.
    pub async fn record_like(
        &self,
        user_id: &str,
        seed_text: &str,
    ) -> Result<LikeReceipt, PersistenceError> {
        let seed_text = seed_text.trim();
        self.mirror_like(user_id, seed_text);

        let writes = self
            .stores
            .iter()
            .map(|store| async move { (store.name().to_string(), store.upsert_like(user_id, seed_text).await) });
        let outcomes = join_all(writes).await;

        let mut committed = Vec::new();
        let mut failed = Vec::new();
        for (store, outcome) in outcomes {
            match outcome {
                Ok(()) => committed.push(store),
                Err(e) => {
                    warn!(store = %store, error = %e, "like write failed in store");
                    failed.push(StoreFailure {
                        store,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if committed.is_empty() && !self.stores.is_empty() {
            return Err(PersistenceError { failures: failed });
        }
        Ok(LikeReceipt { committed, failed })
    }

    /// Loads likes from the read-preferred store, any other configured
    /// store, or the in-memory mirror, in that order. Never raises.
    pub async fn load_likes(&self, user_id: &str) -> Vec<UserLikeRecord> {
        for store in self.read_order() {
            match store.load_likes(user_id).await {
                Ok(likes) => return likes,
                Err(e) => {
                    warn!(store = %store.name(), error = %e, "like read failed, trying next store");
                }
            }
        }
        self.memory
            .lock()
            .map(|m| m.get(user_id).cloned().unwrap_or_default())
            .unwrap_or_default()
    }

    // ── Opportunistic caches (never required for correctness) ─────────

    pub async fn cached_query(&self, query: &str) -> Option<String> {
        for store in self.read_order() {
            match store.cached_query(query).await {
                Ok(hit) => return hit,
                Err(e) => {
                    debug!(store = %store.name(), error = %e, "query cache read failed, trying next store");
                }
            }
        }
        None
    }

    pub async fn remember_query(&self, query: &str, video_id: &str) {
        let writes = self.stores.iter().map(|store| async move {
            if let Err(e) = store.upsert_cached_query(query, video_id).await {
                debug!(store = %store.name(), error = %e, "query cache write failed, skipping");
            }
        });
        join_all(writes).await;
    }

    pub async fn video_features(&self, video_id: &str) -> Option<VideoFeatureRecord> {
        for store in self.read_order() {
            match store.video_features(video_id).await {
                Ok(hit) => return hit,
                Err(e) => {
                    debug!(store = %store.name(), error = %e, "feature cache read failed, trying next store");
                }
            }
        }
        None
    }

    pub async fn remember_features(&self, record: &VideoFeatureRecord) {
        let writes = self.stores.iter().map(|store| async move {
            if let Err(e) = store.upsert_video_features(record).await {
                debug!(store = %store.name(), error = %e, "feature cache write failed, skipping");
            }
        });
        join_all(writes).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Store double whose failure mode can be flipped per test.
    struct FlakyStore {
        name: String,
        failing: AtomicBool,
        likes: Mutex<Vec<UserLikeRecord>>,
    }

    impl FlakyStore {
        fn new(name: &str, failing: bool) -> Arc<Self> {
            Arc::new(Self {
                name: name.to_string(),
                failing: AtomicBool::new(failing),
                likes: Mutex::new(Vec::new()),
            })
        }

        fn check(&self) -> Result<(), StoreError> {
            if self.failing.load(Ordering::SeqCst) {
                Err(StoreError::Database(sqlx::Error::PoolClosed))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DurableStore for FlakyStore {
        fn name(&self) -> &str {
            &self.name
        }

        async fn upsert_like(&self, user_id: &str, seed_text: &str) -> Result<(), StoreError> {
            self.check()?;
            let mut likes = self.likes.lock().unwrap();
            if !likes
                .iter()
                .any(|l| l.user_id == user_id && l.seed_text == seed_text)
            {
                likes.push(UserLikeRecord {
                    user_id: user_id.to_string(),
                    seed_text: seed_text.to_string(),
                    created_at: Utc::now(),
                });
            }
            Ok(())
        }

        async fn load_likes(&self, user_id: &str) -> Result<Vec<UserLikeRecord>, StoreError> {
            self.check()?;
            Ok(self
                .likes
                .lock()
                .unwrap()
                .iter()
                .filter(|l| l.user_id == user_id)
                .cloned()
                .collect())
        }

        async fn cached_query(&self, _query: &str) -> Result<Option<String>, StoreError> {
            self.check()?;
            Ok(None)
        }

        async fn upsert_cached_query(&self, _query: &str, _video_id: &str) -> Result<(), StoreError> {
            self.check()
        }

        async fn video_features(
            &self,
            _video_id: &str,
        ) -> Result<Option<VideoFeatureRecord>, StoreError> {
            self.check()?;
            Ok(None)
        }

        async fn upsert_video_features(
            &self,
            _record: &VideoFeatureRecord,
        ) -> Result<(), StoreError> {
            self.check()
        }
    }

    #[tokio::test]
    async fn partial_store_failure_still_succeeds() {
        let good = FlakyStore::new("good", false);
        let bad = FlakyStore::new("bad", true);
        let store = WriteThroughStore::new(vec![bad.clone(), good.clone()], "bad");

        let receipt = store.record_like("u1", "song").await.unwrap();
        assert_eq!(receipt.committed, vec!["good"]);
        assert_eq!(receipt.failed.len(), 1);
        assert_eq!(receipt.failed[0].store, "bad");

        // Preferred store is down; the read falls back to the survivor.
        let likes = store.load_likes("u1").await;
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].seed_text, "song");
    }

    #[tokio::test]
    async fn total_store_failure_is_a_persistence_error() {
        let a = FlakyStore::new("a", true);
        let b = FlakyStore::new("b", true);
        let store = WriteThroughStore::new(vec![a, b], "a");

        let err = store.record_like("u1", "song").await.unwrap_err();
        assert_eq!(err.failures.len(), 2);
    }

    #[tokio::test]
    async fn reads_fall_back_to_memory_when_no_store_is_reachable() {
        let a = FlakyStore::new("a", true);
        let store = WriteThroughStore::new(vec![a.clone()], "a");

        assert!(store.record_like("u1", "song").await.is_err());
        // The in-memory mirror still remembers the like for this process.
        let likes = store.load_likes("u1").await;
        assert_eq!(likes.len(), 1);
        assert_eq!(likes[0].seed_text, "song");
    }

    #[tokio::test]
    async fn duplicate_likes_are_idempotent() {
        let a = FlakyStore::new("a", false);
        let store = WriteThroughStore::new(vec![a.clone()], "a");

        store.record_like("u1", "song").await.unwrap();
        store.record_like("u1", " song ").await.unwrap();
        assert_eq!(store.load_likes("u1").await.len(), 1);
    }

    #[tokio::test]
    async fn zero_configured_stores_is_memory_only() {
        let store = WriteThroughStore::new(Vec::new(), "sqlite");
        let receipt = store.record_like("u1", "song").await.unwrap();
        assert!(receipt.committed.is_empty());
        assert_eq!(store.load_likes("u1").await.len(), 1);
    }
}
