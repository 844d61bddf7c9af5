// src/store/mod.rs

//! Durable persistence: user likes plus the opportunistic query/feature
//! caches that let the engine skip repeated upstream calls across restarts.
//!
//! Every store kind implements the same [`DurableStore`] capability surface;
//! [`WriteThroughStore`] fans writes out across all configured stores and
//! reads from a designated read-preferred one.

pub mod postgres;
pub mod sqlite;
pub mod write_through;

use crate::gateway::Candidate;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use postgres::PostgresStore;
pub use sqlite::SqliteStore;
pub use write_through::{LikeReceipt, PersistenceError, WriteThroughStore};

/// One "liked" record. Unique per (user, seed text) within a store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserLikeRecord {
    pub user_id: String,
    pub seed_text: String,
    pub created_at: DateTime<Utc>,
}

/// Durable copy of a candidate's extracted text features.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFeatureRecord {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub tags: Vec<String>,
    pub description: String,
    pub view_count: u64,
    pub duration_secs: Option<u64>,
}

impl From<&Candidate> for VideoFeatureRecord {
    fn from(candidate: &Candidate) -> Self {
        Self {
            video_id: candidate.video_id.clone(),
            title: candidate.title.clone(),
            channel: candidate.channel.clone(),
            tags: candidate.tags.clone(),
            description: candidate.description.clone(),
            view_count: candidate.view_count,
            duration_secs: candidate.duration_secs,
        }
    }
}

impl VideoFeatureRecord {
    pub fn into_candidate(self) -> Candidate {
        Candidate {
            video_id: self.video_id,
            title: self.title,
            channel: self.channel,
            description: self.description,
            tags: self.tags,
            view_count: self.view_count,
            duration_secs: self.duration_secs,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Uniform transactional session surface over one durable store.
///
/// Writes open and commit their own transaction; no call holds state across
/// requests. Upserts are idempotent.
#[async_trait]
pub trait DurableStore: Send + Sync {
    fn name(&self) -> &str;

    async fn upsert_like(&self, user_id: &str, seed_text: &str) -> Result<(), StoreError>;
    async fn load_likes(&self, user_id: &str) -> Result<Vec<UserLikeRecord>, StoreError>;

    async fn cached_query(&self, query: &str) -> Result<Option<String>, StoreError>;
    async fn upsert_cached_query(&self, query: &str, video_id: &str) -> Result<(), StoreError>;

    async fn video_features(&self, video_id: &str) -> Result<Option<VideoFeatureRecord>, StoreError>;
    async fn upsert_video_features(&self, record: &VideoFeatureRecord) -> Result<(), StoreError>;
}

pub(crate) fn tags_to_json(tags: &[String]) -> String {
    serde_json::to_string(tags).unwrap_or_else(|_| "[]".to_string())
}

pub(crate) fn tags_from_json(raw: Option<String>) -> Vec<String> {
    raw.as_deref()
        .and_then(|s| serde_json::from_str(s).ok())
        .unwrap_or_default()
}
