// src/gateway/mod.rs

//! Client for the external video-metadata service.
//!
//! All upstream communication lives here: relevance search, related-video
//! lookup, batched detail enrichment and the popularity chart. Failures are
//! normalized into [`GatewayError`] with a transient/permanent split; retry
//! policy belongs to the caller, never to this module.

pub mod client;
pub mod types;

use async_trait::async_trait;
use std::collections::HashMap;

pub use client::YouTubeClient;
pub use types::{Candidate, CandidateDetails};

/// Errors from the upstream metadata service.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("upstream request failed: {0}")]
    Network(#[from] reqwest::Error),

    #[error("upstream rate limit or quota exhausted (HTTP {status})")]
    RateLimited { status: u16 },

    #[error("upstream API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode upstream response: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Whether a caller could reasonably see this clear up on its own.
    pub fn is_transient(&self) -> bool {
        match self {
            GatewayError::Network(_) => true,
            GatewayError::RateLimited { .. } => true,
            GatewayError::Api { status, .. } => *status >= 500,
            GatewayError::Decode(_) => false,
        }
    }
}

/// Read-only capability surface of the upstream service.
///
/// `find_seed_candidate` returns `Ok(None)` when the search simply has no
/// match; `related_candidates` may return an empty list; `batch_details`
/// silently drops ids the upstream does not know.
#[async_trait]
pub trait CandidateSource: Send + Sync {
    async fn find_seed_candidate(&self, text: &str) -> Result<Option<Candidate>, GatewayError>;

    async fn related_candidates(
        &self,
        video_id: &str,
        limit: u32,
    ) -> Result<Vec<Candidate>, GatewayError>;

    async fn batch_details(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, CandidateDetails>, GatewayError>;

    async fn popular_chart(
        &self,
        category_hint: &str,
        limit: u32,
    ) -> Result<Vec<Candidate>, GatewayError>;
}
