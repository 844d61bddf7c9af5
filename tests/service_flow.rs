// tests/service_flow.rs
// End-to-end behavior of the suggestion facade with a scripted upstream.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use encore::cache::SuggestionCache;
use encore::gateway::{Candidate, CandidateDetails, CandidateSource, GatewayError};
use encore::scoring::{CandidateScorer, ScoringConfig};
use encore::service::SuggestionService;
use encore::store::{SqliteStore, WriteThroughStore};
use encore::suggest::memo::SeedMemo;
use encore::suggest::{EngineConfig, PopularityFallback, SuggestionEngine, SuggestionResponse};
use sqlx::sqlite::SqlitePoolOptions;

fn candidate(id: &str, title: &str, channel: &str, views: u64, duration: u64) -> Candidate {
    Candidate {
        video_id: id.to_string(),
        title: title.to_string(),
        channel: channel.to_string(),
        description: format!("{title} by {channel}"),
        tags: vec![channel.to_lowercase()],
        view_count: views,
        duration_secs: Some(duration),
    }
}

/// Upstream double: canned seed/related/chart data plus call counters.
#[derive(Default)]
struct ScriptedSource {
    seed: Option<Candidate>,
    related: Vec<Candidate>,
    chart: Vec<Candidate>,
    fail_search: bool,
    find_calls: AtomicUsize,
}

impl ScriptedSource {
    fn find_call_count(&self) -> usize {
        self.find_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CandidateSource for ScriptedSource {
    async fn find_seed_candidate(&self, _text: &str) -> Result<Option<Candidate>, GatewayError> {
        self.find_calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_search {
            return Err(GatewayError::RateLimited { status: 429 });
        }
        Ok(self.seed.clone())
    }

    async fn related_candidates(
        &self,
        _video_id: &str,
        limit: u32,
    ) -> Result<Vec<Candidate>, GatewayError> {
        Ok(self.related.iter().take(limit as usize).cloned().collect())
    }

    async fn batch_details(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, CandidateDetails>, GatewayError> {
        Ok(self
            .related
            .iter()
            .chain(self.chart.iter())
            .filter(|c| ids.contains(&c.video_id))
            .map(|c| {
                (
                    c.video_id.clone(),
                    CandidateDetails {
                        description: c.description.clone(),
                        tags: c.tags.clone(),
                        view_count: c.view_count,
                        duration_secs: c.duration_secs,
                    },
                )
            })
            .collect())
    }

    async fn popular_chart(
        &self,
        _category_hint: &str,
        limit: u32,
    ) -> Result<Vec<Candidate>, GatewayError> {
        Ok(self.chart.iter().take(limit as usize).cloned().collect())
    }
}

async fn memory_store() -> Arc<WriteThroughStore> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    let sqlite = SqliteStore::new(pool);
    sqlite.migrate().await.unwrap();
    Arc::new(WriteThroughStore::new(vec![Arc::new(sqlite)], "sqlite"))
}

async fn build_service(source: Arc<ScriptedSource>) -> SuggestionService {
    let store = memory_store().await;
    let scorer = CandidateScorer::new(ScoringConfig::default());
    let fallback = PopularityFallback::new(source.clone(), "10".to_string(), 10);
    let engine = SuggestionEngine::new(
        source,
        scorer,
        fallback,
        SeedMemo::new(16),
        Some(store.clone()),
        EngineConfig::default(),
    );
    let cache = SuggestionCache::new(None, Duration::from_secs(300));
    SuggestionService::new(cache, engine, store)
}

fn weeknd_source() -> Arc<ScriptedSource> {
    Arc::new(ScriptedSource {
        seed: Some(candidate("A", "Blinding Lights", "The Weeknd", 500_000_000, 260)),
        related: vec![
            candidate(
                "B",
                "Blinding Lights (Official Video)",
                "The Weeknd",
                2_000_000_000,
                263,
            ),
            candidate(
                "C",
                "Save Your Tears (Official Video)",
                "The Weeknd",
                1_000_000_000,
                215,
            ),
            candidate("D", "Blinding Lights Remix", "DJ Somebody", 5_000_000, 180),
        ],
        chart: vec![candidate("Z", "Global Hit", "Chart Channel", 3_000_000_000, 200)],
        ..ScriptedSource::default()
    })
}

#[tokio::test]
async fn ranked_suggestions_are_deduplicated_and_descending() {
    let source = weeknd_source();
    let service = build_service(source).await;

    let seeds = vec!["Blinding Lights".to_string()];
    let response = service.get_suggestions("user-1", &seeds).await;

    let ranked = match response {
        SuggestionResponse::Ranked(ranked) => ranked,
        SuggestionResponse::NoSuggestions => panic!("expected ranked suggestions"),
    };
    assert!(!ranked.is_empty());
    assert!(ranked.len() <= 5);

    let mut ids: Vec<&str> = ranked.iter().map(|s| s.video_id.as_str()).collect();
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), ranked.len(), "duplicate video ids in response");

    for window in ranked.windows(2) {
        assert!(window[0].score >= window[1].score, "scores not descending");
    }
    for (i, suggestion) in ranked.iter().enumerate() {
        assert!((0.0..=1.0).contains(&suggestion.score));
        assert_eq!(suggestion.rank, i + 1);
    }
    // The seed video itself must not be suggested back.
    assert!(ranked.iter().all(|s| s.video_id != "A"));
}

#[tokio::test]
async fn repeated_request_is_served_from_cache_without_recompute() {
    let source = weeknd_source();
    let service = build_service(source.clone()).await;

    let seeds = vec!["Blinding Lights".to_string()];
    let first = service.get_suggestions("user-1", &seeds).await;
    let calls_after_first = source.find_call_count();
    assert_eq!(calls_after_first, 1);

    // Same seed set, different order/casing still maps to the same key.
    let second = service
        .get_suggestions("user-1", &vec!["  BLINDING LIGHTS ".to_string()])
        .await;
    assert_eq!(first, second);
    assert_eq!(source.find_call_count(), calls_after_first, "engine ran again");
}

#[tokio::test]
async fn unknown_seed_falls_back_to_popular_chart() {
    let source = Arc::new(ScriptedSource {
        seed: None,
        chart: vec![
            candidate("X", "Minor Hit", "Channel X", 100, 200),
            candidate("Y", "Major Hit", "Channel Y", 999_999, 200),
        ],
        ..ScriptedSource::default()
    });
    let service = build_service(source).await;

    let seeds = vec!["zzz-nonexistent-song-zzz".to_string()];
    match service.get_suggestions("user-1", &seeds).await {
        SuggestionResponse::Ranked(ranked) => {
            assert_eq!(ranked.len(), 1);
            assert_eq!(ranked[0].video_id, "Y");
            assert_eq!(ranked[0].rank, 1);
            assert!((0.0..=1.0).contains(&ranked[0].score));
        }
        SuggestionResponse::NoSuggestions => panic!("expected fallback suggestion"),
    }
}

#[tokio::test]
async fn no_suggestions_when_ranking_and_fallback_are_both_empty() {
    let source = Arc::new(ScriptedSource::default());
    let service = build_service(source).await;

    let seeds = vec!["zzz-nonexistent-song-zzz".to_string()];
    let response = service.get_suggestions("user-1", &seeds).await;
    assert_eq!(response, SuggestionResponse::NoSuggestions);
}

#[tokio::test]
async fn upstream_failure_degrades_to_fallback_not_error() {
    let source = Arc::new(ScriptedSource {
        fail_search: true,
        chart: vec![candidate("Z", "Global Hit", "Chart Channel", 3_000_000_000, 200)],
        ..ScriptedSource::default()
    });
    let service = build_service(source).await;

    let seeds = vec!["anything".to_string()];
    match service.get_suggestions("user-1", &seeds).await {
        SuggestionResponse::Ranked(ranked) => {
            assert_eq!(ranked.len(), 1);
            assert_eq!(ranked[0].video_id, "Z");
        }
        SuggestionResponse::NoSuggestions => panic!("expected fallback suggestion"),
    }
}

#[tokio::test]
async fn record_like_is_idempotent_per_store() {
    let source = weeknd_source();
    let service = build_service(source).await;

    service.record_like("user-1", "Blinding Lights").await.unwrap();
    let receipt = service.record_like("user-1", "Blinding Lights").await.unwrap();
    assert_eq!(receipt.committed, vec!["sqlite"]);
    assert!(receipt.failed.is_empty());

    let likes = service.load_likes("user-1").await;
    assert_eq!(likes.len(), 1);
    assert_eq!(likes[0].seed_text, "Blinding Lights");
    assert!(service.load_likes("user-2").await.is_empty());
}
