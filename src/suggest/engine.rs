// src/suggest/engine.rs

use super::fallback::PopularityFallback;
use super::memo::{SeedMemo, SeedRetrieval};
use super::{ScoredSuggestion, SuggestionResponse, dedup_seeds, normalize_seed};
use crate::gateway::{Candidate, CandidateSource, GatewayError};
use crate::scoring::{CandidateScorer, Scored, SeedProfile};
use crate::store::{VideoFeatureRecord, WriteThroughStore};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub related_limit: u32,
    pub per_seed_cap: usize,
    pub top_n: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            related_limit: 25,
            per_seed_cap: 10,
            top_n: 5,
        }
    }
}

/// Fans retrieval and scoring out across the caller's seed items, merges the
/// per-seed results, and ranks them. Per-seed failures are absorbed here;
/// only a fully empty merge falls through to the popularity chart.
pub struct SuggestionEngine {
    source: Arc<dyn CandidateSource>,
    scorer: CandidateScorer,
    fallback: PopularityFallback,
    memo: SeedMemo,
    durable: Option<Arc<WriteThroughStore>>,
    config: EngineConfig,
}

impl SuggestionEngine {
    pub fn new(
        source: Arc<dyn CandidateSource>,
        scorer: CandidateScorer,
        fallback: PopularityFallback,
        memo: SeedMemo,
        durable: Option<Arc<WriteThroughStore>>,
        config: EngineConfig,
    ) -> Self {
        Self {
            source,
            scorer,
            fallback,
            memo,
            durable,
            config,
        }
    }

    pub async fn rank(&self, seeds: &[String]) -> SuggestionResponse {
        let seeds = dedup_seeds(seeds);
        let seed_titles: Vec<String> = seeds.iter().map(|s| normalize_seed(s)).collect();

        let mut merge = MergeSet::default();
        for seed in &seeds {
            match self.retrieve(seed).await {
                Ok(Some((seed_candidate, related))) => {
                    let profile = SeedProfile {
                        text: seed.clone(),
                        candidate: seed_candidate.clone(),
                    };
                    let mut scored = self.scorer.score(&profile, related);
                    scored.retain(|s| {
                        s.candidate.video_id != seed_candidate.video_id
                            && !seed_titles.contains(&normalize_seed(&s.candidate.title))
                    });
                    scored.truncate(self.config.per_seed_cap);
                    debug!(seed = %seed, kept = scored.len(), "seed scored");
                    for s in scored {
                        merge.insert(s);
                    }
                }
                Ok(None) => {
                    warn!(seed = %seed, "no seed candidate found, skipping seed");
                }
                Err(e) => {
                    warn!(
                        seed = %seed,
                        error = %e,
                        transient = e.is_transient(),
                        "seed retrieval failed, skipping seed"
                    );
                }
            }
        }

        let ranked = merge.into_ranked(self.config.top_n);
        if !ranked.is_empty() {
            info!(count = ranked.len(), "ranked suggestions");
            return SuggestionResponse::Ranked(ranked);
        }

        match self.fallback.pick().await {
            Some(candidate) => {
                info!(video_id = %candidate.video_id, "serving popularity fallback");
                let score = self.scorer.popularity_prior(candidate.view_count).clamp(0.0, 1.0);
                SuggestionResponse::Ranked(vec![ScoredSuggestion {
                    video_id: candidate.video_id,
                    title: candidate.title,
                    channel: candidate.channel,
                    score,
                    rank: 1,
                }])
            }
            None => SuggestionResponse::NoSuggestions,
        }
    }

    /// Per-seed retrieval: memo tier first, then the durable query/feature
    /// caches, then the upstream. Enriched results are memoized and written
    /// back to the durable caches best-effort.
    async fn retrieve(&self, seed: &str) -> Result<Option<SeedRetrieval>, GatewayError> {
        let key = normalize_seed(seed);
        if let Some(hit) = self.memo.get(&key) {
            debug!(seed, "seed memo hit");
            return Ok(Some(hit));
        }

        let seed_candidate = match self.locate_seed(&key, seed).await? {
            Some(candidate) => candidate,
            None => return Ok(None),
        };

        let mut related = self
            .source
            .related_candidates(&seed_candidate.video_id, self.config.related_limit)
            .await?;
        self.enrich(&mut related).await?;

        let retrieval = (seed_candidate, related);
        self.memo.put(key, retrieval.clone());
        Ok(Some(retrieval))
    }

    async fn locate_seed(
        &self,
        normalized: &str,
        original: &str,
    ) -> Result<Option<Candidate>, GatewayError> {
        if let Some(store) = &self.durable {
            if let Some(video_id) = store.cached_query(normalized).await {
                if let Some(features) = store.video_features(&video_id).await {
                    debug!(seed = original, "seed resolved from durable query cache");
                    return Ok(Some(features.into_candidate()));
                }
            }
        }

        let found = self.source.find_seed_candidate(original).await?;
        if let (Some(store), Some(candidate)) = (&self.durable, &found) {
            store.remember_query(normalized, &candidate.video_id).await;
            store
                .remember_features(&VideoFeatureRecord::from(candidate))
                .await;
        }
        Ok(found)
    }

    async fn enrich(&self, related: &mut [Candidate]) -> Result<(), GatewayError> {
        let ids: Vec<String> = related.iter().map(|c| c.video_id.clone()).collect();
        let details = self.source.batch_details(&ids).await?;
        for candidate in related.iter_mut() {
            if let Some(d) = details.get(&candidate.video_id) {
                candidate.apply_details(d);
            }
        }
        if let Some(store) = &self.durable {
            for candidate in related.iter() {
                store
                    .remember_features(&VideoFeatureRecord::from(candidate))
                    .await;
            }
        }
        Ok(())
    }
}

/// Merge across seeds with two dedup keys: candidate id and normalized
/// title. A collision on either key keeps the higher score; discovery order
/// is the stable tie-break for the final sort.
#[derive(Default)]
struct MergeSet {
    entries: Vec<(Candidate, f32)>,
    by_id: HashMap<String, usize>,
    by_title: HashMap<String, usize>,
}

impl MergeSet {
    fn insert(&mut self, scored: Scored) {
        let title_key = normalize_seed(&scored.candidate.title);
        if let Some(&index) = self.by_id.get(&scored.candidate.video_id) {
            if scored.score > self.entries[index].1 {
                self.entries[index].1 = scored.score;
            }
            self.by_title.entry(title_key).or_insert(index);
            return;
        }
        if let Some(&index) = self.by_title.get(&title_key) {
            if scored.score > self.entries[index].1 {
                self.entries[index].1 = scored.score;
            }
            self.by_id
                .entry(scored.candidate.video_id.clone())
                .or_insert(index);
            return;
        }
        let index = self.entries.len();
        self.by_id.insert(scored.candidate.video_id.clone(), index);
        self.by_title.insert(title_key, index);
        self.entries.push((scored.candidate, scored.score));
    }

    fn into_ranked(self, top_n: usize) -> Vec<ScoredSuggestion> {
        let mut entries = self.entries;
        // Stable sort keeps discovery order among equal scores.
        entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        entries
            .into_iter()
            .take(top_n)
            .enumerate()
            .map(|(i, (candidate, score))| ScoredSuggestion {
                video_id: candidate.video_id,
                title: candidate.title,
                channel: candidate.channel,
                score,
                rank: i + 1,
            })
            .collect()
    }
}
