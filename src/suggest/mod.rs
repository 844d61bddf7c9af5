// src/suggest/mod.rs

//! Aggregation and ranking of per-seed candidate retrievals, plus the
//! popularity fallback used when primary ranking comes up empty.

pub mod engine;
pub mod fallback;
pub mod memo;

use serde::{Deserialize, Serialize};

pub use engine::{EngineConfig, SuggestionEngine};
pub use fallback::PopularityFallback;

/// One ranked suggestion in a response. Scores are capped to [0, 1] and no
/// two suggestions in a response share a `video_id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoredSuggestion {
    pub video_id: String,
    pub title: String,
    pub channel: String,
    pub score: f32,
    pub rank: usize,
}

/// Outcome of a suggestion request. An empty outcome is a normal condition,
/// not a fault.
#[derive(Debug, Clone, PartialEq)]
pub enum SuggestionResponse {
    Ranked(Vec<ScoredSuggestion>),
    NoSuggestions,
}

impl SuggestionResponse {
    pub fn is_empty(&self) -> bool {
        matches!(self, SuggestionResponse::NoSuggestions)
    }
}

/// Trim, case-fold. Used for seed dedup, memo keys and cache keys.
pub fn normalize_seed(seed: &str) -> String {
    seed.trim().to_lowercase()
}

/// Deduplicates seeds case-insensitively, preserving first-seen order.
/// Returns the original (trimmed) spelling of each surviving seed.
pub fn dedup_seeds(seeds: &[String]) -> Vec<String> {
    let mut seen: Vec<String> = Vec::new();
    let mut out: Vec<String> = Vec::new();
    for seed in seeds {
        let normalized = normalize_seed(seed);
        if normalized.is_empty() || seen.contains(&normalized) {
            continue;
        }
        seen.push(normalized);
        out.push(seed.trim().to_string());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedup_is_case_insensitive_and_order_preserving() {
        let seeds = vec![
            "Blinding Lights".to_string(),
            "  blinding lights ".to_string(),
            "As It Was".to_string(),
            "".to_string(),
            "BLINDING LIGHTS".to_string(),
        ];
        assert_eq!(dedup_seeds(&seeds), vec!["Blinding Lights", "As It Was"]);
    }
}
