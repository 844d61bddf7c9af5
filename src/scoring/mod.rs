// src/scoring/mod.rs
// Text-similarity scoring with heuristic boosts

//! Ranks candidates against a seed by cosine similarity over a per-batch
//! TF-IDF vector space, then layers capped heuristic bonuses on top. The
//! final score is clamped to [0, 1].

use crate::gateway::Candidate;
use std::collections::HashMap;
use tracing::debug;

/// Tuning constants for the scoring formula. The shape of the formula is
/// fixed (similarity plus bounded boosts, clamped); the constants are not.
#[derive(Debug, Clone)]
pub struct ScoringConfig {
    pub min_score: f32,
    pub min_duration_secs: u64,
    pub official_video_bonus: f32,
    pub title_overlap_scale: f32,
    pub channel_match_bonus: f32,
    pub popularity_cap: f32,
    pub popularity_pivot: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            min_score: 0.1,
            min_duration_secs: 60,
            official_video_bonus: 0.15,
            title_overlap_scale: 0.2,
            channel_match_bonus: 0.1,
            popularity_cap: 0.15,
            popularity_pivot: 100_000_000.0,
        }
    }
}

/// The located seed: caller text plus the upstream candidate it resolved to.
#[derive(Debug, Clone)]
pub struct SeedProfile {
    pub text: String,
    pub candidate: Candidate,
}

/// A candidate with its final score, before aggregation assigns ranks.
#[derive(Debug, Clone)]
pub struct Scored {
    pub candidate: Candidate,
    pub score: f32,
}

pub struct CandidateScorer {
    config: ScoringConfig,
}

impl CandidateScorer {
    pub fn new(config: ScoringConfig) -> Self {
        Self { config }
    }

    /// Scores `candidates` against the seed, dropping short-form entries
    /// before scoring and sub-threshold entries after. The returned list is
    /// sorted descending, stable in the candidates' input order.
    pub fn score(&self, seed: &SeedProfile, candidates: Vec<Candidate>) -> Vec<Scored> {
        let candidates: Vec<Candidate> = candidates
            .into_iter()
            .filter(|c| c.duration_secs.unwrap_or(0) >= self.config.min_duration_secs)
            .collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        let seed_tokens = tokenize(&seed.text);
        let candidate_tokens: Vec<Vec<String>> =
            candidates.iter().map(|c| tokenize(&corpus_text(c))).collect();

        let mut docs: Vec<&[String]> = Vec::with_capacity(candidate_tokens.len() + 1);
        docs.push(&seed_tokens);
        for tokens in &candidate_tokens {
            docs.push(tokens);
        }
        let model = TfIdfModel::fit(&docs);
        let seed_vector = model.vector(&seed_tokens);

        let seed_title_tokens = tokenize(&seed.candidate.title);
        let mut scored: Vec<Scored> = candidates
            .into_iter()
            .zip(candidate_tokens.iter())
            .map(|(candidate, tokens)| {
                let similarity = cosine_similarity(&seed_vector, &model.vector(tokens));
                let boosts = self.boosts(seed, &seed_title_tokens, &candidate);
                let score = (similarity + boosts).clamp(0.0, 1.0);
                debug!(
                    video_id = %candidate.video_id,
                    similarity,
                    boosts,
                    score,
                    "scored candidate"
                );
                Scored { candidate, score }
            })
            .filter(|s| s.score >= self.config.min_score)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored
    }

    fn boosts(&self, seed: &SeedProfile, seed_title_tokens: &[String], candidate: &Candidate) -> f32 {
        let mut bonus = 0.0;

        let title_lower = candidate.title.to_lowercase();
        if title_lower.contains("official video") || title_lower.contains("official music video") {
            bonus += self.config.official_video_bonus;
        }

        if !seed_title_tokens.is_empty() {
            let candidate_title_tokens = tokenize(&candidate.title);
            let overlap = seed_title_tokens
                .iter()
                .filter(|t| candidate_title_tokens.contains(t))
                .count();
            let ratio = overlap as f32 / seed_title_tokens.len() as f32;
            bonus += ratio * self.config.title_overlap_scale;
        }

        if !candidate.channel.is_empty()
            && candidate.channel.eq_ignore_ascii_case(&seed.candidate.channel)
        {
            bonus += self.config.channel_match_bonus;
        }

        bonus += self.popularity_prior(candidate.view_count);
        bonus
    }

    /// Monotone, sub-linear view-count prior, capped so popularity can never
    /// dominate similarity.
    pub fn popularity_prior(&self, view_count: u64) -> f32 {
        let normalized =
            ((1.0 + view_count as f64).ln() / (1.0 + self.config.popularity_pivot).ln()) as f32;
        self.config.popularity_cap * normalized.min(1.0)
    }

}

/// Lower-cases and splits on anything non-alphanumeric.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// One bag-of-words document per candidate: title, channel, description and
/// tags, concatenated.
fn corpus_text(candidate: &Candidate) -> String {
    let mut text = String::with_capacity(
        candidate.title.len() + candidate.channel.len() + candidate.description.len() + 64,
    );
    text.push_str(&candidate.title);
    text.push(' ');
    text.push_str(&candidate.channel);
    text.push(' ');
    text.push_str(&candidate.description);
    for tag in &candidate.tags {
        text.push(' ');
        text.push_str(tag);
    }
    text
}

/// TF-IDF weights fitted over one batch of documents. No global vocabulary
/// survives between batches.
struct TfIdfModel {
    idf: HashMap<String, f32>,
}

impl TfIdfModel {
    fn fit(docs: &[&[String]]) -> Self {
        let n = docs.len() as f32;
        let mut df: HashMap<&str, u32> = HashMap::new();
        for doc in docs {
            let mut seen: Vec<&str> = Vec::new();
            for term in doc.iter() {
                if !seen.contains(&term.as_str()) {
                    seen.push(term);
                    *df.entry(term).or_insert(0) += 1;
                }
            }
        }
        let idf = df
            .into_iter()
            .map(|(term, count)| (term.to_string(), (n / (1.0 + count as f32)).ln() + 1.0))
            .collect();
        Self { idf }
    }

    fn vector(&self, tokens: &[String]) -> HashMap<&str, f32> {
        if tokens.is_empty() {
            return HashMap::new();
        }
        let mut counts: HashMap<&str, f32> = HashMap::new();
        for token in tokens {
            *counts.entry(token.as_str()).or_insert(0.0) += 1.0;
        }
        let len = tokens.len() as f32;
        counts
            .into_iter()
            .filter_map(|(term, count)| {
                let (term, idf) = self.idf.get_key_value(term)?;
                Some((term.as_str(), (count / len) * idf))
            })
            .collect()
    }
}

/// Cosine similarity over sparse non-negative term weights, in [0, 1].
/// Empty vectors compare as 0, never an error.
fn cosine_similarity(a: &HashMap<&str, f32>, b: &HashMap<&str, f32>) -> f32 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let dot: f32 = a
        .iter()
        .filter_map(|(term, weight)| b.get(term).map(|other| weight * other))
        .sum();
    let norm_a: f32 = a.values().map(|w| w * w).sum::<f32>().sqrt();
    let norm_b: f32 = b.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        (dot / (norm_a * norm_b)).clamp(0.0, 1.0)
    }
}
