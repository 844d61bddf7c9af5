// src/config/mod.rs
// All tuning knobs load from the environment with code defaults.

use serde::Deserialize;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct EncoreConfig {
    // ── Upstream metadata service
    pub youtube_api_key: String,
    pub youtube_api_base: String,
    pub upstream_timeout_secs: u64,
    pub related_limit: u32,
    pub chart_limit: u32,
    pub chart_category: String,

    // ── Ranking
    pub top_n: usize,
    pub per_seed_cap: usize,
    pub min_score: f32,
    pub min_duration_secs: u64,
    pub official_video_bonus: f32,
    pub title_overlap_scale: f32,
    pub channel_match_bonus: f32,
    pub popularity_cap: f32,
    pub popularity_pivot: f64,

    // ── Cache tiers
    pub redis_url: String,
    pub redis_timeout_ms: u64,
    pub suggestion_ttl_secs: u64,
    pub seed_memo_capacity: usize,

    // ── Durable stores
    pub sqlite_url: String,
    pub postgres_url: String,
    pub read_preferred_store: String,
    pub store_max_connections: u32,
    pub store_acquire_timeout_secs: u64,

    // ── Server
    pub host: String,
    pub port: u16,

    // ── Logging
    pub log_level: String,
}

fn env_var_or<T>(key: &str, default: T) -> T
where
    T: FromStr,
{
    match std::env::var(key) {
        Ok(val) => {
            let clean_val = val.split('#').next().unwrap_or("").trim();
            match clean_val.parse::<T>() {
                Ok(parsed) => parsed,
                Err(_) => {
                    eprintln!("Config: {} = '{}' (parse failed, using default)", key, val);
                    default
                }
            }
        }
        Err(_) => default,
    }
}

impl EncoreConfig {
    pub fn from_env() -> Self {
        if dotenvy::dotenv().is_err() {
            eprintln!("Warning: .env file not found. Using environment variables and defaults.");
        }

        Self {
            youtube_api_key: env_var_or("YOUTUBE_API_KEY", String::new()),
            youtube_api_base: env_var_or(
                "YOUTUBE_API_BASE",
                "https://www.googleapis.com/youtube/v3".to_string(),
            ),
            upstream_timeout_secs: env_var_or("ENCORE_UPSTREAM_TIMEOUT", 10),
            related_limit: env_var_or("ENCORE_RELATED_LIMIT", 25),
            chart_limit: env_var_or("ENCORE_CHART_LIMIT", 10),
            chart_category: env_var_or("ENCORE_CHART_CATEGORY", "10".to_string()),
            top_n: env_var_or("ENCORE_TOP_N", 5),
            per_seed_cap: env_var_or("ENCORE_PER_SEED_CAP", 10),
            min_score: env_var_or("ENCORE_MIN_SCORE", 0.1),
            min_duration_secs: env_var_or("ENCORE_MIN_DURATION_SECS", 60),
            official_video_bonus: env_var_or("ENCORE_OFFICIAL_VIDEO_BONUS", 0.15),
            title_overlap_scale: env_var_or("ENCORE_TITLE_OVERLAP_SCALE", 0.2),
            channel_match_bonus: env_var_or("ENCORE_CHANNEL_MATCH_BONUS", 0.1),
            popularity_cap: env_var_or("ENCORE_POPULARITY_CAP", 0.15),
            popularity_pivot: env_var_or("ENCORE_POPULARITY_PIVOT", 100_000_000.0),
            redis_url: env_var_or("REDIS_URL", String::new()),
            redis_timeout_ms: env_var_or("ENCORE_REDIS_TIMEOUT_MS", 250),
            suggestion_ttl_secs: env_var_or("ENCORE_SUGGESTION_TTL", 3600),
            seed_memo_capacity: env_var_or("ENCORE_SEED_MEMO_CAPACITY", 256),
            sqlite_url: env_var_or("DATABASE_URL", "sqlite:./encore.db".to_string()),
            postgres_url: env_var_or("POSTGRES_URL", String::new()),
            read_preferred_store: env_var_or("ENCORE_READ_PREFERRED", "sqlite".to_string()),
            store_max_connections: env_var_or("STORE_MAX_CONNECTIONS", 5),
            store_acquire_timeout_secs: env_var_or("STORE_ACQUIRE_TIMEOUT", 5),
            host: env_var_or("ENCORE_HOST", "0.0.0.0".to_string()),
            port: env_var_or("ENCORE_PORT", 3002),
            log_level: env_var_or("ENCORE_LOG_LEVEL", "info".to_string()),
        }
    }

    /// Server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_secs)
    }

    pub fn redis_timeout(&self) -> Duration {
        Duration::from_millis(self.redis_timeout_ms)
    }

    pub fn suggestion_ttl(&self) -> Duration {
        Duration::from_secs(self.suggestion_ttl_secs)
    }

    /// Whether a fast cache tier is configured at all.
    pub fn fast_tier_enabled(&self) -> bool {
        !self.redis_url.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let config = EncoreConfig::from_env();
        assert!(config.top_n > 0);
        assert!(config.per_seed_cap >= config.top_n);
        assert!(config.min_score >= 0.0 && config.min_score < 1.0);
        assert!(config.suggestion_ttl() > Duration::ZERO);
    }
}
