// src/main.rs

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

use encore::cache::{FastCache, SuggestionCache};
use encore::config::EncoreConfig;
use encore::gateway::YouTubeClient;
use encore::scoring::{CandidateScorer, ScoringConfig};
use encore::server;
use encore::service::SuggestionService;
use encore::store::{DurableStore, PostgresStore, SqliteStore, WriteThroughStore};
use encore::suggest::memo::SeedMemo;
use encore::suggest::{EngineConfig, PopularityFallback, SuggestionEngine};

#[derive(Parser, Debug)]
#[command(name = "encore", about = "Related-song suggestion service")]
struct Args {
    /// Override the configured bind host
    #[arg(long)]
    host: Option<String>,

    /// Override the configured bind port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let mut config = EncoreConfig::from_env();
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }

    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Starting Encore suggestion service");
    anyhow::ensure!(
        !config.youtube_api_key.is_empty(),
        "YOUTUBE_API_KEY must be set"
    );

    // ── Durable stores ──────────────────────────────────────────────
    let acquire_timeout = std::time::Duration::from_secs(config.store_acquire_timeout_secs);
    let mut stores: Vec<Arc<dyn DurableStore>> = Vec::new();
    if !config.sqlite_url.is_empty() {
        let sqlite =
            SqliteStore::connect(&config.sqlite_url, config.store_max_connections, acquire_timeout)
                .await
                .context("connecting sqlite store")?;
        stores.push(Arc::new(sqlite));
    }
    if !config.postgres_url.is_empty() {
        match PostgresStore::connect(
            &config.postgres_url,
            config.store_max_connections,
            acquire_timeout,
        )
        .await
        {
            Ok(postgres) => stores.push(Arc::new(postgres)),
            Err(e) => warn!(error = %e, "postgres store unavailable, continuing without it"),
        }
    }
    let store = Arc::new(WriteThroughStore::new(stores, &config.read_preferred_store));
    info!(stores = ?store.store_names(), "durable stores configured");

    // ── Upstream gateway ────────────────────────────────────────────
    let gateway = Arc::new(YouTubeClient::new(
        config.youtube_api_key.clone(),
        config.youtube_api_base.clone(),
        config.upstream_timeout(),
    )?);

    // ── Suggestion engine ───────────────────────────────────────────
    let scorer = CandidateScorer::new(ScoringConfig {
        min_score: config.min_score,
        min_duration_secs: config.min_duration_secs,
        official_video_bonus: config.official_video_bonus,
        title_overlap_scale: config.title_overlap_scale,
        channel_match_bonus: config.channel_match_bonus,
        popularity_cap: config.popularity_cap,
        popularity_pivot: config.popularity_pivot,
    });
    let fallback = PopularityFallback::new(
        gateway.clone(),
        config.chart_category.clone(),
        config.chart_limit,
    );
    let engine = SuggestionEngine::new(
        gateway,
        scorer,
        fallback,
        SeedMemo::new(config.seed_memo_capacity),
        Some(store.clone()),
        EngineConfig {
            related_limit: config.related_limit,
            per_seed_cap: config.per_seed_cap,
            top_n: config.top_n,
        },
    );

    // ── Cache tiers ─────────────────────────────────────────────────
    let fast = if config.fast_tier_enabled() {
        match FastCache::connect(&config.redis_url, config.redis_timeout()).await {
            Ok(fast) => {
                if !fast.ping().await {
                    warn!("fast cache tier connected but not responding to ping");
                }
                Some(fast)
            }
            Err(e) => {
                warn!(error = %e, "fast cache tier unavailable, running on local tier only");
                None
            }
        }
    } else {
        None
    };
    let cache = SuggestionCache::new(fast, config.suggestion_ttl());

    let service = Arc::new(SuggestionService::new(cache, engine, store));

    // ── Serve ───────────────────────────────────────────────────────
    let app = server::router(service);
    let bind_address = config.bind_address();
    info!(%bind_address, "listening");
    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
