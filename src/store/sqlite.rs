// src/store/sqlite.rs
//! SQLite-backed durable store. Schema is created at startup so a fresh
//! database file is usable immediately.

use super::{DurableStore, StoreError, UserLikeRecord, VideoFeatureRecord, tags_from_json, tags_to_json};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use std::time::Duration;

const CREATE_USER_LIKED_SONGS: &str = r#"
CREATE TABLE IF NOT EXISTS user_liked_songs (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id TEXT NOT NULL,
    seed_text TEXT NOT NULL,
    created_at DATETIME NOT NULL,
    UNIQUE(user_id, seed_text)
);
"#;

const CREATE_QUERY_CACHE: &str = r#"
CREATE TABLE IF NOT EXISTS query_cache (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT NOT NULL UNIQUE,
    best_video_id TEXT NOT NULL,
    updated_at DATETIME NOT NULL
);
"#;

const CREATE_VIDEO_FEATURES: &str = r#"
CREATE TABLE IF NOT EXISTS video_features (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    video_id TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    channel_title TEXT NOT NULL,
    tags TEXT,
    description TEXT,
    view_count INTEGER,
    duration_secs INTEGER,
    updated_at DATETIME NOT NULL
);
"#;

pub struct SqliteStore {
    pool: SqlitePool,
    name: String,
}

impl SqliteStore {
    /// Connects, then runs the idempotent migrations.
    pub async fn connect(
        url: &str,
        max_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(acquire_timeout)
            .connect(url)
            .await?;
        let store = Self::new(pool);
        store.migrate().await?;
        Ok(store)
    }

    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            name: "sqlite".to_string(),
        }
    }

    pub async fn migrate(&self) -> Result<(), StoreError> {
        sqlx::query(CREATE_USER_LIKED_SONGS).execute(&self.pool).await?;
        sqlx::query(CREATE_QUERY_CACHE).execute(&self.pool).await?;
        sqlx::query(CREATE_VIDEO_FEATURES).execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl DurableStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn upsert_like(&self, user_id: &str, seed_text: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO user_liked_songs (user_id, seed_text, created_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id, seed_text) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(seed_text)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn load_likes(&self, user_id: &str) -> Result<Vec<UserLikeRecord>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT user_id, seed_text, created_at
            FROM user_liked_songs
            WHERE user_id = ?
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| UserLikeRecord {
                user_id: row.get("user_id"),
                seed_text: row.get("seed_text"),
                created_at: row.get("created_at"),
            })
            .collect())
    }

    async fn cached_query(&self, query: &str) -> Result<Option<String>, StoreError> {
        let row = sqlx::query("SELECT best_video_id FROM query_cache WHERE query = ?")
            .bind(query)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|r| r.get("best_video_id")))
    }

    async fn upsert_cached_query(&self, query: &str, video_id: &str) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO query_cache (query, best_video_id, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(query) DO UPDATE SET
                best_video_id = excluded.best_video_id,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(query)
        .bind(video_id)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    async fn video_features(&self, video_id: &str) -> Result<Option<VideoFeatureRecord>, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT video_id, title, channel_title, tags, description, view_count, duration_secs
            FROM video_features
            WHERE video_id = ?
            "#,
        )
        .bind(video_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| VideoFeatureRecord {
            video_id: row.get("video_id"),
            title: row.get("title"),
            channel: row.get("channel_title"),
            tags: tags_from_json(row.get("tags")),
            description: row.get::<Option<String>, _>("description").unwrap_or_default(),
            view_count: row.get::<Option<i64>, _>("view_count").unwrap_or(0).max(0) as u64,
            duration_secs: row
                .get::<Option<i64>, _>("duration_secs")
                .and_then(|d| u64::try_from(d).ok()),
        }))
    }

    async fn upsert_video_features(&self, record: &VideoFeatureRecord) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"
            INSERT INTO video_features
                (video_id, title, channel_title, tags, description, view_count, duration_secs, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(video_id) DO UPDATE SET
                title = excluded.title,
                channel_title = excluded.channel_title,
                tags = excluded.tags,
                description = excluded.description,
                view_count = excluded.view_count,
                duration_secs = excluded.duration_secs,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&record.video_id)
        .bind(&record.title)
        .bind(&record.channel)
        .bind(tags_to_json(&record.tags))
        .bind(&record.description)
        .bind(record.view_count as i64)
        .bind(record.duration_secs.map(|d| d as i64))
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }
}
