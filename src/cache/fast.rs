// src/cache/fast.rs

use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{info, warn};

/// The distributed fast tier, backed by Redis.
///
/// Every operation is bounded by a short timeout and absorbs its own
/// failures: an unreachable tier only costs latency, never correctness.
#[derive(Clone)]
pub struct FastCache {
    conn: ConnectionManager,
    op_timeout: Duration,
}

impl FastCache {
    pub async fn connect(url: &str, op_timeout: Duration) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        info!(url, "fast cache tier connected");
        Ok(Self { conn, op_timeout })
    }

    /// Reachability probe. False only says the tier is degraded right now.
    pub async fn ping(&self) -> bool {
        let mut conn = self.conn.clone();
        let cmd = redis::cmd("PING");
        let ping = cmd.query_async::<String>(&mut conn);
        matches!(timeout(self.op_timeout, ping).await, Ok(Ok(_)))
    }

    pub async fn get(&self, key: &str) -> Option<Vec<u8>> {
        let mut conn = self.conn.clone();
        match timeout(self.op_timeout, conn.get::<_, Option<Vec<u8>>>(key)).await {
            Ok(Ok(value)) => value,
            Ok(Err(e)) => {
                warn!(error = %e, "fast tier read failed, degrading");
                None
            }
            Err(_) => {
                warn!("fast tier read timed out, degrading");
                None
            }
        }
    }

    pub async fn set(&self, key: &str, payload: &[u8], ttl: Duration) {
        let mut conn = self.conn.clone();
        let ttl_secs = ttl.as_secs().max(1);
        match timeout(
            self.op_timeout,
            conn.set_ex::<_, _, ()>(key, payload, ttl_secs),
        )
        .await
        {
            Ok(Ok(())) => {}
            Ok(Err(e)) => warn!(error = %e, "fast tier write failed, skipping"),
            Err(_) => warn!("fast tier write timed out, skipping"),
        }
    }
}
