use async_trait::async_trait;
use redis::{AsyncCommands, RedisResult};
use skywings_core::repository::{BookingContextStore, RateLimiter};
use skywings_core::{BookingContext, RepoError, RepoResult};
use tracing::{debug, warn};

const CONTEXT_FIELD: &str = "context";

#[derive(Clone)]
pub struct RedisClient {
    client: redis::Client,
}

impl RedisClient {
    pub async fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub async fn hset_field(&self, key: &str, field: &str, value: &str) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.hset(key, field, value).await
    }

    pub async fn hget_field(&self, key: &str, field: &str) -> RedisResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.hget(key, field).await
    }

    pub async fn expire_key(&self, key: &str, ttl_seconds: u64) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.expire(key, ttl_seconds as i64).await
    }

    pub async fn del_key(&self, key: &str) -> RedisResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        conn.del(key).await
    }

    /// Counts a hit in a fixed window. The first hit creates the counter with
    /// its expiry; later hits only increment, so the window never slides.
    pub async fn check_rate_limit(&self, key: &str, limit: i64, window_seconds: u64) -> RedisResult<bool> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let (count,): (i64,) = redis::pipe()
            .atomic()
            .cmd("SET")
            .arg(key)
            .arg(0)
            .arg("EX")
            .arg(window_seconds.max(1))
            .arg("NX")
            .ignore()
            .incr(key, 1)
            .query_async(&mut conn)
            .await?;

        Ok(count <= limit)
    }
}

fn cache_err(e: redis::RedisError) -> RepoError {
    RepoError::Cache(e.to_string())
}

fn context_key(session_id: &str) -> String {
    format!("booking:{}", session_id)
}

/// Booking contexts as JSON in a per-session hash, expiring with the session.
pub struct RedisContextStore {
    redis: RedisClient,
    ttl_seconds: u64,
}

impl RedisContextStore {
    pub fn new(redis: RedisClient, ttl_seconds: u64) -> Self {
        Self { redis, ttl_seconds }
    }
}

#[async_trait]
impl BookingContextStore for RedisContextStore {
    async fn load(&self, session_id: &str) -> RepoResult<Option<BookingContext>> {
        let raw = self
            .redis
            .hget_field(&context_key(session_id), CONTEXT_FIELD)
            .await
            .map_err(cache_err)?;

        match raw {
            Some(json) => match serde_json::from_str(&json) {
                Ok(ctx) => Ok(Some(ctx)),
                Err(e) => {
                    // unreadable contexts are treated as absent and replaced on the next save
                    warn!(session_id, error = %e, "Discarding malformed booking context");
                    Ok(None)
                }
            },
            None => Ok(None),
        }
    }

    async fn save(&self, session_id: &str, context: &BookingContext) -> RepoResult<()> {
        let key = context_key(session_id);
        let json = serde_json::to_string(context)?;
        self.redis
            .hset_field(&key, CONTEXT_FIELD, &json)
            .await
            .map_err(cache_err)?;
        self.redis
            .expire_key(&key, self.ttl_seconds)
            .await
            .map_err(cache_err)?;
        debug!(session_id, stage = ?context.stage, "Booking context saved");
        Ok(())
    }

    async fn clear(&self, session_id: &str) -> RepoResult<()> {
        self.redis
            .del_key(&context_key(session_id))
            .await
            .map_err(cache_err)
    }
}

#[async_trait]
impl RateLimiter for RedisClient {
    async fn check(&self, key: &str, limit: u32, window_secs: u64) -> RepoResult<bool> {
        self.check_rate_limit(&format!("rate_limit:{}", key), i64::from(limit), window_secs)
            .await
            .map_err(cache_err)
    }
}
