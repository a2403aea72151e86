mod noop_store;
mod redis_store;

use std::future::Future;
use std::time::Duration;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use noop_store::NoopCacheStore;
use redis_store::RedisCacheStore;

/// How long per-guild configuration rows stay cached.
pub const CONFIG_CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Clone, Debug)]
enum CacheBackend {
    Disabled(NoopCacheStore),
    Redis(RedisCacheStore),
}

/// Result of bumping a windowed counter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WindowedCount {
    pub count: u64,
    /// The counter reached the limit on this increment and was removed.
    pub limit_reached: bool,
}

#[derive(Clone, Debug)]
pub struct CacheService {
    key_prefix: String,
    backend: CacheBackend,
}

impl CacheService {
    pub fn disabled(prefix: impl Into<String>) -> Self {
        Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Disabled(NoopCacheStore),
        }
    }

    pub fn redis(redis_url: &str, prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            key_prefix: prefix.into(),
            backend: CacheBackend::Redis(RedisCacheStore::from_url(redis_url)?),
        })
    }

    pub fn is_redis_enabled(&self) -> bool {
        matches!(self.backend, CacheBackend::Redis(_))
    }

    pub async fn ping(&self) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(_) => Ok(()),
            CacheBackend::Redis(store) => store.ping().await,
        }
    }

    pub fn key(&self, suffix: impl AsRef<str>) -> String {
        format!("{}:{}", self.key_prefix, suffix.as_ref())
    }

    pub async fn get_json<T>(&self, key: &str) -> anyhow::Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        let value = match &self.backend {
            CacheBackend::Disabled(store) => store.get(key).await,
            CacheBackend::Redis(store) => store.get(key).await,
        }?;

        match value {
            Some(bytes) => {
                let parsed = serde_json::from_slice(&bytes).map_err(|e| {
                    anyhow::anyhow!("failed to deserialize cache value for `{key}`: {e}")
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set_json<T>(&self, key: &str, value: &T, ttl: Duration) -> anyhow::Result<()>
    where
        T: Serialize,
    {
        let ttl_seconds = ttl.as_secs().max(1);
        let payload = serde_json::to_vec(value)
            .map_err(|e| anyhow::anyhow!("failed to serialize cache value for `{key}`: {e}"))?;

        match &self.backend {
            CacheBackend::Disabled(store) => store.set(key, payload, ttl_seconds).await,
            CacheBackend::Redis(store) => store.set(key, payload, ttl_seconds).await,
        }
    }

    pub async fn del(&self, key: &str) -> anyhow::Result<()> {
        match &self.backend {
            CacheBackend::Disabled(store) => store.del(key).await,
            CacheBackend::Redis(store) => store.del(key).await,
        }
    }

    pub async fn get_or_load_json<T, F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> anyhow::Result<T>
    where
        T: Serialize + DeserializeOwned + Clone,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<T>>,
    {
        match self.get_json::<T>(key).await {
            Ok(Some(cached)) => return Ok(cached),
            Ok(None) => {}
            Err(e) => warn!(
                ?e,
                cache_key = key,
                "cache get failed; falling back to database"
            ),
        }

        let loaded = loader().await?;

        if let Err(e) = self.set_json(key, &loaded, ttl).await {
            warn!(
                ?e,
                cache_key = key,
                "cache set failed; returning database value"
            );
        }

        Ok(loaded)
    }

    /// Increment a counter that expires `window` after its first hit. When the
    /// new value reaches `limit` the key is deleted in the same atomic step.
    ///
    /// Only the Redis backend can hold counters.
    pub async fn increment_within_window(
        &self,
        key: &str,
        window: Duration,
        limit: u64,
    ) -> anyhow::Result<WindowedCount> {
        match &self.backend {
            CacheBackend::Disabled(_) => {
                anyhow::bail!("windowed counters need the redis cache backend")
            }
            CacheBackend::Redis(store) => {
                let window_ms = u64::try_from(window.as_millis())
                    .unwrap_or(u64::MAX)
                    .max(1);
                let (count, reached) = store.increment_with_limit(key, window_ms, limit).await?;
                Ok(WindowedCount {
                    count,
                    limit_reached: reached,
                })
            }
        }
    }

    pub async fn get_counter(&self, key: &str) -> anyhow::Result<Option<u64>> {
        match &self.backend {
            CacheBackend::Disabled(_) => Ok(None),
            CacheBackend::Redis(store) => store.get_u64(key).await,
        }
    }
}

pub fn antinuke_config_key(cache: &CacheService, guild_id: u64) -> String {
    cache.key(format!("antinuke_config:{guild_id}"))
}

pub fn alert_channel_key(cache: &CacheService, guild_id: u64) -> String {
    cache.key(format!("alert_channel:{guild_id}"))
}

pub fn abuse_counter_key(cache: &CacheService, guild_id: u64, actor_id: u64) -> String {
    cache.key(format!("abuse_counter:{guild_id}:{actor_id}"))
}

pub async fn invalidate_antinuke_config(cache: &CacheService, guild_id: u64) -> anyhow::Result<()> {
    cache.del(&antinuke_config_key(cache, guild_id)).await
}

pub async fn invalidate_alert_channel(cache: &CacheService, guild_id: u64) -> anyhow::Result<()> {
    cache.del(&alert_channel_key(cache, guild_id)).await
}
