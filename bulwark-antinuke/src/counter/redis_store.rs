use std::time::Duration;

use async_trait::async_trait;

use bulwark_database::CacheService;
use bulwark_database::cache::abuse_counter_key;

use super::{CounterKey, CounterStore, Increment};

/// Counters shared through Redis, so several bot processes see the same totals
/// and a restart does not forget an attack in progress.
#[derive(Clone, Debug)]
pub struct RedisCounterStore {
    cache: CacheService,
}

impl RedisCounterStore {
    pub fn new(cache: CacheService) -> anyhow::Result<Self> {
        anyhow::ensure!(
            cache.is_redis_enabled(),
            "redis counter store needs a redis-backed cache"
        );
        Ok(Self { cache })
    }

    fn key(&self, key: CounterKey) -> String {
        abuse_counter_key(&self.cache, key.guild_id, key.actor_id)
    }
}

#[async_trait]
impl CounterStore for RedisCounterStore {
    async fn increment(
        &self,
        key: CounterKey,
        window: Duration,
        limit: u64,
    ) -> anyhow::Result<Increment> {
        let tally = self
            .cache
            .increment_within_window(&self.key(key), window, limit)
            .await?;

        Ok(if tally.limit_reached {
            Increment::Crossed(tally.count)
        } else {
            Increment::Counted(tally.count)
        })
    }

    async fn reset(&self, key: CounterKey) -> anyhow::Result<()> {
        self.cache.del(&self.key(key)).await
    }

    async fn get(&self, key: CounterKey) -> anyhow::Result<Option<u64>> {
        self.cache.get_counter(&self.key(key)).await
    }
}
