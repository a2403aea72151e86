//! Per-guild, per-actor deletion counting.
//!
//! The store owns the increment-compare-remove step so that two deletions
//! landing at the same moment can never both observe the crossing, and so the
//! in-process map can be swapped for a shared backend.

mod memory_store;
mod redis_store;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

pub use memory_store::InMemoryCounterStore;
pub use redis_store::RedisCounterStore;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CounterKey {
    pub guild_id: u64,
    pub actor_id: u64,
}

impl CounterKey {
    pub fn new(guild_id: u64, actor_id: u64) -> Self {
        Self { guild_id, actor_id }
    }
}

/// Outcome of a single increment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Increment {
    /// Still below the limit; the entry lives on.
    Counted(u64),
    /// This increment reached the limit and the entry has been removed.
    Crossed(u64),
}

#[async_trait]
pub trait CounterStore: Send + Sync {
    /// Add one to `key`, creating it with a lifetime of `window` when absent
    /// or expired. Reaching `limit` removes the entry in the same step.
    async fn increment(
        &self,
        key: CounterKey,
        window: Duration,
        limit: u64,
    ) -> anyhow::Result<Increment>;

    async fn reset(&self, key: CounterKey) -> anyhow::Result<()>;

    /// Current live count, `None` when absent or expired.
    async fn get(&self, key: CounterKey) -> anyhow::Result<Option<u64>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Triggered,
    NotTriggered,
}

#[derive(Clone)]
pub struct AbuseCounter {
    store: Arc<dyn CounterStore>,
}

impl AbuseCounter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Record one deletion by `actor_id` and report whether it tripped the
    /// threshold. Returns `Triggered` once per crossing; the next deletion
    /// starts a fresh count.
    pub async fn record_and_check(
        &self,
        guild_id: u64,
        actor_id: u64,
        threshold_count: u64,
        window: Duration,
    ) -> anyhow::Result<Verdict> {
        let key = CounterKey::new(guild_id, actor_id);
        let outcome = self
            .store
            .increment(key, window, threshold_count.max(1))
            .await?;

        Ok(match outcome {
            Increment::Crossed(_) => Verdict::Triggered,
            Increment::Counted(_) => Verdict::NotTriggered,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::{AbuseCounter, CounterKey, CounterStore, InMemoryCounterStore, Verdict};
    use crate::clock::ManualClock;

    const WINDOW: Duration = Duration::from_secs(10);

    fn counter() -> (Arc<ManualClock>, Arc<InMemoryCounterStore>, AbuseCounter) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let store = Arc::new(InMemoryCounterStore::new(clock.clone()));
        let counter = AbuseCounter::new(store.clone());
        (clock, store, counter)
    }

    #[tokio::test]
    async fn below_threshold_never_triggers() {
        let (clock, _store, counter) = counter();
        for _ in 0..4 {
            let verdict = counter.record_and_check(1, 7, 5, WINDOW).await.unwrap();
            assert_eq!(verdict, Verdict::NotTriggered);
            clock.advance(Duration::from_secs(2));
        }
    }

    #[tokio::test]
    async fn reaching_threshold_triggers_once_and_clears() {
        let (_clock, store, counter) = counter();
        let mut verdicts = Vec::new();
        for _ in 0..5 {
            verdicts.push(counter.record_and_check(1, 7, 5, WINDOW).await.unwrap());
        }

        assert_eq!(
            verdicts.iter().filter(|v| **v == Verdict::Triggered).count(),
            1
        );
        assert_eq!(verdicts.last(), Some(&Verdict::Triggered));
        assert_eq!(store.get(CounterKey::new(1, 7)).await.unwrap(), None);

        let next = counter.record_and_check(1, 7, 5, WINDOW).await.unwrap();
        assert_eq!(next, Verdict::NotTriggered);
        assert_eq!(store.get(CounterKey::new(1, 7)).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn window_expiry_restarts_count() {
        let (clock, store, counter) = counter();
        for _ in 0..4 {
            counter.record_and_check(1, 7, 5, WINDOW).await.unwrap();
            clock.advance(Duration::from_secs(2));
        }

        clock.advance(Duration::from_secs(11));
        let verdict = counter.record_and_check(1, 7, 5, WINDOW).await.unwrap();
        assert_eq!(verdict, Verdict::NotTriggered);
        assert_eq!(store.get(CounterKey::new(1, 7)).await.unwrap(), Some(1));
    }

    #[tokio::test]
    async fn threshold_of_one_trips_on_first_deletion() {
        let (_clock, _store, counter) = counter();
        let verdict = counter.record_and_check(1, 7, 1, WINDOW).await.unwrap();
        assert_eq!(verdict, Verdict::Triggered);
    }

    #[tokio::test]
    async fn actors_and_guilds_are_counted_apart() {
        let (_clock, store, counter) = counter();
        counter.record_and_check(1, 7, 5, WINDOW).await.unwrap();
        counter.record_and_check(1, 8, 5, WINDOW).await.unwrap();
        counter.record_and_check(2, 7, 5, WINDOW).await.unwrap();
        counter.record_and_check(1, 7, 5, WINDOW).await.unwrap();

        assert_eq!(store.get(CounterKey::new(1, 7)).await.unwrap(), Some(2));
        assert_eq!(store.get(CounterKey::new(1, 8)).await.unwrap(), Some(1));
        assert_eq!(store.get(CounterKey::new(2, 7)).await.unwrap(), Some(1));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_deletions_trigger_once_per_crossing() {
        let (_clock, _store, counter) = counter();
        let mut handles = Vec::new();
        for _ in 0..50 {
            let counter = counter.clone();
            handles.push(tokio::spawn(async move {
                counter.record_and_check(1, 7, 5, WINDOW).await.unwrap()
            }));
        }

        let mut triggered = 0;
        for handle in handles {
            if handle.await.unwrap() == Verdict::Triggered {
                triggered += 1;
            }
        }

        assert_eq!(triggered, 10);
    }
}
