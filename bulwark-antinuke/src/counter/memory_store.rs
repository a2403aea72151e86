use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::{CounterKey, CounterStore, Increment};
use crate::clock::Clock;

#[derive(Debug)]
struct Entry {
    count: u64,
    expires_at: Instant,
}

#[derive(Debug, Default)]
struct State {
    entries: HashMap<CounterKey, Entry>,
    /// Expiry index: every live entry appears exactly once, under its `expires_at`.
    expiries: BTreeMap<Instant, Vec<CounterKey>>,
}

impl State {
    fn remove(&mut self, key: &CounterKey) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        if let Some(keys) = self.expiries.get_mut(&entry.expires_at) {
            keys.retain(|k| k != key);
            if keys.is_empty() {
                self.expiries.remove(&entry.expires_at);
            }
        }
        Some(entry)
    }

    fn live_count(&self, key: &CounterKey, now: Instant) -> Option<u64> {
        self.entries
            .get(key)
            .filter(|entry| entry.expires_at > now)
            .map(|entry| entry.count)
    }
}

/// Process-local counters. Entries expire lazily on access and in bulk via
/// [`InMemoryCounterStore::sweep`]; nothing here ever awaits while holding the lock.
pub struct InMemoryCounterStore {
    clock: Arc<dyn Clock>,
    state: Mutex<State>,
}

impl InMemoryCounterStore {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            state: Mutex::new(State::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Drop every entry whose window has elapsed. Returns how many were removed.
    pub fn sweep(&self) -> usize {
        let now = self.clock.now();
        let mut state = self.lock();

        let due: Vec<Instant> = state.expiries.range(..=now).map(|(at, _)| *at).collect();
        let mut removed = 0;
        for at in due {
            let Some(keys) = state.expiries.remove(&at) else {
                continue;
            };
            for key in keys {
                if state.entries.get(&key).is_some_and(|e| e.expires_at == at) {
                    state.entries.remove(&key);
                    removed += 1;
                }
            }
        }

        removed
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(
        &self,
        key: CounterKey,
        window: Duration,
        limit: u64,
    ) -> anyhow::Result<Increment> {
        let now = self.clock.now();
        let mut state = self.lock();

        if state.live_count(&key, now).is_none() {
            state.remove(&key);
            let Some(expires_at) = now.checked_add(window) else {
                anyhow::bail!("counter window of {window:?} is out of range");
            };
            state.entries.insert(
                key,
                Entry {
                    count: 0,
                    expires_at,
                },
            );
            state.expiries.entry(expires_at).or_default().push(key);
        }

        let count = match state.entries.get_mut(&key) {
            Some(entry) => {
                entry.count += 1;
                entry.count
            }
            None => anyhow::bail!("counter entry vanished while locked"),
        };

        if count >= limit {
            state.remove(&key);
            return Ok(Increment::Crossed(count));
        }

        Ok(Increment::Counted(count))
    }

    async fn reset(&self, key: CounterKey) -> anyhow::Result<()> {
        self.lock().remove(&key);
        Ok(())
    }

    async fn get(&self, key: CounterKey) -> anyhow::Result<Option<u64>> {
        let now = self.clock.now();
        Ok(self.lock().live_count(&key, now))
    }
}
