use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info};

use bulwark_database::model::antinuke::MAX_THRESHOLD_WINDOW_SECONDS;
use bulwark_database::model::snapshot::GuildSnapshot;

use crate::capture::capture;
use crate::clock::Clock;
use crate::correlator::{Attribution, UnattributableReason, attribute};
use crate::counter::{AbuseCounter, CounterStore, Verdict};
use crate::gateway::{DeletionKind, GuildGateway};
use crate::restore::{DEFAULT_PACING, RestoreOutcome, restore};
use crate::store::ProtectionStore;
use crate::trigger::{TriggerResponse, respond};

/// Stored windows are clamped to `1..=MAX_THRESHOLD_WINDOW_SECONDS`.
fn counting_window(seconds: i64) -> Duration {
    let seconds = seconds.clamp(1, MAX_THRESHOLD_WINDOW_SECONDS);
    Duration::from_secs(seconds.unsigned_abs())
}

/// What happened to a single deletion notification.
#[derive(Debug)]
pub enum DeletionOutcome {
    /// Protection is off, unconfigured, or its settings could not be read.
    Disabled,
    Unattributable(UnattributableReason),
    Counted { actor_id: u64 },
    Triggered(TriggerResponse),
}

/// Entry point for deletion events, snapshot captures and manual restores.
#[derive(Clone)]
pub struct AntiNuke {
    store: Arc<dyn ProtectionStore>,
    counter: AbuseCounter,
    clock: Arc<dyn Clock>,
    pacing: Duration,
}

impl fmt::Debug for AntiNuke {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AntiNuke")
            .field("pacing", &self.pacing)
            .finish_non_exhaustive()
    }
}

impl AntiNuke {
    pub fn new(
        store: Arc<dyn ProtectionStore>,
        counter_store: Arc<dyn CounterStore>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            counter: AbuseCounter::new(counter_store),
            clock,
            pacing: DEFAULT_PACING,
        }
    }

    pub fn with_pacing(mut self, pacing: Duration) -> Self {
        self.pacing = pacing;
        self
    }

    /// Handle one channel or role deletion. Nothing here returns an error:
    /// every failure is logged and the deletion is dropped.
    pub async fn handle_deletion(
        &self,
        gateway: Arc<dyn GuildGateway>,
        guild_id: u64,
        kind: DeletionKind,
    ) -> DeletionOutcome {
        let settings = match self.store.protection_settings(guild_id).await {
            Ok(Some(settings)) if settings.enabled => settings,
            Ok(_) => return DeletionOutcome::Disabled,
            Err(source) => {
                error!(?source, guild_id, "failed to read anti-nuke settings");
                return DeletionOutcome::Disabled;
            }
        };

        let attribution =
            match attribute(gateway.as_ref(), self.clock.as_ref(), guild_id, kind).await {
                Attribution::Attributed(attribution) => attribution,
                Attribution::Unattributable(reason) => {
                    return DeletionOutcome::Unattributable(reason);
                }
            };
        let actor_id = attribution.actor_id;

        let threshold_count = u64::try_from(settings.threshold_count)
            .unwrap_or(1)
            .max(1);
        let window = counting_window(settings.threshold_window_seconds);

        let verdict = match self
            .counter
            .record_and_check(guild_id, actor_id, threshold_count, window)
            .await
        {
            Ok(verdict) => verdict,
            Err(source) => {
                error!(?source, guild_id, actor_id, "failed to update abuse counter");
                return DeletionOutcome::Counted { actor_id };
            }
        };

        match verdict {
            Verdict::NotTriggered => {
                debug!(guild_id, actor_id, kind = kind.as_str(), "deletion counted");
                DeletionOutcome::Counted { actor_id }
            }
            Verdict::Triggered => {
                let response = respond(
                    gateway,
                    self.store.clone(),
                    self.clock.as_ref(),
                    guild_id,
                    actor_id,
                    self.pacing,
                )
                .await;
                DeletionOutcome::Triggered(response)
            }
        }
    }

    pub async fn capture(
        &self,
        gateway: &dyn GuildGateway,
        guild_id: u64,
    ) -> anyhow::Result<GuildSnapshot> {
        capture(gateway, self.store.as_ref(), self.clock.as_ref(), guild_id).await
    }

    /// Refresh the snapshot of every listed guild, logging failures per guild.
    pub async fn capture_all(&self, gateway: &dyn GuildGateway, guild_ids: &[u64]) -> usize {
        let mut captured = 0;
        for &guild_id in guild_ids {
            match self.capture(gateway, guild_id).await {
                Ok(_) => captured += 1,
                Err(source) => error!(?source, guild_id, "scheduled snapshot failed"),
            }
        }
        info!(captured, total = guild_ids.len(), "snapshot refresh finished");
        captured
    }

    pub async fn restore(
        &self,
        gateway: &dyn GuildGateway,
        guild_id: u64,
    ) -> anyhow::Result<RestoreOutcome> {
        restore(gateway, self.store.as_ref(), guild_id, self.pacing).await
    }
}
