//! Background maintenance loops started once the bot is connected.

use std::sync::Arc;
use std::time::Duration;

use poise::serenity_prelude as serenity;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use bulwark_antinuke::{AntiNuke, InMemoryCounterStore, SerenityGateway};
use bulwark_database::Database;
use bulwark_database::impls::antinuke_config::list_protected_guild_ids;

/// Re-capture every protected guild on a fixed period so the stored layout
/// tracks intentional changes made between incidents.
pub fn spawn_snapshot_refresh(
    http: Arc<serenity::Http>,
    db: Database,
    antinuke: AntiNuke,
    every: Duration,
) {
    if every.is_zero() {
        info!("Scheduled snapshot refresh disabled.");
        return;
    }

    tokio::spawn(async move {
        info!(interval_secs = every.as_secs(), "Snapshot refresh task started.");
        let gateway = SerenityGateway::new(http);
        let mut timer = tokio::time::interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first tick fires immediately; enabling already captured.
        timer.tick().await;

        loop {
            timer.tick().await;
            let guild_ids = match list_protected_guild_ids(&db).await {
                Ok(guild_ids) => guild_ids,
                Err(source) => {
                    error!(?source, "failed to list protected guilds");
                    continue;
                }
            };
            antinuke.capture_all(&gateway, &guild_ids).await;
        }
    });
}

/// Drop expired in-memory counters so idle actors do not accumulate.
pub fn spawn_counter_sweep(store: Arc<InMemoryCounterStore>, every: Duration) {
    if every.is_zero() {
        return;
    }

    tokio::spawn(async move {
        let mut timer = tokio::time::interval(every);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            timer.tick().await;
            let removed = store.sweep();
            if removed > 0 {
                debug!(removed, live = store.len(), "expired abuse counters swept");
            }
        }
    });
}
