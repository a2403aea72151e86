//! Best-effort reconstruction of a guild from its last snapshot.
//!
//! Entities are matched by name because recreated channels and roles get new
//! ids. Permission overwrites are not reapplied: the ids they reference are
//! gone after a nuke.

use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use bulwark_database::model::snapshot::{CATEGORY_CHANNEL_KIND, ChannelRecord, GuildSnapshot};

use crate::gateway::{GuildGateway, NewChannel, NewRole};
use crate::store::ProtectionStore;

pub const RESTORE_REASON: &str = "Anti-Nuke Restoration";

/// Pause after each channel creation to stay clear of Discord's rate limits.
pub const DEFAULT_PACING: Duration = Duration::from_millis(500);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub created: usize,
    pub skipped: usize,
    pub failed: usize,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RestoreReport {
    pub roles: Tally,
    pub categories: Tally,
    pub channels: Tally,
}

impl RestoreReport {
    pub fn created(&self) -> usize {
        self.roles.created + self.categories.created + self.channels.created
    }

    pub fn failed(&self) -> usize {
        self.roles.failed + self.categories.failed + self.channels.failed
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestoreOutcome {
    NoSnapshot,
    Completed(RestoreReport),
}

/// Recreate roles, then categories, then the remaining channels. A failed
/// creation is logged and counted; it never stops the run.
pub async fn restore(
    gateway: &dyn GuildGateway,
    store: &dyn ProtectionStore,
    guild_id: u64,
    pacing: Duration,
) -> anyhow::Result<RestoreOutcome> {
    let Some(snapshot) = store.latest_snapshot(guild_id).await? else {
        info!(guild_id, "no snapshot stored; nothing to restore");
        return Ok(RestoreOutcome::NoSnapshot);
    };

    info!(
        guild_id,
        roles = snapshot.roles.len(),
        channels = snapshot.channels.len(),
        "starting restoration"
    );

    let mut report = RestoreReport::default();
    restore_roles(gateway, guild_id, &snapshot, &mut report.roles).await?;

    let live_channels = gateway.channels(guild_id).await?;
    let mut existing: HashSet<(String, u8)> = live_channels
        .iter()
        .map(|channel| (channel.name.clone(), channel.kind))
        .collect();
    let mut categories: HashMap<String, u64> = HashMap::new();
    for channel in live_channels
        .iter()
        .filter(|channel| channel.kind == CATEGORY_CHANNEL_KIND)
    {
        categories.entry(channel.name.clone()).or_insert(channel.id);
    }

    let (category_records, channel_records): (Vec<&ChannelRecord>, Vec<&ChannelRecord>) =
        snapshot.channels.iter().partition(|record| record.is_category());

    for record in category_records {
        let key = (record.name.clone(), record.kind);
        if existing.contains(&key) {
            report.categories.skipped += 1;
            continue;
        }

        let new_channel = NewChannel {
            name: record.name.clone(),
            kind: record.kind,
            parent_id: None,
        };
        match gateway
            .create_channel(guild_id, &new_channel, RESTORE_REASON)
            .await
        {
            Ok(id) => {
                report.categories.created += 1;
                categories.entry(record.name.clone()).or_insert(id);
                existing.insert(key);
            }
            Err(source) => {
                report.categories.failed += 1;
                warn!(?source, guild_id, name = %record.name, "failed to recreate category");
            }
        }
        pace(pacing).await;
    }

    for record in channel_records {
        let key = (record.name.clone(), record.kind);
        if existing.contains(&key) {
            report.channels.skipped += 1;
            continue;
        }

        let parent_id = record
            .parent_name
            .as_ref()
            .and_then(|name| categories.get(name).copied());
        let new_channel = NewChannel {
            name: record.name.clone(),
            kind: record.kind,
            parent_id,
        };
        match gateway
            .create_channel(guild_id, &new_channel, RESTORE_REASON)
            .await
        {
            Ok(_) => {
                report.channels.created += 1;
                existing.insert(key);
            }
            Err(source) => {
                report.channels.failed += 1;
                warn!(?source, guild_id, name = %record.name, "failed to recreate channel");
            }
        }
        pace(pacing).await;
    }

    info!(
        guild_id,
        created = report.created(),
        failed = report.failed(),
        roles_created = report.roles.created,
        categories_created = report.categories.created,
        channels_created = report.channels.created,
        "restoration finished"
    );

    Ok(RestoreOutcome::Completed(report))
}

async fn restore_roles(
    gateway: &dyn GuildGateway,
    guild_id: u64,
    snapshot: &GuildSnapshot,
    tally: &mut Tally,
) -> anyhow::Result<()> {
    let mut existing: HashSet<String> = gateway
        .roles(guild_id)
        .await?
        .into_iter()
        .map(|role| role.name)
        .collect();

    for record in &snapshot.roles {
        if existing.contains(&record.name) {
            tally.skipped += 1;
            continue;
        }

        let permissions = match record.permissions.parse::<u64>() {
            Ok(bits) => bits,
            Err(source) => {
                warn!(?source, guild_id, name = %record.name, "unreadable role permissions; using none");
                0
            }
        };
        let new_role = NewRole {
            name: record.name.clone(),
            color: record.color,
            hoist: record.hoisted,
            permissions,
        };

        match gateway.create_role(guild_id, &new_role, RESTORE_REASON).await {
            Ok(_) => {
                tally.created += 1;
                existing.insert(record.name.clone());
            }
            Err(source) => {
                tally.failed += 1;
                warn!(?source, guild_id, name = %record.name, "failed to recreate role");
            }
        }
    }

    Ok(())
}

async fn pace(pacing: Duration) {
    if !pacing.is_zero() {
        sleep(pacing).await;
    }
}
