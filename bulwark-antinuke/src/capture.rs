use std::collections::HashMap;

use tracing::info;

use bulwark_database::model::snapshot::{ChannelRecord, GuildSnapshot, RoleRecord};

use crate::clock::Clock;
use crate::gateway::{GuildGateway, LiveChannel, LiveRole};
use crate::store::ProtectionStore;

const EVERYONE_ROLE_NAME: &str = "@everyone";

/// Read the live guild structure and replace the stored snapshot with it.
pub async fn capture(
    gateway: &dyn GuildGateway,
    store: &dyn ProtectionStore,
    clock: &dyn Clock,
    guild_id: u64,
) -> anyhow::Result<GuildSnapshot> {
    let channels = gateway.channels(guild_id).await?;
    let roles = gateway.roles(guild_id).await?;

    let snapshot = build_snapshot(guild_id, &channels, &roles, clock.unix_millis());
    store.save_snapshot(guild_id, &snapshot).await?;

    info!(
        guild_id,
        channels = snapshot.channels.len(),
        roles = snapshot.roles.len(),
        "guild snapshot captured"
    );

    Ok(snapshot)
}

/// Channels come out ordered by position; roles highest first, which is the
/// order they have to be recreated in to keep their relative hierarchy.
pub fn build_snapshot(
    guild_id: u64,
    channels: &[LiveChannel],
    roles: &[LiveRole],
    captured_at: u64,
) -> GuildSnapshot {
    let names_by_id: HashMap<u64, &str> = channels
        .iter()
        .map(|channel| (channel.id, channel.name.as_str()))
        .collect();

    let mut channel_records: Vec<ChannelRecord> = channels
        .iter()
        .map(|channel| ChannelRecord {
            name: channel.name.clone(),
            kind: channel.kind,
            parent_name: channel
                .parent_id
                .and_then(|parent_id| names_by_id.get(&parent_id))
                .map(|name| (*name).to_owned()),
            position: channel.position,
            permission_overwrites: channel.overwrites.clone(),
        })
        .collect();
    channel_records.sort_by(|left, right| {
        left.position
            .cmp(&right.position)
            .then_with(|| left.name.cmp(&right.name))
    });

    let mut role_records: Vec<RoleRecord> = roles
        .iter()
        .filter(|role| !role.managed && role.id != guild_id && role.name != EVERYONE_ROLE_NAME)
        .map(|role| RoleRecord {
            name: role.name.clone(),
            color: role.color,
            hoisted: role.hoist,
            permissions: role.permissions.to_string(),
            position: role.position,
        })
        .collect();
    role_records.sort_by(|left, right| {
        right
            .position
            .cmp(&left.position)
            .then_with(|| left.name.cmp(&right.name))
    });

    GuildSnapshot {
        channels: channel_records,
        roles: role_records,
        captured_at,
    }
}
