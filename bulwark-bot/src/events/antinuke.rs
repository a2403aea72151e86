use std::sync::Arc;

use poise::serenity_prelude as serenity;
use tracing::{debug, info};

use bulwark_antinuke::{DeletionKind, DeletionOutcome, GuildGateway, SerenityGateway};
use bulwark_core::Data;

pub async fn handle_channel_delete(
    ctx: &serenity::Context,
    data: &Data,
    channel: &serenity::GuildChannel,
) {
    handle_deletion(ctx, data, channel.guild_id, DeletionKind::Channel).await;
}

pub async fn handle_role_delete(ctx: &serenity::Context, data: &Data, guild_id: serenity::GuildId) {
    handle_deletion(ctx, data, guild_id, DeletionKind::Role).await;
}

async fn handle_deletion(
    ctx: &serenity::Context,
    data: &Data,
    guild_id: serenity::GuildId,
    kind: DeletionKind,
) {
    let gateway: Arc<dyn GuildGateway> = Arc::new(SerenityGateway::new(ctx.http.clone()));

    match data
        .antinuke
        .handle_deletion(gateway, guild_id.get(), kind)
        .await
    {
        DeletionOutcome::Triggered(response) => {
            // Restoration keeps running in the background; its outcome is logged there.
            info!(
                guild_id = guild_id.get(),
                actor_id = response.incident.actor_id,
                action = response.incident.action.as_str(),
                "anti-nuke response dispatched"
            );
        }
        DeletionOutcome::Unattributable(reason) => {
            debug!(guild_id = guild_id.get(), kind = kind.as_str(), ?reason, "deletion not attributed");
        }
        DeletionOutcome::Counted { .. } | DeletionOutcome::Disabled => {}
    }
}
