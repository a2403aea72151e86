//! [`GuildGateway`] backed by Discord's REST API.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serenity::all::{
    ChannelId, ChannelType, CreateChannel, CreateEmbed, CreateEmbedFooter, CreateMessage,
    EditRole, GuildChannel, GuildId, Http, PermissionOverwrite, PermissionOverwriteType,
    Permissions, Role, User, UserId,
};
use serenity::model::guild::audit_log::{Action, ChannelAction, RoleAction};
use tracing::warn;

use bulwark_database::model::snapshot::{OverwriteRecord, OverwriteSubject};
use bulwark_utils::embed::ALERT_EMBED_COLOR;
use bulwark_utils::formatting::discord_relative_time;

use crate::gateway::{
    AuditEntry, AuditExecutor, DeletionKind, GuildGateway, LiveChannel, LiveRole, NewChannel,
    NewRole,
};
use crate::trigger::{IncidentRecord, RestorationStatus};

/// Milliseconds between the unix epoch and Discord's snowflake epoch.
const DISCORD_EPOCH_MILLIS: u64 = 1_420_070_400_000;

#[derive(Clone)]
pub struct SerenityGateway {
    http: Arc<Http>,
}

impl SerenityGateway {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http }
    }
}

fn snowflake_millis(id: u64) -> u64 {
    (id >> 22) + DISCORD_EPOCH_MILLIS
}

/// The executor as embedded in the same audit log response. No extra request
/// is made: during a nuke every lookup would queue on one rate-limit bucket.
fn resolve_executor(users: &HashMap<UserId, User>, user_id: UserId) -> Option<AuditExecutor> {
    users.get(&user_id).map(|user| AuditExecutor {
        id: user.id.get(),
        bot: user.bot,
    })
}

fn live_channel(channel: &GuildChannel) -> LiveChannel {
    LiveChannel {
        id: channel.id.get(),
        name: channel.name.clone(),
        kind: u8::from(channel.kind),
        parent_id: channel.parent_id.map(ChannelId::get),
        position: i64::from(channel.position),
        overwrites: channel
            .permission_overwrites
            .iter()
            .filter_map(overwrite_record)
            .collect(),
    }
}

fn overwrite_record(overwrite: &PermissionOverwrite) -> Option<OverwriteRecord> {
    let (subject_id, subject_type) = match overwrite.kind {
        PermissionOverwriteType::Member(user_id) => (user_id.get(), OverwriteSubject::Member),
        PermissionOverwriteType::Role(role_id) => (role_id.get(), OverwriteSubject::Role),
        _ => return None,
    };
    Some(OverwriteRecord {
        subject_id,
        subject_type,
        allow: overwrite.allow.bits().to_string(),
        deny: overwrite.deny.bits().to_string(),
    })
}

fn live_role(role: &Role) -> LiveRole {
    LiveRole {
        id: role.id.get(),
        name: role.name.clone(),
        color: role.colour.0,
        hoist: role.hoist,
        managed: role.managed,
        permissions: role.permissions.bits(),
        position: i64::from(role.position),
    }
}

fn restoration_line(status: &RestorationStatus) -> String {
    match status {
        RestorationStatus::Completed(report) => format!(
            "{} ({} created, {} failed)",
            status.as_str(),
            report.created(),
            report.failed()
        ),
        other => other.as_str().to_owned(),
    }
}

fn alert_embed(incident: &IncidentRecord) -> CreateEmbed {
    let description = [
        format!("**User :** <@{}> ({})", incident.actor_id, incident.actor_id),
        format!("**Action :** {}", incident.action.as_str()),
        format!("**Restoration :** {}", restoration_line(&incident.restoration)),
        format!("**When :** {}", discord_relative_time(incident.detected_at)),
    ]
    .join("\n");

    CreateEmbed::new()
        .title("Anti-Nuke Triggered")
        .description(description)
        .color(ALERT_EMBED_COLOR)
        .footer(CreateEmbedFooter::new("Mass deletion detected"))
}

#[async_trait]
impl GuildGateway for SerenityGateway {
    async fn latest_deletion_entry(
        &self,
        guild_id: u64,
        kind: DeletionKind,
    ) -> anyhow::Result<Option<AuditEntry>> {
        let action = match kind {
            DeletionKind::Channel => Action::Channel(ChannelAction::Delete),
            DeletionKind::Role => Action::Role(RoleAction::Delete),
        };

        let logs = GuildId::new(guild_id)
            .audit_logs(&*self.http, Some(action), None, None, Some(1))
            .await?;
        let Some(entry) = logs.entries.into_iter().next() else {
            return Ok(None);
        };

        let executor = resolve_executor(&logs.users, entry.user_id);
        if executor.is_none() {
            warn!(guild_id, user_id = entry.user_id.get(), "audit log executor missing from response");
        }

        Ok(Some(AuditEntry {
            executor,
            created_at: snowflake_millis(entry.id.get()),
        }))
    }

    async fn channels(&self, guild_id: u64) -> anyhow::Result<Vec<LiveChannel>> {
        let channels = GuildId::new(guild_id).channels(&*self.http).await?;
        Ok(channels.values().map(live_channel).collect())
    }

    async fn roles(&self, guild_id: u64) -> anyhow::Result<Vec<LiveRole>> {
        let roles = GuildId::new(guild_id).roles(&*self.http).await?;
        Ok(roles.values().map(live_role).collect())
    }

    async fn create_role(
        &self,
        guild_id: u64,
        role: &NewRole,
        reason: &str,
    ) -> anyhow::Result<u64> {
        let builder = EditRole::new()
            .name(role.name.as_str())
            .colour(role.color)
            .hoist(role.hoist)
            .permissions(Permissions::from_bits_truncate(role.permissions))
            .audit_log_reason(reason);
        let created = GuildId::new(guild_id)
            .create_role(&*self.http, builder)
            .await?;
        Ok(created.id.get())
    }

    async fn create_channel(
        &self,
        guild_id: u64,
        channel: &NewChannel,
        reason: &str,
    ) -> anyhow::Result<u64> {
        let mut builder = CreateChannel::new(channel.name.as_str())
            .kind(ChannelType::from(channel.kind))
            .audit_log_reason(reason);
        if let Some(parent_id) = channel.parent_id {
            builder = builder.category(ChannelId::new(parent_id));
        }
        let created = GuildId::new(guild_id)
            .create_channel(&*self.http, builder)
            .await?;
        Ok(created.id.get())
    }

    async fn ban(&self, guild_id: u64, user_id: u64, reason: &str) -> anyhow::Result<()> {
        GuildId::new(guild_id)
            .ban_with_reason(&*self.http, UserId::new(user_id), 0, reason)
            .await?;
        Ok(())
    }

    async fn send_alert(&self, channel_id: u64, incident: &IncidentRecord) -> anyhow::Result<()> {
        ChannelId::new(channel_id)
            .send_message(&*self.http, CreateMessage::new().embed(alert_embed(incident)))
            .await?;
        Ok(())
    }
}
