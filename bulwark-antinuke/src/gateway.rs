//! What the engine needs from Discord, expressed without serenity types so the
//! engine can run against a fake in tests.

use async_trait::async_trait;

use bulwark_database::model::snapshot::OverwriteRecord;

use crate::trigger::IncidentRecord;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DeletionKind {
    Channel,
    Role,
}

impl DeletionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Channel => "channel",
            Self::Role => "role",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditExecutor {
    pub id: u64,
    pub bot: bool,
}

/// The newest audit log entry of a delete type.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AuditEntry {
    /// `None` when the response did not resolve who performed the action.
    pub executor: Option<AuditExecutor>,
    /// Unix milliseconds.
    pub created_at: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveChannel {
    pub id: u64,
    pub name: String,
    pub kind: u8,
    pub parent_id: Option<u64>,
    pub position: i64,
    pub overwrites: Vec<OverwriteRecord>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveRole {
    pub id: u64,
    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub managed: bool,
    pub permissions: u64,
    pub position: i64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewRole {
    pub name: String,
    pub color: u32,
    pub hoist: bool,
    pub permissions: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewChannel {
    pub name: String,
    pub kind: u8,
    pub parent_id: Option<u64>,
}

#[async_trait]
pub trait GuildGateway: Send + Sync {
    /// Newest audit entry for deletions of `kind`, if any.
    async fn latest_deletion_entry(
        &self,
        guild_id: u64,
        kind: DeletionKind,
    ) -> anyhow::Result<Option<AuditEntry>>;

    async fn channels(&self, guild_id: u64) -> anyhow::Result<Vec<LiveChannel>>;

    async fn roles(&self, guild_id: u64) -> anyhow::Result<Vec<LiveRole>>;

    /// Returns the id Discord assigned to the new role.
    async fn create_role(&self, guild_id: u64, role: &NewRole, reason: &str)
    -> anyhow::Result<u64>;

    /// Returns the id Discord assigned to the new channel.
    async fn create_channel(
        &self,
        guild_id: u64,
        channel: &NewChannel,
        reason: &str,
    ) -> anyhow::Result<u64>;

    async fn ban(&self, guild_id: u64, user_id: u64, reason: &str) -> anyhow::Result<()>;

    async fn send_alert(&self, channel_id: u64, incident: &IncidentRecord) -> anyhow::Result<()>;
}
