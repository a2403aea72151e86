use async_trait::async_trait;

use bulwark_database::Database;
use bulwark_database::impls::alert_config::get_antinuke_alert_channel_id;
use bulwark_database::impls::antinuke_config::get_protection_settings;
use bulwark_database::impls::snapshots::{get_snapshot, upsert_snapshot};
use bulwark_database::model::antinuke::GuildProtectionSettings;
use bulwark_database::model::snapshot::GuildSnapshot;

/// Persistence the engine reads and writes.
#[async_trait]
pub trait ProtectionStore: Send + Sync {
    async fn protection_settings(
        &self,
        guild_id: u64,
    ) -> anyhow::Result<Option<GuildProtectionSettings>>;

    async fn latest_snapshot(&self, guild_id: u64) -> anyhow::Result<Option<GuildSnapshot>>;

    async fn save_snapshot(&self, guild_id: u64, snapshot: &GuildSnapshot) -> anyhow::Result<()>;

    async fn alert_channel(&self, guild_id: u64) -> anyhow::Result<Option<u64>>;
}

#[async_trait]
impl ProtectionStore for Database {
    async fn protection_settings(
        &self,
        guild_id: u64,
    ) -> anyhow::Result<Option<GuildProtectionSettings>> {
        get_protection_settings(self, guild_id).await
    }

    async fn latest_snapshot(&self, guild_id: u64) -> anyhow::Result<Option<GuildSnapshot>> {
        get_snapshot(self, guild_id).await
    }

    async fn save_snapshot(&self, guild_id: u64, snapshot: &GuildSnapshot) -> anyhow::Result<()> {
        upsert_snapshot(self, guild_id, snapshot).await
    }

    async fn alert_channel(&self, guild_id: u64) -> anyhow::Result<Option<u64>> {
        get_antinuke_alert_channel_id(self, guild_id).await
    }
}
