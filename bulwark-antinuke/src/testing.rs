//! In-memory stand-ins for Discord and Postgres used by the engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use anyhow::{anyhow, bail};
use async_trait::async_trait;

use bulwark_database::model::antinuke::GuildProtectionSettings;
use bulwark_database::model::snapshot::GuildSnapshot;

use crate::gateway::{
    AuditEntry, DeletionKind, GuildGateway, LiveChannel, LiveRole, NewChannel, NewRole,
};
use crate::store::ProtectionStore;
use crate::trigger::IncidentRecord;

pub fn live_role(id: u64, name: &str, position: i64) -> LiveRole {
    LiveRole {
        id,
        name: name.to_owned(),
        color: 0,
        hoist: false,
        managed: false,
        permissions: 0,
        position,
    }
}

#[derive(Default)]
struct GatewayState {
    channels: Vec<LiveChannel>,
    roles: Vec<LiveRole>,
    next_id: u64,
    audit_entry: Option<AuditEntry>,
    fail_audit: bool,
    audit_queries: Vec<DeletionKind>,
    bans: Vec<(u64, String)>,
    fail_bans: bool,
    alerts: Vec<(u64, IncidentRecord)>,
    fail_alerts: bool,
    created_roles: Vec<String>,
    created_channels: Vec<String>,
    failing_names: HashSet<String>,
}

impl GatewayState {
    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// A single guild kept in memory. Starts with only its `@everyone` role.
pub struct FakeGateway {
    guild_id: u64,
    state: Mutex<GatewayState>,
}

impl FakeGateway {
    pub fn new(guild_id: u64) -> Self {
        let state = GatewayState {
            roles: vec![live_role(guild_id, "@everyone", 0)],
            next_id: 1_000,
            ..GatewayState::default()
        };
        Self {
            guild_id,
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, GatewayState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn check_guild(&self, guild_id: u64) -> anyhow::Result<()> {
        if guild_id != self.guild_id {
            bail!("unknown guild {guild_id}");
        }
        Ok(())
    }

    pub fn set_audit_entry(&self, entry: Option<AuditEntry>) {
        self.state().audit_entry = entry;
    }

    pub fn fail_audit_queries(&self) {
        self.state().fail_audit = true;
    }

    pub fn audit_queries(&self) -> Vec<DeletionKind> {
        self.state().audit_queries.clone()
    }

    pub fn add_role(&self, name: &str) -> u64 {
        let mut state = self.state();
        let id = state.next_id();
        let position = i64::try_from(state.roles.len()).unwrap_or(0);
        state.roles.push(live_role(id, name, position));
        id
    }

    pub fn add_channel(&self, name: &str, kind: u8, parent_id: Option<u64>) -> u64 {
        let mut state = self.state();
        let id = state.next_id();
        let position = i64::try_from(state.channels.len()).unwrap_or(0);
        state.channels.push(LiveChannel {
            id,
            name: name.to_owned(),
            kind,
            parent_id,
            position,
            overwrites: Vec::new(),
        });
        id
    }

    pub fn created_roles(&self) -> Vec<String> {
        self.state().created_roles.clone()
    }

    pub fn created_channels(&self) -> Vec<String> {
        self.state().created_channels.clone()
    }

    pub fn role_named(&self, name: &str) -> Option<LiveRole> {
        self.state().roles.iter().find(|r| r.name == name).cloned()
    }

    pub fn roles_named(&self, name: &str) -> usize {
        self.state().roles.iter().filter(|r| r.name == name).count()
    }

    pub fn channel_named(&self, name: &str, kind: u8) -> Option<LiveChannel> {
        self.state()
            .channels
            .iter()
            .find(|c| c.name == name && c.kind == kind)
            .cloned()
    }

    /// Make every later creation of an entity with this name fail.
    pub fn fail_creation_of(&self, name: &str) {
        self.state().failing_names.insert(name.to_owned());
    }

    pub fn bans(&self) -> Vec<(u64, String)> {
        self.state().bans.clone()
    }

    pub fn fail_bans(&self) {
        self.state().fail_bans = true;
    }

    pub fn alerts(&self) -> Vec<(u64, IncidentRecord)> {
        self.state().alerts.clone()
    }

    pub fn fail_alerts(&self) {
        self.state().fail_alerts = true;
    }
}

#[async_trait]
impl GuildGateway for FakeGateway {
    async fn latest_deletion_entry(
        &self,
        guild_id: u64,
        kind: DeletionKind,
    ) -> anyhow::Result<Option<AuditEntry>> {
        self.check_guild(guild_id)?;
        let mut state = self.state();
        state.audit_queries.push(kind);
        if state.fail_audit {
            return Err(anyhow!("audit log unavailable"));
        }
        Ok(state.audit_entry.clone())
    }

    async fn channels(&self, guild_id: u64) -> anyhow::Result<Vec<LiveChannel>> {
        self.check_guild(guild_id)?;
        Ok(self.state().channels.clone())
    }

    async fn roles(&self, guild_id: u64) -> anyhow::Result<Vec<LiveRole>> {
        self.check_guild(guild_id)?;
        Ok(self.state().roles.clone())
    }

    async fn create_role(
        &self,
        guild_id: u64,
        role: &NewRole,
        _reason: &str,
    ) -> anyhow::Result<u64> {
        self.check_guild(guild_id)?;
        let mut state = self.state();
        if state.failing_names.contains(&role.name) {
            bail!("role creation rejected");
        }
        let id = state.next_id();
        let position = i64::try_from(state.roles.len()).unwrap_or(0);
        state.roles.push(LiveRole {
            id,
            name: role.name.clone(),
            color: role.color,
            hoist: role.hoist,
            managed: false,
            permissions: role.permissions,
            position,
        });
        state.created_roles.push(role.name.clone());
        Ok(id)
    }

    async fn create_channel(
        &self,
        guild_id: u64,
        channel: &NewChannel,
        _reason: &str,
    ) -> anyhow::Result<u64> {
        self.check_guild(guild_id)?;
        let mut state = self.state();
        if state.failing_names.contains(&channel.name) {
            bail!("channel creation rejected");
        }
        let id = state.next_id();
        let position = i64::try_from(state.channels.len()).unwrap_or(0);
        state.channels.push(LiveChannel {
            id,
            name: channel.name.clone(),
            kind: channel.kind,
            parent_id: channel.parent_id,
            position,
            overwrites: Vec::new(),
        });
        state.created_channels.push(channel.name.clone());
        Ok(id)
    }

    async fn ban(&self, guild_id: u64, user_id: u64, reason: &str) -> anyhow::Result<()> {
        self.check_guild(guild_id)?;
        let mut state = self.state();
        if state.fail_bans {
            bail!("ban rejected");
        }
        state.bans.push((user_id, reason.to_owned()));
        Ok(())
    }

    async fn send_alert(&self, channel_id: u64, incident: &IncidentRecord) -> anyhow::Result<()> {
        let mut state = self.state();
        if state.fail_alerts {
            bail!("alert rejected");
        }
        state.alerts.push((channel_id, incident.clone()));
        Ok(())
    }
}

#[derive(Default)]
struct StoreState {
    settings: HashMap<u64, GuildProtectionSettings>,
    snapshots: HashMap<u64, GuildSnapshot>,
    alert_channels: HashMap<u64, u64>,
    snapshot_reads: usize,
    fail_snapshot_writes: bool,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    pub fn with_snapshot(guild_id: u64, snapshot: GuildSnapshot) -> Self {
        let store = Self::default();
        store.state().snapshots.insert(guild_id, snapshot);
        store
    }

    fn state(&self) -> std::sync::MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn snapshot(&self, guild_id: u64) -> Option<GuildSnapshot> {
        self.state().snapshots.get(&guild_id).cloned()
    }

    /// How many times restoration has looked up a snapshot.
    pub fn snapshot_reads(&self) -> usize {
        self.state().snapshot_reads
    }

    pub fn fail_snapshot_writes(&self) {
        self.state().fail_snapshot_writes = true;
    }

    pub fn set_settings(&self, settings: GuildProtectionSettings) {
        let guild_id = u64::try_from(settings.guild_id).unwrap_or_default();
        self.state().settings.insert(guild_id, settings);
    }

    pub fn set_alert_channel(&self, guild_id: u64, channel_id: u64) {
        self.state().alert_channels.insert(guild_id, channel_id);
    }
}

#[async_trait]
impl ProtectionStore for MemoryStore {
    async fn protection_settings(
        &self,
        guild_id: u64,
    ) -> anyhow::Result<Option<GuildProtectionSettings>> {
        Ok(self.state().settings.get(&guild_id).cloned())
    }

    async fn latest_snapshot(&self, guild_id: u64) -> anyhow::Result<Option<GuildSnapshot>> {
        let mut state = self.state();
        state.snapshot_reads += 1;
        Ok(state.snapshots.get(&guild_id).cloned())
    }

    async fn save_snapshot(&self, guild_id: u64, snapshot: &GuildSnapshot) -> anyhow::Result<()> {
        let mut state = self.state();
        if state.fail_snapshot_writes {
            bail!("snapshot write rejected");
        }
        state.snapshots.insert(guild_id, snapshot.clone());
        Ok(())
    }

    async fn alert_channel(&self, guild_id: u64) -> anyhow::Result<Option<u64>> {
        Ok(self.state().alert_channels.get(&guild_id).copied())
    }
}
