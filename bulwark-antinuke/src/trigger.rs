//! Punitive response once an actor crosses the deletion threshold.
//!
//! Banning and restoring are independent and both best-effort: a failed ban
//! still restores, and restoration runs in the background so the event
//! handler returns immediately.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use bulwark_utils::permissions::is_missing_permissions;

use crate::clock::Clock;
use crate::gateway::GuildGateway;
use crate::restore::{RestoreOutcome, RestoreReport, restore};
use crate::store::ProtectionStore;

pub const BAN_REASON: &str = "Anti-Nuke System Triggered: Mass Deletion Detected";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IncidentAction {
    Banned,
    BanFailed,
}

impl IncidentAction {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Banned => "BANNED",
            Self::BanFailed => "BAN_FAILED",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RestorationStatus {
    Pending,
    Completed(RestoreReport),
    NoSnapshot,
    Failed,
}

impl RestorationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed(_) => "COMPLETED",
            Self::NoSnapshot => "NO_SNAPSHOT",
            Self::Failed => "FAILED",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IncidentRecord {
    pub guild_id: u64,
    pub actor_id: u64,
    /// Unix milliseconds.
    pub detected_at: u64,
    pub action: IncidentAction,
    pub restoration: RestorationStatus,
}

#[derive(Debug)]
pub struct TriggerResponse {
    pub incident: IncidentRecord,
    /// Background restoration; resolves to its final status.
    pub restoration: JoinHandle<RestorationStatus>,
}

pub async fn respond(
    gateway: Arc<dyn GuildGateway>,
    store: Arc<dyn ProtectionStore>,
    clock: &dyn Clock,
    guild_id: u64,
    actor_id: u64,
    pacing: Duration,
) -> TriggerResponse {
    let action = match gateway.ban(guild_id, actor_id, BAN_REASON).await {
        Ok(()) => IncidentAction::Banned,
        Err(source) => {
            if is_permission_denied(&source) {
                warn!(guild_id, actor_id, "missing permissions to ban nuker (check role hierarchy)");
            } else {
                error!(?source, guild_id, actor_id, "failed to ban nuker");
            }
            IncidentAction::BanFailed
        }
    };

    let incident = IncidentRecord {
        guild_id,
        actor_id,
        detected_at: clock.unix_millis(),
        action,
        restoration: RestorationStatus::Pending,
    };

    warn!(
        guild_id,
        actor_id,
        detected_at = incident.detected_at,
        action = incident.action.as_str(),
        restoration = incident.restoration.as_str(),
        "anti-nuke triggered: mass deletion detected"
    );

    let alert_channel = match store.alert_channel(guild_id).await {
        Ok(channel) => channel,
        Err(source) => {
            error!(?source, guild_id, "failed to read anti-nuke alert channel");
            None
        }
    };

    if let Some(channel_id) = alert_channel {
        notify(gateway.as_ref(), channel_id, &incident).await;
    }

    let restoration = tokio::spawn(run_restoration(
        gateway,
        store,
        incident.clone(),
        alert_channel,
        pacing,
    ));

    TriggerResponse {
        incident,
        restoration,
    }
}

async fn run_restoration(
    gateway: Arc<dyn GuildGateway>,
    store: Arc<dyn ProtectionStore>,
    mut incident: IncidentRecord,
    alert_channel: Option<u64>,
    pacing: Duration,
) -> RestorationStatus {
    let guild_id = incident.guild_id;
    let status = match restore(gateway.as_ref(), store.as_ref(), guild_id, pacing).await {
        Ok(RestoreOutcome::Completed(report)) => RestorationStatus::Completed(report),
        Ok(RestoreOutcome::NoSnapshot) => RestorationStatus::NoSnapshot,
        Err(source) => {
            error!(?source, guild_id, "restoration aborted");
            RestorationStatus::Failed
        }
    };

    info!(
        guild_id,
        actor_id = incident.actor_id,
        restoration = status.as_str(),
        "anti-nuke incident closed"
    );

    incident.restoration = status;
    if let Some(channel_id) = alert_channel {
        notify(gateway.as_ref(), channel_id, &incident).await;
    }

    status
}

async fn notify(gateway: &dyn GuildGateway, channel_id: u64, incident: &IncidentRecord) {
    if let Err(source) = gateway.send_alert(channel_id, incident).await {
        if is_permission_denied(&source) {
            warn!(channel_id, "missing permissions to post anti-nuke alert");
        } else {
            error!(?source, channel_id, "failed to post anti-nuke alert");
        }
    }
}

fn is_permission_denied(source: &anyhow::Error) -> bool {
    source
        .downcast_ref::<serenity::Error>()
        .is_some_and(is_missing_permissions)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use bulwark_database::model::snapshot::{GuildSnapshot, RoleRecord};

    use super::{BAN_REASON, IncidentAction, RestorationStatus, respond};
    use crate::clock::ManualClock;
    use crate::testing::{FakeGateway, MemoryStore};

    const GUILD: u64 = 100;

    fn snapshot_with_role(name: &str) -> GuildSnapshot {
        GuildSnapshot {
            roles: vec![RoleRecord {
                name: name.to_owned(),
                color: 0,
                hoisted: false,
                permissions: "0".to_owned(),
                position: 1,
            }],
            ..GuildSnapshot::default()
        }
    }

    #[tokio::test]
    async fn bans_alerts_and_restores() {
        let gateway = Arc::new(FakeGateway::new(GUILD));
        let store = Arc::new(MemoryStore::with_snapshot(GUILD, snapshot_with_role("Staff")));
        store.set_alert_channel(GUILD, 555);
        let clock = ManualClock::new(9_000);

        let response = respond(
            gateway.clone(),
            store.clone(),
            &clock,
            GUILD,
            42,
            Duration::ZERO,
        )
        .await;
        assert_eq!(response.incident.action, IncidentAction::Banned);
        assert_eq!(response.incident.detected_at, 9_000);

        let status = response.restoration.await.unwrap();
        assert!(matches!(status, RestorationStatus::Completed(report) if report.roles.created == 1));

        assert_eq!(gateway.bans(), vec![(42, BAN_REASON.to_owned())]);
        let alerts = gateway.alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].0, 555);
        assert_eq!(alerts[0].1.restoration, RestorationStatus::Pending);
        assert_eq!(alerts[1].1.restoration, status);
    }

    #[tokio::test]
    async fn failed_ban_still_restores() {
        let gateway = Arc::new(FakeGateway::new(GUILD));
        gateway.fail_bans();
        let store = Arc::new(MemoryStore::with_snapshot(GUILD, snapshot_with_role("Staff")));
        let clock = ManualClock::new(0);

        let response = respond(gateway.clone(), store, &clock, GUILD, 42, Duration::ZERO).await;
        assert_eq!(response.incident.action, IncidentAction::BanFailed);

        response.restoration.await.unwrap();
        assert_eq!(gateway.created_roles(), vec!["Staff".to_owned()]);
    }

    #[tokio::test]
    async fn no_alert_channel_means_no_alerts() {
        let gateway = Arc::new(FakeGateway::new(GUILD));
        let store = Arc::new(MemoryStore::default());
        let clock = ManualClock::new(0);

        let response = respond(gateway.clone(), store, &clock, GUILD, 42, Duration::ZERO).await;
        let status = response.restoration.await.unwrap();

        assert_eq!(status, RestorationStatus::NoSnapshot);
        assert!(gateway.alerts().is_empty());
    }

    #[tokio::test]
    async fn alert_failure_is_swallowed() {
        let gateway = Arc::new(FakeGateway::new(GUILD));
        gateway.fail_alerts();
        let store = Arc::new(MemoryStore::with_snapshot(GUILD, snapshot_with_role("Staff")));
        store.set_alert_channel(GUILD, 555);
        let clock = ManualClock::new(0);

        let response = respond(gateway.clone(), store, &clock, GUILD, 42, Duration::ZERO).await;
        let status = response.restoration.await.unwrap();
        assert!(matches!(status, RestorationStatus::Completed(_)));
    }
}
