//! Attributes a deletion notification to the account that performed it.

use std::time::Duration;

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::gateway::{DeletionKind, GuildGateway};

/// Audit entries older than this cannot be the cause of the event being handled.
pub const FRESHNESS_WINDOW: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DeletionAttribution {
    pub actor_id: u64,
    pub actor_is_bot: bool,
    /// Unix milliseconds.
    pub occurred_at: u64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UnattributableReason {
    QueryFailed,
    NoEntry,
    Stale { age_ms: u64 },
    UnknownExecutor,
    BotExecutor,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Attribution {
    Attributed(DeletionAttribution),
    Unattributable(UnattributableReason),
}

/// Look up who deleted the most recent `kind` in the guild. Never fails: any
/// problem reading the audit log is reported as unattributable.
pub async fn attribute(
    gateway: &dyn GuildGateway,
    clock: &dyn Clock,
    guild_id: u64,
    kind: DeletionKind,
) -> Attribution {
    let entry = match gateway.latest_deletion_entry(guild_id, kind).await {
        Ok(Some(entry)) => entry,
        Ok(None) => {
            debug!(guild_id, kind = kind.as_str(), "no audit entry for deletion");
            return Attribution::Unattributable(UnattributableReason::NoEntry);
        }
        Err(source) => {
            warn!(?source, guild_id, kind = kind.as_str(), "audit log query failed");
            return Attribution::Unattributable(UnattributableReason::QueryFailed);
        }
    };

    // Entries stamped slightly ahead of our clock count as brand new.
    let age_ms = clock.unix_millis().saturating_sub(entry.created_at);
    if u128::from(age_ms) > FRESHNESS_WINDOW.as_millis() {
        debug!(guild_id, age_ms, "audit entry too old to explain deletion");
        return Attribution::Unattributable(UnattributableReason::Stale { age_ms });
    }

    let Some(executor) = entry.executor else {
        return Attribution::Unattributable(UnattributableReason::UnknownExecutor);
    };

    if executor.bot {
        debug!(guild_id, executor_id = executor.id, "ignoring deletion by bot account");
        return Attribution::Unattributable(UnattributableReason::BotExecutor);
    }

    Attribution::Attributed(DeletionAttribution {
        actor_id: executor.id,
        actor_is_bot: executor.bot,
        occurred_at: entry.created_at,
    })
}
