use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Deletions needed to trip protection when a guild first enables it.
pub const DEFAULT_THRESHOLD_COUNT: i32 = 5;
/// Counting window used when a guild first enables protection.
pub const DEFAULT_THRESHOLD_WINDOW_SECONDS: i64 = 10;
/// Largest deletion count a guild may configure.
pub const MAX_THRESHOLD_COUNT: i32 = 100;
/// Longest counting window a guild may configure.
pub const MAX_THRESHOLD_WINDOW_SECONDS: i64 = 3_600;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct GuildProtectionSettings {
    pub guild_id: i64,
    pub enabled: bool,
    pub threshold_count: i32,
    pub threshold_window_seconds: i64,
}

impl GuildProtectionSettings {
    /// Settings a guild gets before it has ever touched the config.
    pub fn defaults_for(guild_id: i64) -> Self {
        Self {
            guild_id,
            enabled: false,
            threshold_count: DEFAULT_THRESHOLD_COUNT,
            threshold_window_seconds: DEFAULT_THRESHOLD_WINDOW_SECONDS,
        }
    }
}
