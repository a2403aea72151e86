use anyhow::Context as _;

use crate::cache::{CONFIG_CACHE_TTL, antinuke_config_key, invalidate_antinuke_config};
use crate::database::Database;
use crate::model::antinuke::{
    DEFAULT_THRESHOLD_COUNT, DEFAULT_THRESHOLD_WINDOW_SECONDS, GuildProtectionSettings,
};

pub async fn get_protection_settings(
    db: &Database,
    guild_id: u64,
) -> anyhow::Result<Option<GuildProtectionSettings>> {
    let cache_key = antinuke_config_key(db.cache(), guild_id);
    db.cache()
        .get_or_load_json(&cache_key, CONFIG_CACHE_TTL, || async {
            let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

            let row = sqlx::query_as::<_, GuildProtectionSettings>(
                "SELECT guild_id, enabled, threshold_count, threshold_window_seconds \
                 FROM antinuke_config WHERE guild_id = $1",
            )
            .bind(guild_id_i64)
            .fetch_optional(db.pool())
            .await?;

            Ok(row)
        })
        .await
}

/// Toggle protection. A guild's first row is seeded with the default threshold.
pub async fn set_antinuke_enabled(
    db: &Database,
    guild_id: u64,
    enabled: bool,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    sqlx::query(
        "INSERT INTO antinuke_config (guild_id, enabled, threshold_count, threshold_window_seconds) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (guild_id) DO UPDATE SET enabled = EXCLUDED.enabled",
    )
    .bind(guild_id_i64)
    .bind(enabled)
    .bind(DEFAULT_THRESHOLD_COUNT)
    .bind(DEFAULT_THRESHOLD_WINDOW_SECONDS)
    .execute(db.pool())
    .await?;

    invalidate_antinuke_config(db.cache(), guild_id).await?;

    Ok(())
}

pub async fn set_threshold_count(db: &Database, guild_id: u64, count: i32) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    sqlx::query(
        "INSERT INTO antinuke_config (guild_id, threshold_count) VALUES ($1, $2) \
         ON CONFLICT (guild_id) DO UPDATE SET threshold_count = $2",
    )
    .bind(guild_id_i64)
    .bind(count)
    .execute(db.pool())
    .await?;

    invalidate_antinuke_config(db.cache(), guild_id).await?;

    Ok(())
}

pub async fn set_threshold_window(
    db: &Database,
    guild_id: u64,
    window_seconds: i64,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    sqlx::query(
        "INSERT INTO antinuke_config (guild_id, threshold_window_seconds) VALUES ($1, $2) \
         ON CONFLICT (guild_id) DO UPDATE SET threshold_window_seconds = $2",
    )
    .bind(guild_id_i64)
    .bind(window_seconds)
    .execute(db.pool())
    .await?;

    invalidate_antinuke_config(db.cache(), guild_id).await?;

    Ok(())
}

/// Guild ids with protection switched on, for the periodic snapshot refresh.
pub async fn list_protected_guild_ids(db: &Database) -> anyhow::Result<Vec<u64>> {
    let rows: Vec<i64> =
        sqlx::query_scalar("SELECT guild_id FROM antinuke_config WHERE enabled = TRUE")
            .fetch_all(db.pool())
            .await?;

    rows.into_iter()
        .map(|id| u64::try_from(id).context("guild_id out of u64 range"))
        .collect()
}
