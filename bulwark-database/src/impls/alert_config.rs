use anyhow::Context as _;

use crate::cache::{CONFIG_CACHE_TTL, alert_channel_key, invalidate_alert_channel};
use crate::database::Database;

pub async fn get_antinuke_alert_channel_id(
    db: &Database,
    guild_id: u64,
) -> anyhow::Result<Option<u64>> {
    let cache_key = alert_channel_key(db.cache(), guild_id);
    db.cache()
        .get_or_load_json(&cache_key, CONFIG_CACHE_TTL, || async {
            let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

            let channel_id: Option<i64> = sqlx::query_scalar(
                "SELECT antinuke_channel_id FROM guild_alert_config WHERE guild_id = $1",
            )
            .bind(guild_id_i64)
            .fetch_optional(db.pool())
            .await?
            .flatten();

            channel_id
                .map(u64::try_from)
                .transpose()
                .context("antinuke_channel_id out of u64 range")
        })
        .await
}

pub async fn set_antinuke_alert_channel_id(
    db: &Database,
    guild_id: u64,
    channel_id: u64,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let channel_id_i64 = i64::try_from(channel_id).context("channel_id out of i64 range")?;

    sqlx::query(
        "INSERT INTO guild_alert_config (guild_id, antinuke_channel_id)
         VALUES ($1, $2)
         ON CONFLICT (guild_id) DO UPDATE SET antinuke_channel_id = EXCLUDED.antinuke_channel_id",
    )
    .bind(guild_id_i64)
    .bind(channel_id_i64)
    .execute(db.pool())
    .await?;

    invalidate_alert_channel(db.cache(), guild_id).await?;

    Ok(())
}

pub async fn clear_antinuke_alert_channel_id(db: &Database, guild_id: u64) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    sqlx::query("DELETE FROM guild_alert_config WHERE guild_id = $1")
        .bind(guild_id_i64)
        .execute(db.pool())
        .await?;

    invalidate_alert_channel(db.cache(), guild_id).await?;

    Ok(())
}
