use anyhow::Context as _;
use sqlx::types::Json;

use crate::database::Database;
use crate::model::snapshot::GuildSnapshot;

/// Replace the guild's snapshot. Only the latest capture is kept.
pub async fn upsert_snapshot(
    db: &Database,
    guild_id: u64,
    snapshot: &GuildSnapshot,
) -> anyhow::Result<()> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;
    let captured_at =
        i64::try_from(snapshot.captured_at).context("captured_at out of i64 range")?;

    sqlx::query(
        "INSERT INTO guild_snapshots (guild_id, data, captured_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (guild_id) DO UPDATE SET data = EXCLUDED.data, captured_at = EXCLUDED.captured_at",
    )
    .bind(guild_id_i64)
    .bind(Json(snapshot))
    .bind(captured_at)
    .execute(db.pool())
    .await?;

    Ok(())
}

pub async fn get_snapshot(db: &Database, guild_id: u64) -> anyhow::Result<Option<GuildSnapshot>> {
    let guild_id_i64 = i64::try_from(guild_id).context("guild_id out of i64 range")?;

    let row: Option<Json<GuildSnapshot>> =
        sqlx::query_scalar("SELECT data FROM guild_snapshots WHERE guild_id = $1")
            .bind(guild_id_i64)
            .fetch_optional(db.pool())
            .await?;

    Ok(row.map(|Json(snapshot)| snapshot))
}
