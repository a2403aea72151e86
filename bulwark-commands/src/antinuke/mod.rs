mod embeds;

use poise::serenity_prelude as serenity;
use tracing::error;

use crate::CommandMeta;
use bulwark_antinuke::SerenityGateway;
use bulwark_core::{Context, Error};
use bulwark_database::impls::alert_config::{
    clear_antinuke_alert_channel_id, get_antinuke_alert_channel_id, set_antinuke_alert_channel_id,
};
use bulwark_database::impls::antinuke_config::{
    get_protection_settings, set_antinuke_enabled, set_threshold_count, set_threshold_window,
};
use bulwark_database::impls::snapshots::get_snapshot;
use bulwark_database::model::antinuke::{MAX_THRESHOLD_COUNT, MAX_THRESHOLD_WINDOW_SECONDS};
use bulwark_utils::formatting::format_compact_duration;
use bulwark_utils::parse::{parse_channel_id, parse_duration_seconds};
use bulwark_utils::permissions::has_user_permission;

use embeds::{
    guild_only_message, missing_permission_message, restore_summary, snapshot_summary,
    status_description, status_embed,
};

pub const META: CommandMeta = CommandMeta {
    name: "antinuke",
    desc: "Configure mass-deletion protection.",
    category: "moderation",
    usage: "!antinuke <enable|disable|set|alertchannel|snapshot|restore>",
};

/// Resolve the guild and check the author may configure it.
async fn managed_guild(ctx: Context<'_>) -> Result<Option<serenity::GuildId>, Error> {
    let Some(guild_id) = ctx.guild_id() else {
        ctx.say(guild_only_message()).await?;
        return Ok(None);
    };

    if !has_user_permission(
        ctx.http(),
        guild_id,
        ctx.author().id,
        serenity::Permissions::MANAGE_GUILD,
    )
    .await?
    {
        ctx.say(missing_permission_message()).await?;
        return Ok(None);
    }

    Ok(Some(guild_id))
}

fn gateway(ctx: Context<'_>) -> SerenityGateway {
    SerenityGateway::new(ctx.serenity_context().http.clone())
}

fn parse_threshold_count(raw: &str) -> Result<i32, &'static str> {
    let count = raw
        .parse::<i32>()
        .map_err(|_| "Invalid number. Usage: `!antinuke set threshold <count>` (e.g. `5`)")?;
    if !(1..=MAX_THRESHOLD_COUNT).contains(&count) {
        return Err("Threshold must be between 1 and 100.");
    }
    Ok(count)
}

fn parse_window_seconds(raw: &str) -> Result<u64, &'static str> {
    let seconds =
        parse_duration_seconds(raw).ok_or("Invalid duration. Examples: `10s`, `30s`, `1m`")?;
    if seconds == 0 || seconds > MAX_THRESHOLD_WINDOW_SECONDS.unsigned_abs() {
        return Err("Window must be between 1s and 1h.");
    }
    Ok(seconds)
}

/// Show anti-nuke protection status for this server.
#[poise::command(
    prefix_command,
    slash_command,
    category = "Moderation",
    subcommands("enable", "disable", "set", "alertchannel", "snapshot", "restore")
)]
pub async fn antinuke(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = managed_guild(ctx).await? else {
        return Ok(());
    };

    let db = &ctx.data().db;
    let settings = get_protection_settings(db, guild_id.get()).await?;
    let alert_channel = get_antinuke_alert_channel_id(db, guild_id.get()).await?;
    let snapshot = get_snapshot(db, guild_id.get()).await?;

    let description = status_description(
        settings.as_ref(),
        guild_id.get(),
        alert_channel,
        snapshot.as_ref(),
    );
    ctx.send(poise::CreateReply::default().embed(status_embed(description)))
        .await?;

    Ok(())
}

/// Enable protection and take a fresh snapshot.
#[poise::command(prefix_command, slash_command, category = "Moderation")]
pub async fn enable(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = managed_guild(ctx).await? else {
        return Ok(());
    };

    set_antinuke_enabled(&ctx.data().db, guild_id.get(), true).await?;

    match ctx
        .data()
        .antinuke
        .capture(&gateway(ctx), guild_id.get())
        .await
    {
        Ok(snapshot) => {
            ctx.say(format!(
                "Anti-nuke has been **enabled**. {}",
                snapshot_summary(&snapshot)
            ))
            .await?;
        }
        Err(source) => {
            error!(?source, guild_id = guild_id.get(), "snapshot on enable failed");
            ctx.say(
                "Anti-nuke has been **enabled**, but the server snapshot failed. \
                 Run `!antinuke snapshot` once the bot can see every channel and role.",
            )
            .await?;
        }
    }

    Ok(())
}

/// Disable protection.
#[poise::command(prefix_command, slash_command, category = "Moderation")]
pub async fn disable(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = managed_guild(ctx).await? else {
        return Ok(());
    };

    set_antinuke_enabled(&ctx.data().db, guild_id.get(), false).await?;
    ctx.say("Anti-nuke has been **disabled**.").await?;

    Ok(())
}

/// Set protection thresholds.
#[poise::command(
    prefix_command,
    slash_command,
    category = "Moderation",
    subcommands("threshold", "window")
)]
pub async fn set(ctx: Context<'_>) -> Result<(), Error> {
    ctx.say(
        "Usage:\n\
         `!antinuke set threshold <count>` (deletions that trigger a ban, e.g. `5`)\n\
         `!antinuke set window <duration>` (counting window, e.g. `10s`, `1m`)",
    )
    .await?;

    Ok(())
}

/// Set how many deletions trigger the ban.
#[poise::command(prefix_command, slash_command, category = "Moderation")]
pub async fn threshold(
    ctx: Context<'_>,
    #[description = "Deletions within the window before banning"]
    #[rest]
    input: Option<String>,
) -> Result<(), Error> {
    let Some(guild_id) = managed_guild(ctx).await? else {
        return Ok(());
    };

    let Some(raw) = input.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        ctx.say("Usage: `!antinuke set threshold <count>` (e.g. `5`)")
            .await?;
        return Ok(());
    };

    let count = match parse_threshold_count(raw) {
        Ok(count) => count,
        Err(message) => {
            ctx.say(message).await?;
            return Ok(());
        }
    };

    set_threshold_count(&ctx.data().db, guild_id.get(), count).await?;
    ctx.say(format!("Deletion threshold set to **{}**.", count))
        .await?;

    Ok(())
}

/// Set the window deletions are counted in.
#[poise::command(prefix_command, slash_command, category = "Moderation")]
pub async fn window(
    ctx: Context<'_>,
    #[description = "Duration (e.g. 10s, 1m)"]
    #[rest]
    input: Option<String>,
) -> Result<(), Error> {
    let Some(guild_id) = managed_guild(ctx).await? else {
        return Ok(());
    };

    let Some(raw) = input.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        ctx.say("Usage: `!antinuke set window <duration>` (e.g. `10s`, `1m`)")
            .await?;
        return Ok(());
    };

    let seconds = match parse_window_seconds(raw) {
        Ok(seconds) => seconds,
        Err(message) => {
            ctx.say(message).await?;
            return Ok(());
        }
    };

    set_threshold_window(&ctx.data().db, guild_id.get(), seconds as i64).await?;
    ctx.say(format!(
        "Deletion window set to **{}**.",
        format_compact_duration(seconds)
    ))
    .await?;

    Ok(())
}

/// Set or clear the channel incident alerts are posted to.
#[poise::command(prefix_command, slash_command, category = "Moderation")]
pub async fn alertchannel(
    ctx: Context<'_>,
    #[description = "Channel mention or id, or `clear`"]
    #[rest]
    input: Option<String>,
) -> Result<(), Error> {
    let Some(guild_id) = managed_guild(ctx).await? else {
        return Ok(());
    };

    let db = &ctx.data().db;
    let raw = input.as_deref().map(str::trim).filter(|s| !s.is_empty());

    match raw {
        None => {
            let message = match get_antinuke_alert_channel_id(db, guild_id.get()).await? {
                Some(channel_id) => format!("Anti-nuke alerts are sent to <#{}>.", channel_id),
                None => "No anti-nuke alert channel is set. \
                         Usage: `!antinuke alertchannel <#channel|clear>`"
                    .to_owned(),
            };
            ctx.say(message).await?;
        }
        Some(value) if value.eq_ignore_ascii_case("clear") => {
            clear_antinuke_alert_channel_id(db, guild_id.get()).await?;
            ctx.say("Anti-nuke alert channel cleared.").await?;
        }
        Some(value) => {
            let Some(channel_id) = parse_channel_id(value) else {
                ctx.say("Invalid channel. Use a channel mention like `#alerts` or its id.")
                    .await?;
                return Ok(());
            };
            set_antinuke_alert_channel_id(db, guild_id.get(), channel_id).await?;
            ctx.say(format!("Anti-nuke alerts will be sent to <#{}>.", channel_id))
                .await?;
        }
    }

    Ok(())
}

/// Replace the stored snapshot with the server's current layout.
#[poise::command(prefix_command, slash_command, category = "Moderation")]
pub async fn snapshot(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = managed_guild(ctx).await? else {
        return Ok(());
    };

    let snapshot = ctx
        .data()
        .antinuke
        .capture(&gateway(ctx), guild_id.get())
        .await?;
    ctx.say(snapshot_summary(&snapshot)).await?;

    Ok(())
}

/// Recreate missing channels and roles from the stored snapshot.
#[poise::command(prefix_command, slash_command, category = "Moderation")]
pub async fn restore(ctx: Context<'_>) -> Result<(), Error> {
    let Some(guild_id) = managed_guild(ctx).await? else {
        return Ok(());
    };

    ctx.say("Restoring from the last snapshot. This can take a while.")
        .await?;
    let outcome = ctx
        .data()
        .antinuke
        .restore(&gateway(ctx), guild_id.get())
        .await?;
    ctx.say(restore_summary(&outcome)).await?;

    Ok(())
}
