use poise::serenity_prelude as serenity;

use bulwark_antinuke::restore::RestoreOutcome;
use bulwark_database::model::antinuke::GuildProtectionSettings;
use bulwark_database::model::snapshot::GuildSnapshot;
use bulwark_utils::embed::DEFAULT_EMBED_COLOR;
use bulwark_utils::formatting::{discord_relative_time, format_compact_duration};

pub fn guild_only_message() -> &'static str {
    "This command only works in servers."
}

pub fn missing_permission_message() -> &'static str {
    "You need the **Manage Server** permission to configure anti-nuke."
}

pub fn status_description(
    settings: Option<&GuildProtectionSettings>,
    guild_id: u64,
    alert_channel: Option<u64>,
    snapshot: Option<&GuildSnapshot>,
) -> String {
    let settings = settings
        .cloned()
        .unwrap_or_else(|| GuildProtectionSettings::defaults_for(guild_id as i64));
    let status = if settings.enabled { "Enabled" } else { "Disabled" };
    let window = format_compact_duration(settings.threshold_window_seconds.max(0) as u64);
    let alerts = match alert_channel {
        Some(channel_id) => format!("<#{}>", channel_id),
        None => "Not set".to_owned(),
    };
    let last_snapshot = match snapshot {
        Some(snapshot) => format!(
            "{} ({} channel(s), {} role(s))",
            discord_relative_time(snapshot.captured_at),
            snapshot.channels.len(),
            snapshot.roles.len()
        ),
        None => "Never".to_owned(),
    };

    format!(
        "**Status :** {}\n\
         **Threshold :** {} deletion(s) within {}\n\
         **Alert Channel :** {}\n\
         **Last Snapshot :** {}\n\n\
         Anyone who deletes **{}** channel(s) or role(s) within **{}** is \
         banned and the server is rebuilt from the last snapshot.",
        status,
        settings.threshold_count,
        window,
        alerts,
        last_snapshot,
        settings.threshold_count,
        window,
    )
}

pub fn status_embed(description: String) -> serenity::CreateEmbed {
    serenity::CreateEmbed::new()
        .title("Anti-Nuke Config")
        .description(description)
        .color(DEFAULT_EMBED_COLOR)
        .footer(serenity::CreateEmbedFooter::new(
            "Subcommands: enable, disable, set threshold/window, alertchannel, snapshot, restore",
        ))
}

pub fn snapshot_summary(snapshot: &GuildSnapshot) -> String {
    format!(
        "Snapshot saved: **{}** channel(s) and **{}** role(s).",
        snapshot.channels.len(),
        snapshot.roles.len()
    )
}

pub fn restore_summary(outcome: &RestoreOutcome) -> String {
    match outcome {
        RestoreOutcome::NoSnapshot => {
            "No snapshot is stored for this server. Run `!antinuke snapshot` first.".to_owned()
        }
        RestoreOutcome::Completed(report) => format!(
            "Restoration finished: **{}** role(s), **{}** categor(ies) and **{}** channel(s) \
             recreated; **{}** failed.",
            report.roles.created,
            report.categories.created,
            report.channels.created,
            report.failed()
        ),
    }
}
