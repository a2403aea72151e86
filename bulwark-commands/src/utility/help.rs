use poise::serenity_prelude as serenity;

use crate::utility::embeds::{
    grouped_help_description, no_commands_message, unknown_category_message,
};
use crate::{COMMANDS, CommandMeta};
use bulwark_core::{Context, Error};
use bulwark_utils::embed::DEFAULT_EMBED_COLOR;

pub const META: CommandMeta = CommandMeta {
    name: "help",
    desc: "Lists out all available commands.",
    category: "utility",
    usage: "!help [category]",
};

#[poise::command(prefix_command, slash_command, category = "Utility")]
pub async fn help(
    ctx: Context<'_>,
    #[description = "Category"] category: Option<String>,
) -> Result<(), Error> {
    let category = category.as_deref();

    let mut categories: Vec<&str> = COMMANDS.iter().map(|c| c.category).collect();
    categories.sort_unstable();
    categories.dedup();

    if let Some(wanted_category) = category
        && !categories.contains(&wanted_category)
    {
        ctx.say(unknown_category_message(wanted_category, &categories))
            .await?;
        return Ok(());
    }

    let commands = sorted_commands(category);
    if commands.is_empty() {
        ctx.say(no_commands_message(category)).await?;
        return Ok(());
    }

    let embed = serenity::CreateEmbed::new()
        .title("Available Commands")
        .color(DEFAULT_EMBED_COLOR)
        .description(grouped_help_description(&commands));
    ctx.send(poise::CreateReply::default().embed(embed)).await?;
    Ok(())
}

fn sorted_commands(category: Option<&str>) -> Vec<&'static CommandMeta> {
    let mut filtered: Vec<&'static CommandMeta> = COMMANDS
        .iter()
        .filter(|cmd| match category {
            Some(wanted) => cmd.category == wanted,
            None => true,
        })
        .collect();

    filtered.sort_unstable_by(|left, right| {
        left.category
            .cmp(right.category)
            .then_with(|| left.name.cmp(right.name))
    });

    filtered
}

#[cfg(test)]
mod tests {
    use super::sorted_commands;

    #[test]
    fn lists_every_command_sorted_by_category_then_name() {
        let names: Vec<&str> = sorted_commands(None).iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["antinuke", "help", "ping"]);
    }

    #[test]
    fn filters_by_category() {
        let names: Vec<&str> = sorted_commands(Some("utility"))
            .iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["help", "ping"]);
    }
}
