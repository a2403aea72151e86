use crate::CommandMeta;

pub fn unknown_category_message(wanted_category: &str, valid_categories: &[&str]) -> String {
    let valid = valid_categories
        .iter()
        .map(|category| display_category(category))
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        "Unknown category: {}\nValid categories: {}",
        display_category(wanted_category),
        valid
    )
}

pub fn no_commands_message(category: Option<&str>) -> String {
    match category {
        Some(cat) => format!("No commands found in category: {}", display_category(cat)),
        None => "No commands found at all. (This probably means something is broken)".to_owned(),
    }
}

pub fn grouped_help_description(commands: &[&CommandMeta]) -> String {
    let mut out = String::new();
    let mut current_category: Option<&str> = None;

    for command in commands {
        if current_category != Some(command.category) {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&format!("**{}**\n", display_category(command.category)));
            current_category = Some(command.category);
        }

        out.push_str(&format!("`{}`: {}\n", command.name, command.desc));
    }

    if out.is_empty() {
        out.push_str("No commands available.");
    }

    out.trim_end().to_owned()
}

fn display_category(category: &str) -> String {
    let mut chars = category.chars();
    match chars.next() {
        Some(first) => format!("{}{}", first.to_uppercase(), chars.as_str()),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::{grouped_help_description, no_commands_message, unknown_category_message};
    use crate::CommandMeta;

    const PING: CommandMeta = CommandMeta {
        name: "ping",
        desc: "Replies with Pong!",
        category: "utility",
        usage: "!ping",
    };

    const ANTINUKE: CommandMeta = CommandMeta {
        name: "antinuke",
        desc: "Configure mass-deletion protection.",
        category: "moderation",
        usage: "!antinuke",
    };

    #[test]
    fn groups_commands_under_category_headings() {
        let description = grouped_help_description(&[&ANTINUKE, &PING]);
        assert_eq!(
            description,
            "**Moderation**\n`antinuke`: Configure mass-deletion protection.\n\n\
             **Utility**\n`ping`: Replies with Pong!"
        );
    }

    #[test]
    fn empty_listing_says_so() {
        assert_eq!(grouped_help_description(&[]), "No commands available.");
        assert!(no_commands_message(Some("fun")).contains("Fun"));
    }

    #[test]
    fn unknown_category_lists_valid_ones() {
        let message = unknown_category_message("fun", &["moderation", "utility"]);
        assert_eq!(
            message,
            "Unknown category: Fun\nValid categories: Moderation, Utility"
        );
    }
}
