pub mod antinuke;
pub mod utility;

use bulwark_core::{Data, Error};

pub struct CommandMeta {
    pub name: &'static str,
    pub desc: &'static str,
    pub category: &'static str,
    pub usage: &'static str,
}

pub const COMMANDS: &[CommandMeta] = &[
    utility::ping::META,
    utility::help::META,
    antinuke::META,
];

pub fn commands() -> Vec<poise::Command<Data, Error>> {
    vec![
        utility::ping::ping(),
        utility::help::help(),
        antinuke::antinuke(),
    ]
}
