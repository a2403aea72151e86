/// Shared embed colors.
pub mod embed;
/// Shared formatting helpers.
pub mod formatting;
/// Single source of truth for the message-command prefix.
pub const COMMAND_PREFIX: char = '!';
/// Pure parser helpers.
pub mod parse;
/// Permission helper utilities.
pub mod permissions;
