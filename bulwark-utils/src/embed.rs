/// Default embed color used across the bot UI.
pub const DEFAULT_EMBED_COLOR: u32 = 0x90_55_30;

/// Color for anti-nuke incident alerts.
pub const ALERT_EMBED_COLOR: u32 = 0xED_42_45;
