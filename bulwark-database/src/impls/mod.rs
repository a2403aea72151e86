pub mod alert_config;
pub mod antinuke_config;
pub mod snapshots;
