/// Format seconds into a compact human-readable duration (e.g. 59s, 1m, 1h, 1d, 1h 30m).
pub fn format_compact_duration(total_seconds: u64) -> String {
    let days = total_seconds / 86_400;
    let hours = (total_seconds % 86_400) / 3_600;
    let minutes = (total_seconds % 3_600) / 60;
    let seconds = total_seconds % 60;

    if days > 0 {
        return if hours > 0 {
            format!("{}d {}h", days, hours)
        } else {
            format!("{}d", days)
        };
    }

    if hours > 0 {
        let mut parts = vec![format!("{}h", hours)];
        if minutes > 0 {
            parts.push(format!("{}m", minutes));
        }
        if seconds > 0 {
            parts.push(format!("{}s", seconds));
        }
        return parts.join(" ");
    }

    if minutes > 0 {
        return if seconds > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}m", minutes)
        };
    }

    format!("{}s", seconds)
}


/// Render a unix-millisecond timestamp as a Discord relative timestamp.
pub fn discord_relative_time(unix_millis: u64) -> String {
    format!("<t:{}:R>", unix_millis / 1_000)
}

#[cfg(test)]
mod tests {
    use super::{discord_relative_time, format_compact_duration};

    #[test]
    fn compact_duration_formatting() {
        assert_eq!(format_compact_duration(59), "59s");
        assert_eq!(format_compact_duration(60), "1m");
        assert_eq!(format_compact_duration(61), "1m 1s");
        assert_eq!(format_compact_duration(3600), "1h");
        assert_eq!(format_compact_duration(3660), "1h 1m");
        assert_eq!(format_compact_duration(3670), "1h 1m 10s");
        assert_eq!(format_compact_duration(3605), "1h 5s");
        assert_eq!(format_compact_duration(86400), "1d");
        assert_eq!(format_compact_duration(90000), "1d 1h");
    }

    #[test]
    fn relative_time_truncates_to_seconds() {
        assert_eq!(discord_relative_time(1_700_000_000_999), "<t:1700000000:R>");
    }
}
