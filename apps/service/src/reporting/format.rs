/// Render a whole number of seconds as a compact human duration
pub fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        return format!("{}s", seconds);
    }

    let days = seconds / 86_400;
    let hours = (seconds % 86_400) / 3_600;
    let minutes = (seconds % 3_600) / 60;
    let secs = seconds % 60;

    if days > 0 {
        format!("{}d {}h", days, hours)
    } else if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m {}s", minutes, secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_only() {
        assert_eq!(format_duration(0), "0s");
        assert_eq!(format_duration(45), "45s");
        assert_eq!(format_duration(59), "59s");
    }

    #[test]
    fn minutes_carry_seconds() {
        assert_eq!(format_duration(60), "1m 0s");
        assert_eq!(format_duration(200), "3m 20s");
    }

    #[test]
    fn hours_carry_minutes() {
        assert_eq!(format_duration(7_500), "2h 5m");
        assert_eq!(format_duration(86_399), "23h 59m");
    }

    #[test]
    fn days_carry_hours() {
        assert_eq!(format_duration(100_800), "1d 4h");
        assert_eq!(format_duration(86_400), "1d 0h");
    }
}
