const MINUTE_MS: i64 = 60_000;

/// Render an age in milliseconds as "just now", "5m ago", "2h ago", "3d ago".
///
/// Hours and days round up from the half mark. Negative ages (clock skew)
/// read as "just now".
pub fn format_age(age_ms: i64) -> String {
    let minutes = age_ms / MINUTE_MS;
    if minutes < 1 {
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// Render a remaining duration in milliseconds as "23h 59m" or "4m".
pub fn format_remaining(remaining_ms: i64) -> String {
    let minutes = remaining_ms.max(0) / MINUTE_MS;
    let (hours, minutes) = (minutes / 60, minutes % 60);
    if hours > 0 {
        format!("{}h {}m", hours, minutes)
    } else {
        format!("{}m", minutes)
    }
}

/// Truncate a string to a maximum length, adding ellipsis if needed
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else if max_len <= 3 {
        s.chars().take(max_len).collect()
    } else {
        let truncated: String = s.chars().take(max_len - 3).collect();
        format!("{}...", truncated)
    }
}
