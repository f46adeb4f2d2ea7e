use chrono::{DateTime, Local, NaiveDateTime, TimeZone};

/// Cut `text` to `max_chars` characters, appending `...` when anything was dropped
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
    }
}

/// Parse the timestamps the backend emits: RFC 3339, or naive ISO-8601 in local time
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Local>> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Local));
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .and_then(|naive| Local.from_local_datetime(&naive).earliest())
}

/// Human relative age of a history timestamp, e.g. `5m ago`
pub fn format_timestamp(raw: &str, now: DateTime<Local>) -> String {
    let Some(at) = parse_timestamp(raw) else {
        return raw.to_string();
    };

    let elapsed = now.signed_duration_since(at);
    let minutes = elapsed.num_minutes();
    let hours = elapsed.num_hours();
    let days = elapsed.num_days();

    if minutes < 1 {
        "Just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if hours < 24 {
        format!("{}h ago", hours)
    } else if days < 7 {
        format!("{}d ago", days)
    } else {
        at.format("%Y-%m-%d").to_string()
    }
}
