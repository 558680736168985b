//! Duration formatting for countdown surfaces.

/// Format a remaining time for a countdown.
///
/// Negative values read as `0:00`. Fractional seconds round up, so a session
/// that has just started shows its full length and `0:00` only appears once
/// the session is over. Spans of an hour or more use `H:MM:SS`.
pub fn format_remaining(remaining_secs: f64) -> String {
    let secs = if remaining_secs.is_finite() && remaining_secs > 0.0 {
        remaining_secs.ceil() as u64
    } else {
        0
    };

    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;
    if hours > 0 {
        format!("{hours}:{minutes:02}:{seconds:02}")
    } else {
        format!("{minutes}:{seconds:02}")
    }
}

/// Human label for a session length: "45 sec", "25 min", "1 min 30 sec".
pub fn format_duration_label(total_secs: u64) -> String {
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    match (minutes, seconds) {
        (0, s) => format!("{s} sec"),
        (m, 0) => format!("{m} min"),
        (m, s) => format!("{m} min {s} sec"),
    }
}
