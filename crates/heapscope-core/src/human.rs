//! Human-readable renderings of byte counts and durations.
//!
//! These populate the descriptive string fields of diff and leak reports;
//! they are presentation helpers, not parsers, and intentionally round
//! aggressively.

const KB: f64 = 1024.0;
const MB: f64 = 1024.0 * 1024.0;
const GB: f64 = 1024.0 * 1024.0 * 1024.0;
const TB: f64 = 1024.0 * 1024.0 * 1024.0 * 1024.0;

/// Render a (possibly negative) byte count, e.g. `"512 bytes"`, `"1.2 mb"`,
/// `"-6.8 kb"`.
pub fn nice_size(bytes: i64) -> String {
    let sign = if bytes < 0 { "-" } else { "" };
    let magnitude = bytes.unsigned_abs() as f64;

    if magnitude < KB {
        format!("{sign}{} bytes", bytes.unsigned_abs())
    } else if magnitude < MB {
        format!("{sign}{:.1} kb", magnitude / KB)
    } else if magnitude < GB {
        format!("{sign}{:.1} mb", magnitude / MB)
    } else if magnitude < TB {
        format!("{sign}{:.1} gb", magnitude / GB)
    } else {
        format!("{sign}{:.1} tb", magnitude / TB)
    }
}

/// Render an elapsed duration in its largest whole unit, e.g.
/// `"42 seconds"`, `"5 minutes"`, `"2 hours"`, `"3 days"`.
pub fn nice_delta(seconds: u64) -> String {
    let (value, unit) = if seconds < 60 {
        (seconds, "second")
    } else if seconds < 60 * 60 {
        (seconds / 60, "minute")
    } else if seconds < 24 * 60 * 60 {
        (seconds / (60 * 60), "hour")
    } else {
        (seconds / (24 * 60 * 60), "day")
    };

    if value == 1 {
        format!("1 {unit}")
    } else {
        format!("{value} {unit}s")
    }
}
