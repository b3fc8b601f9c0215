//! Display helpers shared by the pages.

use chrono::{DateTime, NaiveDateTime};

const KIB: u64 = 1024;
const MIB: u64 = 1024 * 1024;

/// Human-readable size: bytes below 1 KB, otherwise KB or MB with two decimals.
pub fn format_file_size(size: u64) -> String {
    if size < KIB {
        format!("{size}B")
    } else if size < MIB {
        format!("{:.2}KB", size as f64 / KIB as f64)
    } else {
        format!("{:.2}MB", size as f64 / MIB as f64)
    }
}

/// `YYYY-MM-DD HH:MM` for a backend timestamp.
///
/// Offset-aware timestamps are shown in their own offset. Empty input gives an
/// empty string; input that is not a timestamp is returned unchanged.
pub fn format_time(raw: &str) -> String {
    const OUT: &str = "%Y-%m-%d %H:%M";

    let raw = raw.trim();
    if raw.is_empty() {
        return String::new();
    }
    if let Ok(time) = DateTime::parse_from_rfc3339(raw) {
        return time.format(OUT).to_string();
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(raw, pattern).ok())
        .map(|time| time.format(OUT).to_string())
        .unwrap_or_else(|| raw.to_string())
}
