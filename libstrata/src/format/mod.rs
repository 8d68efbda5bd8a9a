//! Human-readable formatting of image sizes, ids and timestamps.

use crate::index::SHORT_ID_LEN;
use chrono::{DateTime, Local, Utc};
use chrono_humanize::Humanize;
use humansize::{BINARY, format_size as format_size_human};


/// Formats a byte size using binary units (KiB, MiB, GiB).
///
/// # Examples
///
/// ```
/// use libstrata::format::format_size;
///
/// assert_eq!(format_size(1024 * 1024 * 5), "5 MiB");
/// ```
pub fn format_size(size_bytes: u64) -> String {
    format_size_human(size_bytes, BINARY)
}

/// Formats an optional size, `-` when the size is not recorded.
pub fn format_optional_size(size_bytes: Option<u64>) -> String {
    size_bytes.map(format_size).unwrap_or_else(|| "-".to_string())
}

/// Formats a timestamp relative to now, e.g. "a day ago".
///
/// # Examples
///
/// ```
/// use libstrata::format::format_timestamp;
/// use chrono::{Duration, Utc};
///
/// let one_day_ago = Utc::now() - Duration::days(1);
/// assert_eq!(format_timestamp(&one_day_ago), "a day ago");
/// ```
pub fn format_timestamp(timestamp: &DateTime<Utc>) -> String {
    timestamp.humanize()
}

/// Formats a timestamp in the local timezone.
pub fn format_timestamp_local(timestamp: &DateTime<Utc>) -> String {
    timestamp
        .with_timezone(&Local)
        .format("%Y-%m-%d %H:%M:%S %Z")
        .to_string()
}

/// The first [`SHORT_ID_LEN`] characters of an id.
///
/// # Examples
///
/// ```
/// use libstrata::format::abbreviate_id;
///
/// assert_eq!(abbreviate_id("0123456789abcdef0123"), "0123456789ab");
/// assert_eq!(abbreviate_id("abc"), "abc");
/// ```
pub fn abbreviate_id(id: &str) -> &str {
    id.get(..SHORT_ID_LEN).unwrap_or(id)
}
