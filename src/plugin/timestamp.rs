use std::sync::LazyLock;

use chrono::{Local, LocalResult, NaiveDate, NaiveDateTime, TimeZone};
use regex::{Captures, Regex};

// Tried in order; the first match wins.
static PATTERNS: LazyLock<[Regex; 3]> = LazyLock::new(|| {
    [
        // "Screenshot 2024-02-03 at 10.15.30"
        Regex::new(r"(\d{4})-(\d{2})-(\d{2}) at (\d{1,2})\.(\d{2})\.(\d{2})")
            .expect("valid macOS screenshot regex"),
        // "Screenshot_20240203-101530" / "IMG_20240203_101530"
        Regex::new(r"(\d{4})(\d{2})(\d{2})[-_](\d{2})(\d{2})(\d{2})")
            .expect("valid compact timestamp regex"),
        // "2024-02-03-10-15-30"
        Regex::new(r"(\d{4})-(\d{2})-(\d{2})-(\d{2})-(\d{2})-(\d{2})")
            .expect("valid dashed timestamp regex"),
    ]
});

/// Extracts a capture timestamp from an image name, as epoch milliseconds of
/// the local calendar time it names.
///
/// Returns `None` when no pattern matches or the captured fields are not a
/// real date and time.
pub fn parse_timestamp(name: &str) -> Option<i64> {
    let caps = PATTERNS.iter().find_map(|re| re.captures(name))?;
    let naive = naive_from_captures(&caps)?;

    let instant = match Local.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt,
        LocalResult::Ambiguous(earliest, _) => earliest,
        // Skipped by a DST transition.
        LocalResult::None => Local.from_utc_datetime(&naive),
    };
    Some(instant.timestamp_millis())
}

fn naive_from_captures(caps: &Captures<'_>) -> Option<NaiveDateTime> {
    let field = |i: usize| caps.get(i)?.as_str().parse::<u32>().ok();

    let year = i32::try_from(field(1)?).ok()?;
    NaiveDate::from_ymd_opt(year, field(2)?, field(3)?)?.and_hms_opt(field(4)?, field(5)?, field(6)?)
}
