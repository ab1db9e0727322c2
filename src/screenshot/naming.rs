//! File names for screenshot artifacts

use chrono::{DateTime, Local, TimeZone};

/// Timestamp layout used in artifact names (`yyyyMMddHHmmss`)
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%S";

/// Name of a screenshot file for `test_name` taken at `at`
///
/// Full-page captures are named `screenshot__fullpage_<test>_<timestamp>.png`,
/// viewport captures `screenshot_<test>_<timestamp>.png`. Path separators in
/// the test name are replaced so the result is always a single file name.
pub fn screenshot_file_name<Tz: TimeZone>(test_name: &str, full_page: bool, at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let test_name: String = test_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect();
    let mode = if full_page { "_fullpage_" } else { "" };
    format!("screenshot_{}{}_{}.png", mode, test_name, at.format(TIMESTAMP_FORMAT))
}

/// [`screenshot_file_name`] stamped with the local time
pub fn screenshot_file_name_now(test_name: &str, full_page: bool) -> String {
    screenshot_file_name(test_name, full_page, &Local::now())
}
