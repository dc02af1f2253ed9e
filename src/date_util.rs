use chrono::{Duration, NaiveDate};

/// Format a date as a `YYYY-MM-DD` date key.
/// All date columns and response dates in the warehouse use this format.
pub fn date_key(d: NaiveDate) -> String {
    d.format("%Y-%m-%d").to_string()
}

/// Parse a `YYYY-MM-DD` date key back into a date.
pub fn parse_date_key(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// All dates from `start` through `end` inclusive, in ascending order.
/// Empty when `start > end`.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut d = start;
    while d <= end {
        dates.push(d);
        d += Duration::days(1);
    }
    dates
}
