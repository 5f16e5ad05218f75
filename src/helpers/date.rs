//! Date helper functions

use chrono::{DateTime, NaiveDate, NaiveDateTime};

/// Formats accepted for front-matter dates, tried in order
const DATE_FORMATS: [&str; 8] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y/%m/%d %H:%M:%S",
    "%Y-%m-%d %H:%M",
    "%Y/%m/%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d",
    "%Y/%m/%d",
];

/// Parse a front-matter date string in one of the supported formats.
///
/// Offsets in RFC 3339 values are normalised to UTC; everything else is
/// compared as written.
pub fn parse_date(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.naive_utc());
    }

    for fmt in DATE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt);
        }
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return d.and_hms_opt(0, 0, 0);
        }
    }

    None
}

/// Ordering key for a post date; missing or invalid dates count as the epoch
pub fn sort_key(s: &str) -> NaiveDateTime {
    // NaiveDateTime::default() is 1970-01-01T00:00:00
    parse_date(s).unwrap_or_default()
}

/// Format a date string using a Moment.js-compatible format string
///
/// Unparseable input is returned unchanged.
///
/// # Examples
/// ```ignore
/// format_date("2024-01-15", "LL") // -> "January 15, 2024"
/// ```
pub fn format_date(s: &str, format: &str) -> String {
    let Some(date) = parse_date(s) else {
        return s.to_string();
    };

    let chrono_format = match format {
        "LL" => "%B %-d, %Y".to_string(),
        "LLL" => "%B %-d, %Y %-I:%M %p".to_string(),
        _ => moment_to_chrono_format(format),
    };
    date.format(&chrono_format).to_string()
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest tokens first within each family
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
        ("ZZ", "%z"),
        ("SSS", "%3f"),
    ];

    let mut result = format.to_string();

    for (from, to) in replacements {
        result = result.replace(from, to);
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        assert_eq!(parse_date("2024-01-15"), Some(expected));
        assert_eq!(parse_date("2024/01/15"), Some(expected));
        assert_eq!(parse_date(" 2024-01-15 00:00:00 "), Some(expected));
        assert_eq!(parse_date("2024-01-15T02:00:00+02:00"), Some(expected));
    }

    #[test]
    fn test_invalid_date_sorts_as_epoch() {
        assert_eq!(parse_date(""), None);
        assert_eq!(parse_date("next tuesday"), None);
        assert_eq!(sort_key("next tuesday"), NaiveDateTime::default());
        assert!(sort_key("1999-12-31") > sort_key(""));
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date("2024-01-15", "YYYY-MM-DD"), "2024-01-15");
        assert_eq!(format_date("2024-01-15 10:30", "YYYY/MM/DD HH:mm"), "2024/01/15 10:30");
        assert_eq!(format_date("2024-01-05", "LL"), "January 5, 2024");
        assert_eq!(format_date("someday", "LL"), "someday");
    }

    #[test]
    fn test_moment_to_chrono() {
        assert_eq!(moment_to_chrono_format("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(moment_to_chrono_format("HH:mm:ss"), "%H:%M:%S");
    }
}
