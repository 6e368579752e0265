//! Date helper functions

use chrono::{DateTime, NaiveDateTime, TimeZone};

/// Format a date using a Moment.js-style format string
///
/// # Examples
/// ```ignore
/// format_date(&date, "MMMM D, YYYY") // -> "January 5, 2024"
/// ```
pub fn format_date(date: &NaiveDateTime, format: &str) -> String {
    let chrono_format = moment_to_chrono_format(format);
    date.format(&chrono_format).to_string()
}

/// Format a date in ISO 8601 form, as used by `<time datetime>` and sitemaps
pub fn date_xml(date: &NaiveDateTime) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Interpret a naive post date in the site timezone and format it for RSS
pub fn date_rfc2822<Tz: TimeZone>(date: &NaiveDateTime, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    localize(date, tz).to_rfc2822()
}

/// Attach a timezone to a naive date. Times skipped by a DST gap fall back to
/// reading the value as UTC.
pub fn localize<Tz: TimeZone>(date: &NaiveDateTime, tz: &Tz) -> DateTime<Tz> {
    tz.from_local_datetime(date)
        .earliest()
        .unwrap_or_else(|| tz.from_utc_datetime(date))
}

/// Convert Moment.js format to chrono format
fn moment_to_chrono_format(format: &str) -> String {
    // Longest tokens first within each letter
    let replacements = [
        ("YYYY", "%Y"),
        ("YY", "%y"),
        ("MMMM", "%B"),
        ("MMM", "%b"),
        ("MM", "%m"),
        ("DDDD", "%j"),
        ("DD", "%d"),
        ("D", "%-d"),
        ("HH", "%H"),
        ("hh", "%I"),
        ("mm", "%M"),
        ("ss", "%S"),
        ("dddd", "%A"),
        ("ddd", "%a"),
    ];

    let mut result = String::with_capacity(format.len());
    let mut rest = format;
    'outer: while !rest.is_empty() {
        for (from, to) in replacements {
            if let Some(stripped) = rest.strip_prefix(from) {
                result.push_str(to);
                rest = stripped;
                continue 'outer;
            }
        }
        let mut chars = rest.chars();
        if let Some(c) = chars.next() {
            if c == '%' {
                result.push_str("%%");
            } else {
                result.push(c);
            }
        }
        rest = chars.as_str();
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn sample() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 5)
            .unwrap()
            .and_hms_opt(10, 30, 0)
            .unwrap()
    }

    #[test]
    fn test_format_date() {
        assert_eq!(format_date(&sample(), "YYYY-MM-DD"), "2024-01-05");
        assert_eq!(format_date(&sample(), "MMMM D, YYYY"), "January 5, 2024");
        assert_eq!(format_date(&sample(), "dddd HH:mm"), "Friday 10:30");
    }

    #[test]
    fn test_moment_to_chrono() {
        assert_eq!(moment_to_chrono_format("YYYY-MM-DD"), "%Y-%m-%d");
        assert_eq!(moment_to_chrono_format("HH:mm:ss"), "%H:%M:%S");
        assert_eq!(moment_to_chrono_format("100%"), "100%%");
    }

    #[test]
    fn test_date_rfc2822_in_timezone() {
        let tz = chrono_tz::Africa::Nairobi;
        assert_eq!(
            date_rfc2822(&sample(), &tz),
            "Fri, 5 Jan 2024 10:30:00 +0300"
        );
        assert_eq!(date_xml(&sample()), "2024-01-05");
    }
}
