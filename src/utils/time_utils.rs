use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Local, NaiveDateTime};

pub struct TimeUtils;

impl TimeUtils {
    pub const SECS_IN_MIN: i64 = 60;
    pub const SECS_IN_H: i64 = Self::SECS_IN_MIN * 60;
    pub const MINS_IN_H: f64 = 60.0;
    pub const HOURS_IN_D: u32 = 24;
    pub const DAYS_IN_W: u32 = 7;
    pub const STANDARD_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

    /// Fractional hours as a chrono duration, truncated to whole seconds.
    pub fn hours(hours: f64) -> Duration {
        Duration::seconds((hours * Self::SECS_IN_H as f64) as i64)
    }

    /// Signed difference `later - earlier` in hours.
    pub fn hours_between(earlier: NaiveDateTime, later: NaiveDateTime) -> f64 {
        (later - earlier).num_seconds() as f64 / Self::SECS_IN_H as f64
    }
}

// Time Helper functions

/// Wall-clock "now" at the forecast location (the engine works on local naive timestamps).
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Accepts RFC 3339 (offset kept as local wall clock, `Z` allowed) or a naive ISO timestamp.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.naive_local());
    }
    NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M"))
        .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M"))
        .with_context(|| format!("unrecognised timestamp '{}'", text))
}

pub fn format_timestamp(ts: NaiveDateTime) -> String {
    format!("{}", ts.format(TimeUtils::STANDARD_TIME_FORMAT))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 12)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    #[test]
    fn fractional_hours() {
        assert_eq!(TimeUtils::hours(0.5), Duration::minutes(30));
        assert_eq!(TimeUtils::hours(-2.0), Duration::hours(-2));
        assert_eq!(TimeUtils::hours_between(at(8, 0), at(10, 30)), 2.5);
    }

    #[test]
    fn parses_supported_formats() {
        assert_eq!(parse_timestamp("2024-03-12T08:00:00Z").unwrap(), at(8, 0));
        assert_eq!(parse_timestamp("2024-03-12T08:00:00-07:00").unwrap(), at(8, 0));
        assert_eq!(parse_timestamp("2024-03-12T08:15").unwrap(), at(8, 15));
        assert_eq!(parse_timestamp("2024-03-12 08:15").unwrap(), at(8, 15));
        assert!(parse_timestamp("yesterday").is_err());
    }
}
