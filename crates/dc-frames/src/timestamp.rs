//! Wall-clock timestamp parsing for interval data.
//!
//! The backend emits naive ISO timestamps, but older exports carry an offset
//! or use a space separator. The wall-clock reading drives month/hour
//! bucketing; the offset, when present, is kept so spacing can be measured
//! on the absolute instant.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};

use crate::error::{FrameError, FrameResult};

const WIRE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Parse the wall-clock reading, dropping any offset.
pub fn parse_timestamp(text: &str) -> FrameResult<NaiveDateTime> {
    parse_timestamp_with_offset(text).map(|(ts, _)| ts)
}

/// Parse the wall-clock reading and the UTC offset it was written with.
pub fn parse_timestamp_with_offset(
    text: &str,
) -> FrameResult<(NaiveDateTime, Option<FixedOffset>)> {
    let text = text.trim();
    if let Ok(ts) = text.parse::<NaiveDateTime>() {
        return Ok((ts, None));
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(text) {
        return Ok((ts.naive_local(), Some(*ts.offset())));
    }
    if let Ok(ts) = NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S") {
        return Ok((ts, None));
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d")
        && let Some(ts) = date.and_hms_opt(0, 0, 0)
    {
        return Ok((ts, None));
    }
    Err(FrameError::Timestamp {
        value: text.to_string(),
    })
}

pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    ts.format(WIRE_FORMAT).to_string()
}

/// Format a wall-clock reading, appending `offset` as `+HH:MM` when known.
pub fn format_timestamp_with_offset(ts: &NaiveDateTime, offset: Option<FixedOffset>) -> String {
    match offset {
        Some(offset) => format!("{}{}", format_timestamp(ts), format_offset(offset)),
        None => format_timestamp(ts),
    }
}

fn format_offset(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let secs = secs.unsigned_abs();
    format!("{sign}{:02}:{:02}", secs / 3600, secs % 3600 / 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn accepts_backend_variants() {
        for text in [
            "2021-03-04T05:15:00",
            "2021-03-04T05:15:00+00:00",
            "2021-03-04T05:15:00-08:00",
            "2021-03-04 05:15:00",
        ] {
            let ts = parse_timestamp(text).unwrap();
            assert_eq!(ts.month(), 3);
            assert_eq!(ts.hour(), 5);
            assert_eq!(ts.minute(), 15);
        }
    }

    #[test]
    fn offset_is_kept_alongside_wall_clock() {
        let (ts, offset) = parse_timestamp_with_offset("2020-03-08T03:00:00-07:00").unwrap();
        assert_eq!(format_timestamp(&ts), "2020-03-08T03:00:00");
        assert_eq!(offset.map(|o| o.local_minus_utc()), Some(-7 * 3600));
        assert_eq!(
            format_timestamp_with_offset(&ts, offset),
            "2020-03-08T03:00:00-07:00"
        );

        let (_, none) = parse_timestamp_with_offset("2020-03-08T03:00:00").unwrap();
        assert_eq!(none, None);
    }

    #[test]
    fn date_only_is_midnight() {
        let ts = parse_timestamp("2020-01-01").unwrap();
        assert_eq!(format_timestamp(&ts), "2020-01-01T00:00:00");
    }

    #[test]
    fn rejects_garbage() {
        assert!(matches!(
            parse_timestamp("yesterday"),
            Err(FrameError::Timestamp { .. })
        ));
    }
}
