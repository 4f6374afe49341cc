use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::reporting::{IntervalError, PeriodDuration};

#[derive(Debug, Error, PartialEq, Eq)]
pub(super) enum ReportArgsError {
    #[error("invalid interval: {0}")]
    Interval(#[from] IntervalError),
    #[error("expected exactly two timestamps, got {0}")]
    RangeArity(usize),
    #[error("invalid RFC 3339 timestamp: {0}")]
    Timestamp(String),
}

pub(super) const ERRORSINCE_USAGE: &str = "Usage: /errorsince <interval>\nExamples: /errorsince 3d, /errorsince 1mo 2d, /errorsince 2 jam 30 menit";
pub(super) const ERRORRANGE_USAGE: &str = "Usage: /errorrange <start> <end>\nExample: /errorrange 2025-09-01T00:00:00+07:00 2025-09-02T00:00:00+07:00";

pub(super) fn parse_since_args(args: &str) -> Result<PeriodDuration, ReportArgsError> {
    Ok(PeriodDuration::parse(args)?)
}

/// Two RFC 3339 timestamps separated by whitespace, any offsets.
pub(super) fn parse_range_args(args: &str) -> Result<(DateTime<Utc>, DateTime<Utc>), ReportArgsError> {
    let parts: Vec<&str> = args.split_whitespace().collect();
    let [start, end] = parts.as_slice() else {
        return Err(ReportArgsError::RangeArity(parts.len()));
    };

    Ok((parse_timestamp(start)?, parse_timestamp(end)?))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, ReportArgsError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|_| ReportArgsError::Timestamp(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{ReportArgsError, parse_range_args, parse_since_args};
    use crate::reporting::IntervalError;

    #[test]
    fn range_accepts_mixed_offsets() {
        let (start, end) =
            parse_range_args("2025-09-01T00:00:00+07:00   2025-09-01T12:00:00Z").expect("valid");
        assert_eq!(
            start,
            Utc.with_ymd_and_hms(2025, 8, 31, 17, 0, 0).single().expect("valid time")
        );
        assert_eq!(
            end,
            Utc.with_ymd_and_hms(2025, 9, 1, 12, 0, 0).single().expect("valid time")
        );
    }

    #[test]
    fn range_rejects_wrong_arity_and_bad_timestamps() {
        assert_eq!(parse_range_args(""), Err(ReportArgsError::RangeArity(0)));
        assert_eq!(
            parse_range_args("2025-09-01T00:00:00Z"),
            Err(ReportArgsError::RangeArity(1))
        );
        assert_eq!(
            parse_range_args("yesterday 2025-09-01T00:00:00Z"),
            Err(ReportArgsError::Timestamp("yesterday".to_string()))
        );
    }

    #[test]
    fn since_surfaces_interval_errors() {
        assert_eq!(parse_since_args("3d").expect("valid").days, 3);
        assert_eq!(
            parse_since_args(""),
            Err(ReportArgsError::Interval(IntervalError::Empty))
        );
    }
}
