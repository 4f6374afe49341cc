use chrono::{DateTime, Days, Duration as ChronoDuration, NaiveTime, TimeZone, Utc};

use crate::aggregation::GuardedMinuteQuery;

use super::interval::{IntervalError, PeriodDuration};

/// A named `[start, end)` reporting window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportWindow {
    pub period: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ReportWindow {
    pub fn query(&self) -> GuardedMinuteQuery {
        GuardedMinuteQuery::new(self.start, self.end)
    }

    pub fn absolute(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            period: "custom".to_string(),
            start,
            end,
        }
    }

    pub fn last_hours<Tz: TimeZone>(hours: u32, now: &DateTime<Tz>) -> Self {
        let end = now.with_timezone(&Utc);
        Self {
            period: format!("last-{hours}h"),
            start: end - ChronoDuration::hours(i64::from(hours)),
            end,
        }
    }

    /// Local midnight to now.
    pub fn today<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self {
            period: "today".to_string(),
            start: local_midnight(now, 0),
            end: now.with_timezone(&Utc),
        }
    }

    pub fn yesterday<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self {
            period: "yesterday".to_string(),
            start: local_midnight(now, 1),
            end: local_midnight(now, 0),
        }
    }

    pub fn two_days_ago<Tz: TimeZone>(now: &DateTime<Tz>) -> Self {
        Self {
            period: "two-days-ago".to_string(),
            start: local_midnight(now, 2),
            end: local_midnight(now, 1),
        }
    }

    /// Local midnight `days` days ago to now.
    pub fn last_days<Tz: TimeZone>(days: u64, now: &DateTime<Tz>) -> Self {
        let period = match days {
            7 => "last-week-until-now".to_string(),
            14 => "last-2weeks-until-now".to_string(),
            days => format!("last-{days}d-until-now"),
        };
        Self {
            period,
            start: local_midnight(now, days),
            end: now.with_timezone(&Utc),
        }
    }

    /// Local midnight of `now - interval` to now.
    pub fn since<Tz: TimeZone>(
        interval: &PeriodDuration,
        now: &DateTime<Tz>,
    ) -> Result<Self, IntervalError> {
        let then = interval.subtract_from(now)?;
        Ok(Self {
            period: format!("since-{}", interval.to_iso_string()),
            start: local_midnight(&then, 0),
            end: now.with_timezone(&Utc),
        })
    }
}

/// Start of the local calendar day `days_back` days before `now`.
pub(crate) fn local_midnight<Tz: TimeZone>(now: &DateTime<Tz>, days_back: u64) -> DateTime<Utc> {
    let zone = now.timezone();
    let date = now
        .date_naive()
        .checked_sub_days(Days::new(days_back))
        .unwrap_or(chrono::NaiveDate::MIN);
    let naive = date.and_time(NaiveTime::MIN);

    // a DST gap at midnight has no local 00:00; the day then starts at the
    // first instant after the gap
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| {
            zone.from_local_datetime(&(naive + ChronoDuration::hours(1)))
                .earliest()
        })
        .map(|midnight| midnight.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}
