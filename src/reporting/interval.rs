use chrono::{DateTime, Days, Months, TimeDelta, TimeZone};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntervalError {
    #[error("interval is empty")]
    Empty,
    #[error("unknown interval unit: {0}")]
    UnknownUnit(String),
    #[error("no <number><unit> tokens found in: {0}")]
    NoTokens(String),
    #[error("interval is too large")]
    Overflow,
}

/// Calendar part (years, months, days) plus a clock part, like `1mo 2d 3h`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PeriodDuration {
    pub years: u32,
    pub months: u32,
    pub days: u32,
    pub hours: u64,
    pub minutes: u64,
    pub seconds: u64,
}

#[derive(Clone, Copy)]
enum Unit {
    Years,
    Months,
    Days,
    Hours,
    Minutes,
    Seconds,
}

impl Unit {
    fn parse(token: &str) -> Option<Self> {
        let unit = match token {
            "y" | "year" | "years" | "tahun" | "th" | "thn" => Self::Years,
            "mo" | "month" | "months" | "bulan" | "bln" => Self::Months,
            "d" | "day" | "days" | "hari" | "hr" => Self::Days,
            "h" | "hour" | "hours" | "jam" | "j" => Self::Hours,
            "m" | "min" | "minute" | "minutes" | "menit" | "mnt" => Self::Minutes,
            "s" | "sec" | "second" | "seconds" | "detik" | "dtk" => Self::Seconds,
            _ => return None,
        };
        Some(unit)
    }
}

impl PeriodDuration {
    /// Parses summed `<n><unit>` tokens; whitespace between number and unit
    /// is allowed, anything else between tokens is ignored.
    pub fn parse(input: &str) -> Result<Self, IntervalError> {
        let normalized = input.trim().to_lowercase();
        if normalized.is_empty() {
            return Err(IntervalError::Empty);
        }

        let mut period = Self::default();
        let mut hits = 0usize;
        let mut rest = normalized.as_str();

        while let Some(start) = rest.find(|c: char| c.is_ascii_digit()) {
            let from_digits = &rest[start..];
            let digits_len = from_digits
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(from_digits.len());
            let (digits, after_digits) = from_digits.split_at(digits_len);
            let after_space = after_digits.trim_start();
            let unit_len = after_space
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(after_space.len());
            let (unit, remainder) = after_space.split_at(unit_len);
            rest = remainder;

            if unit.is_empty() {
                continue;
            }

            let value = digits.parse::<u64>().map_err(|_| IntervalError::Overflow)?;
            let unit = Unit::parse(unit).ok_or_else(|| IntervalError::UnknownUnit(unit.to_string()))?;
            period.add(unit, value)?;
            hits += 1;
        }

        if hits == 0 {
            return Err(IntervalError::NoTokens(input.trim().to_string()));
        }

        Ok(period)
    }

    fn add(&mut self, unit: Unit, value: u64) -> Result<(), IntervalError> {
        let calendar = |current: u32| {
            u32::try_from(value)
                .ok()
                .and_then(|value| current.checked_add(value))
                .ok_or(IntervalError::Overflow)
        };
        let clock = |current: u64| current.checked_add(value).ok_or(IntervalError::Overflow);

        match unit {
            Unit::Years => self.years = calendar(self.years)?,
            Unit::Months => self.months = calendar(self.months)?,
            Unit::Days => self.days = calendar(self.days)?,
            Unit::Hours => self.hours = clock(self.hours)?,
            Unit::Minutes => self.minutes = clock(self.minutes)?,
            Unit::Seconds => self.seconds = clock(self.seconds)?,
        }
        Ok(())
    }

    fn clock_seconds(&self) -> Option<i64> {
        let total = self
            .hours
            .checked_mul(3600)?
            .checked_add(self.minutes.checked_mul(60)?)?
            .checked_add(self.seconds)?;
        i64::try_from(total).ok()
    }

    /// `now` minus the calendar part (local calendar arithmetic), then minus
    /// the clock part.
    pub fn subtract_from<Tz: TimeZone>(&self, now: &DateTime<Tz>) -> Result<DateTime<Tz>, IntervalError> {
        let months = self
            .years
            .checked_mul(12)
            .and_then(|months| months.checked_add(self.months))
            .ok_or(IntervalError::Overflow)?;
        let clock = self
            .clock_seconds()
            .and_then(TimeDelta::try_seconds)
            .ok_or(IntervalError::Overflow)?;

        now.clone()
            .checked_sub_months(Months::new(months))
            .and_then(|then| then.checked_sub_days(Days::new(u64::from(self.days))))
            .and_then(|then| then.checked_sub_signed(clock))
            .ok_or(IntervalError::Overflow)
    }

    /// ISO-8601 form, e.g. `P1Y2M3DT4H5M6S`, zero as `PT0S`.
    pub fn to_iso_string(&self) -> String {
        let mut date = String::new();
        for (value, suffix) in [
            (u64::from(self.years), 'Y'),
            (u64::from(self.months), 'M'),
            (u64::from(self.days), 'D'),
        ] {
            if value > 0 {
                date.push_str(&format!("{value}{suffix}"));
            }
        }

        let mut time = String::new();
        for (value, suffix) in [(self.hours, 'H'), (self.minutes, 'M'), (self.seconds, 'S')] {
            if value > 0 {
                time.push_str(&format!("{value}{suffix}"));
            }
        }

        match (date.is_empty(), time.is_empty()) {
            (true, true) => "PT0S".to_string(),
            (_, true) => format!("P{date}"),
            _ => format!("P{date}T{time}"),
        }
    }
}
