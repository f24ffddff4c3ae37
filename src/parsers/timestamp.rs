//! Timestamp extraction.

use chrono::{Datelike, Local, NaiveDate};
use regex::Regex;

use crate::error::{LogsieveError, Result};
use crate::row::TimestampHit;

/// `MM-DD HH:MM:SS` with optional milliseconds, the layout emitted by
/// logcat-style sources that omit the year.
const TIMESTAMP_PATTERN: &str = r"(\d{2})-(\d{2}) (\d{2}):(\d{2}):(\d{2})(?:\.(\d{3}))?";

/// Extracts every `MM-DD HH:MM:SS(.mmm)` occurrence from a line, completing
/// the calendar date with the year captured at construction.
#[derive(Debug)]
pub struct TimestampParser {
    regex: Regex,
    year: i32,
}

impl TimestampParser {
    pub fn new() -> Result<Self> {
        Self::with_year(Local::now().year())
    }

    /// Build against a fixed year; `new` uses the current system year.
    pub fn with_year(year: i32) -> Result<Self> {
        let regex = Regex::new(TIMESTAMP_PATTERN)
            .map_err(|err| LogsieveError::config(format!("timestamp pattern: {err}")))?;
        Ok(Self { regex, year })
    }

    /// All timestamp hits on `line`, in order of occurrence. Matches that do
    /// not form a valid calendar date (month 13, hour 25) are skipped.
    pub fn parse(&self, line: &str) -> Vec<TimestampHit> {
        self.regex
            .captures_iter(line)
            .filter_map(|caps| {
                let field = |i: usize| caps.get(i).map(|m| m.as_str().parse::<u32>().ok());
                let month = field(1)??;
                let day = field(2)??;
                let hour = field(3)??;
                let minute = field(4)??;
                let second = field(5)??;
                let millis = caps.get(6).map_or(Some(0), |m| m.as_str().parse().ok())?;

                let datetime = NaiveDate::from_ymd_opt(self.year, month, day)?
                    .and_hms_milli_opt(hour, minute, second, millis)?;
                Some(TimestampHit {
                    epoch_millis: datetime.and_utc().timestamp_millis(),
                    datetime,
                })
            })
            .collect()
    }
}
