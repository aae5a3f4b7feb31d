//! Object naming for per-run outputs.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::error::CoreError;

/// Calendar date of a run, rendered `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunDate(Date);

impl RunDate {
    pub fn new(date: Date) -> Self {
        RunDate(date)
    }

    /// Today's date in UTC.
    pub fn today() -> Self {
        RunDate(OffsetDateTime::now_utc().date())
    }

    pub fn date(&self) -> Date {
        self.0
    }
}

impl FromStr for RunDate {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Date::parse(s.trim(), format_description!("[year]-[month]-[day]"))
            .map(RunDate)
            .map_err(|e| CoreError::InvalidRunDate {
                value: s.to_string(),
                reason: e.to_string(),
            })
    }
}

impl fmt::Display for RunDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:04}-{:02}-{:02}",
            self.0.year(),
            self.0.month() as u8,
            self.0.day()
        )
    }
}

impl Serialize for RunDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RunDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Destination of one run's aggregated output in the central bucket.
///
/// Keys are `d=<YYYY-MM-DD>/<run id>.json`; the `d=` prefix is the Hive-style
/// partition the central crawler turns into the table's `d` column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputKey {
    pub date: RunDate,
    pub run_id: String,
}

impl OutputKey {
    pub fn new(date: RunDate, run_id: impl Into<String>) -> Result<Self, CoreError> {
        let run_id = run_id.into();
        if run_id.trim().is_empty() || run_id.contains('/') {
            return Err(CoreError::InvalidRunId(run_id));
        }
        Ok(OutputKey { date, run_id })
    }

    pub fn object_key(&self) -> String {
        format!("d={}/{}.json", self.date, self.run_id)
    }
}

impl fmt::Display for OutputKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.object_key())
    }
}

/// Stable, human-readable key of a generated report.
pub fn report_object_key(date: &str) -> String {
    format!("report-{}.csv.gz", date)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_date_round_trips() {
        let d: RunDate = "2024-03-09".parse().unwrap();
        assert_eq!(d.to_string(), "2024-03-09");
        assert_eq!(serde_json::to_value(d).unwrap(), "2024-03-09");
    }

    #[test]
    fn run_date_rejects_garbage() {
        let err = "03/09/2024".parse::<RunDate>().unwrap_err();
        assert!(matches!(err, CoreError::InvalidRunDate { .. }));
    }

    #[test]
    fn output_key_is_partitioned_by_date() {
        let key = OutputKey::new("2024-03-09".parse().unwrap(), "123456789012").unwrap();
        assert_eq!(key.object_key(), "d=2024-03-09/123456789012.json");
    }

    #[test]
    fn output_key_rejects_slash_in_run_id() {
        let date: RunDate = "2024-03-09".parse().unwrap();
        assert!(OutputKey::new(date, "a/b").is_err());
        assert!(OutputKey::new(date, " ").is_err());
    }

    #[test]
    fn report_key_uses_date_string() {
        assert_eq!(report_object_key("2024-03-09"), "report-2024-03-09.csv.gz");
    }
}
