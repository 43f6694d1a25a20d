use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::de::Error as DeError;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, Duration, OffsetDateTime};

use crate::ValidationError;

const ISO_DATE: &[FormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// Calendar date that crosses every boundary as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct IsoDate(Date);

impl IsoDate {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        Date::parse(input.trim(), ISO_DATE)
            .map(Self)
            .map_err(|_| ValidationError::InvalidDate {
                value: input.to_owned(),
            })
    }

    /// Parse the leading `YYYY-MM-DD` of a provider stamp such as
    /// `2024-03-01 14:05:00`.
    pub fn parse_prefix(input: &str) -> Option<Self> {
        let trimmed = input.trim();
        let head = trimmed.get(..10)?;
        Self::parse(head).ok()
    }

    pub fn from_date(date: Date) -> Self {
        Self(date)
    }

    pub fn today() -> Self {
        Self(OffsetDateTime::now_utc().date())
    }

    pub fn into_inner(self) -> Date {
        self.0
    }

    /// Shift by whole days, saturating at the calendar limits.
    pub fn add_days(self, days: i64) -> Self {
        Self(self.0.saturating_add(Duration::days(days)))
    }

    pub fn next_day(self) -> Option<Self> {
        self.0.next_day().map(Self)
    }

    pub fn format_iso(self) -> String {
        self.to_string()
    }
}

impl Display for IsoDate {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let formatted = self.0.format(ISO_DATE).map_err(|_| std::fmt::Error)?;
        f.write_str(&formatted)
    }
}

impl FromStr for IsoDate {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Self::parse(value)
    }
}

impl Serialize for IsoDate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for IsoDate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = String::deserialize(deserializer)?;
        Self::parse(&value).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_iso_text() {
        let parsed = IsoDate::parse("2024-01-02").expect("must parse");
        assert_eq!(parsed.to_string(), "2024-01-02");
    }

    #[test]
    fn formats_with_zero_padding() {
        let early = IsoDate::from_date(
            time::Date::from_calendar_date(987, time::Month::March, 4).expect("valid date"),
        );
        assert_eq!(early.format_iso(), "0987-03-04");
        assert_eq!(
            serde_json::to_string(&early).expect("serialize"),
            "\"0987-03-04\""
        );
    }

    #[test]
    fn rejects_slashed_dates() {
        let err = IsoDate::parse("2024/01/02").expect_err("must fail");
        assert!(matches!(err, ValidationError::InvalidDate { .. }));
    }

    #[test]
    fn prefix_parse_ignores_time_of_day() {
        let parsed = IsoDate::parse_prefix("2024-03-01 14:05:00").expect("prefix");
        assert_eq!(parsed, IsoDate::parse("2024-03-01").expect("date"));
        assert!(IsoDate::parse_prefix("03/01").is_none());
    }

    #[test]
    fn add_days_crosses_month_boundary() {
        let date = IsoDate::parse("2024-01-25").expect("date");
        assert_eq!(date.add_days(10).to_string(), "2024-02-04");
        assert_eq!(date.add_days(-25).to_string(), "2023-12-31");
    }
}
