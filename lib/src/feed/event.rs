use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};

/// An event as read from the feed: a recurring, yearless date.
///
/// Fields are read leniently. Missing or `null` fields read as empty strings,
/// numbers and booleans as their text, and lists or objects as empty strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct RawEvent {
    #[serde(default, deserialize_with = "lenient")]
    pub date: String,
    #[serde(default, deserialize_with = "lenient")]
    pub time: String,
    #[serde(default, deserialize_with = "lenient")]
    pub description: String,
    #[serde(default, deserialize_with = "lenient_opt", skip_serializing_if = "Option::is_none")]
    pub description2: Option<String>,
    #[serde(default, deserialize_with = "lenient")]
    pub url: String,
}

fn text(value: Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn lenient<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Ok(text(Value::deserialize(de)?).unwrap_or_default())
}

fn lenient_opt<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(text(Value::deserialize(de)?))
}

impl RawEvent {
    /// Reads a feed document: a JSON array of event records.
    ///
    /// Anything but an array is an error. Records that aren't objects are
    /// skipped with a warning and the rest are kept.
    pub fn read_feed(json: &str) -> Result<Vec<RawEvent>> {
        let records: Vec<Value> = serde_json::from_str(json)?;
        let events = records.into_iter()
            .enumerate()
            .filter_map(|(i, record)| match RawEvent::deserialize(record) {
                Ok(event) => Some(event),
                Err(e) => {
                    tracing::warn!(record = i, "skipping event: {e}");
                    None
                }
            })
            .collect();

        Ok(events)
    }

    /// The secondary description, unless it's missing or empty.
    pub fn description2(&self) -> Option<&str> {
        self.description2.as_deref().filter(|s| !s.is_empty())
    }
}

/// A [`RawEvent`] with a concrete date. Never written back to the feed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedEvent {
    pub event: RawEvent,
    pub date: NaiveDateTime,
}

/// A 1-indexed month and day with no year.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthDay {
    pub month: u32,
    pub day: u32,
}

impl MonthDay {
    pub fn new(month: u32, day: u32) -> Option<Self> {
        // 2000 is a leap year: every day that exists in some year exists in it.
        NaiveDate::from_ymd_opt(2000, month, day)?;
        Some(MonthDay { month, day })
    }

    /// This month and day in `year`, if it exists then.
    pub fn in_year(&self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

impl FromStr for MonthDay {
    type Err = Error;

    /// Parses `MM-DD`.
    fn from_str(string: &str) -> Result<Self, Self::Err> {
        fn number(s: &str) -> Option<u32> {
            let s = s.trim();
            if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }

            s.parse().ok()
        }

        let mut parts = string.split('-');
        let (month, day) = match (parts.next(), parts.next(), parts.next()) {
            (Some(m), Some(d), None) => (number(m), number(d)),
            _ => return err!("event date must be `MM-DD`", "date" => string),
        };

        match (month, day) {
            (Some(month), Some(day)) => MonthDay::new(month, day)
                .ok_or_else(|| error!("event date does not exist", "date" => string)),
            _ => err!("event date components must be numeric", "date" => string),
        }
    }
}

impl fmt::Display for MonthDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_month() {
        for month in 1..=12 {
            let md: MonthDay = format!("{month:02}-07").parse().unwrap();
            assert_eq!((md.month, md.day), (month, 7));
        }

        assert_eq!("3-9".parse::<MonthDay>().unwrap(), MonthDay { month: 3, day: 9 });
        assert_eq!("02-29".parse::<MonthDay>().unwrap().to_string(), "02-29");
    }

    #[test]
    fn rejects_malformed_dates() {
        for bad in ["", "13-01", "00-10", "04-31", "02-30", "12", "12-01-2024", "ab-01", "+1-01", "-01"] {
            assert!(bad.parse::<MonthDay>().is_err(), "{bad:?} should be rejected");
        }
    }

    #[test]
    fn reads_records_leniently() {
        let events = RawEvent::read_feed(r#"[
            { "date": "08-01", "time": "7pm", "description": "Picnic", "url": "picnic.html" },
            { "date": "09-01", "time": null, "description2": "Bring a dish", "extra": 1 },
            { "date": "10-01", "description2": "  " },
            { "date": "11-01", "description2": "" }
        ]"#).unwrap();

        assert_eq!(events[0].time, "7pm");
        assert_eq!(events[0].description2(), None);
        assert_eq!(events[1].time, "");
        assert_eq!(events[1].url, "");
        assert_eq!(events[1].description2(), Some("Bring a dish"));
        assert_eq!(events[2].description2(), Some("  "));
        assert_eq!(events[3].description2(), None);
    }

    #[test]
    fn mistyped_fields_keep_the_record() {
        let events = RawEvent::read_feed(r#"[
            { "date": "08-01", "time": 19, "description": true, "description2": 2.5, "url": ["x"] },
            { "date": "07-04", "time": "Noon", "description": { "en": "Parade" }, "description2": [] },
            42,
            "not a record",
            { "date": "09-01", "time": "7pm" }
        ]"#).unwrap();

        assert_eq!(events.len(), 3);
        assert_eq!(events[0].time, "19");
        assert_eq!(events[0].description, "true");
        assert_eq!(events[0].description2(), Some("2.5"));
        assert_eq!(events[0].url, "");
        assert_eq!(events[1].description, "");
        assert_eq!(events[1].description2(), None);
        assert_eq!(events[2].date, "09-01");
    }

    #[test]
    fn non_arrays_are_faults() {
        assert!(RawEvent::read_feed(r#"{ "date": "01-01" }"#).is_err());
        assert!(RawEvent::read_feed("not json").is_err());
    }
}
