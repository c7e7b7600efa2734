use chrono::{Datelike, Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::feed::event::{MonthDay, RawEvent, ResolvedEvent};

// How many years ahead to look for a date that exists: covers leap days.
const YEAR_SEARCH: i32 = 8;

/// How yearless dates get a year, and which resolved events are shown.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedPolicy {
    /// Dates already past this year roll over to the next. Only events at or
    /// after now are shown.
    #[default]
    Upcoming,
    /// Dates stay in the current year. Events ended within the given number of
    /// days are still shown.
    Grace(u32),
}

impl FeedPolicy {
    /// Gives `date` a concrete year relative to `now`, at midnight.
    ///
    /// A date that doesn't exist in the current year (a leap day) takes the
    /// next year in which it does.
    pub fn resolve(&self, date: MonthDay, now: NaiveDateTime) -> Option<NaiveDateTime> {
        let mut years = (now.year()..now.year() + YEAR_SEARCH)
            .filter_map(|year| date.in_year(year))
            .map(|date| date.and_time(NaiveTime::MIN));

        match self {
            FeedPolicy::Upcoming => years.find(|candidate| *candidate >= now),
            FeedPolicy::Grace(_) => years.next(),
        }
    }

    /// Whether an event resolved to `date` is shown at `now`.
    ///
    /// A grace window reaching past the earliest representable date keeps
    /// everything before `now`.
    pub fn retains(&self, date: NaiveDateTime, now: NaiveDateTime) -> bool {
        match *self {
            FeedPolicy::Upcoming => date >= now,
            FeedPolicy::Grace(days) => Duration::try_days(days.into())
                .and_then(|window| now.checked_sub_signed(window))
                .map_or(true, |start| date >= start),
        }
    }

    /// Resolves, filters, and sorts `events` by date. Events with equal dates
    /// keep their feed order. Events with malformed dates are skipped.
    pub fn apply(&self, events: Vec<RawEvent>, now: NaiveDateTime) -> Vec<ResolvedEvent> {
        let mut resolved: Vec<ResolvedEvent> = events.into_iter()
            .filter_map(|event| {
                let month_day = match event.date.parse::<MonthDay>() {
                    Ok(month_day) => month_day,
                    Err(e) => {
                        tracing::warn!(date = %event.date, "skipping event: {}", e.message());
                        return None;
                    }
                };

                let Some(date) = self.resolve(month_day, now) else {
                    tracing::warn!(date = %month_day, "skipping event: no year found for date");
                    return None;
                };

                Some(ResolvedEvent { event, date })
            })
            .filter(|resolved| self.retains(resolved.date, now))
            .collect();

        resolved.sort_by_key(|resolved| resolved.date);
        resolved
    }
}
