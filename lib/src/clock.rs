use chrono::NaiveDateTime;

/// The source of "now" for date resolution and filtering.
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Local wall-clock time.
#[derive(Debug, Default, Copy, Clone)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Always the same instant.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

impl<F: Fn() -> NaiveDateTime + Send + Sync> Clock for F {
    fn now(&self) -> NaiveDateTime {
        self()
    }
}

/// Parses a `YYYY-MM-DD` date or a `YYYY-MM-DDTHH:MM[:SS]` date-time.
pub fn parse_instant(string: &str) -> crate::error::Result<NaiveDateTime> {
    use chrono::{NaiveDate, NaiveTime};

    let string = string.trim();
    if let Ok(date) = string.parse::<NaiveDate>() {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    NaiveDateTime::parse_from_str(string, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(string, "%Y-%m-%dT%H:%M"))
        .map_err(|e| error!("invalid date or date-time", "input" => string, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_instants() {
        let noon = parse_instant("2024-06-15T12:00").unwrap();
        assert_eq!(noon.to_string(), "2024-06-15 12:00:00");
        assert_eq!(parse_instant(" 2024-06-15 ").unwrap().to_string(), "2024-06-15 00:00:00");
        assert_eq!(parse_instant("2024-06-15T12:00:30").unwrap().to_string(), "2024-06-15 12:00:30");
        assert!(parse_instant("06-15").is_err());
    }

    #[test]
    fn closures_are_clocks() {
        let at = parse_instant("2024-01-01").unwrap();
        let clock = move || at;
        assert_eq!(Clock::now(&clock), FixedClock(at).now());
    }
}
