//! Domain services: the public operation surface of the module.

pub mod access_events;
pub mod packages;
pub mod remote_browse;

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};

/// First instant of the month containing `now` (UTC). The default listing
/// window for packages.
#[must_use]
pub(crate) fn month_start(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now.date_naive();
    let first = NaiveDate::from_ymd_opt(today.year(), today.month(), 1).unwrap_or(today);
    first.and_time(NaiveTime::MIN).and_utc()
}

/// First instant of the day containing `now` (UTC). The default listing
/// window for access events.
#[must_use]
pub(crate) fn day_start(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive().and_time(NaiveTime::MIN).and_utc()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn month_start_is_the_first_at_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 3, 17, 15, 42, 7).unwrap();
        assert_eq!(
            month_start(now),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        );
        // First day of a month maps to itself at midnight.
        let first = Utc.with_ymd_and_hms(2026, 3, 1, 8, 0, 0).unwrap();
        assert_eq!(
            month_start(first),
            Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn day_start_is_midnight() {
        let now = Utc.with_ymd_and_hms(2026, 3, 17, 15, 42, 7).unwrap();
        assert_eq!(
            day_start(now),
            Utc.with_ymd_and_hms(2026, 3, 17, 0, 0, 0).unwrap()
        );
    }
}
