//! Civil-time adapter for the center's timezone.
//!
//! Everything the engine stores is UTC; everything the center reasons about
//! (lesson days, week boundaries, "run tonight at 00:05") is local civil
//! time. This module is the only place where the two meet.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use chrono_tz::Tz;

use crate::{EngineError, ResultEngine};

/// Clock for a single center, pinned to one IANA timezone.
#[derive(Clone, Copy, Debug)]
pub struct CenterClock {
    tz: Tz,
}

impl CenterClock {
    #[must_use]
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    /// Parses an IANA timezone name (e.g. `Asia/Tashkent`).
    pub fn from_name(name: &str) -> ResultEngine<Self> {
        let tz: Tz = name
            .parse()
            .map_err(|_| EngineError::InvalidInput(format!("unknown timezone: {name}")))?;
        Ok(Self { tz })
    }

    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.tz
    }

    #[must_use]
    pub fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }

    /// The center's civil date at the given instant.
    #[must_use]
    pub fn local_date(&self, instant: DateTime<Utc>) -> NaiveDate {
        instant.with_timezone(&self.tz).date_naive()
    }

    /// The center's civil weekday at the given instant.
    #[must_use]
    pub fn local_weekday(&self, instant: DateTime<Utc>) -> Weekday {
        instant.with_timezone(&self.tz).weekday()
    }

    /// Converts a local civil (date, time) to the stored instant.
    ///
    /// DST gaps resolve to one hour later; ambiguous times take the earlier
    /// offset, so the result is always deterministic.
    #[must_use]
    pub fn instant_of(&self, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
        let naive = date.and_time(time);
        match self.tz.from_local_datetime(&naive) {
            chrono::LocalResult::Single(dt) => dt.with_timezone(&Utc),
            chrono::LocalResult::Ambiguous(earlier, _) => earlier.with_timezone(&Utc),
            chrono::LocalResult::None => {
                let shifted = naive + Duration::hours(1);
                self.tz
                    .from_local_datetime(&shifted)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
            }
        }
    }

    /// The next instant at which the local wall clock reads `at`, strictly
    /// after `now`.
    #[must_use]
    pub fn next_daily(&self, at: NaiveTime, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = self.local_date(now);
        let candidate = self.instant_of(today, at);
        if candidate > now {
            candidate
        } else {
            self.instant_of(today + Duration::days(1), at)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono_tz::Asia::Tashkent;

    fn clock() -> CenterClock {
        CenterClock::new(Tashkent)
    }

    #[test]
    fn local_date_crosses_midnight_before_utc() {
        // 20:00 UTC is already the next day in Tashkent (UTC+5).
        let instant = Utc.with_ymd_and_hms(2026, 3, 2, 20, 0, 0).unwrap();
        assert_eq!(
            clock().local_date(instant),
            NaiveDate::from_ymd_opt(2026, 3, 3).unwrap()
        );
    }

    #[test]
    fn next_daily_picks_today_when_still_ahead() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap();
        let at = NaiveTime::from_hms_opt(23, 5, 0).unwrap();
        let next = clock().next_daily(at, now);
        // 23:05 Tashkent == 18:05 UTC, same day.
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 2, 18, 5, 0).unwrap());
    }

    #[test]
    fn next_daily_rolls_to_tomorrow_when_passed() {
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 19, 0, 0).unwrap();
        let at = NaiveTime::from_hms_opt(23, 5, 0).unwrap();
        let next = clock().next_daily(at, now);
        assert_eq!(next, Utc.with_ymd_and_hms(2026, 3, 3, 18, 5, 0).unwrap());
    }

    #[test]
    fn from_name_rejects_garbage() {
        assert!(CenterClock::from_name("Mars/Olympus").is_err());
        assert!(CenterClock::from_name("Asia/Tashkent").is_ok());
    }
}
