//! Billing/payroll periods: one calendar (month, year) pair.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{EngineError, ResultEngine};

/// A validated calendar month.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    month: u32,
    year: i32,
}

impl Period {
    pub fn new(month: u32, year: i32) -> ResultEngine<Self> {
        if !(1..=12).contains(&month) {
            return Err(EngineError::InvalidInput(format!(
                "month must be 1..=12, got {month}"
            )));
        }
        if !(2000..=2200).contains(&year) {
            return Err(EngineError::InvalidInput(format!(
                "year out of range: {year}"
            )));
        }
        Ok(Self { month, year })
    }

    #[must_use]
    pub fn of(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            year: date.year(),
        }
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    #[must_use]
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Canonical `YYYY-MM` form, used in charge idempotency keys.
    #[must_use]
    pub fn key(self) -> String {
        format!("{:04}-{:02}", self.year, self.month)
    }

    #[must_use]
    pub fn first_day(self) -> NaiveDate {
        // month is validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or_default()
    }

    #[must_use]
    pub fn last_day(self) -> NaiveDate {
        let next = if self.month == 12 {
            NaiveDate::from_ymd_opt(self.year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(self.year, self.month + 1, 1)
        };
        next.unwrap_or_default() - chrono::Duration::days(1)
    }

    #[must_use]
    pub fn contains(self, date: NaiveDate) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_month_zero_and_thirteen() {
        assert!(Period::new(0, 2026).is_err());
        assert!(Period::new(13, 2026).is_err());
        assert!(Period::new(12, 2026).is_ok());
    }

    #[test]
    fn last_day_handles_december_and_february() {
        let dec = Period::new(12, 2026).unwrap();
        assert_eq!(dec.last_day(), NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
        let feb = Period::new(2, 2028).unwrap(); // leap year
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2028, 2, 29).unwrap());
    }

    #[test]
    fn key_is_zero_padded() {
        assert_eq!(Period::new(3, 2026).unwrap().key(), "2026-03");
    }
}
