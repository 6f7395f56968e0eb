//! Reset periods for challenge completions.
//!
//! A daily challenge can be completed once per calendar day, a weekly one once
//! per ISO week. The [`Period`] computed for a completion date is the third
//! component of the uniqueness key `(practitioner, challenge, period)`.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::types::Scope;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "scope", rename_all = "snake_case")]
pub enum Period {
    Day { date: NaiveDate },
    Week { year: i32, week: u32 },
}

impl Period {
    /// The period of `scope` that contains `date`.
    pub fn containing(scope: Scope, date: NaiveDate) -> Self {
        match scope {
            Scope::Daily => Period::Day { date },
            Scope::Weekly => {
                let iso = date.iso_week();
                Period::Week {
                    year: iso.year(),
                    week: iso.week(),
                }
            }
        }
    }

    pub fn scope(&self) -> Scope {
        match self {
            Period::Day { .. } => Scope::Daily,
            Period::Week { .. } => Scope::Weekly,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        *self == Period::containing(self.scope(), date)
    }

    /// Stable textual form used inside storage keys: `2026-10-16` or `2026-W42`.
    pub fn key(&self) -> String {
        match self {
            Period::Day { date } => date.format("%Y-%m-%d").to_string(),
            Period::Week { year, week } => format!("{year:04}-W{week:02}"),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn daily_period_is_the_date() {
        let p = Period::containing(Scope::Daily, d(2026, 10, 16));
        assert_eq!(p.key(), "2026-10-16");
        assert!(p.contains(d(2026, 10, 16)));
        assert!(!p.contains(d(2026, 10, 17)));
    }

    #[test]
    fn weekly_period_spans_monday_to_sunday() {
        // 2026-10-12 is a Monday.
        let p = Period::containing(Scope::Weekly, d(2026, 10, 14));
        assert!(!p.contains(d(2026, 10, 11)));
        assert!(p.contains(d(2026, 10, 12)));
        assert!(p.contains(d(2026, 10, 18)));
        assert!(!p.contains(d(2026, 10, 19)));
        assert_eq!(p.key(), "2026-W42");
    }

    #[test]
    fn iso_week_crosses_calendar_year() {
        // 2027-01-01 is a Friday, still in ISO week 53 of 2026.
        let p = Period::containing(Scope::Weekly, d(2027, 1, 1));
        assert_eq!(p, Period::Week { year: 2026, week: 53 });
        assert!(p.contains(d(2026, 12, 28)));
    }

    #[test]
    fn scope_is_recoverable_from_period() {
        assert_eq!(
            Period::containing(Scope::Weekly, d(2026, 1, 5)).scope(),
            Scope::Weekly
        );
        assert_eq!(
            Period::containing(Scope::Daily, d(2026, 1, 5)).scope(),
            Scope::Daily
        );
    }
}
