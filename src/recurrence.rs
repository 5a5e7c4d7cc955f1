//! Annual recurrence arithmetic.
//!
//! All functions operate on calendar dates (`NaiveDate`), so "start of day"
//! is implicit. The engine is total over valid dates; invalid month/day
//! combinations are rejected earlier by [`calendar_date`].

use crate::error::{AppError, AppResult};
use chrono::{Datelike, Local, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed look-ahead window for "upcoming" events, in days.
pub const UPCOMING_WINDOW_DAYS: i64 = 30;

/// Where a Feb-29 anchor lands in a year without Feb-29.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LeapDayPolicy {
    /// Feb 28, which is what calendar month arithmetic yields.
    #[default]
    ClampToFeb28,
    /// The day after Feb 28.
    RollToMar1,
}

impl LeapDayPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            LeapDayPolicy::ClampToFeb28 => "feb28",
            LeapDayPolicy::RollToMar1 => "mar1",
        }
    }
}

impl fmt::Display for LeapDayPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeapDayPolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "feb28" => Ok(LeapDayPolicy::ClampToFeb28),
            "mar1" => Ok(LeapDayPolicy::RollToMar1),
            other => Err(AppError::config(format!("Unknown leap day policy: {}", other))),
        }
    }
}

/// Builds a calendar date, rejecting combinations such as Feb 30.
pub fn calendar_date(year: i32, month: u32, day: u32) -> AppResult<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| {
        AppError::validation(format!(
            "{:04}-{:02}-{:02} is not a valid calendar date",
            year, month, day
        ))
    })
}

/// The local calendar date right now.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn is_leap_day(date: NaiveDate) -> bool {
    date.month() == 2 && date.day() == 29
}

/// The anchor shifted forward by `years` whole years.
fn shift_years(anchor: NaiveDate, years: u32, policy: LeapDayPolicy) -> NaiveDate {
    let shifted = anchor
        .checked_add_months(Months::new(years.saturating_mul(12)))
        .unwrap_or(NaiveDate::MAX);

    match policy {
        LeapDayPolicy::RollToMar1 if is_leap_day(anchor) && !is_leap_day(shifted) => {
            shifted.succ_opt().unwrap_or(shifted)
        }
        _ => shifted,
    }
}

pub fn next_occurrence(anchor: NaiveDate, recurring: bool, reference: NaiveDate) -> NaiveDate {
    next_occurrence_with(anchor, recurring, reference, LeapDayPolicy::default())
}

/// Earliest date on or after `reference` that falls on the anchor's month and
/// day. Non-recurring anchors are returned unchanged.
pub fn next_occurrence_with(
    anchor: NaiveDate,
    recurring: bool,
    reference: NaiveDate,
    policy: LeapDayPolicy,
) -> NaiveDate {
    if !recurring || anchor >= reference {
        return anchor;
    }

    // Skip straight to the year before the reference year.
    let mut years = (reference.year() - anchor.year()).max(1) as u32 - 1;
    loop {
        let candidate = shift_years(anchor, years, policy);
        if candidate >= reference {
            return candidate;
        }
        years += 1;
    }
}

pub fn days_until(anchor: NaiveDate, recurring: bool, reference: NaiveDate) -> i64 {
    days_until_with(anchor, recurring, reference, LeapDayPolicy::default())
}

/// Whole days from `reference` to the next occurrence. Never negative for
/// recurring anchors.
pub fn days_until_with(
    anchor: NaiveDate,
    recurring: bool,
    reference: NaiveDate,
    policy: LeapDayPolicy,
) -> i64 {
    (next_occurrence_with(anchor, recurring, reference, policy) - reference).num_days()
}

pub fn is_today(anchor: NaiveDate, recurring: bool, reference: NaiveDate) -> bool {
    is_today_with(anchor, recurring, reference, LeapDayPolicy::default())
}

pub fn is_today_with(
    anchor: NaiveDate,
    recurring: bool,
    reference: NaiveDate,
    policy: LeapDayPolicy,
) -> bool {
    days_until_with(anchor, recurring, reference, policy) == 0
}

pub fn is_upcoming(anchor: NaiveDate, recurring: bool, reference: NaiveDate) -> bool {
    is_upcoming_with(anchor, recurring, reference, LeapDayPolicy::default())
}

pub fn is_upcoming_with(
    anchor: NaiveDate,
    recurring: bool,
    reference: NaiveDate,
    policy: LeapDayPolicy,
) -> bool {
    let days = days_until_with(anchor, recurring, reference, policy);
    days > 0 && days <= UPCOMING_WINDOW_DAYS
}

/// Whether a recurring anchor lands on `date` in `date`'s year, ignoring
/// the anchor year. A Feb-29 anchor lands on the policy's substitute day in
/// years without Feb 29.
pub fn falls_on_anniversary(anchor: NaiveDate, date: NaiveDate, policy: LeapDayPolicy) -> bool {
    if (anchor.month(), anchor.day()) == (date.month(), date.day()) {
        return true;
    }
    if !is_leap_day(anchor) || NaiveDate::from_ymd_opt(date.year(), 2, 29).is_some() {
        return false;
    }

    let substitute = match policy {
        LeapDayPolicy::ClampToFeb28 => (2, 28),
        LeapDayPolicy::RollToMar1 => (3, 1),
    };
    (date.month(), date.day()) == substitute
}

/// Whole years elapsed from `anchor` to `reference` (age, years married).
pub fn years_between(anchor: NaiveDate, reference: NaiveDate) -> i32 {
    let mut years = reference.year() - anchor.year();
    if (reference.month(), reference.day()) < (anchor.month(), anchor.day()) {
        years -= 1;
    }
    years
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_non_recurring_returns_anchor() {
        let anchor = d(2020, 5, 17);
        assert_eq!(next_occurrence(anchor, false, d(2024, 1, 1)), anchor);
        assert_eq!(days_until(anchor, false, d(2020, 5, 10)), 7);
        // Past non-recurring anchors go negative
        assert_eq!(days_until(anchor, false, d(2020, 5, 20)), -3);
    }

    #[test]
    fn test_recurring_later_this_year() {
        let next = next_occurrence(d(1990, 12, 25), true, d(2024, 12, 1));
        assert_eq!(next, d(2024, 12, 25));
        assert_eq!(days_until(d(1990, 12, 25), true, d(2024, 12, 1)), 24);
    }

    #[test]
    fn test_recurring_rolls_over_year_boundary() {
        let next = next_occurrence(d(1985, 1, 3), true, d(2024, 12, 30));
        assert_eq!(next, d(2025, 1, 3));
        assert_eq!(days_until(d(1985, 1, 3), true, d(2024, 12, 30)), 4);
    }

    #[test]
    fn test_recurring_on_reference_day_is_today() {
        let anchor = d(2000, 7, 4);
        let reference = d(2026, 7, 4);
        assert_eq!(next_occurrence(anchor, true, reference), reference);
        assert!(is_today(anchor, true, reference));
        assert!(!is_upcoming(anchor, true, reference));
    }

    #[test]
    fn test_future_anchor_is_its_own_next_occurrence() {
        let anchor = d(2030, 3, 3);
        assert_eq!(next_occurrence(anchor, true, d(2026, 1, 1)), anchor);
    }

    #[test]
    fn test_next_occurrence_never_before_reference() {
        let anchors = [d(1970, 1, 1), d(1999, 6, 30), d(2004, 2, 29), d(2012, 12, 31)];
        let references = [d(2025, 1, 1), d(2025, 2, 28), d(2025, 3, 1), d(2028, 2, 29), d(2026, 12, 31)];

        for anchor in anchors {
            for reference in references {
                let next = next_occurrence(anchor, true, reference);
                assert!(next >= reference, "{} -> {} before {}", anchor, next, reference);
                assert!(days_until(anchor, true, reference) >= 0);
                if !is_leap_day(anchor) {
                    assert_eq!((next.month(), next.day()), (anchor.month(), anchor.day()));
                }
            }
        }
    }

    #[test]
    fn test_days_until_is_idempotent() {
        let anchor = d(1991, 9, 14);
        let reference = d(2026, 10, 19);
        let first = days_until(anchor, true, reference);
        assert_eq!(first, days_until(anchor, true, reference));
        assert_eq!(first, 330);
    }

    #[test]
    fn test_leap_anchor_clamps_to_feb_28() {
        let anchor = d(2024, 2, 29);
        let reference = d(2025, 3, 1);
        // Feb 28 2025 has already passed, so the next one is Feb 28 2026
        assert_eq!(next_occurrence(anchor, true, reference), d(2026, 2, 28));
        assert_eq!(days_until(anchor, true, reference), 364);

        assert_eq!(next_occurrence(anchor, true, d(2025, 2, 1)), d(2025, 2, 28));
        assert!(is_today(anchor, true, d(2025, 2, 28)));
    }

    #[test]
    fn test_leap_anchor_rolls_to_mar_1() {
        let anchor = d(2024, 2, 29);
        let reference = d(2025, 3, 1);
        let policy = LeapDayPolicy::RollToMar1;
        assert_eq!(next_occurrence_with(anchor, true, reference, policy), d(2025, 3, 1));
        assert_eq!(days_until_with(anchor, true, reference, policy), 0);
        assert_eq!(next_occurrence_with(anchor, true, d(2025, 3, 2), policy), d(2026, 3, 1));
    }

    #[test]
    fn test_leap_anchor_returns_to_feb_29_in_leap_years() {
        let anchor = d(2024, 2, 29);
        for policy in [LeapDayPolicy::ClampToFeb28, LeapDayPolicy::RollToMar1] {
            assert_eq!(next_occurrence_with(anchor, true, d(2028, 1, 15), policy), d(2028, 2, 29));
        }
    }

    #[test]
    fn test_leap_anchor_is_today_under_each_policy() {
        let anchor = d(2024, 2, 29);
        assert!(is_today_with(anchor, true, d(2027, 3, 1), LeapDayPolicy::RollToMar1));
        assert!(!is_today_with(anchor, true, d(2027, 2, 28), LeapDayPolicy::RollToMar1));
        assert!(is_upcoming_with(anchor, true, d(2027, 2, 28), LeapDayPolicy::RollToMar1));
        assert!(!is_upcoming_with(anchor, true, d(2027, 2, 28), LeapDayPolicy::ClampToFeb28));
    }

    #[test]
    fn test_falls_on_anniversary() {
        let anchor = d(2024, 2, 29);
        let clamp = LeapDayPolicy::ClampToFeb28;
        let roll = LeapDayPolicy::RollToMar1;

        assert!(falls_on_anniversary(anchor, d(2027, 2, 28), clamp));
        assert!(!falls_on_anniversary(anchor, d(2027, 3, 1), clamp));
        assert!(falls_on_anniversary(anchor, d(2027, 3, 1), roll));
        assert!(!falls_on_anniversary(anchor, d(2027, 2, 28), roll));

        // Leap years keep the real date under both policies
        assert!(falls_on_anniversary(anchor, d(2028, 2, 29), clamp));
        assert!(!falls_on_anniversary(anchor, d(2028, 2, 28), clamp));
        assert!(!falls_on_anniversary(anchor, d(2028, 3, 1), roll));

        assert!(falls_on_anniversary(d(1990, 7, 4), d(2026, 7, 4), roll));
        assert!(!falls_on_anniversary(d(1990, 7, 4), d(2026, 7, 5), clamp));
    }

    #[test]
    fn test_upcoming_window_bounds() {
        let reference = d(2026, 1, 1);
        assert!(is_upcoming(d(2000, 1, 2), true, reference));
        assert!(is_upcoming(d(2000, 1, 31), true, reference));
        assert!(!is_upcoming(d(2000, 2, 1), true, reference));
    }

    #[test]
    fn test_years_between() {
        assert_eq!(years_between(d(1990, 10, 20), d(2026, 10, 19)), 35);
        assert_eq!(years_between(d(1990, 10, 19), d(2026, 10, 19)), 36);
        assert_eq!(years_between(d(2004, 2, 29), d(2025, 2, 28)), 20);
        assert_eq!(years_between(d(2004, 2, 29), d(2025, 3, 1)), 21);
    }

    #[test]
    fn test_calendar_date_rejects_feb_30() {
        assert!(calendar_date(2025, 2, 30).is_err());
        assert!(calendar_date(2025, 2, 29).is_err());
        assert_eq!(calendar_date(2024, 2, 29).unwrap(), d(2024, 2, 29));
    }

    #[test]
    fn test_leap_policy_parse() {
        assert_eq!("feb28".parse::<LeapDayPolicy>().unwrap(), LeapDayPolicy::ClampToFeb28);
        assert_eq!(" MAR1 ".parse::<LeapDayPolicy>().unwrap(), LeapDayPolicy::RollToMar1);
        assert!("feb29".parse::<LeapDayPolicy>().is_err());
    }
}
