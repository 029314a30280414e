//! Calendar utilities
//!
//! Gregorian date arithmetic shared by the temporal algorithms:
//! - **period**: month and year periods used as aggregation targets
//! - **dn**: fixed-width day-number buckets (e.g. 8-day composites)
//! - **season**: meteorological and phenological season labels
//!
//! All intervals are closed: `[start, end]` includes both endpoints.

mod dn;
mod period;
mod season;

pub use dn::{dn_end, dn_index, dn_label, dn_start, parse_dn_label};
pub use period::{periods, Period, PeriodKind};
pub use season::{in_growing_season, season_label, Season, SeasonScheme};

use chrono::{Datelike, NaiveDate};

/// Gregorian leap rule: divisible by 4 and not by 100, unless divisible by 400.
pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// Number of days in a calendar year (365 or 366)
pub fn days_in_year(year: i32) -> u32 {
    if is_leap_year(year) { 366 } else { 365 }
}

/// Number of days in a month (28-31). `month` is 1-based.
///
/// Returns `None` for a month outside 1..=12.
pub fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let days = match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => return None,
    };
    Some(days)
}

/// Last day of the year of `date`
pub fn year_end(date: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(date.year(), 12, 31).unwrap_or(date)
}

/// Number of days in `[start, end]`, counting both endpoints.
///
/// Zero when `end` precedes `start`.
pub fn inclusive_days(start: NaiveDate, end: NaiveDate) -> u32 {
    let days = (end - start).num_days() + 1;
    days.max(0) as u32
}

/// Earlier of two dates
pub fn min_date(a: NaiveDate, b: NaiveDate) -> NaiveDate {
    if a > b { b } else { a }
}

/// Later of two dates
pub fn max_date(a: NaiveDate, b: NaiveDate) -> NaiveDate {
    if a > b { a } else { b }
}

/// Days shared by two closed intervals, counting both endpoints.
///
/// `overlap_days((s1, e1), (s2, e2)) = min(e1, e2) - max(s1, s2) + 1`,
/// or 0 when the intervals are disjoint.
pub fn overlap_days(a: (NaiveDate, NaiveDate), b: (NaiveDate, NaiveDate)) -> u32 {
    inclusive_days(max_date(a.0, b.0), min_date(a.1, b.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_leap_years() {
        assert!(is_leap_year(2020));
        assert!(!is_leap_year(2019));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2000));
        assert_eq!(days_in_year(2020), 366);
        assert_eq!(days_in_year(2019), 365);
    }

    #[test]
    fn test_days_in_month() {
        assert_eq!(days_in_month(2019, 2), Some(28));
        assert_eq!(days_in_month(2020, 2), Some(29));
        assert_eq!(days_in_month(2019, 4), Some(30));
        assert_eq!(days_in_month(2019, 12), Some(31));
        assert_eq!(days_in_month(2019, 13), None);
        assert_eq!(days_in_month(2019, 0), None);
    }

    #[test]
    fn test_inclusive_days() {
        assert_eq!(inclusive_days(ymd(2019, 1, 1), ymd(2019, 1, 1)), 1);
        assert_eq!(inclusive_days(ymd(2019, 1, 1), ymd(2019, 1, 8)), 8);
        assert_eq!(inclusive_days(ymd(2019, 1, 8), ymd(2019, 1, 1)), 0);
        assert_eq!(inclusive_days(ymd(2020, 1, 1), ymd(2020, 12, 31)), 366);
    }

    #[test]
    fn test_overlap_days() {
        // 8-day composite straddling a month boundary
        let obs = (ymd(2019, 1, 25), ymd(2019, 2, 1));
        let jan = (ymd(2019, 1, 1), ymd(2019, 1, 31));
        let feb = (ymd(2019, 2, 1), ymd(2019, 2, 28));
        assert_eq!(overlap_days(obs, jan), 7);
        assert_eq!(overlap_days(obs, feb), 1);

        let mar = (ymd(2019, 3, 1), ymd(2019, 3, 31));
        assert_eq!(overlap_days(obs, mar), 0);
    }

    #[test]
    fn test_min_max_date() {
        let a = ymd(2019, 1, 1);
        let b = ymd(2019, 6, 1);
        assert_eq!(min_date(a, b), a);
        assert_eq!(max_date(a, b), b);
        assert_eq!(year_end(b), ymd(2019, 12, 31));
    }
}
