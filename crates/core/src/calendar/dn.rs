//! Day-number buckets
//!
//! Composite products (MODIS 8-day, 4-day, 16-day) index their images by a
//! bucket number within the year: `dn = (doy - 1) / n + 1`. The last bucket
//! of a year is truncated at December 31 rather than spilling into January.

use chrono::{Datelike, Days, NaiveDate};

use super::{min_date, year_end};
use crate::error::{Error, Result};

fn check_width(n: u32) -> Result<()> {
    if n == 0 {
        return Err(Error::InvalidParameter {
            name: "dn",
            value: n.to_string(),
            reason: "bucket width must be at least one day".into(),
        });
    }
    Ok(())
}

/// 1-based bucket index of `date` for buckets of `n` days
pub fn dn_index(date: NaiveDate, n: u32) -> Result<u32> {
    check_width(n)?;
    Ok((date.ordinal() - 1) / n + 1)
}

/// Bucket label: `"2019-05"` with the year, `"05"` without.
pub fn dn_label(date: NaiveDate, n: u32, include_year: bool) -> Result<String> {
    let dn = dn_index(date, n)?;
    Ok(if include_year {
        format!("{}-{:02}", date.year(), dn)
    } else {
        format!("{:02}", dn)
    })
}

/// First day of bucket `index` (1-based) in `year`
pub fn dn_start(year: i32, index: u32, n: u32) -> Result<NaiveDate> {
    check_width(n)?;
    let invalid = || Error::InvalidParameter {
        name: "dn_index",
        value: index.to_string(),
        reason: format!("no {}-day bucket with this index in {}", n, year),
    };
    if index == 0 {
        return Err(invalid());
    }
    let doy = (index - 1)
        .checked_mul(n)
        .and_then(|d| d.checked_add(1))
        .ok_or_else(invalid)?;
    NaiveDate::from_yo_opt(year, doy).ok_or_else(invalid)
}

/// Parse a `"YYYY-dd"` label back to the first day of its bucket
pub fn parse_dn_label(label: &str, n: u32) -> Result<NaiveDate> {
    let invalid = || Error::InvalidParameter {
        name: "dn_label",
        value: label.to_string(),
        reason: "expected YYYY-dd".into(),
    };
    let (year, index) = label.split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.trim().parse().map_err(|_| invalid())?;
    let index: u32 = index.trim().parse().map_err(|_| invalid())?;
    dn_start(year, index, n)
}

/// Last day covered by the bucket starting at `date`: `date + n - 1`,
/// clamped to December 31 of the same year.
pub fn dn_end(date: NaiveDate, n: u32) -> Result<NaiveDate> {
    check_width(n)?;
    let last = year_end(date);
    let end = date.checked_add_days(Days::new(u64::from(n - 1))).unwrap_or(last);
    Ok(min_date(end, last))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_dn_index() {
        assert_eq!(dn_index(ymd(2019, 1, 1), 8).unwrap(), 1);
        assert_eq!(dn_index(ymd(2019, 1, 8), 8).unwrap(), 1);
        assert_eq!(dn_index(ymd(2019, 1, 9), 8).unwrap(), 2);
        assert_eq!(dn_index(ymd(2019, 12, 31), 8).unwrap(), 46);
        assert!(dn_index(ymd(2019, 1, 1), 0).is_err());
    }

    #[test]
    fn test_dn_label_round_trip() {
        let date = ymd(2010, 11, 18);
        let label = dn_label(date, 8, true).unwrap();
        assert_eq!(label, "2010-41");
        assert_eq!(dn_label(date, 8, false).unwrap(), "41");

        let start = parse_dn_label(&label, 8).unwrap();
        assert_eq!(start, ymd(2010, 11, 17));
        assert_eq!(dn_index(start, 8).unwrap(), 41);
    }

    #[test]
    fn test_dn_start_out_of_year() {
        assert!(dn_start(2019, 47, 8).is_err());
        assert!(dn_start(2019, 0, 8).is_err());
        assert!(parse_dn_label("2019", 8).is_err());
        assert!(parse_dn_label("abcd-01", 8).is_err());
    }

    #[test]
    fn test_dn_end_clamped_to_year() {
        assert_eq!(dn_end(ymd(2019, 1, 1), 8).unwrap(), ymd(2019, 1, 8));
        // Last 8-day bucket of 2019 starts Dec 27 and keeps only 5 days
        assert_eq!(dn_end(ymd(2019, 12, 27), 8).unwrap(), ymd(2019, 12, 31));
        assert_eq!(dn_end(ymd(2019, 3, 3), 1).unwrap(), ymd(2019, 3, 3));
    }
}
