//! Calendar periods (months and years)

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::{days_in_month, inclusive_days};
use crate::error::{Error, Result};

/// Granularity of an aggregation period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PeriodKind {
    /// Calendar month (28-31 days)
    Month,
    /// Calendar year (365/366 days)
    Year,
}

impl PeriodKind {
    /// Number of periods of this kind in one calendar year
    pub fn per_year(self) -> usize {
        match self {
            PeriodKind::Month => 12,
            PeriodKind::Year => 1,
        }
    }
}

impl std::str::FromStr for PeriodKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "month" | "monthly" | "mon" => Ok(PeriodKind::Month),
            "year" | "yearly" | "annual" => Ok(PeriodKind::Year),
            _ => Err(Error::InvalidParameter {
                name: "period",
                value: s.to_string(),
                reason: "expected month or year".into(),
            }),
        }
    }
}

/// A closed calendar period `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Period {
    pub kind: PeriodKind,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Period {
    /// Period of the given kind that contains `date`
    pub fn containing(date: NaiveDate, kind: PeriodKind) -> Self {
        match kind {
            PeriodKind::Month => Self::month(date.year(), date.month()).unwrap_or(Self {
                kind,
                start: date,
                end: date,
            }),
            PeriodKind::Year => Self::year(date.year()).unwrap_or(Self {
                kind,
                start: date,
                end: date,
            }),
        }
    }

    /// Calendar month `month` (1-based) of `year`
    pub fn month(year: i32, month: u32) -> Option<Self> {
        let start = NaiveDate::from_ymd_opt(year, month, 1)?;
        let end = NaiveDate::from_ymd_opt(year, month, days_in_month(year, month)?)?;
        Some(Self { kind: PeriodKind::Month, start, end })
    }

    /// Calendar year `year`
    pub fn year(year: i32) -> Option<Self> {
        Some(Self {
            kind: PeriodKind::Year,
            start: NaiveDate::from_ymd_opt(year, 1, 1)?,
            end: NaiveDate::from_ymd_opt(year, 12, 31)?,
        })
    }

    /// The period immediately following this one
    pub fn next(&self) -> Option<Self> {
        let day_after = self.end.succ_opt()?;
        Some(Self::containing(day_after, self.kind))
    }

    /// Calendar days in the period, leap-year aware
    pub fn length_days(&self) -> u32 {
        inclusive_days(self.start, self.end)
    }

    /// True if the closed intervals `[start, end]` and this period overlap
    pub fn overlaps(&self, start: NaiveDate, end: NaiveDate) -> bool {
        start <= self.end && end >= self.start
    }

    /// Zero-based position of this period among all periods of its kind
    /// starting at January of `first_year`.
    pub fn index_from(&self, first_year: i32) -> i64 {
        let years = (self.start.year() - first_year) as i64;
        match self.kind {
            PeriodKind::Month => years * 12 + (self.start.month() as i64 - 1),
            PeriodKind::Year => years,
        }
    }
}

/// Generate the periods of `kind` covering `start_year..=end_year`.
///
/// Twelve months per year for [`PeriodKind::Month`], one full year for
/// [`PeriodKind::Year`], in chronological order.
pub fn periods(kind: PeriodKind, start_year: i32, end_year: i32) -> Result<Vec<Period>> {
    if start_year > end_year {
        return Err(Error::InvalidParameter {
            name: "year_range",
            value: format!("{}..={}", start_year, end_year),
            reason: "start year must not be after end year".into(),
        });
    }

    let mut out = Vec::with_capacity((end_year - start_year + 1) as usize * kind.per_year());
    for year in start_year..=end_year {
        match kind {
            PeriodKind::Month => out.extend((1..=12).filter_map(|m| Period::month(year, m))),
            PeriodKind::Year => out.extend(Period::year(year)),
        }
    }
    Ok(out)
}
