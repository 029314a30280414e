//! Reduction of observations grouped by a calendar key
//!
//! Unlike period aggregation, grouping ignores coverage intervals: every
//! observation falls into the group of its timestamp and contributes its
//! value once.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use trendsat_core::calendar::{dn_label, in_growing_season, season_label, SeasonScheme};
use trendsat_core::series::{group_by_unit, single_unit};
use trendsat_core::{Error, Observation, Result, UnitId};

use crate::maybe_rayon::*;

/// Calendar key observations are grouped by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupKey {
    /// `"2019"`
    Year,
    /// `"2019-03"`
    YearMonth,
    /// `"2019-05"` (with year) or `"05"` for `n`-day buckets
    Dn { n: u32, include_year: bool },
    /// `"2018_winter"`
    Season(SeasonScheme),
    /// `"2019-true"` for April through October, `"2019-false"` otherwise
    GrowingSeason,
}

impl GroupKey {
    /// Group label of `date`
    pub fn label(&self, date: NaiveDate) -> Result<String> {
        let label = match *self {
            GroupKey::Year => format!("{}", date.year()),
            GroupKey::YearMonth => format!("{}-{:02}", date.year(), date.month()),
            GroupKey::Dn { n, include_year } => dn_label(date, n, include_year)?,
            GroupKey::Season(scheme) => season_label(date, scheme),
            GroupKey::GrowingSeason => format!("{}-{}", date.year(), in_growing_season(date)),
        };
        Ok(label)
    }
}

impl std::str::FromStr for GroupKey {
    type Err = Error;

    /// `year`, `month`, `dn` / `dnN` (e.g. `dn16`), `doy-dn` / `doy-dnN`
    /// (bucket without year), `season`, `season-pheno`, `growing`
    fn from_str(s: &str) -> Result<Self> {
        let lower = s.to_lowercase();
        let invalid = || Error::InvalidParameter {
            name: "group_key",
            value: s.to_string(),
            reason: "expected year, month, dn[N], doy-dn[N], season, season-pheno or growing".into(),
        };
        let dn_width = |rest: &str| -> Result<u32> {
            if rest.is_empty() {
                Ok(8)
            } else {
                rest.parse().map_err(|_| invalid())
            }
        };

        match lower.as_str() {
            "year" | "yearly" => Ok(GroupKey::Year),
            "month" | "year-month" => Ok(GroupKey::YearMonth),
            "season" => Ok(GroupKey::Season(SeasonScheme::Meteorological)),
            "season-pheno" | "phenological" => Ok(GroupKey::Season(SeasonScheme::Phenological)),
            "growing" | "growing-season" => Ok(GroupKey::GrowingSeason),
            other => {
                if let Some(rest) = other.strip_prefix("doy-dn") {
                    Ok(GroupKey::Dn { n: dn_width(rest)?, include_year: false })
                } else if let Some(rest) = other.strip_prefix("dn") {
                    Ok(GroupKey::Dn { n: dn_width(rest)?, include_year: true })
                } else {
                    Err(invalid())
                }
            }
        }
    }
}

/// Reduction applied to the values of one group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    Mean,
    Sum,
    Min,
    Max,
    Median,
    /// Last minus first value in time order
    Delta,
}

impl Reducer {
    /// Reduce values given in time order. `values` must be non-empty.
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            Reducer::Mean => values.iter().sum::<f64>() / values.len() as f64,
            Reducer::Sum => values.iter().sum(),
            Reducer::Min => values.iter().copied().fold(f64::INFINITY, f64::min),
            Reducer::Max => values.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            Reducer::Median => {
                let mut sorted = values.to_vec();
                sorted.sort_by(f64::total_cmp);
                let n = sorted.len();
                if n % 2 == 0 {
                    (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
                } else {
                    sorted[n / 2]
                }
            }
            Reducer::Delta => match (values.first(), values.last()) {
                (Some(first), Some(last)) => last - first,
                _ => f64::NAN,
            },
        }
    }
}

impl std::str::FromStr for Reducer {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "mean" | "avg" => Ok(Reducer::Mean),
            "sum" => Ok(Reducer::Sum),
            "min" => Ok(Reducer::Min),
            "max" => Ok(Reducer::Max),
            "median" => Ok(Reducer::Median),
            "delta" => Ok(Reducer::Delta),
            _ => Err(Error::InvalidParameter {
                name: "reducer",
                value: s.to_string(),
                reason: "expected mean, sum, min, max, median or delta".into(),
            }),
        }
    }
}

/// Reduced value of one (unit, group)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupValue {
    pub unit_id: UnitId,
    pub key: String,
    pub value: f64,
    /// Valid observations in the group
    pub n: usize,
}

/// Group one unit's valid observations by `key` and reduce each group.
///
/// Groups come out sorted by label. Values within a group are taken in
/// timestamp order (stable for ties), so [`Reducer::Delta`] does not depend
/// on input order. Groups without a valid value are omitted.
pub fn reduce_by(series: &[Observation], key: GroupKey, reducer: Reducer) -> Result<Vec<GroupValue>> {
    let unit_id = single_unit(series)?;

    let mut groups: BTreeMap<String, Vec<(NaiveDate, f64)>> = BTreeMap::new();
    for obs in series.iter().filter(|o| o.is_usable()) {
        let label = key.label(obs.timestamp)?;
        groups.entry(label).or_default().push((obs.timestamp, obs.value));
    }

    Ok(groups
        .into_iter()
        .map(|(label, mut members)| {
            members.sort_by_key(|&(date, _)| date);
            let values: Vec<f64> = members.into_iter().map(|(_, v)| v).collect();
            GroupValue {
                unit_id: unit_id.clone(),
                key: label,
                value: reducer.apply(&values),
                n: values.len(),
            }
        })
        .collect())
}

/// [`reduce_by`] over a batch mixing units, in ascending unit order
pub fn reduce_by_unit(
    observations: &[Observation],
    key: GroupKey,
    reducer: Reducer,
) -> Result<Vec<GroupValue>> {
    let per_unit: Vec<Vec<GroupValue>> = group_by_unit(observations.iter().cloned())
        .into_par_iter()
        .map(|unit| reduce_by(&unit.observations, key, reducer))
        .collect::<Result<Vec<_>>>()?;
    Ok(per_unit.into_iter().flatten().collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn obs(date: NaiveDate, v: f64) -> Observation {
        Observation::new("px", date, v)
    }

    #[test]
    fn test_reducers() {
        let v = [3.0, 1.0, 4.0, 1.0, 5.0];
        assert!((Reducer::Mean.apply(&v) - 2.8).abs() < 1e-12);
        assert_eq!(Reducer::Sum.apply(&v), 14.0);
        assert_eq!(Reducer::Min.apply(&v), 1.0);
        assert_eq!(Reducer::Max.apply(&v), 5.0);
        assert_eq!(Reducer::Median.apply(&v), 3.0);
        assert_eq!(Reducer::Median.apply(&[1.0, 2.0, 3.0, 10.0]), 2.5);
        assert_eq!(Reducer::Delta.apply(&v), 2.0);
    }

    #[test]
    fn test_reduce_by_year_month() {
        let series = vec![
            obs(ymd(2019, 1, 5), 1.0),
            obs(ymd(2019, 1, 20), 3.0),
            obs(ymd(2019, 2, 1), 10.0),
            obs(ymd(2019, 2, 2), 99.0).with_valid(false),
        ];
        let out = reduce_by(&series, GroupKey::YearMonth, Reducer::Mean).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].key, "2019-01");
        assert_eq!(out[0].value, 2.0);
        assert_eq!(out[0].n, 2);
        assert_eq!(out[1].key, "2019-02");
        assert_eq!(out[1].value, 10.0);
        assert_eq!(out[1].n, 1);
    }

    #[test]
    fn test_delta_uses_time_order() {
        // Same-group values given out of order
        let series = vec![
            obs(ymd(2019, 1, 1), 1.0),
            obs(ymd(2019, 12, 1), 6.0),
            obs(ymd(2019, 6, 1), 4.0),
        ];
        let out = reduce_by(&series, GroupKey::Year, Reducer::Delta).unwrap();
        assert_eq!(out[0].value, 5.0);
    }

    #[test]
    fn test_season_and_growing_keys() {
        let series = vec![
            obs(ymd(2018, 12, 15), 1.0),
            obs(ymd(2019, 1, 15), 3.0),
            obs(ymd(2019, 5, 15), 7.0),
        ];
        let out = reduce_by(&series, GroupKey::Season(SeasonScheme::Meteorological), Reducer::Max)
            .unwrap();
        let keys: Vec<&str> = out.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["2018_winter", "2019_spring"]);
        assert_eq!(out[0].value, 3.0);

        let out = reduce_by(&series, GroupKey::GrowingSeason, Reducer::Sum).unwrap();
        let keys: Vec<&str> = out.iter().map(|g| g.key.as_str()).collect();
        assert_eq!(keys, vec!["2018-false", "2019-false", "2019-true"]);
        assert_eq!(out[0].value, 1.0);
        assert_eq!(out[1].value, 3.0);
        assert_eq!(out[2].value, 7.0);
        assert_eq!(GroupKey::GrowingSeason.label(ymd(2019, 10, 31)).unwrap(), "2019-true");
        assert_eq!(GroupKey::GrowingSeason.label(ymd(2019, 11, 1)).unwrap(), "2019-false");
    }

    #[test]
    fn test_dn_key() {
        let series = vec![obs(ymd(2010, 11, 18), 2.0), obs(ymd(2011, 11, 20), 4.0)];
        let out = reduce_by(&series, GroupKey::Dn { n: 8, include_year: true }, Reducer::Mean)
            .unwrap();
        assert_eq!(out[0].key, "2010-41");

        let out = reduce_by(&series, GroupKey::Dn { n: 8, include_year: false }, Reducer::Mean)
            .unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].key, "41");
        assert_eq!(out[0].value, 3.0);
    }

    #[test]
    fn test_parse_keys() {
        assert_eq!("year".parse::<GroupKey>().unwrap(), GroupKey::Year);
        assert_eq!(
            "dn16".parse::<GroupKey>().unwrap(),
            GroupKey::Dn { n: 16, include_year: true }
        );
        assert_eq!(
            "doy-dn".parse::<GroupKey>().unwrap(),
            GroupKey::Dn { n: 8, include_year: false }
        );
        assert_eq!(
            "season-pheno".parse::<GroupKey>().unwrap(),
            GroupKey::Season(SeasonScheme::Phenological)
        );
        assert!("decade".parse::<GroupKey>().is_err());
        assert!("dnx".parse::<GroupKey>().is_err());
        assert_eq!("MEDIAN".parse::<Reducer>().unwrap(), Reducer::Median);
        assert!("mode".parse::<Reducer>().is_err());
    }

    #[test]
    fn test_reduce_by_unit() {
        let batch = vec![
            Observation::new("b", ymd(2019, 1, 1), 2.0),
            Observation::new("a", ymd(2019, 1, 1), 1.0),
            Observation::new("a", ymd(2020, 1, 1), 5.0),
        ];
        let out = reduce_by_unit(&batch, GroupKey::Year, Reducer::Sum).unwrap();
        assert_eq!(out.len(), 3);
        assert_eq!(out[0].unit_id.as_str(), "a");
        assert_eq!(out[0].key, "2019");
        assert_eq!(out[2].unit_id.as_str(), "b");
    }
}
