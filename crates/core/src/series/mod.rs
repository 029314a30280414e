//! Per-unit observation series
//!
//! An [`Observation`] is one time-stamped value of one unit (pixel, station,
//! polygon). Batches mix units freely; [`group_by_unit`] splits them into
//! independent [`UnitSeries`] before any algorithm runs.

pub mod qa;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::calendar::dn_end;
use crate::error::{Error, Result};

/// Identifier of an independent spatial or feature unit
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for UnitId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for UnitId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<u64> for UnitId {
    fn from(n: u64) -> Self {
        Self(n.to_string())
    }
}

/// One time-stamped observation of a unit.
///
/// The observation represents the closed coverage interval
/// `[timestamp, interval_end]`; without `interval_end` it covers the single
/// day `timestamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub unit_id: UnitId,
    pub timestamp: NaiveDate,
    pub interval_end: Option<NaiveDate>,
    pub value: f64,
    /// Invalid observations are skipped by reductions but still count
    /// towards coverage diagnostics
    pub valid: bool,
}

impl Observation {
    /// Valid, single-day observation
    pub fn new(unit_id: impl Into<UnitId>, timestamp: NaiveDate, value: f64) -> Self {
        Self {
            unit_id: unit_id.into(),
            timestamp,
            interval_end: None,
            value,
            valid: true,
        }
    }

    pub fn with_interval_end(mut self, end: NaiveDate) -> Self {
        self.interval_end = Some(end);
        self
    }

    pub fn with_valid(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }

    /// Fill a missing `interval_end` with the end of the `n`-day bucket
    /// starting at `timestamp` (clamped to December 31).
    pub fn with_dn_coverage(mut self, n: u32) -> Result<Self> {
        if self.interval_end.is_none() {
            self.interval_end = Some(dn_end(self.timestamp, n)?);
        }
        Ok(self)
    }

    /// Calendar year of the timestamp
    pub fn year(&self) -> i32 {
        self.timestamp.year()
    }

    /// Last covered day
    pub fn coverage_end(&self) -> NaiveDate {
        self.interval_end.unwrap_or(self.timestamp)
    }

    /// Closed coverage interval, rejecting an end before the start
    pub fn coverage(&self) -> Result<(NaiveDate, NaiveDate)> {
        let end = self.coverage_end();
        if end < self.timestamp {
            return Err(Error::MalformedInterval {
                unit: self.unit_id.clone(),
                start: self.timestamp,
                end,
            });
        }
        Ok((self.timestamp, end))
    }

    /// Valid and carrying a finite value
    pub fn is_usable(&self) -> bool {
        self.valid && self.value.is_finite()
    }
}

/// All observations of one unit, in caller order
#[derive(Debug, Clone, PartialEq)]
pub struct UnitSeries {
    pub unit_id: UnitId,
    pub observations: Vec<Observation>,
}

impl UnitSeries {
    pub fn new(unit_id: impl Into<UnitId>, observations: Vec<Observation>) -> Self {
        Self {
            unit_id: unit_id.into(),
            observations,
        }
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    /// Number of usable observations
    pub fn valid_count(&self) -> usize {
        self.observations.iter().filter(|o| o.is_usable()).count()
    }

    /// First and last covered day over all observations
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let start = self.observations.iter().map(|o| o.timestamp).min()?;
        let end = self.observations.iter().map(|o| o.coverage_end()).max()?;
        Some((start, end))
    }
}

/// Split a batch into per-unit series.
///
/// Units come out in ascending [`UnitId`] order; observations keep their
/// relative input order within each unit.
pub fn group_by_unit<I>(observations: I) -> Vec<UnitSeries>
where
    I: IntoIterator<Item = Observation>,
{
    let mut groups: BTreeMap<UnitId, Vec<Observation>> = BTreeMap::new();
    for obs in observations {
        groups.entry(obs.unit_id.clone()).or_default().push(obs);
    }
    groups
        .into_iter()
        .map(|(unit_id, observations)| UnitSeries { unit_id, observations })
        .collect()
}

/// Check that every observation belongs to one unit and return it.
pub fn single_unit(observations: &[Observation]) -> Result<UnitId> {
    let first = observations.first().ok_or_else(|| Error::EmptySeries {
        unit: UnitId::from(""),
    })?;
    if let Some(other) = observations.iter().find(|o| o.unit_id != first.unit_id) {
        return Err(Error::MixedUnits {
            expected: first.unit_id.clone(),
            found: other.unit_id.clone(),
        });
    }
    Ok(first.unit_id.clone())
}

/// Check that timestamps never decrease. Equal timestamps are allowed.
pub fn check_sorted(observations: &[Observation]) -> Result<()> {
    for (index, pair) in observations.windows(2).enumerate() {
        if pair[1].timestamp < pair[0].timestamp {
            return Err(Error::UnsortedSeries {
                unit: pair[1].unit_id.clone(),
                index: index + 1,
                date: pair[1].timestamp,
                previous: pair[0].timestamp,
            });
        }
    }
    Ok(())
}
