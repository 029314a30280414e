//! Aggregation of irregular observations into calendar periods
//!
//! Each observation covers the closed interval `[timestamp, interval_end]`.
//! For every month or year in the requested range, observations are weighted
//! by the number of days they overlap the period:
//!
//! ```text
//! weighted_sum  = Σ value·overlap·scale_factor     (valid observations)
//! coverage_days = Σ overlap                        (valid observations)
//! mean          = weighted_sum / coverage_days
//! value         = mean · period_length_days
//! ```
//!
//! Periods without valid coverage produce no record.

pub mod group;

pub use group::{reduce_by, reduce_by_unit, GroupKey, GroupValue, Reducer};

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use tracing::debug;
use trendsat_core::calendar::{max_date, overlap_days, periods, Period, PeriodKind};
use trendsat_core::series::group_by_unit;
use trendsat_core::{Algorithm, Error, Observation, Result, UnitId, UnitSeries};

use crate::maybe_rayon::*;

/// Parameters for period aggregation
#[derive(Debug, Clone)]
pub struct AggregateParams {
    /// Month or year periods
    pub kind: PeriodKind,
    /// Inclusive year range; `None` spans the years each unit touches
    pub year_range: Option<(i32, i32)>,
    /// Multiplier applied to every value (e.g. product scale factor)
    pub scale_factor: f64,
}

impl AggregateParams {
    /// Reject a backwards `year_range` or a non-finite `scale_factor`.
    pub fn validate(&self) -> Result<()> {
        if let Some((start, end)) = self.year_range
            && start > end
        {
            return Err(Error::InvalidParameter {
                name: "year_range",
                value: format!("{}..={}", start, end),
                reason: "start year must not be after end year".into(),
            });
        }
        if !self.scale_factor.is_finite() {
            return Err(Error::InvalidParameter {
                name: "scale_factor",
                value: self.scale_factor.to_string(),
                reason: "must be finite".into(),
            });
        }
        Ok(())
    }
}

impl Default for AggregateParams {
    fn default() -> Self {
        Self {
            kind: PeriodKind::Month,
            year_range: None,
            scale_factor: 1.0,
        }
    }
}

/// One (unit, period) aggregate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateRecord {
    pub unit_id: UnitId,
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    /// Full-period total, `mean · period_length_days`
    pub value: f64,
    /// Coverage-weighted daily mean
    pub mean: f64,
    /// Days covered by valid observations
    pub coverage_days: u32,
    /// Days covered by any selected observation, valid or not
    pub observed_days: u32,
    pub period_length_days: u32,
}

impl AggregateRecord {
    /// Fraction of the period covered by valid observations
    pub fn coverage_ratio(&self) -> f64 {
        self.coverage_days as f64 / self.period_length_days as f64
    }

    /// The record as a valid observation spanning its period with the daily
    /// mean as value, ready to be aggregated again.
    pub fn to_observation(&self) -> Observation {
        Observation::new(self.unit_id.clone(), self.period_start, self.mean)
            .with_interval_end(self.period_end)
    }
}

/// Running sums of one period
#[derive(Debug, Clone, Copy, Default)]
struct Accumulator {
    weighted_sum: f64,
    coverage_days: u32,
    observed_days: u32,
}

/// Periods of one unit laid out contiguously from January of `first_year`
struct PeriodGrid {
    first_year: i32,
    periods: Vec<Period>,
    acc: Vec<Accumulator>,
}

impl PeriodGrid {
    fn new(kind: PeriodKind, first_year: i32, last_year: i32) -> Result<Self> {
        let periods = periods(kind, first_year, last_year)?;
        let acc = vec![Accumulator::default(); periods.len()];
        Ok(Self { first_year, periods, acc })
    }

    /// Spread one observation over every period it overlaps
    fn add(&mut self, obs: &Observation, start: NaiveDate, end: NaiveDate, scale: f64) {
        let (Some(first), Some(last)) = (self.periods.first(), self.periods.last()) else {
            return;
        };
        if end < first.start || start > last.end {
            return;
        }

        let usable = obs.is_usable();
        let mut period = Period::containing(max_date(start, first.start), first.kind);
        loop {
            let days = overlap_days((start, end), (period.start, period.end));
            let idx = period.index_from(self.first_year) as usize;
            if let Some(slot) = self.acc.get_mut(idx) {
                slot.observed_days += days;
                if usable {
                    slot.weighted_sum += obs.value * days as f64 * scale;
                    slot.coverage_days += days;
                }
            }
            if period.end >= end || period.end >= last.end {
                break;
            }
            match period.next() {
                Some(next) => period = next,
                None => break,
            }
        }
    }

    fn into_records(self, unit_id: &UnitId) -> Result<Vec<AggregateRecord>> {
        let mut out = Vec::new();
        for (period, acc) in self.periods.into_iter().zip(self.acc) {
            if acc.coverage_days == 0 {
                continue;
            }
            let length = period.length_days();
            if acc.coverage_days > length {
                return Err(Error::CoverageOverflow {
                    unit: unit_id.clone(),
                    period_start: period.start,
                    coverage: acc.coverage_days as f64,
                    length,
                });
            }
            let mean = acc.weighted_sum / acc.coverage_days as f64;
            out.push(AggregateRecord {
                unit_id: unit_id.clone(),
                period_start: period.start,
                period_end: period.end,
                value: mean * length as f64,
                mean,
                coverage_days: acc.coverage_days,
                observed_days: acc.observed_days,
                period_length_days: length,
            });
        }
        Ok(out)
    }
}

/// Aggregate one unit's observations. Order of observations does not matter.
pub fn aggregate_unit(unit: &UnitSeries, params: &AggregateParams) -> Result<Vec<AggregateRecord>> {
    params.validate()?;
    let intervals = unit
        .observations
        .iter()
        .map(|o| o.coverage())
        .collect::<Result<Vec<_>>>()?;

    let range = match params.year_range {
        Some(range) => Some(range),
        None => intervals
            .iter()
            .map(|(s, _)| s.year())
            .min()
            .zip(intervals.iter().map(|(_, e)| e.year()).max()),
    };
    let Some((first_year, last_year)) = range else {
        return Ok(Vec::new());
    };

    let mut grid = PeriodGrid::new(params.kind, first_year, last_year)?;
    for (obs, &(start, end)) in unit.observations.iter().zip(&intervals) {
        grid.add(obs, start, end, params.scale_factor);
    }
    let records = grid.into_records(&unit.unit_id)?;
    debug!(unit = %unit.unit_id, records = records.len(), "aggregated");
    Ok(records)
}

/// Aggregate a batch of observations into periods of `kind`.
///
/// The batch may mix units; records come out grouped by ascending unit and
/// chronologically within a unit. The first invalid unit aborts the batch.
///
/// # Errors
/// - An observation whose `interval_end` precedes its `timestamp`
/// - Valid coverage of a period longer than the period itself
/// - `year_range` with start after end
pub fn aggregate(
    series: &[Observation],
    kind: PeriodKind,
    year_range: Option<(i32, i32)>,
) -> Result<Vec<AggregateRecord>> {
    let params = AggregateParams {
        kind,
        year_range,
        ..Default::default()
    };
    aggregate_with(series, &params)
}

/// [`aggregate`] with explicit parameters
pub fn aggregate_with(series: &[Observation], params: &AggregateParams) -> Result<Vec<AggregateRecord>> {
    params.validate()?;

    let per_unit: Vec<Vec<AggregateRecord>> = group_by_unit(series.iter().cloned())
        .into_par_iter()
        .map(|unit| aggregate_unit(&unit, params))
        .collect::<Result<Vec<_>>>()?;

    Ok(per_unit.into_iter().flatten().collect())
}

/// Calendar period aggregator
#[derive(Debug, Clone, Default)]
pub struct PeriodAggregator;

impl Algorithm for PeriodAggregator {
    type Input = Vec<Observation>;
    type Output = Vec<AggregateRecord>;
    type Params = AggregateParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Period Aggregation"
    }

    fn description(&self) -> &'static str {
        "Overlap-weighted aggregation of interval observations into months or years"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        aggregate_with(&input, &params)
    }
}
