//! Temporal linear trend with significance
//!
//! Fits `value = offset + slope·year` over one unit's observations and
//! derives an approximate t-statistic for the slope:
//!
//! ```text
//! Sx   = n(n+1)(n-1)/12          variance of the ranks 1..n
//! adj  = sqrt(n/(n-2))
//! tval = slope / (rmse·adj) · sqrt(Sx)
//! ```
//!
//! `rmse` is the population RMSE of the residuals and `Sx` treats the years
//! as evenly spaced ranks. Both are kept as-is so results stay comparable
//! with previously published trend maps.

mod regression;

pub use regression::{bisquare, ols, robust, LineFit, BISQUARE_TUNING};

use ndarray::Array1;
use serde::Serialize;
use tracing::debug;
use trendsat_core::series::{check_sorted, group_by_unit, single_unit};
use trendsat_core::{Algorithm, Error, Observation, Result, UnitId};

use crate::maybe_rayon::*;

/// Parameters for trend estimation
#[derive(Debug, Clone)]
pub struct TrendParams {
    /// Use bisquare IRLS instead of ordinary least squares
    pub robust: bool,
    /// Maximum IRLS iterations (robust mode only)
    pub max_iterations: usize,
    /// Relative coefficient change that ends IRLS
    pub tolerance: f64,
}

impl Default for TrendParams {
    fn default() -> Self {
        Self {
            robust: false,
            max_iterations: 50,
            tolerance: 1e-10,
        }
    }
}

impl TrendParams {
    pub fn robust() -> Self {
        Self {
            robust: true,
            ..Default::default()
        }
    }
}

/// Trend of one unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendResult {
    pub unit_id: UnitId,
    pub offset: f64,
    pub slope: f64,
    pub rmse: f64,
    /// `None` when the statistic is undefined (`n <= 2`, or no slope).
    /// Finite whenever present.
    pub tval: Option<f64>,
    /// Valid observations used in the fit
    pub n: usize,
}

impl TrendResult {
    /// `|tval| >= critical`; false when `tval` is undefined
    pub fn is_significant(&self, critical: f64) -> bool {
        self.tval.is_some_and(|t| t.abs() >= critical)
    }
}

/// The approximate t-statistic, `None` unless `n > 2` and it is a finite
/// number.
///
/// `rmse` is floored at `f64::EPSILON · y_scale`, where `y_scale` is the
/// magnitude of the observed values, so a perfect fit gives a very large but
/// finite value carrying the sign of the slope.
pub fn approximate_tval(slope: f64, rmse: f64, n: usize, y_scale: f64) -> Option<f64> {
    if n <= 2 {
        return None;
    }
    let rmse = rmse.max(f64::EPSILON * y_scale.abs().max(1.0));
    let n = n as f64;
    let sx = n * (n + 1.0) * (n - 1.0) / 12.0;
    let adj = (n / (n - 2.0)).sqrt();
    let tval = slope / (rmse * adj) * sx.sqrt();
    tval.is_finite().then_some(tval)
}

/// Fit a linear trend of value against year.
///
/// `series` must hold one unit's observations with non-decreasing
/// timestamps; it is never re-sorted. Invalid observations and non-finite
/// values are skipped. Observations sharing a year enter the regression
/// separately.
///
/// # Errors
/// - Empty series, or no valid observation
/// - Observations from more than one unit
/// - Timestamps out of order
pub fn fit(series: &[Observation], robust: bool) -> Result<TrendResult> {
    let params = TrendParams {
        robust,
        ..Default::default()
    };
    fit_with(series, &params)
}

/// [`fit`] with explicit parameters
pub fn fit_with(series: &[Observation], params: &TrendParams) -> Result<TrendResult> {
    let unit_id = single_unit(series)?;
    check_sorted(series)?;

    let (years, values): (Vec<f64>, Vec<f64>) = series
        .iter()
        .filter(|o| o.is_usable())
        .map(|o| (o.year() as f64, o.value))
        .unzip();
    let n = values.len();
    if n == 0 {
        return Err(Error::EmptySeries { unit: unit_id });
    }

    let x = Array1::from(years);
    let y = Array1::from(values);
    let line = if params.robust {
        robust(x.view(), y.view(), params.max_iterations, params.tolerance)
    } else {
        ols(x.view(), y.view())
    };

    let Some(line) = line else {
        debug!(unit = %unit_id, n, "fewer than two distinct years, trend undefined");
        return Ok(TrendResult {
            unit_id,
            offset: f64::NAN,
            slope: f64::NAN,
            rmse: f64::NAN,
            tval: None,
            n,
        });
    };

    let rmse = line.rmse();
    let y_scale = y.iter().fold(0.0_f64, |m, v| m.max(v.abs())) + 1.0;
    let tval = approximate_tval(line.slope, rmse, n, y_scale);
    if tval.is_none() {
        debug!(unit = %unit_id, n, "t-statistic undefined");
    }

    Ok(TrendResult {
        unit_id,
        offset: line.offset,
        slope: line.slope,
        rmse,
        tval,
        n,
    })
}

/// Fit every unit of a mixed batch independently.
///
/// Units are fitted in parallel and returned in ascending unit order; a
/// failing unit does not affect the others.
pub fn fit_by_unit(
    observations: &[Observation],
    params: &TrendParams,
) -> Vec<(UnitId, Result<TrendResult>)> {
    group_by_unit(observations.iter().cloned())
        .into_par_iter()
        .map(|unit| {
            let result = fit_with(&unit.observations, params);
            (unit.unit_id, result)
        })
        .collect()
}

/// Linear trend estimator
#[derive(Debug, Clone, Default)]
pub struct TrendEstimator;

impl Algorithm for TrendEstimator {
    type Input = Vec<Observation>;
    type Output = TrendResult;
    type Params = TrendParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Linear Trend"
    }

    fn description(&self) -> &'static str {
        "OLS or bisquare-robust linear trend against year with approximate t-statistic"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        fit_with(&input, &params)
    }
}
