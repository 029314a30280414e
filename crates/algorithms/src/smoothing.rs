//! Smoother seam
//!
//! Gap-filling smoothers (Whittaker, Savitzky-Golay, ...) live outside this
//! crate. They plug in through [`Smoother`], which sees one unit's values and
//! weights as plain arrays.

use ndarray::{Array1, Array2, ArrayView1};
use trendsat_core::series::{check_sorted, group_by_unit, single_unit};
use trendsat_core::{Error, Observation, Result, UnitId};

use crate::maybe_rayon::*;

/// Output of a smoother
#[derive(Debug, Clone)]
pub struct SmoothedSeries {
    /// Final smoothed values, one per input value
    pub values: Array1<f64>,
    /// Weights per iteration, one column per iteration
    pub weights: Array2<f64>,
}

/// A smoothing algorithm applied to one unit at a time
pub trait Smoother: Sync {
    /// Smooth `values` given initial `weights` (0 for missing values).
    fn smooth(&self, values: ArrayView1<f64>, weights: ArrayView1<f64>) -> Result<SmoothedSeries>;
}

/// Replace a unit's values with the smoother's final values.
///
/// Invalid or non-finite observations enter with weight 0 and value 0. The
/// returned observations are valid wherever the smoother produced a finite
/// value.
pub fn smooth_unit(series: &[Observation], smoother: &dyn Smoother) -> Result<Vec<Observation>> {
    single_unit(series)?;
    check_sorted(series)?;

    let values: Array1<f64> = series
        .iter()
        .map(|o| if o.is_usable() { o.value } else { 0.0 })
        .collect();
    let weights: Array1<f64> = series
        .iter()
        .map(|o| if o.is_usable() { 1.0 } else { 0.0 })
        .collect();

    let smoothed = smoother.smooth(values.view(), weights.view())?;
    if smoothed.values.len() != series.len() {
        return Err(Error::Algorithm(format!(
            "smoother returned {} values for {} observations",
            smoothed.values.len(),
            series.len()
        )));
    }

    Ok(series
        .iter()
        .zip(smoothed.values.iter())
        .map(|(obs, &v)| Observation {
            value: v,
            valid: v.is_finite(),
            ..obs.clone()
        })
        .collect())
}

/// [`smooth_unit`] for every unit of a batch
pub fn smooth_by_unit(
    observations: &[Observation],
    smoother: &dyn Smoother,
) -> Vec<(UnitId, Result<Vec<Observation>>)> {
    group_by_unit(observations.iter().cloned())
        .into_par_iter()
        .map(|unit| {
            let result = smooth_unit(&unit.observations, smoother);
            (unit.unit_id, result)
        })
        .collect()
}
