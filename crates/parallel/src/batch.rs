//! Batch driver running a per-unit function with a failure policy

use tracing::{debug, warn};
use trendsat_core::{Error, Result, UnitId, UnitSeries};

use crate::strategy::{ParallelStrategy, ProcessingMode};

/// What to do when a unit fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Return the first error in unit order
    #[default]
    Abort,
    /// Record units failing on their own data and keep going. Other errors
    /// (I/O, parameters) still abort.
    Skip,
}

/// Outcome of a batch
#[derive(Debug)]
pub struct BatchReport<T> {
    /// Successful units, in input order
    pub completed: Vec<(UnitId, T)>,
    /// Skipped units with the reason, in input order
    pub failed: Vec<(UnitId, Error)>,
}

impl<T> BatchReport<T> {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }

    /// Successful outputs without their unit ids
    pub fn into_outputs(self) -> Vec<T> {
        self.completed.into_iter().map(|(_, t)| t).collect()
    }
}

/// Run `f` on every unit under `mode`.
///
/// Units are independent; `f` sees one unit at a time and results keep the
/// order of `units`.
pub fn run_per_unit<T, F>(
    mode: ProcessingMode,
    units: &[UnitSeries],
    policy: FailurePolicy,
    f: F,
) -> Result<BatchReport<T>>
where
    T: Send,
    F: Fn(&UnitSeries) -> Result<T> + Sync + Send,
{
    debug!(units = units.len(), ?mode, ?policy, "running batch");
    let results = mode.par_map(units, |unit| f(unit));

    let mut report = BatchReport {
        completed: Vec::with_capacity(results.len()),
        failed: Vec::new(),
    };
    for (unit, result) in units.iter().zip(results) {
        match result {
            Ok(value) => report.completed.push((unit.unit_id.clone(), value)),
            Err(e) if policy == FailurePolicy::Skip && e.is_invalid_input() => {
                warn!(unit = %unit.unit_id, "skipping unit: {}", e);
                report.failed.push((unit.unit_id.clone(), e));
            }
            Err(e) => return Err(e),
        }
    }

    if !report.failed.is_empty() {
        warn!(
            skipped = report.failed.len(),
            completed = report.completed.len(),
            "batch finished with skipped units"
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use trendsat_core::Observation;

    fn units() -> Vec<UnitSeries> {
        let d = |day| NaiveDate::from_ymd_opt(2019, 1, day).unwrap();
        vec![
            UnitSeries::new("a", vec![Observation::new("a", d(1), 1.0)]),
            UnitSeries::new("b", vec![]),
            UnitSeries::new("c", vec![Observation::new("c", d(1), 3.0), Observation::new("c", d(2), 4.0)]),
        ]
    }

    fn total(unit: &UnitSeries) -> Result<f64> {
        if unit.is_empty() {
            return Err(Error::EmptySeries { unit: unit.unit_id.clone() });
        }
        Ok(unit.observations.iter().map(|o| o.value).sum())
    }

    #[test]
    fn test_abort_returns_first_error() {
        let err = run_per_unit(ProcessingMode::Parallel, &units(), FailurePolicy::Abort, total)
            .unwrap_err();
        assert!(matches!(err, Error::EmptySeries { ref unit } if unit.as_str() == "b"));
    }

    #[test]
    fn test_skip_keeps_others() {
        for mode in [ProcessingMode::Sequential, ProcessingMode::ParallelWith(2)] {
            let report = run_per_unit(mode, &units(), FailurePolicy::Skip, total).unwrap();
            assert!(!report.is_complete());
            assert_eq!(report.failed.len(), 1);
            assert_eq!(report.failed[0].0.as_str(), "b");
            let outputs: Vec<(String, f64)> = report
                .completed
                .iter()
                .map(|(u, v)| (u.to_string(), *v))
                .collect();
            assert_eq!(outputs, vec![("a".to_string(), 1.0), ("c".to_string(), 7.0)]);
        }
    }

    #[test]
    fn test_skip_does_not_hide_parameter_errors() {
        let result = run_per_unit(ProcessingMode::Sequential, &units(), FailurePolicy::Skip, |_| {
            Err::<(), _>(Error::InvalidParameter {
                name: "x",
                value: "1".into(),
                reason: "test".into(),
            })
        });
        assert!(matches!(result, Err(Error::InvalidParameter { .. })));
    }

    #[test]
    fn test_into_outputs() {
        let report = run_per_unit(ProcessingMode::Sequential, &units()[..1], FailurePolicy::Abort, total)
            .unwrap();
        assert!(report.is_complete());
        assert_eq!(report.into_outputs(), vec![1.0]);
    }
}
