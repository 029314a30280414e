//! Error types for trendsat

use chrono::NaiveDate;
use thiserror::Error;

use crate::series::UnitId;

/// Main error type for trendsat operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Empty series for unit {unit}")]
    EmptySeries { unit: UnitId },

    #[error("Malformed coverage interval for unit {unit}: end {end} is before start {start}")]
    MalformedInterval {
        unit: UnitId,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("Series for unit {unit} is not sorted: {date} at position {index} precedes {previous}")]
    UnsortedSeries {
        unit: UnitId,
        index: usize,
        date: NaiveDate,
        previous: NaiveDate,
    },

    #[error("Series mixes units {expected} and {found}")]
    MixedUnits { expected: UnitId, found: UnitId },

    #[error("Coverage of {coverage} days exceeds the {length}-day period starting {period_start} for unit {unit}")]
    CoverageOverflow {
        unit: UnitId,
        period_start: NaiveDate,
        coverage: f64,
        length: u32,
    },

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Algorithm error: {0}")]
    Algorithm(String),
}

impl Error {
    /// True for errors caused by a unit's own data rather than by the
    /// environment or by parameters. A batch driver may skip such units.
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            Error::EmptySeries { .. }
                | Error::MalformedInterval { .. }
                | Error::UnsortedSeries { .. }
                | Error::MixedUnits { .. }
                | Error::CoverageOverflow { .. }
        )
    }

    /// Unit the error refers to, when there is one
    pub fn unit(&self) -> Option<&UnitId> {
        match self {
            Error::EmptySeries { unit }
            | Error::MalformedInterval { unit, .. }
            | Error::UnsortedSeries { unit, .. }
            | Error::CoverageOverflow { unit, .. } => Some(unit),
            Error::MixedUnits { found, .. } => Some(found),
            _ => None,
        }
    }
}

/// Result type alias for trendsat operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_input_classification() {
        let unit = UnitId::from("px-1");
        let err = Error::EmptySeries { unit: unit.clone() };
        assert!(err.is_invalid_input());
        assert_eq!(err.unit(), Some(&unit));

        let err = Error::InvalidParameter {
            name: "scale_factor",
            value: "NaN".into(),
            reason: "must be finite".into(),
        };
        assert!(!err.is_invalid_input());
        assert!(err.unit().is_none());
    }

    #[test]
    fn test_display_mentions_unit() {
        let err = Error::MalformedInterval {
            unit: UnitId::from("station-7"),
            start: NaiveDate::from_ymd_opt(2019, 5, 10).unwrap(),
            end: NaiveDate::from_ymd_opt(2019, 5, 1).unwrap(),
        };
        let msg = err.to_string();
        assert!(msg.contains("station-7"), "{}", msg);
        assert!(msg.contains("2019-05-01"), "{}", msg);
    }
}
