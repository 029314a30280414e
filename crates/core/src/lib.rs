//! # trendsat Core
//!
//! Core types, calendar utilities and I/O for the trendsat time-series library.
//!
//! This crate provides:
//! - `Observation` / `UnitSeries`: per-unit time-stamped observations
//! - `calendar`: leap years, month lengths, overlap days, periods,
//!   day-number buckets and season labels
//! - `series::qa`: QA bit decoding applied upstream of the algorithms
//! - Algorithm traits for consistent API
//! - CSV I/O for observations and result records

pub mod calendar;
pub mod error;
pub mod io;
pub mod series;

pub use calendar::{Period, PeriodKind};
pub use error::{Error, Result};
pub use series::{Observation, UnitId, UnitSeries};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::calendar::{Period, PeriodKind};
    pub use crate::error::{Error, Result};
    pub use crate::series::{Observation, UnitId, UnitSeries};
    pub use crate::Algorithm;
}

/// Core trait for all algorithms in trendsat.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(&self, input: Self::Input, params: Self::Params) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(&self, input: Self::Input) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
