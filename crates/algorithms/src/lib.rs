//! # trendsat Algorithms
//!
//! Temporal algorithms over per-unit observation series.
//!
//! ## Available Algorithm Categories
//!
//! - **trend**: OLS and bisquare-robust linear trend against year, with an
//!   approximate t-statistic
//! - **aggregate**: overlap-weighted month/year aggregation of interval
//!   observations, and calendar-key grouping with simple reducers
//! - **smoothing**: the trait external smoothers implement

mod maybe_rayon;

pub mod aggregate;
pub mod smoothing;
pub mod trend;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::aggregate::{
        aggregate, aggregate_with, reduce_by, AggregateParams, AggregateRecord, GroupKey,
        GroupValue, PeriodAggregator, Reducer,
    };
    pub use crate::smoothing::{smooth_unit, SmoothedSeries, Smoother};
    pub use crate::trend::{fit, fit_with, TrendEstimator, TrendParams, TrendResult};
    pub use trendsat_core::prelude::*;
}
