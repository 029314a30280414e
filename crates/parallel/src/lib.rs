//! # trendsat Parallel
//!
//! Per-unit processing strategies for trendsat.
//!
//! This crate provides:
//! - Sequential or rayon-parallel fan-out over independent units
//! - A batch driver that either aborts on the first failing unit or skips
//!   units with invalid data and reports them

pub mod batch;
pub mod strategy;

pub use batch::{run_per_unit, BatchReport, FailurePolicy};
pub use strategy::{num_cpus, set_num_threads, ParallelStrategy, ProcessingMode};
