//! Processing modes for per-unit fan-out

use tracing::warn;
use trendsat_core::{Error, Result};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Processing mode for per-unit batches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingMode {
    /// Single-threaded processing
    Sequential,
    /// Parallel processing using all available cores
    #[default]
    Parallel,
    /// Parallel with specified number of threads
    ParallelWith(usize),
}

impl ProcessingMode {
    /// Mode for a `--threads` style setting: 0 means all cores, 1 means
    /// sequential.
    pub fn from_threads(threads: usize) -> Self {
        match threads {
            0 => ProcessingMode::Parallel,
            1 => ProcessingMode::Sequential,
            n => ProcessingMode::ParallelWith(n),
        }
    }
}

impl std::str::FromStr for ProcessingMode {
    type Err = Error;

    /// `sequential`, `parallel`, or a thread count
    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "sequential" | "seq" => Ok(ProcessingMode::Sequential),
            "parallel" | "par" => Ok(ProcessingMode::Parallel),
            other => other
                .parse::<usize>()
                .map(ProcessingMode::from_threads)
                .map_err(|_| Error::InvalidParameter {
                    name: "mode",
                    value: s.to_string(),
                    reason: "expected sequential, parallel or a thread count".into(),
                }),
        }
    }
}

/// Strategy for mapping a function over independent items
pub trait ParallelStrategy {
    /// Map `f` over `items`, keeping input order in the output
    fn par_map<I, T, F>(&self, items: &[I], f: F) -> Vec<T>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Sync + Send;
}

impl ParallelStrategy for ProcessingMode {
    #[cfg(feature = "parallel")]
    fn par_map<I, T, F>(&self, items: &[I], f: F) -> Vec<T>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Sync + Send,
    {
        match self {
            ProcessingMode::Sequential => items.iter().map(f).collect(),
            ProcessingMode::Parallel => items.par_iter().map(f).collect(),
            ProcessingMode::ParallelWith(threads) => {
                match rayon::ThreadPoolBuilder::new().num_threads(*threads).build() {
                    Ok(pool) => pool.install(|| items.par_iter().map(f).collect()),
                    Err(e) => {
                        warn!("Failed to build {}-thread pool ({}), using global pool", threads, e);
                        items.par_iter().map(f).collect()
                    }
                }
            }
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn par_map<I, T, F>(&self, items: &[I], f: F) -> Vec<T>
    where
        I: Sync,
        T: Send,
        F: Fn(&I) -> T + Sync + Send,
    {
        if *self != ProcessingMode::Sequential {
            warn!("Built without the parallel feature, running {:?} sequentially", self);
        }
        items.iter().map(f).collect()
    }
}

/// Get the number of available CPU cores
#[cfg(feature = "parallel")]
pub fn num_cpus() -> usize {
    rayon::current_num_threads()
}

/// Get the number of available CPU cores
#[cfg(not(feature = "parallel"))]
pub fn num_cpus() -> usize {
    1
}

/// Configure the global thread pool. Returns false if it was already
/// initialized.
#[cfg(feature = "parallel")]
pub fn set_num_threads(threads: usize) -> bool {
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .is_ok()
}

#[cfg(not(feature = "parallel"))]
pub fn set_num_threads(_threads: usize) -> bool {
    false
}
