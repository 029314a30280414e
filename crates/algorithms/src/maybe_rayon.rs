//! Rayon or sequential fan-out over units.
//!
//! With the `parallel` feature this re-exports rayon's prelude, so
//! `units.into_par_iter()` spreads independent units across the thread pool.
//! Without it (single-threaded or WASM targets) the same call resolves to a
//! plain `into_iter()`, keeping per-unit code identical in both builds.
#[cfg(feature = "parallel")]
pub use rayon::prelude::*;

#[cfg(not(feature = "parallel"))]
mod sequential {
    /// Sequential stand-in for `rayon::prelude::IntoParallelIterator`.
    pub trait IntoParallelIterator {
        type Iter;
        type Item;
        fn into_par_iter(self) -> Self::Iter;
    }

    impl<I: IntoIterator> IntoParallelIterator for I {
        type Iter = I::IntoIter;
        type Item = I::Item;
        fn into_par_iter(self) -> Self::Iter {
            self.into_iter()
        }
    }
}

#[cfg(not(feature = "parallel"))]
pub use sequential::*;
