//! Analysis modules.
//!
//! Grouping and summary statistics over loaded datasets.

pub mod aggregator;

pub use aggregator::*;
