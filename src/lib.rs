//! AggBench library: dataset loading, grouped aggregation, the timing
//! harness and report rendering used by the `aggbench` binary.

pub mod analysis;
pub mod bench;
pub mod cli;
pub mod config;
pub mod error;
pub mod loader;
pub mod models;
pub mod report;
