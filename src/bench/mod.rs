//! Benchmark harness.
//!
//! `suite` measures arbitrary closures; `subjects` registers the four
//! aggregation subjects as cases.

pub mod subjects;
pub mod suite;

pub use subjects::benchmark_subjects;
pub use suite::*;
