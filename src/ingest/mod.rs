//! The ingestion pipeline: one feed per tick, fetched and stored.
//!
//! [`engine`] owns a single cycle (select stalest feed, stamp, fetch, store
//! items with URL dedup); [`scheduler`] repeats cycles on a fixed interval
//! until shut down.

mod engine;
mod scheduler;

pub use engine::{run_cycle, CycleError, CycleOutcome};
pub use scheduler::run;
