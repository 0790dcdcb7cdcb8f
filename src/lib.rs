//! creel — a personal RSS aggregator.
//!
//! Users register, follow feeds, and a background loop fetches one feed per
//! tick (stalest first), parses its items, and stores new posts deduplicated
//! by URL. The crate is a library plus a thin CLI binary so the integration
//! tests can drive the same code paths as the executable.

pub mod cli;
pub mod commands;
pub mod config;
pub mod feed;
pub mod ingest;
pub mod session;
pub mod storage;
