//! Feed retrieval: HTTP fetch plus RSS decoding.
//!
//! - [`parser`] - serde decoding of the fixed `rss > channel > item*` schema,
//!   with HTML-entity resolution of free-text fields
//! - [`fetcher`] - one GET per call with the shared client's deadline; retry
//!   policy belongs to the caller

mod fetcher;
mod parser;

pub use fetcher::{fetch_feed, FetchError};
pub use parser::{parse_channel, Channel, Item};
