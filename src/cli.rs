//! Command-line surface: a closed set of subcommands resolved at parse time.
//!
//! Unknown verbs and malformed arguments die inside clap before any handler
//! runs; the aggregator period is validated here too, so a bad duration is a
//! startup error, never a runtime one.
use clap::{Parser, Subcommand};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "creel", about = "Personal RSS aggregator", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Log in as an existing user
    Login { name: String },
    /// Create a user and log in as them
    Register { name: String },
    /// Delete all users, feeds, follows, and posts
    Reset,
    /// List registered users
    Users,
    /// Run the feed aggregation loop until interrupted
    Agg {
        /// Time between fetches, e.g. "30s", "5m", "1h"
        #[arg(value_parser = parse_period)]
        period: Duration,
    },
    /// Add a feed and follow it (requires login)
    #[command(name = "addfeed")]
    AddFeed { name: String, url: String },
    /// List all feeds and who added them
    Feeds,
    /// Follow an existing feed by URL (requires login)
    Follow { url: String },
    /// List the feeds you follow (requires login)
    Following,
    /// Stop following a feed by URL (requires login)
    Unfollow { url: String },
    /// Show recent posts from feeds you follow (requires login)
    Browse {
        /// Maximum number of posts to show
        limit: Option<i64>,
    },
}

/// Parse a human-readable period like "30s", "5m", or "1h".
///
/// Zero and unitless values are rejected; the scheduler needs a positive
/// interval before it starts.
pub fn parse_period(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    let (value, multiplier) = if let Some(digits) = input.strip_suffix('s') {
        (digits, 1)
    } else if let Some(digits) = input.strip_suffix('m') {
        (digits, 60)
    } else if let Some(digits) = input.strip_suffix('h') {
        (digits, 3600)
    } else {
        return Err(format!("`{input}` needs a unit suffix: s, m, or h"));
    };

    let count: u64 = value
        .parse()
        .map_err(|_| format!("`{input}` is not a valid period"))?;
    if count == 0 {
        return Err("period must be positive".to_string());
    }

    let secs = count
        .checked_mul(multiplier)
        .ok_or_else(|| format!("`{input}` is too large"))?;
    Ok(Duration::from_secs(secs))
}
