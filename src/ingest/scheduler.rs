use std::future::Future;
use std::time::Duration;

use crate::ingest::engine::{run_cycle, CycleError};
use crate::storage::Database;

/// Drive the ingestion loop until `shutdown` resolves.
///
/// A fixed-interval ticker fires one ingestion cycle per tick; the first
/// tick fires immediately. The loop blocks on each cycle before re-arming,
/// so concurrent cycles are impossible by construction. Cycle failures are
/// logged and the loop keeps ticking; only the shutdown future ends it.
pub async fn run(
    db: &Database,
    client: &reqwest::Client,
    period: Duration,
    shutdown: impl Future<Output = ()>,
) {
    println!("Collecting feeds every {:?}", period);

    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("shutdown requested, stopping aggregator");
                break;
            }
            _ = ticker.tick() => {
                match run_cycle(db, client).await {
                    Ok(outcome) => {
                        if outcome.new_posts == 0 {
                            println!("No new posts from `{}` ({})", outcome.feed.name, outcome.feed.url);
                        } else {
                            println!(
                                "Found {} new post(s) from `{}` ({})",
                                outcome.new_posts, outcome.feed.name, outcome.feed.url
                            );
                        }
                    }
                    Err(CycleError::NoFeeds) => {
                        tracing::debug!("no feeds to fetch, waiting for next tick");
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "ingestion cycle failed");
                    }
                }
            }
        }
    }
}
