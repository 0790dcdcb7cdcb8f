use chrono::DateTime;
use thiserror::Error;

use crate::feed::{fetch_feed, FetchError, Item};
use crate::storage::{Database, Feed, NewPost, StorageError};

/// Errors that abort one ingestion cycle. None of them stop the scheduler.
#[derive(Debug, Error)]
pub enum CycleError {
    /// The store has no feeds to select
    #[error("no feeds available to fetch")]
    NoFeeds,
    /// Fetch or parse failed; the feed stays stamped and rotates back
    #[error(transparent)]
    Fetch(#[from] FetchError),
    /// Selection or stamping failed
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Result of one completed ingestion cycle.
///
/// `new_posts` counts only rows actually inserted; items the store already
/// knew are not included. Zero is a normal outcome.
#[derive(Debug)]
pub struct CycleOutcome {
    pub feed: Feed,
    pub new_posts: usize,
}

/// Run one ingestion cycle: select the stalest feed, stamp it, fetch it,
/// store its items.
///
/// The feed is stamped as fetched *before* the network call. A crash or
/// fetch failure after that point leaves the feed at the back of the
/// rotation instead of wedging the scheduler on one broken feed.
pub async fn run_cycle(
    db: &Database,
    client: &reqwest::Client,
) -> Result<CycleOutcome, CycleError> {
    let feed = db.next_feed_to_fetch().await?.ok_or(CycleError::NoFeeds)?;
    let feed = db.mark_feed_fetched(feed.id, Database::now()).await?;

    tracing::info!(feed = %feed.name, url = %feed.url, "fetching feed");
    let channel = fetch_feed(client, &feed.url).await?;

    let new_posts = store_items(db, feed.id, channel.items).await;

    Ok(CycleOutcome { feed, new_posts })
}

/// Store one batch of parsed items for a feed, returning how many posts were
/// newly created.
///
/// Per-item failures never abort the batch: an already-known URL is skipped
/// silently, anything else is logged with the offending title and skipped.
pub(crate) async fn store_items(db: &Database, feed_id: i64, items: Vec<Item>) -> usize {
    let mut new_posts = 0;

    for item in items {
        // A date that does not parse is not an error; the post is simply
        // stored without a published timestamp.
        let published_at = DateTime::parse_from_rfc2822(&item.pub_date)
            .ok()
            .map(|dt| dt.timestamp());

        let post = NewPost {
            feed_id,
            title: item.title,
            url: item.link,
            description: if item.description.is_empty() {
                None
            } else {
                Some(item.description)
            },
            published_at,
        };

        match db.create_post(&post).await {
            Ok(created) => {
                new_posts += 1;
                tracing::debug!(title = %created.title, url = %created.url, "stored post");
            }
            Err(StorageError::UniqueViolation) => {
                tracing::debug!(url = %post.url, "post already known, skipping");
            }
            Err(e) => {
                tracing::warn!(title = %post.title, error = %e, "failed to store post");
            }
        }
    }

    new_posts
}
