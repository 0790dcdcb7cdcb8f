use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Storage-layer errors with structured classification.
///
/// Duplicate-key failures are surfaced as a dedicated variant so callers can
/// branch on them without inspecting error text. The ingestion engine relies
/// on this to absorb already-known posts silently.
#[derive(Debug, Error)]
pub enum StorageError {
    /// A uniqueness constraint rejected the write (duplicate user name,
    /// feed URL, follow pair, or post URL).
    #[error("unique constraint violated")]
    UniqueViolation,

    /// The referenced row does not exist
    #[error("no matching row found")]
    NotFound,

    /// Schema migration failed
    #[error("database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("database error: {0}")]
    Database(sqlx::Error),
}

impl StorageError {
    /// Classify a sqlx error, mapping uniqueness violations to the
    /// structured variant.
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            if db_err.is_unique_violation() {
                return StorageError::UniqueViolation;
            }
        }
        StorageError::Database(err)
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A registered user. Names are unique; rows are immutable after creation
/// apart from `updated_at`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub created_at: i64,
    pub updated_at: i64,
}

/// A subscribed remote content source, owned by the user who added it.
///
/// `last_fetched_at` is NULL until the first scrape; the scheduler selects
/// the feed with the minimal value (NULLs first) as its next unit of work.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    pub user_id: i64,
    pub last_fetched_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Feed listing row with the creator's name joined in
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FeedWithCreator {
    pub name: String,
    pub url: String,
    pub creator: String,
}

/// Subscription link between a user and a feed, with the joined names the
/// command surface prints.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FollowSummary {
    pub id: i64,
    pub user_name: String,
    pub feed_name: String,
}

/// One ingested item, deduplicated globally by URL.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<i64>,
    pub created_at: i64,
    pub updated_at: i64,
}

/// Insert payload for a post, produced by the ingestion engine from one
/// parsed feed item.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub description: Option<String>,
    pub published_at: Option<i64>,
}
