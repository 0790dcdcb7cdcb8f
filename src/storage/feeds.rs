use super::schema::Database;
use super::types::{Feed, FeedWithCreator, StorageError};

const FEED_COLUMNS: &str = "id, name, url, user_id, last_fetched_at, created_at, updated_at";

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Create a feed owned by `user_id`. URLs are unique across all users.
    pub async fn create_feed(
        &self,
        name: &str,
        url: &str,
        user_id: i64,
    ) -> Result<Feed, StorageError> {
        let now = Self::now();
        let result = sqlx::query(
            r#"
            INSERT INTO feeds (name, url, user_id, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
        "#,
        )
        .bind(name)
        .bind(url)
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        Ok(Feed {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            url: url.to_string(),
            user_id,
            last_fetched_at: None,
            created_at: now,
            updated_at: now,
        })
    }

    /// List all feeds with their creator's name, for the `feeds` command
    pub async fn list_feeds_with_creators(&self) -> Result<Vec<FeedWithCreator>, StorageError> {
        sqlx::query_as::<_, FeedWithCreator>(
            r#"
            SELECT f.name AS name, f.url AS url, u.name AS creator
            FROM feeds f
            JOIN users u ON u.id = f.user_id
            ORDER BY f.created_at, f.id
        "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }

    /// Look up a feed by its URL
    pub async fn get_feed_by_url(&self, url: &str) -> Result<Option<Feed>, StorageError> {
        sqlx::query_as::<_, Feed>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE url = ?"
        ))
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }

    /// Select the next feed the scheduler should fetch: minimal
    /// `last_fetched_at` with NULLs (never fetched) taking priority, `id` as
    /// a tiebreaker so the rotation is deterministic.
    pub async fn next_feed_to_fetch(&self) -> Result<Option<Feed>, StorageError> {
        sqlx::query_as::<_, Feed>(&format!(
            r#"
            SELECT {FEED_COLUMNS}
            FROM feeds
            ORDER BY last_fetched_at ASC NULLS FIRST, id ASC
            LIMIT 1
        "#
        ))
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }

    /// Stamp a feed as fetched at `now`, rotating it to the back of the
    /// scheduler's queue. Returns the updated row.
    ///
    /// The ingestion engine calls this before the network fetch, so a feed
    /// that fails to download is still rotated and cannot starve the others.
    pub async fn mark_feed_fetched(&self, feed_id: i64, now: i64) -> Result<Feed, StorageError> {
        let result = sqlx::query(
            "UPDATE feeds SET last_fetched_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(now)
        .bind(now)
        .bind(feed_id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        let feed = sqlx::query_as::<_, Feed>(&format!(
            "SELECT {FEED_COLUMNS} FROM feeds WHERE id = ?"
        ))
        .bind(feed_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        feed.ok_or(StorageError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::StorageError;
    use super::Database;

    async fn db_with_user() -> (Database, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("alice").await.unwrap();
        (db, user.id)
    }

    #[tokio::test]
    async fn duplicate_feed_url_is_unique_violation() {
        let (db, user_id) = db_with_user().await;
        db.create_feed("One", "https://example.com/rss", user_id)
            .await
            .unwrap();
        let err = db
            .create_feed("Two", "https://example.com/rss", user_id)
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UniqueViolation));
    }

    #[tokio::test]
    async fn never_fetched_feeds_selected_first() {
        let (db, user_id) = db_with_user().await;
        let a = db
            .create_feed("A", "https://a.example/rss", user_id)
            .await
            .unwrap();
        let b = db
            .create_feed("B", "https://b.example/rss", user_id)
            .await
            .unwrap();

        // Stamp A; B has never been fetched and must now win selection
        db.mark_feed_fetched(a.id, 1_700_000_000).await.unwrap();

        let next = db.next_feed_to_fetch().await.unwrap().unwrap();
        assert_eq!(next.id, b.id);
    }

    #[tokio::test]
    async fn oldest_fetched_feed_selected_next() {
        let (db, user_id) = db_with_user().await;
        let a = db
            .create_feed("A", "https://a.example/rss", user_id)
            .await
            .unwrap();
        let b = db
            .create_feed("B", "https://b.example/rss", user_id)
            .await
            .unwrap();

        db.mark_feed_fetched(a.id, 100).await.unwrap();
        db.mark_feed_fetched(b.id, 200).await.unwrap();

        let next = db.next_feed_to_fetch().await.unwrap().unwrap();
        assert_eq!(next.id, a.id);
    }

    #[tokio::test]
    async fn selection_rotates_after_stamping() {
        let (db, user_id) = db_with_user().await;
        let a = db
            .create_feed("A", "https://a.example/rss", user_id)
            .await
            .unwrap();
        let b = db
            .create_feed("B", "https://b.example/rss", user_id)
            .await
            .unwrap();

        // Selecting and stamping each feed in turn walks the whole set
        let first = db.next_feed_to_fetch().await.unwrap().unwrap();
        db.mark_feed_fetched(first.id, 10).await.unwrap();
        let second = db.next_feed_to_fetch().await.unwrap().unwrap();
        db.mark_feed_fetched(second.id, 20).await.unwrap();

        assert_eq!(first.id, a.id);
        assert_eq!(second.id, b.id);

        // After a full pass the oldest stamp is minimal again
        let third = db.next_feed_to_fetch().await.unwrap().unwrap();
        assert_eq!(third.id, a.id);
    }

    #[tokio::test]
    async fn no_feeds_yields_none() {
        let db = Database::open(":memory:").await.unwrap();
        assert!(db.next_feed_to_fetch().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn mark_fetched_returns_updated_row() {
        let (db, user_id) = db_with_user().await;
        let feed = db
            .create_feed("A", "https://a.example/rss", user_id)
            .await
            .unwrap();
        assert!(feed.last_fetched_at.is_none());

        let stamped = db.mark_feed_fetched(feed.id, 1234).await.unwrap();
        assert_eq!(stamped.last_fetched_at, Some(1234));
        assert_eq!(stamped.updated_at, 1234);
    }

    #[tokio::test]
    async fn mark_fetched_unknown_feed_is_not_found() {
        let db = Database::open(":memory:").await.unwrap();
        let err = db.mark_feed_fetched(42, 0).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }
}
