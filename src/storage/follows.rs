use super::schema::Database;
use super::types::{FollowSummary, StorageError};

impl Database {
    // ========================================================================
    // Follow Operations
    // ========================================================================

    /// Subscribe a user to a feed. At most one follow per (user, feed) pair;
    /// a second attempt is a `UniqueViolation`.
    pub async fn create_follow(
        &self,
        user_id: i64,
        feed_id: i64,
    ) -> Result<FollowSummary, StorageError> {
        let now = Self::now();
        let result = sqlx::query(
            r#"
            INSERT INTO feed_follows (user_id, feed_id, created_at, updated_at)
            VALUES (?, ?, ?, ?)
        "#,
        )
        .bind(user_id)
        .bind(feed_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        let summary = sqlx::query_as::<_, FollowSummary>(
            r#"
            SELECT ff.id AS id, u.name AS user_name, f.name AS feed_name
            FROM feed_follows ff
            JOIN users u ON u.id = ff.user_id
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.id = ?
        "#,
        )
        .bind(result.last_insert_rowid())
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        summary.ok_or(StorageError::NotFound)
    }

    /// List the feeds a user follows, oldest subscription first
    pub async fn follows_for_user(&self, user_id: i64) -> Result<Vec<FollowSummary>, StorageError> {
        sqlx::query_as::<_, FollowSummary>(
            r#"
            SELECT ff.id AS id, u.name AS user_name, f.name AS feed_name
            FROM feed_follows ff
            JOIN users u ON u.id = ff.user_id
            JOIN feeds f ON f.id = ff.feed_id
            WHERE ff.user_id = ?
            ORDER BY ff.created_at, ff.id
        "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }

    /// Remove a user's subscription to the feed at `url`.
    ///
    /// # Errors
    ///
    /// `StorageError::NotFound` when the user was not following that feed
    /// (or no such feed exists).
    pub async fn delete_follow(&self, user_id: i64, url: &str) -> Result<(), StorageError> {
        let result = sqlx::query(
            r#"
            DELETE FROM feed_follows
            WHERE user_id = ?
              AND feed_id IN (SELECT id FROM feeds WHERE url = ?)
        "#,
        )
        .bind(user_id)
        .bind(url)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }
}
