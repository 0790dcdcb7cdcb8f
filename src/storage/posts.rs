use super::schema::Database;
use super::types::{NewPost, Post, StorageError};

impl Database {
    // ========================================================================
    // Post Operations
    // ========================================================================

    /// Insert one ingested post.
    ///
    /// `posts.url` is globally unique; inserting an already-known URL yields
    /// `StorageError::UniqueViolation`, which the ingestion engine treats as
    /// "already have it", not a failure.
    pub async fn create_post(&self, post: &NewPost) -> Result<Post, StorageError> {
        let now = Self::now();
        let result = sqlx::query(
            r#"
            INSERT INTO posts (feed_id, title, url, description, published_at, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
        )
        .bind(post.feed_id)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.description)
        .bind(post.published_at)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)?;

        Ok(Post {
            id: result.last_insert_rowid(),
            feed_id: post.feed_id,
            title: post.title.clone(),
            url: post.url.clone(),
            description: post.description.clone(),
            published_at: post.published_at,
            created_at: now,
            updated_at: now,
        })
    }

    /// Posts from the feeds `user_id` follows, newest first
    pub async fn posts_for_user(&self, user_id: i64, limit: i64) -> Result<Vec<Post>, StorageError> {
        sqlx::query_as::<_, Post>(
            r#"
            SELECT p.id, p.feed_id, p.title, p.url, p.description, p.published_at,
                   p.created_at, p.updated_at
            FROM posts p
            JOIN feed_follows ff ON ff.feed_id = p.feed_id
            WHERE ff.user_id = ?
            ORDER BY p.published_at DESC, p.created_at DESC, p.id DESC
            LIMIT ?
        "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }

    /// Total number of posts stored for one feed
    pub async fn count_posts_for_feed(&self, feed_id: i64) -> Result<i64, StorageError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM posts WHERE feed_id = ?")
            .bind(feed_id)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)?;
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::super::types::{NewPost, StorageError};
    use super::Database;

    fn post(feed_id: i64, url: &str) -> NewPost {
        NewPost {
            feed_id,
            title: "Title".to_string(),
            url: url.to_string(),
            description: Some("Summary".to_string()),
            published_at: Some(1_700_000_000),
        }
    }

    async fn db_with_feed() -> (Database, i64, i64) {
        let db = Database::open(":memory:").await.unwrap();
        let user = db.create_user("alice").await.unwrap();
        let feed = db
            .create_feed("Blog", "https://example.com/rss", user.id)
            .await
            .unwrap();
        (db, user.id, feed.id)
    }

    #[tokio::test]
    async fn duplicate_url_is_unique_violation() {
        let (db, _, feed_id) = db_with_feed().await;
        db.create_post(&post(feed_id, "http://x/a")).await.unwrap();
        let err = db
            .create_post(&post(feed_id, "http://x/a"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::UniqueViolation));
        assert_eq!(db.count_posts_for_feed(feed_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn url_dedup_spans_feeds() {
        let (db, user_id, feed_id) = db_with_feed().await;
        let other = db
            .create_feed("Other", "https://other.example/rss", user_id)
            .await
            .unwrap();

        db.create_post(&post(feed_id, "http://x/a")).await.unwrap();
        let err = db.create_post(&post(other.id, "http://x/a")).await.unwrap_err();
        assert!(matches!(err, StorageError::UniqueViolation));
    }

    #[tokio::test]
    async fn browse_only_sees_followed_feeds() {
        let (db, user_id, feed_id) = db_with_feed().await;
        let other = db
            .create_feed("Other", "https://other.example/rss", user_id)
            .await
            .unwrap();
        db.create_follow(user_id, feed_id).await.unwrap();

        db.create_post(&post(feed_id, "http://x/followed")).await.unwrap();
        db.create_post(&post(other.id, "http://x/unfollowed"))
            .await
            .unwrap();

        let posts = db.posts_for_user(user_id, 10).await.unwrap();
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].url, "http://x/followed");
    }

    #[tokio::test]
    async fn browse_orders_newest_first_and_limits() {
        let (db, user_id, feed_id) = db_with_feed().await;
        db.create_follow(user_id, feed_id).await.unwrap();

        for (i, ts) in [(1, 100), (2, 300), (3, 200)] {
            db.create_post(&NewPost {
                feed_id,
                title: format!("Post {i}"),
                url: format!("http://x/{i}"),
                description: None,
                published_at: Some(ts),
            })
            .await
            .unwrap();
        }

        let posts = db.posts_for_user(user_id, 2).await.unwrap();
        assert_eq!(posts.len(), 2);
        assert_eq!(posts[0].url, "http://x/2");
        assert_eq!(posts[1].url, "http://x/3");
    }

    #[tokio::test]
    async fn absent_published_at_round_trips_as_none() {
        let (db, user_id, feed_id) = db_with_feed().await;
        db.create_follow(user_id, feed_id).await.unwrap();
        db.create_post(&NewPost {
            feed_id,
            title: "No date".to_string(),
            url: "http://x/nodate".to_string(),
            description: None,
            published_at: None,
        })
        .await
        .unwrap();

        let posts = db.posts_for_user(user_id, 10).await.unwrap();
        assert_eq!(posts[0].published_at, None);
        assert_eq!(posts[0].description, None);
    }
}
