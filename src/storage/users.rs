use super::schema::Database;
use super::types::{StorageError, User};

impl Database {
    // ========================================================================
    // User Operations
    // ========================================================================

    /// Create a user. Names are unique; a duplicate name surfaces as
    /// `StorageError::UniqueViolation`.
    pub async fn create_user(&self, name: &str) -> Result<User, StorageError> {
        let now = Self::now();
        let result = sqlx::query("INSERT INTO users (name, created_at, updated_at) VALUES (?, ?, ?)")
            .bind(name)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)?;

        Ok(User {
            id: result.last_insert_rowid(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Look up a user by display name
    pub async fn get_user_by_name(&self, name: &str) -> Result<Option<User>, StorageError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users WHERE name = ?",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }

    /// List all users, oldest first
    pub async fn list_users(&self) -> Result<Vec<User>, StorageError> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, created_at, updated_at FROM users ORDER BY created_at, id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::from_sqlx)
    }

    /// Delete every user. Feeds, follows, and posts go with them via
    /// cascading foreign keys.
    pub async fn reset(&self) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM users")
            .execute(&self.pool)
            .await
            .map_err(StorageError::from_sqlx)?;
        Ok(())
    }
}
