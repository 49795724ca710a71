// SQLite implementation of the storage interface. Uniqueness and the
// destroy cascade live in the schema and in transactions here, not in the
// callers.

use anyhow::anyhow;
use async_trait::async_trait;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::QueryBuilder;

use crate::core::{PostId, UserId};
use crate::error::{AppError, AppResult};
use crate::models::{FollowEdge, Post, User};
use crate::storage::GraphStorage;

pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn connect(url: &str) -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .connect(url)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to connect to SQLite: {}", e)))?;

        let storage = Self { pool };
        storage.initialize().await?;
        Ok(storage)
    }

    /// An in-memory database exists per connection, so the pool is pinned
    /// to a single one.
    pub async fn new_in_memory() -> AppResult<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| {
                AppError::Database(anyhow!("Failed to connect to in-memory SQLite: {}", e))
            })?;

        let storage = Self { pool };
        storage.initialize().await?;
        Ok(storage)
    }

    /// Create tables and indexes. The unique email index is declared
    /// COLLATE NOCASE, making case-insensitive uniqueness a database
    /// constraint rather than an application convention.
    async fn initialize(&self) -> AppResult<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                email TEXT NOT NULL,
                password_salt TEXT NOT NULL,
                password_digest TEXT NOT NULL,
                admin INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to create users table: {}", e)))?;

        sqlx::query(
            "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email
             ON users(email COLLATE NOCASE)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to create email index: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS follow_edges (
                follower_id INTEGER NOT NULL,
                followee_id INTEGER NOT NULL,
                created_at INTEGER NOT NULL,
                PRIMARY KEY (follower_id, followee_id)
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to create follow_edges table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_follow_edges_followee
             ON follow_edges(followee_id)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to create reverse edge index: {}", e)))?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS posts (
                id INTEGER PRIMARY KEY,
                user_id INTEGER NOT NULL,
                content TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to create posts table: {}", e)))?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_posts_user_time
             ON posts(user_id, created_at DESC, id DESC)",
        )
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to create posts index: {}", e)))?;

        Ok(())
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .map_or(false, |db| matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation))
}

#[async_trait]
impl GraphStorage for SqliteStorage {
    async fn insert_user(&self, user: User) -> AppResult<User> {
        let result = sqlx::query(
            "INSERT INTO users (id, name, email, password_salt, password_digest, admin, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_salt)
        .bind(&user.password_digest)
        .bind(user.admin)
        .bind(user.created_at)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => Ok(user),
            Err(e) if is_unique_violation(&e) => Err(AppError::DuplicateEmail(user.email)),
            Err(e) => Err(AppError::Database(anyhow!(
                "Failed to insert user {}: {}",
                user.id,
                e
            ))),
        }
    }

    async fn get_user(&self, id: UserId) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_salt, password_digest, admin, created_at
             FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to get user {}: {}", id, e)))
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        sqlx::query_as::<_, User>(
            "SELECT id, name, email, password_salt, password_digest, admin, created_at
             FROM users WHERE email = ? COLLATE NOCASE",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to get user by email: {}", e)))
    }

    async fn get_users(&self, ids: &[UserId]) -> AppResult<Vec<User>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<sqlx::Sqlite> = QueryBuilder::new(
            "SELECT id, name, email, password_salt, password_digest, admin, created_at
             FROM users WHERE id IN (",
        );
        let mut separated = builder.separated(", ");
        for id in ids {
            separated.push_bind(*id);
        }
        separated.push_unseparated(")");

        let users: Vec<User> = builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to batch-get users: {}", e)))?;

        // Restore the caller's order; SQL gives no guarantee.
        let mut out = Vec::with_capacity(users.len());
        for id in ids {
            if let Some(user) = users.iter().find(|u| u.id == *id) {
                out.push(user.clone());
            }
        }
        Ok(out)
    }

    async fn update_user(&self, user: &User) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE users
             SET name = ?, email = ?, password_salt = ?, password_digest = ?, admin = ?
             WHERE id = ?",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_salt)
        .bind(&user.password_digest)
        .bind(user.admin)
        .bind(user.id)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(done.rows_affected() > 0),
            Err(e) if is_unique_violation(&e) => {
                Err(AppError::DuplicateEmail(user.email.clone()))
            }
            Err(e) => Err(AppError::Database(anyhow!(
                "Failed to update user {}: {}",
                user.id,
                e
            ))),
        }
    }

    async fn user_exists(&self, id: UserId) -> AppResult<bool> {
        let row: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to check user {}: {}", id, e)))?;
        Ok(row.is_some())
    }

    async fn destroy_user_cascade(&self, id: UserId) -> AppResult<bool> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to begin transaction: {}", e)))?;

        // Edges first, then posts, then the user record; one transaction.
        sqlx::query("DELETE FROM follow_edges WHERE follower_id = ? OR followee_id = ?")
            .bind(id)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to delete edges of {}: {}", id, e)))?;

        sqlx::query("DELETE FROM posts WHERE user_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to delete posts of {}: {}", id, e)))?;

        let deleted = sqlx::query("DELETE FROM users WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to delete user {}: {}", id, e)))?
            .rows_affected()
            > 0;

        tx.commit()
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to commit cascade: {}", e)))?;

        Ok(deleted)
    }

    async fn insert_edge(&self, edge: FollowEdge) -> AppResult<bool> {
        let done = sqlx::query(
            "INSERT OR IGNORE INTO follow_edges (follower_id, followee_id, created_at)
             VALUES (?, ?, ?)",
        )
        .bind(edge.follower_id)
        .bind(edge.followee_id)
        .bind(edge.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to insert edge: {}", e)))?;

        Ok(done.rows_affected() > 0)
    }

    async fn delete_edge(&self, follower: UserId, followee: UserId) -> AppResult<bool> {
        let done = sqlx::query(
            "DELETE FROM follow_edges WHERE follower_id = ? AND followee_id = ?",
        )
        .bind(follower)
        .bind(followee)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to delete edge: {}", e)))?;

        Ok(done.rows_affected() > 0)
    }

    async fn edge_exists(&self, follower: UserId, followee: UserId) -> AppResult<bool> {
        let row: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM follow_edges WHERE follower_id = ? AND followee_id = ?",
        )
        .bind(follower)
        .bind(followee)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to check edge: {}", e)))?;
        Ok(row.is_some())
    }

    async fn following_ids(&self, follower: UserId) -> AppResult<Vec<UserId>> {
        sqlx::query_scalar(
            "SELECT followee_id FROM follow_edges
             WHERE follower_id = ?
             ORDER BY created_at ASC, followee_id ASC",
        )
        .bind(follower)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to list following: {}", e)))
    }

    async fn follower_ids(&self, followee: UserId) -> AppResult<Vec<UserId>> {
        sqlx::query_scalar(
            "SELECT follower_id FROM follow_edges
             WHERE followee_id = ?
             ORDER BY created_at ASC, follower_id ASC",
        )
        .bind(followee)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to list followers: {}", e)))
    }

    async fn count_following(&self, follower: UserId) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follow_edges WHERE follower_id = ?")
                .bind(follower)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::Database(anyhow!("Failed to count following: {}", e)))?;
        Ok(count as u64)
    }

    async fn count_followers(&self, followee: UserId) -> AppResult<u64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM follow_edges WHERE followee_id = ?")
                .bind(followee)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::Database(anyhow!("Failed to count followers: {}", e)))?;
        Ok(count as u64)
    }

    async fn insert_post(&self, post: Post) -> AppResult<Post> {
        sqlx::query("INSERT INTO posts (id, user_id, content, created_at) VALUES (?, ?, ?, ?)")
            .bind(post.id)
            .bind(post.user_id)
            .bind(&post.content)
            .bind(post.created_at)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to insert post {}: {}", post.id, e)))?;
        Ok(post)
    }

    async fn get_post(&self, id: PostId) -> AppResult<Option<Post>> {
        sqlx::query_as::<_, Post>(
            "SELECT id, user_id, content, created_at FROM posts WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to get post {}: {}", id, e)))
    }

    async fn posts_by_user(&self, user: UserId) -> AppResult<Vec<Post>> {
        sqlx::query_as::<_, Post>(
            "SELECT id, user_id, content, created_at FROM posts
             WHERE user_id = ?
             ORDER BY created_at DESC, id DESC",
        )
        .bind(user)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(anyhow!("Failed to list posts of {}: {}", user, e)))
    }

    async fn count_posts_by_user(&self, user: UserId) -> AppResult<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts WHERE user_id = ?")
            .bind(user)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to count posts: {}", e)))?;
        Ok(count as u64)
    }

    async fn delete_post(&self, id: PostId) -> AppResult<bool> {
        let done = sqlx::query("DELETE FROM posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to delete post {}: {}", id, e)))?;
        Ok(done.rows_affected() > 0)
    }

    async fn delete_posts_by_user(&self, user: UserId) -> AppResult<u64> {
        let done = sqlx::query("DELETE FROM posts WHERE user_id = ?")
            .bind(user)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to delete posts of {}: {}", user, e)))?;
        Ok(done.rows_affected())
    }

    /// One IN-filtered query ordered by (created_at DESC, id DESC); the
    /// merge happens in the database regardless of following-set size.
    async fn feed_posts(
        &self,
        authors: &[UserId],
        offset: u64,
        limit: Option<u32>,
    ) -> AppResult<Vec<Post>> {
        if authors.is_empty() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<sqlx::Sqlite> =
            QueryBuilder::new("SELECT id, user_id, content, created_at FROM posts WHERE user_id IN (");
        let mut separated = builder.separated(", ");
        for author in authors {
            separated.push_bind(*author);
        }
        separated.push_unseparated(")");
        builder.push(" ORDER BY created_at DESC, id DESC");

        // SQLite requires LIMIT before OFFSET; -1 means unbounded.
        builder.push(" LIMIT ");
        builder.push_bind(limit.map_or(-1i64, |l| l as i64));
        builder.push(" OFFSET ");
        builder.push_bind(offset as i64);

        builder
            .build_query_as()
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Database(anyhow!("Failed to compose feed: {}", e)))
    }
}
