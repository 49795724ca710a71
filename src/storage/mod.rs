// Storage backends behind a single async interface. The trait carries the
// persistence-level invariants the domain components lean on:
// case-insensitive unique emails, one edge per (follower, followee) pair,
// consistent forward/reverse edge indexes, and atomic cascades.

use async_trait::async_trait;

use crate::core::{PostId, UserId};
use crate::error::AppResult;
use crate::models::{FollowEdge, Post, User};

pub mod memory;
pub mod sqlite;

pub use memory::MemoryStorage;
pub use sqlite::SqliteStorage;

#[async_trait]
pub trait GraphStorage: Send + Sync {
    // User operations

    /// Insert a user record. The case-insensitive unique email index is
    /// enforced here, as the source of truth; any pre-check in the caller
    /// is an optimization only. Surfaces `AppError::DuplicateEmail` on
    /// collision.
    async fn insert_user(&self, user: User) -> AppResult<User>;
    async fn get_user(&self, id: UserId) -> AppResult<Option<User>>;
    /// Case-insensitive email lookup.
    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    /// Batch lookup; result preserves the order of `ids`, missing ids are
    /// skipped.
    async fn get_users(&self, ids: &[UserId]) -> AppResult<Vec<User>>;
    async fn update_user(&self, user: &User) -> AppResult<bool>;
    async fn user_exists(&self, id: UserId) -> AppResult<bool>;
    /// Delete the user plus everything hanging off it - edges in both
    /// directions, then posts, then the record - as one atomic unit.
    /// Returns false when the user did not exist.
    async fn destroy_user_cascade(&self, id: UserId) -> AppResult<bool>;

    // Follow edge operations

    /// Insert an edge unless the pair already exists. Forward and reverse
    /// indexes move together. Returns true when a new edge was created.
    async fn insert_edge(&self, edge: FollowEdge) -> AppResult<bool>;
    /// Remove an edge if present; returns true when one was removed.
    async fn delete_edge(&self, follower: UserId, followee: UserId) -> AppResult<bool>;
    async fn edge_exists(&self, follower: UserId, followee: UserId) -> AppResult<bool>;
    /// Everyone `follower` follows, in edge-creation order.
    async fn following_ids(&self, follower: UserId) -> AppResult<Vec<UserId>>;
    /// Everyone following `followee` (reverse index), in edge-creation order.
    async fn follower_ids(&self, followee: UserId) -> AppResult<Vec<UserId>>;
    async fn count_following(&self, follower: UserId) -> AppResult<u64>;
    async fn count_followers(&self, followee: UserId) -> AppResult<u64>;

    // Post operations

    async fn insert_post(&self, post: Post) -> AppResult<Post>;
    async fn get_post(&self, id: PostId) -> AppResult<Option<Post>>;
    /// Posts authored by `user`, newest first.
    async fn posts_by_user(&self, user: UserId) -> AppResult<Vec<Post>>;
    async fn count_posts_by_user(&self, user: UserId) -> AppResult<u64>;
    async fn delete_post(&self, id: PostId) -> AppResult<bool>;
    async fn delete_posts_by_user(&self, user: UserId) -> AppResult<u64>;

    /// Posts authored by any of `authors`, newest first, ties resolved by
    /// descending id (reverse insertion order). This is the feed's merge
    /// step: one call regardless of how many authors are involved, never a
    /// query per author.
    async fn feed_posts(
        &self,
        authors: &[UserId],
        offset: u64,
        limit: Option<u32>,
    ) -> AppResult<Vec<Post>>;
}
