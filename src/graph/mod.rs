// Directed follow relationships. Edges are independent records referencing
// two user ids, kept in a dual index (by follower and by followee) so both
// traversal directions are a lookup, not a scan.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::core::{current_time_millis, UserId};
use crate::error::{AppError, AppResult};
use crate::models::{FollowEdge, User};
use crate::storage::GraphStorage;

pub struct RelationshipGraph {
    storage: Arc<dyn GraphStorage>,
}

impl RelationshipGraph {
    pub fn new(storage: Arc<dyn GraphStorage>) -> Self {
        Self { storage }
    }

    /// Create a follower -> followee edge. Idempotent: following someone
    /// twice leaves exactly one edge. Self-follows are rejected outright.
    #[instrument(skip(self))]
    pub async fn follow(&self, follower: UserId, followee: UserId) -> AppResult<()> {
        if follower == followee {
            return Err(AppError::SelfFollow(follower));
        }
        self.require_user(follower).await?;
        self.require_user(followee).await?;

        let created = self
            .storage
            .insert_edge(FollowEdge {
                follower_id: follower,
                followee_id: followee,
                created_at: current_time_millis(),
            })
            .await?;
        if created {
            info!(follower, followee, "follow edge created");
        }
        Ok(())
    }

    /// Remove the edge if present; unfollowing someone never followed is a
    /// no-op.
    #[instrument(skip(self))]
    pub async fn unfollow(&self, follower: UserId, followee: UserId) -> AppResult<()> {
        let removed = self.storage.delete_edge(follower, followee).await?;
        if removed {
            info!(follower, followee, "follow edge removed");
        }
        Ok(())
    }

    pub async fn is_following(&self, follower: UserId, followee: UserId) -> AppResult<bool> {
        self.storage.edge_exists(follower, followee).await
    }

    /// Users this user follows.
    pub async fn following(&self, user: UserId) -> AppResult<Vec<User>> {
        let ids = self.storage.following_ids(user).await?;
        self.storage.get_users(&ids).await
    }

    /// Users following this user (reverse index).
    pub async fn followers(&self, user: UserId) -> AppResult<Vec<User>> {
        let ids = self.storage.follower_ids(user).await?;
        self.storage.get_users(&ids).await
    }

    pub async fn following_count(&self, user: UserId) -> AppResult<u64> {
        self.storage.count_following(user).await
    }

    pub async fn followers_count(&self, user: UserId) -> AppResult<u64> {
        self.storage.count_followers(user).await
    }

    async fn require_user(&self, id: UserId) -> AppResult<()> {
        if self.storage.user_exists(id).await? {
            Ok(())
        } else {
            Err(AppError::UnknownUser(id))
        }
    }
}
