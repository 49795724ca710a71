// Posts: creation, lookup, per-user listing, and cascade helpers.

pub mod feed;

pub use feed::FeedComposer;

use std::sync::Arc;

use tracing::{info, instrument};

use crate::core::{current_time_millis, IdGenerator, PostId, UserId};
use crate::error::{AppError, AppResult};
use crate::identity::validation::validate_post_content;
use crate::models::Post;
use crate::storage::GraphStorage;

pub struct PostStore {
    storage: Arc<dyn GraphStorage>,
    ids: Arc<IdGenerator>,
}

impl PostStore {
    pub fn new(storage: Arc<dyn GraphStorage>, ids: Arc<IdGenerator>) -> Self {
        Self { storage, ids }
    }

    /// Create a post owned by `user`. The owner must exist and the content
    /// must pass the micropost rules.
    #[instrument(skip(self, content))]
    pub async fn create(&self, user: UserId, content: &str) -> AppResult<Post> {
        if !self.storage.user_exists(user).await? {
            return Err(AppError::UnknownUser(user));
        }
        let violations = validate_post_content(content);
        if !violations.is_empty() {
            return Err(AppError::Validation(violations));
        }

        let post = Post {
            id: self.ids.next_id(),
            user_id: user,
            content: content.to_string(),
            created_at: current_time_millis(),
        };
        let post = self.storage.insert_post(post).await?;
        info!(post_id = post.id, user_id = user, "post created");
        Ok(post)
    }

    pub async fn find_by_id(&self, id: PostId) -> AppResult<Option<Post>> {
        self.storage.get_post(id).await
    }

    /// Posts authored by `user`, newest first.
    pub async fn by_user(&self, user: UserId) -> AppResult<Vec<Post>> {
        self.storage.posts_by_user(user).await
    }

    pub async fn count_by_user(&self, user: UserId) -> AppResult<u64> {
        self.storage.count_posts_by_user(user).await
    }

    /// Delete a single post; false when it did not exist.
    #[instrument(skip(self))]
    pub async fn destroy(&self, id: PostId) -> AppResult<bool> {
        let removed = self.storage.delete_post(id).await?;
        if removed {
            info!(post_id = id, "post destroyed");
        }
        Ok(removed)
    }

    /// Remove every post owned by `user`; returns how many went. The user
    /// store's destroy cascade covers this internally, so this entry point
    /// exists for callers managing posts on their own.
    #[instrument(skip(self))]
    pub async fn destroy_all_by_user(&self, user: UserId) -> AppResult<u64> {
        self.storage.delete_posts_by_user(user).await
    }
}
