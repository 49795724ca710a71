// The derived activity feed: a read-time merge of the subject's own posts
// with posts from everyone they follow, newest first.
//
// The merge is delegated to the storage layer as a single multi-author
// query (an IN-filter in SQL, a k-way heap merge in memory) so the cost
// stays one round trip however large the following set grows. Issuing one
// query per followed user would scale linearly in round trips and is
// deliberately avoided.

use std::sync::Arc;

use crate::core::UserId;
use crate::error::AppResult;
use crate::models::Post;
use crate::storage::GraphStorage;

pub struct FeedComposer {
    storage: Arc<dyn GraphStorage>,
}

impl FeedComposer {
    pub fn new(storage: Arc<dyn GraphStorage>) -> Self {
        Self { storage }
    }

    /// Full feed for `user`: their posts plus followed users' posts, newest
    /// first, ties resolved toward the most recently inserted post. Reads
    /// may interleave with in-flight follow changes; the feed reflects the
    /// following set as of this call.
    pub async fn feed(&self, user: UserId) -> AppResult<Vec<Post>> {
        self.feed_page(user, 0, None).await
    }

    /// Paginated feed slice.
    pub async fn feed_page(
        &self,
        user: UserId,
        offset: u64,
        limit: Option<u32>,
    ) -> AppResult<Vec<Post>> {
        let mut authors = self.storage.following_ids(user).await?;
        authors.push(user);
        self.storage.feed_posts(&authors, offset, limit).await
    }
}
