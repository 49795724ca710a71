// In-process backend: dual-indexed maps behind one RwLock so every
// mutation, including the destroy cascade, is atomic with respect to
// readers.

use std::collections::{BinaryHeap, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::core::{PostId, Timestamp, UserId};
use crate::error::{AppError, AppResult};
use crate::models::{FollowEdge, Post, User};
use crate::storage::GraphStorage;

#[derive(Default)]
struct Inner {
    users: HashMap<UserId, User>,
    /// Lowercased email -> user id; the uniqueness source of truth.
    email_index: HashMap<String, UserId>,
    /// Forward index: follower -> (followee -> edge timestamp).
    following: HashMap<UserId, HashMap<UserId, Timestamp>>,
    /// Reverse index: followee -> (follower -> edge timestamp).
    followers: HashMap<UserId, HashMap<UserId, Timestamp>>,
    posts: HashMap<PostId, Post>,
    /// Post ids per author in insertion order; ids are time-ordered, so
    /// this doubles as ascending (created_at, id).
    posts_by_user: HashMap<UserId, Vec<PostId>>,
}

impl Inner {
    fn remove_edges_touching(&mut self, id: UserId) {
        if let Some(followees) = self.following.remove(&id) {
            for followee in followees.keys() {
                if let Some(reverse) = self.followers.get_mut(followee) {
                    reverse.remove(&id);
                }
            }
        }
        if let Some(follower_set) = self.followers.remove(&id) {
            for follower in follower_set.keys() {
                if let Some(forward) = self.following.get_mut(follower) {
                    forward.remove(&id);
                }
            }
        }
    }

    fn remove_posts_of(&mut self, id: UserId) -> u64 {
        let ids = self.posts_by_user.remove(&id).unwrap_or_default();
        let removed = ids.len() as u64;
        for post_id in ids {
            self.posts.remove(&post_id);
        }
        removed
    }

    fn ids_sorted_by_edge_time(edges: Option<&HashMap<UserId, Timestamp>>) -> Vec<UserId> {
        let mut pairs: Vec<(Timestamp, UserId)> = edges
            .map(|m| m.iter().map(|(id, ts)| (*ts, *id)).collect())
            .unwrap_or_default();
        pairs.sort_unstable();
        pairs.into_iter().map(|(_, id)| id).collect()
    }
}

pub struct MemoryStorage {
    inner: RwLock<Inner>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphStorage for MemoryStorage {
    async fn insert_user(&self, user: User) -> AppResult<User> {
        let mut inner = self.inner.write().await;
        let key = user.email.to_lowercase();
        if inner.email_index.contains_key(&key) {
            return Err(AppError::DuplicateEmail(user.email));
        }
        inner.email_index.insert(key, user.id);
        inner.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> AppResult<Option<User>> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let inner = self.inner.read().await;
        let id = inner.email_index.get(&email.to_lowercase());
        Ok(id.and_then(|id| inner.users.get(id)).cloned())
    }

    async fn get_users(&self, ids: &[UserId]) -> AppResult<Vec<User>> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| inner.users.get(id))
            .cloned()
            .collect())
    }

    async fn update_user(&self, user: &User) -> AppResult<bool> {
        let mut guard = self.inner.write().await;
        let inner = &mut *guard;
        match inner.users.get(&user.id) {
            Some(existing) => {
                // The email index follows any email change in the same
                // write section.
                let old_key = existing.email.to_lowercase();
                let new_key = user.email.to_lowercase();
                if old_key != new_key {
                    if inner.email_index.contains_key(&new_key) {
                        return Err(AppError::DuplicateEmail(user.email.clone()));
                    }
                    inner.email_index.remove(&old_key);
                    inner.email_index.insert(new_key, user.id);
                }
                inner.users.insert(user.id, user.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn user_exists(&self, id: UserId) -> AppResult<bool> {
        Ok(self.inner.read().await.users.contains_key(&id))
    }

    async fn destroy_user_cascade(&self, id: UserId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let user = match inner.users.remove(&id) {
            Some(user) => user,
            None => return Ok(false),
        };
        // Edges first, then posts, then the record itself; a single write
        // guard makes the whole cascade atomic for readers.
        inner.remove_edges_touching(id);
        inner.remove_posts_of(id);
        inner.email_index.remove(&user.email.to_lowercase());
        Ok(true)
    }

    async fn insert_edge(&self, edge: FollowEdge) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let forward = inner.following.entry(edge.follower_id).or_default();
        if forward.contains_key(&edge.followee_id) {
            return Ok(false);
        }
        forward.insert(edge.followee_id, edge.created_at);
        inner
            .followers
            .entry(edge.followee_id)
            .or_default()
            .insert(edge.follower_id, edge.created_at);
        Ok(true)
    }

    async fn delete_edge(&self, follower: UserId, followee: UserId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        let removed = inner
            .following
            .get_mut(&follower)
            .map_or(false, |m| m.remove(&followee).is_some());
        if removed {
            if let Some(reverse) = inner.followers.get_mut(&followee) {
                reverse.remove(&follower);
            }
        }
        Ok(removed)
    }

    async fn edge_exists(&self, follower: UserId, followee: UserId) -> AppResult<bool> {
        let inner = self.inner.read().await;
        Ok(inner
            .following
            .get(&follower)
            .map_or(false, |m| m.contains_key(&followee)))
    }

    async fn following_ids(&self, follower: UserId) -> AppResult<Vec<UserId>> {
        let inner = self.inner.read().await;
        Ok(Inner::ids_sorted_by_edge_time(inner.following.get(&follower)))
    }

    async fn follower_ids(&self, followee: UserId) -> AppResult<Vec<UserId>> {
        let inner = self.inner.read().await;
        Ok(Inner::ids_sorted_by_edge_time(inner.followers.get(&followee)))
    }

    async fn count_following(&self, follower: UserId) -> AppResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.following.get(&follower).map_or(0, |m| m.len() as u64))
    }

    async fn count_followers(&self, followee: UserId) -> AppResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.followers.get(&followee).map_or(0, |m| m.len() as u64))
    }

    async fn insert_post(&self, post: Post) -> AppResult<Post> {
        let mut inner = self.inner.write().await;
        inner
            .posts_by_user
            .entry(post.user_id)
            .or_default()
            .push(post.id);
        inner.posts.insert(post.id, post.clone());
        Ok(post)
    }

    async fn get_post(&self, id: PostId) -> AppResult<Option<Post>> {
        Ok(self.inner.read().await.posts.get(&id).cloned())
    }

    async fn posts_by_user(&self, user: UserId) -> AppResult<Vec<Post>> {
        let inner = self.inner.read().await;
        let ids = match inner.posts_by_user.get(&user) {
            Some(ids) => ids,
            None => return Ok(Vec::new()),
        };
        // Stored ascending; newest first is the reverse walk.
        Ok(ids
            .iter()
            .rev()
            .filter_map(|id| inner.posts.get(id))
            .cloned()
            .collect())
    }

    async fn count_posts_by_user(&self, user: UserId) -> AppResult<u64> {
        let inner = self.inner.read().await;
        Ok(inner.posts_by_user.get(&user).map_or(0, |v| v.len() as u64))
    }

    async fn delete_post(&self, id: PostId) -> AppResult<bool> {
        let mut inner = self.inner.write().await;
        match inner.posts.remove(&id) {
            Some(post) => {
                if let Some(ids) = inner.posts_by_user.get_mut(&post.user_id) {
                    ids.retain(|post_id| *post_id != id);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_posts_by_user(&self, user: UserId) -> AppResult<u64> {
        let mut inner = self.inner.write().await;
        Ok(inner.remove_posts_of(user))
    }

    /// K-way merge over the per-author runs. Each author's post list is
    /// already ascending by (created_at, id); walking every run from its
    /// tail through a max-heap keyed on (created_at, id) yields the global
    /// newest-first order in O(n log k) for k authors.
    async fn feed_posts(
        &self,
        authors: &[UserId],
        offset: u64,
        limit: Option<u32>,
    ) -> AppResult<Vec<Post>> {
        let inner = self.inner.read().await;

        // Heap entries: (created_at, post_id, author_slot, position).
        let mut heap: BinaryHeap<(Timestamp, PostId, usize, usize)> = BinaryHeap::new();
        let runs: Vec<&Vec<PostId>> = authors
            .iter()
            .filter_map(|author| inner.posts_by_user.get(author))
            .filter(|ids| !ids.is_empty())
            .collect();

        for (slot, ids) in runs.iter().enumerate() {
            let pos = ids.len() - 1;
            let post_id = ids[pos];
            if let Some(post) = inner.posts.get(&post_id) {
                heap.push((post.created_at, post_id, slot, pos));
            }
        }

        let mut skipped = 0u64;
        let mut out = Vec::new();
        let cap = limit.map(|l| l as usize);

        while let Some((_, post_id, slot, pos)) = heap.pop() {
            if skipped < offset {
                skipped += 1;
            } else {
                if let Some(post) = inner.posts.get(&post_id) {
                    out.push(post.clone());
                }
                if cap.map_or(false, |cap| out.len() >= cap) {
                    break;
                }
            }
            if pos > 0 {
                let next_id = runs[slot][pos - 1];
                if let Some(post) = inner.posts.get(&next_id) {
                    heap.push((post.created_at, next_id, slot, pos - 1));
                }
            }
        }

        Ok(out)
    }
}
