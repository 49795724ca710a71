use serde::{Deserialize, Serialize};

use crate::core::{PostId, Timestamp, UserId};

/// A registered user. The digest and salt are derived at creation; the
/// plaintext password is never stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub name: String,
    /// Stored as entered; uniqueness and lookup are case-insensitive.
    pub email: String,
    pub password_salt: String,
    pub password_digest: String,
    pub admin: bool,
    pub created_at: Timestamp,
}

/// Attributes supplied by the caller when registering a user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
}

/// A directed follower -> followee edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct FollowEdge {
    pub follower_id: UserId,
    pub followee_id: UserId,
    pub created_at: Timestamp,
}

/// A micropost owned by exactly one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Post {
    pub id: PostId,
    pub user_id: UserId,
    pub content: String,
    pub created_at: Timestamp,
}
