// Social Graph - user identity and follow-graph core

// Core types and primitives
pub mod core;

// Domain records shared by every component
pub mod models;

// Identity - credential validation, password hashing, user store
pub mod identity;

// Directed follow relationships
pub mod graph;

// Posts and the derived activity feed
pub mod posts;

// Storage backends behind the GraphStorage trait
pub mod storage;

// Common utilities
pub mod config;
pub mod error;

// Re-exports for convenience
pub use error::{AppError, AppResult};
pub use models::{FollowEdge, NewUser, Post, User};
