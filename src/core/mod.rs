// Shared primitives used across the identity, graph, and post components

pub mod id_generator;

pub use id_generator::IdGenerator;

/// Identifier for a user record.
pub type UserId = i64;

/// Identifier for a post record.
pub type PostId = i64;

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Current time in milliseconds since Unix epoch.
pub fn current_time_millis() -> Timestamp {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_millis() as i64
}
