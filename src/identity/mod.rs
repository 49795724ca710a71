// Identity - credential validation, password hashing, and the user store

pub mod password;
pub mod user_store;
pub mod validation;

pub use user_store::UserStore;
