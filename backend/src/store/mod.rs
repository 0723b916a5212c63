//! Persistence for users, thoughts, reactions and friendships.

pub mod sqlite;
pub mod validation;

pub use sqlite::{Counts, Store};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),
    #[error("IO error: {0}")]
    Io(String),
    #[error("{0}")]
    Validation(String),
    #[error("{0} is already taken")]
    Duplicate(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Incorrect credentials")]
    InvalidCredentials,
    #[error("Password error: {0}")]
    Password(String),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

impl From<crate::auth::AuthError> for StoreError {
    fn from(err: crate::auth::AuthError) -> Self {
        StoreError::Password(err.to_string())
    }
}
