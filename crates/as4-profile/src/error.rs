//! Error types for the profile registry.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ProfileError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// A profile with this id is already registered.
    #[error("profile already registered: {0}")]
    AlreadyRegistered(String),

    /// A second profile flagged as default was offered.
    #[error("profile '{offered}' is flagged default but '{existing}' already is")]
    DuplicateDefault { existing: String, offered: String },

    #[error("profile not found: {0}")]
    NotFound(String),

    /// Caller passed an empty profile id.
    #[error("profile id must not be empty")]
    EmptyId,
}
