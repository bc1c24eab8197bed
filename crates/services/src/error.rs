//! Shared error types for the services crate.

use thiserror::Error;

use storage::{AssetError, IdentityError, StorageError};

/// Errors emitted by `ContentRepository`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ContentError {
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `ProgressService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ProgressError {
    #[error("no user is signed in")]
    SignedOut,
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `AuthGate`. The only category shown to the user.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AuthError {
    #[error("Please enter your name.")]
    EmptyName,
    #[error(transparent)]
    Provider(#[from] IdentityError),
}

impl AuthError {
    /// Human-readable description for display.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            AuthError::EmptyName => self.to_string(),
            AuthError::Provider(inner) => inner.user_message(),
        }
    }
}

/// Errors emitted while reading configuration.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("invalid URL in {key}: {raw}")]
    InvalidUrl { key: &'static str, raw: String },
    #[error("invalid catalog mode: {0} (expected local, remote or both)")]
    InvalidCatalogMode(String),
}
