//! Error types for ShelfSync.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Missing or malformed caller input. Maps to HTTP 400.
    #[error("{0}")]
    Validation(String),

    /// Unknown identity. Maps to HTTP 404.
    #[error("{0}")]
    NotFound(String),

    /// Interactive login or identifier extraction failed.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Progress sync setup failed before any write was issued.
    #[error("Sync failed: {0}")]
    Sync(String),

    /// Public feed transport or parse failure.
    #[error("Feed fetch failed: {0}")]
    FeedFetch(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(String),
}

pub type Result<T> = std::result::Result<T, Error>;
