//! Error handling and custom error types
//!
//! Provides unified error handling across the uploader, the cache and the
//! bulk-deletion tool using thiserror.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Upload failed: {0}")]
    Upload(String),

    #[error("Images API error: {0}")]
    RemoteApi(String),

    #[error("Invalid data URL: {0}")]
    InvalidDataUrl(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),
}

pub type Result<T> = std::result::Result<T, Error>;
