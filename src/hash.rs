//! Content digests used as dedup cache keys.

use crate::Result;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Lowercase hex SHA-256 of `data` (64 chars).
pub fn content_digest(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// Read `path` and digest its contents.
pub fn file_digest(path: &Path) -> Result<String> {
    let data = std::fs::read(path)?;
    Ok(content_digest(&data))
}
