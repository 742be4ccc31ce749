//! Content-addressed upload cache
//!
//! Maps a content digest to the delivery URL it was uploaded under, so the
//! same bytes are never uploaded twice within the eviction window. The
//! mapping lives in memory for the session and is written back through a
//! [`StateStore`] after every mutation.

pub mod file;
pub mod memory;
pub mod store;

pub use file::JsonFileStore;
pub use memory::MemoryStore;
pub use store::{ImageCache, CACHE_KEY, CACHE_MAX_AGE_DAYS};

use crate::Result;

/// Host-owned key-value persistence, one JSON value per key.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<serde_json::Value>>;
    fn update(&self, key: &str, value: serde_json::Value) -> Result<()>;
}
