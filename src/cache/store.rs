use super::StateStore;
use crate::models::CacheEntry;
use crate::Result;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use tracing::{debug, warn};

/// Key the whole mapping is stored under.
pub const CACHE_KEY: &str = "imageCache";

/// Entries older than this are dropped when a session starts.
pub const CACHE_MAX_AGE_DAYS: i64 = 30;

/// Digest -> upload record, backed by a [`StateStore`].
///
/// The in-memory map is authoritative for the session. Persistence failures
/// are logged and never roll back an insert or a prune.
pub struct ImageCache {
    entries: HashMap<String, CacheEntry>,
    store: Box<dyn StateStore>,
}

impl ImageCache {
    /// Load the mapping from `store`. A missing or unreadable value starts an
    /// empty cache.
    pub fn load(store: Box<dyn StateStore>) -> Self {
        let entries = match store.get(CACHE_KEY) {
            Ok(Some(value)) => {
                serde_json::from_value::<HashMap<String, CacheEntry>>(value).unwrap_or_else(|e| {
                    warn!("Discarding unreadable image cache: {}", e);
                    HashMap::new()
                })
            }
            Ok(None) => HashMap::new(),
            Err(e) => {
                warn!("Could not load image cache: {}. Starting empty.", e);
                HashMap::new()
            }
        };

        debug!("Loaded {} cached upload(s)", entries.len());
        Self { entries, store }
    }

    pub fn get(&self, digest: &str) -> Option<&CacheEntry> {
        self.entries.get(digest)
    }

    /// Record `remote_url` for `digest`, stamped now, then persist.
    pub fn put(&mut self, digest: &str, remote_url: &str, file_name: &str) {
        self.entries.insert(
            digest.to_string(),
            CacheEntry {
                digest: digest.to_string(),
                remote_url: remote_url.to_string(),
                original_file_name: file_name.to_string(),
                created_at: Utc::now(),
            },
        );
        self.persist_or_warn();
    }

    /// Drop entries created more than `max_age` ago. Returns how many went.
    pub fn prune(&mut self, max_age: Duration) -> usize {
        let cutoff = Utc::now()
            .checked_sub_signed(max_age)
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.prune_before(cutoff)
    }

    /// Drop entries created strictly before `cutoff`; persists only when
    /// something was removed.
    pub fn prune_before(&mut self, cutoff: DateTime<Utc>) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, entry| entry.created_at >= cutoff);
        let removed = before - self.entries.len();

        if removed > 0 {
            debug!("Pruned {} expired cache entr(ies)", removed);
            self.persist_or_warn();
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries, newest first.
    pub fn entries(&self) -> Vec<&CacheEntry> {
        let mut entries: Vec<&CacheEntry> = self.entries.values().collect();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries
    }

    fn persist(&self) -> Result<()> {
        let value = serde_json::to_value(&self.entries)?;
        self.store.update(CACHE_KEY, value)
    }

    fn persist_or_warn(&self) {
        if let Err(e) = self.persist() {
            warn!("Failed to persist image cache: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;
    use pretty_assertions::assert_eq;

    fn entry_aged(digest: &str, age: Duration) -> CacheEntry {
        CacheEntry {
            digest: digest.to_string(),
            remote_url: format!("https://imagedelivery.net/abc/{}/public", digest),
            original_file_name: format!("{}.png", digest),
            created_at: Utc::now() - age,
        }
    }

    fn store_with(entries: &[CacheEntry]) -> MemoryStore {
        let map: HashMap<String, CacheEntry> = entries
            .iter()
            .map(|e| (e.digest.clone(), e.clone()))
            .collect();
        MemoryStore::new().with_value(CACHE_KEY, serde_json::to_value(map).unwrap())
    }

    #[test]
    fn test_get_on_empty_cache_is_none() {
        let cache = ImageCache::load(Box::new(MemoryStore::new()));
        assert!(cache.get("nope").is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_put_then_get_and_persist() {
        let store = MemoryStore::new();
        let mut cache = ImageCache::load(Box::new(store.clone()));

        cache.put("d1", "https://imagedelivery.net/abc/xyz/public", "cat.png");

        let entry = cache.get("d1").unwrap();
        assert_eq!(entry.remote_url, "https://imagedelivery.net/abc/xyz/public");
        assert_eq!(entry.original_file_name, "cat.png");
        assert_eq!(store.get_update_count(), 1);

        let reloaded = ImageCache::load(Box::new(store));
        let persisted = reloaded.get("d1").unwrap();
        assert_eq!(persisted.remote_url, entry.remote_url);
        assert_eq!(persisted.original_file_name, "cat.png");
    }

    #[test]
    fn test_prune_removes_31_day_old_keeps_29_day_old() {
        let store = store_with(&[
            entry_aged("old", Duration::days(31)),
            entry_aged("fresh", Duration::days(29)),
        ]);
        let mut cache = ImageCache::load(Box::new(store.clone()));

        let removed = cache.prune(Duration::days(CACHE_MAX_AGE_DAYS));

        assert_eq!(removed, 1);
        assert!(cache.get("old").is_none());
        assert!(cache.get("fresh").is_some());
        assert_eq!(store.get_update_count(), 1);
    }

    #[test]
    fn test_prune_without_removals_does_not_persist() {
        let store = store_with(&[entry_aged("fresh", Duration::days(1))]);
        let mut cache = ImageCache::load(Box::new(store.clone()));

        assert_eq!(cache.prune(Duration::days(CACHE_MAX_AGE_DAYS)), 0);
        assert_eq!(store.get_update_count(), 0);
    }

    #[test]
    fn test_persistence_failure_keeps_in_memory_state() {
        let store = MemoryStore::new().with_failing_updates(true);
        let mut cache = ImageCache::load(Box::new(store.clone()));

        cache.put("d1", "https://example/x", "x.png");

        assert!(cache.get("d1").is_some());
        assert_eq!(store.get_update_count(), 0);
    }

    #[test]
    fn test_unreadable_value_loads_empty() {
        let store =
            MemoryStore::new().with_value(CACHE_KEY, serde_json::json!(["not", "a", "map"]));
        let cache = ImageCache::load(Box::new(store));
        assert!(cache.is_empty());
    }

    #[test]
    fn test_entries_sorted_newest_first() {
        let store = store_with(&[
            entry_aged("a", Duration::days(3)),
            entry_aged("b", Duration::days(1)),
            entry_aged("c", Duration::days(2)),
        ]);
        let cache = ImageCache::load(Box::new(store));

        let order: Vec<&str> = cache.entries().iter().map(|e| e.digest.as_str()).collect();
        assert_eq!(order, vec!["b", "c", "a"]);
        assert_eq!(cache.len(), 3);
    }
}
