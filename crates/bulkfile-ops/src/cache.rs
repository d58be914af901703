//! Local view of directory listings.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bulkfile_core::{DirectoryEntry, GatewayError, SelectionSet};
use compact_str::CompactString;
use indexmap::IndexMap;
use tokio::sync::watch;
use tracing::debug;

use crate::RemoteFileGateway;

type Listing = IndexMap<CompactString, DirectoryEntry>;

/// Cached directory listings, one per directory path.
///
/// Entries are keyed by name, so a listing never holds duplicates. A name
/// removed optimistically only comes back through [`DirectoryCache::refresh`]
/// or [`DirectoryCache::replace`]. Every mutation bumps a generation counter
/// that observers can subscribe to.
pub struct DirectoryCache {
    gateway: Arc<dyn RemoteFileGateway>,
    listings: Mutex<HashMap<CompactString, Listing>>,
    generation: watch::Sender<u64>,
}

impl std::fmt::Debug for DirectoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DirectoryCache")
            .field("directories", &self.listings().len())
            .field("generation", &*self.generation.borrow())
            .finish_non_exhaustive()
    }
}

impl DirectoryCache {
    /// Create an empty cache backed by a gateway.
    pub fn new(gateway: Arc<dyn RemoteFileGateway>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            gateway,
            listings: Mutex::new(HashMap::new()),
            generation,
        }
    }

    /// Discard the cached listing and fetch it again from the store.
    ///
    /// On error the cached listing is left as it was.
    pub async fn refresh(&self, directory: &str) -> Result<Vec<DirectoryEntry>, GatewayError> {
        let entries = self.gateway.list(directory).await?;
        self.replace(directory, entries);
        Ok(self.entries(directory).unwrap_or_default())
    }

    /// Install a listing. Later entries win over earlier ones with the same name.
    ///
    /// Returns the number of distinct entries stored.
    pub fn replace(&self, directory: &str, entries: Vec<DirectoryEntry>) -> usize {
        let listing: Listing = entries
            .into_iter()
            .map(|entry| (entry.name.clone(), entry))
            .collect();
        let count = listing.len();
        self.listings().insert(normalize_directory(directory), listing);
        self.bump();
        debug!(target: "bulkfile::cache", directory, count, "listing replaced");
        count
    }

    /// Drop every entry matching `predicate` without asking the store.
    ///
    /// Returns how many entries were removed.
    pub fn remove_optimistic<F>(&self, directory: &str, mut predicate: F) -> usize
    where
        F: FnMut(&DirectoryEntry) -> bool,
    {
        let removed = {
            let mut listings = self.listings();
            let Some(listing) = listings.get_mut(normalize_directory(directory).as_str()) else {
                return 0;
            };
            let before = listing.len();
            listing.retain(|_, entry| !predicate(entry));
            before - listing.len()
        };
        if removed > 0 {
            self.bump();
        }
        debug!(target: "bulkfile::cache", directory, removed, "optimistic removal");
        removed
    }

    /// Drop the named entries without asking the store.
    pub fn remove_names(&self, directory: &str, names: &SelectionSet) -> usize {
        self.remove_optimistic(directory, |entry| names.contains(&entry.name))
    }

    /// Forget a directory's listing.
    pub fn invalidate(&self, directory: &str) {
        if self
            .listings()
            .remove(normalize_directory(directory).as_str())
            .is_some()
        {
            self.bump();
        }
    }

    /// Cached entries in listing order, or `None` if never loaded.
    pub fn entries(&self, directory: &str) -> Option<Vec<DirectoryEntry>> {
        self.listings()
            .get(normalize_directory(directory).as_str())
            .map(|listing| listing.values().cloned().collect())
    }

    /// Names in listing order. Empty if the directory was never loaded.
    pub fn names(&self, directory: &str) -> Vec<CompactString> {
        self.listings()
            .get(normalize_directory(directory).as_str())
            .map(|listing| listing.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn get(&self, directory: &str, name: &str) -> Option<DirectoryEntry> {
        self.listings()
            .get(normalize_directory(directory).as_str())
            .and_then(|listing| listing.get(name).cloned())
    }

    pub fn contains(&self, directory: &str, name: &str) -> bool {
        self.listings()
            .get(normalize_directory(directory).as_str())
            .is_some_and(|listing| listing.contains_key(name))
    }

    /// Number of cached entries for a directory.
    pub fn len(&self, directory: &str) -> usize {
        self.listings()
            .get(normalize_directory(directory).as_str())
            .map_or(0, IndexMap::len)
    }

    pub fn is_loaded(&self, directory: &str) -> bool {
        self.listings()
            .contains_key(normalize_directory(directory).as_str())
    }

    /// Current generation. Increases on every mutation.
    pub fn generation(&self) -> u64 {
        *self.generation.borrow()
    }

    /// Observe cache mutations.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.generation.subscribe()
    }

    fn bump(&self) {
        self.generation.send_modify(|generation| *generation += 1);
    }

    fn listings(&self) -> MutexGuard<'_, HashMap<CompactString, Listing>> {
        self.listings.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Canonical cache key for a directory: leading slash, no trailing slash,
/// no empty or `.` segments.
pub fn normalize_directory(directory: &str) -> CompactString {
    let mut normalized = CompactString::new("");
    for segment in directory
        .split(['/', '\\'])
        .filter(|s| !s.is_empty() && *s != ".")
    {
        normalized.push('/');
        normalized.push_str(segment);
    }
    if normalized.is_empty() {
        normalized.push('/');
    }
    normalized
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;

    /// Gateway that only lists; the other calls are never reached here.
    struct ListOnly(Vec<DirectoryEntry>);

    #[async_trait]
    impl RemoteFileGateway for ListOnly {
        async fn list(&self, _directory: &str) -> Result<Vec<DirectoryEntry>, GatewayError> {
            Ok(self.0.clone())
        }

        async fn compress(
            &self,
            _directory: &str,
            _names: &SelectionSet,
        ) -> Result<DirectoryEntry, GatewayError> {
            Err(GatewayError::rejected("unsupported"))
        }

        async fn delete(&self, _directory: &str, _names: &SelectionSet) -> Result<(), GatewayError> {
            Err(GatewayError::rejected("unsupported"))
        }

        async fn move_entries(
            &self,
            _directory: &str,
            _names: &SelectionSet,
            _destination: &str,
        ) -> Result<(), GatewayError> {
            Err(GatewayError::rejected("unsupported"))
        }
    }

    fn cache_with(entries: Vec<DirectoryEntry>) -> DirectoryCache {
        DirectoryCache::new(Arc::new(ListOnly(entries)))
    }

    #[test]
    fn test_normalize_directory() {
        assert_eq!(normalize_directory(""), "/");
        assert_eq!(normalize_directory("/"), "/");
        assert_eq!(normalize_directory("logs/"), "/logs");
        assert_eq!(normalize_directory("//a/./b/"), "/a/b");
    }

    #[test]
    fn test_replace_deduplicates_names() {
        let cache = cache_with(vec![]);
        let count = cache.replace(
            "/",
            vec![
                DirectoryEntry::file("a.txt", 1),
                DirectoryEntry::file("b.txt", 2),
                DirectoryEntry::file("a.txt", 3),
            ],
        );

        assert_eq!(count, 2);
        assert_eq!(cache.get("/", "a.txt").map(|e| e.size), Some(3));
    }

    #[test]
    fn test_remove_names_is_exact() {
        let cache = cache_with(vec![]);
        cache.replace(
            "/data",
            vec![
                DirectoryEntry::file("a.txt", 1),
                DirectoryEntry::file("b.txt", 2),
                DirectoryEntry::folder("c"),
            ],
        );
        let generation = cache.generation();

        let names: SelectionSet = ["a.txt", "c", "missing"].into_iter().collect();
        assert_eq!(cache.remove_names("/data/", &names), 2);
        assert_eq!(cache.names("/data"), vec![CompactString::new("b.txt")]);
        assert!(cache.generation() > generation);
    }

    #[test]
    fn test_remove_from_unloaded_directory() {
        let cache = cache_with(vec![]);
        assert_eq!(cache.remove_optimistic("/nowhere", |_| true), 0);
        assert_eq!(cache.generation(), 0);
    }

    #[tokio::test]
    async fn test_refresh_is_idempotent() {
        let cache = cache_with(vec![
            DirectoryEntry::folder("logs"),
            DirectoryEntry::file("server.jar", 1024),
        ]);

        let first = cache.refresh("/").await.unwrap();
        let second = cache.refresh("/").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.len("/"), 2);
        assert!(cache.is_loaded(""));
    }

    #[tokio::test]
    async fn test_refresh_restores_removed_names() {
        let cache = cache_with(vec![DirectoryEntry::file("a.txt", 1)]);
        cache.refresh("/").await.unwrap();
        cache.remove_optimistic("/", |e| e.name == "a.txt");
        assert!(!cache.contains("/", "a.txt"));

        cache.refresh("/").await.unwrap();
        assert!(cache.contains("/", "a.txt"));
    }

    #[test]
    fn test_invalidate() {
        let cache = cache_with(vec![]);
        cache.replace("/", vec![DirectoryEntry::file("a", 1)]);
        cache.invalidate("/");
        assert!(!cache.is_loaded("/"));
        assert!(cache.entries("/").is_none());
    }
}
