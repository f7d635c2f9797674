//! Per-URL preview cache with TTL-based expiration.

use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;

use crate::models::LinkPreview;

struct CacheEntry {
    preview: LinkPreview,
    inserted_at: Instant,
}

/// Entry limit used by [`PreviewCache::new`].
pub const DEFAULT_MAX_ENTRIES: usize = 1024;

/// In-memory preview cache keyed by URL, bounded to `max_entries`.
pub struct PreviewCache {
    entries: DashMap<String, CacheEntry>,
    ttl: Duration,
    max_entries: usize,
}

impl PreviewCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_max_entries(ttl, DEFAULT_MAX_ENTRIES)
    }

    pub fn with_max_entries(ttl: Duration, max_entries: usize) -> Self {
        Self {
            entries: DashMap::new(),
            ttl,
            max_entries: max_entries.max(1),
        }
    }

    /// Cached preview for `url`, if present and not expired.
    pub fn get(&self, url: &str) -> Option<LinkPreview> {
        if let Some(entry) = self.entries.get(url)
            && entry.inserted_at.elapsed() <= self.ttl
        {
            return Some(entry.preview.clone());
        }
        // Only an entry that is still expired is removed; a concurrent
        // insert for the same URL survives.
        let ttl = self.ttl;
        self.entries.remove_if(url, |_, e| e.inserted_at.elapsed() > ttl);
        None
    }

    pub fn insert(&self, url: &str, preview: LinkPreview) {
        self.insert_at(url, preview, Instant::now());
    }

    fn insert_at(&self, url: &str, preview: LinkPreview, inserted_at: Instant) {
        if !self.entries.contains_key(url) && self.entries.len() >= self.max_entries {
            self.cleanup();
            while self.entries.len() >= self.max_entries {
                if !self.evict_oldest() {
                    break;
                }
            }
        }
        self.entries.insert(
            url.to_string(),
            CacheEntry {
                preview,
                inserted_at,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop everything (e.g. when the owning view is torn down).
    pub fn clear(&self) {
        self.entries.clear();
    }

    /// Evict expired entries.
    pub fn cleanup(&self) {
        let ttl = self.ttl;
        self.entries.retain(|_, e| e.inserted_at.elapsed() <= ttl);
    }

    /// Remove the entry inserted first. Returns false when nothing was removed.
    fn evict_oldest(&self) -> bool {
        let oldest = self
            .entries
            .iter()
            .min_by_key(|e| e.inserted_at)
            .map(|e| e.key().clone());
        match oldest {
            Some(url) => self.entries.remove(&url).is_some(),
            None => false,
        }
    }

    /// Spawn a periodic cleanup task.
    pub fn spawn_cleanup_task(self: &Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        let cache = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every);
            loop {
                interval.tick().await;
                cache.cleanup();
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn preview(title: &str) -> LinkPreview {
        LinkPreview {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    #[test]
    fn hit_within_ttl() {
        let cache = PreviewCache::new(Duration::from_secs(3600));
        cache.insert("https://a", preview("A"));
        assert_eq!(cache.get("https://a"), Some(preview("A")));
        assert_eq!(cache.get("https://b"), None);
    }

    #[test]
    fn expired_entry_is_a_miss_and_evicted() {
        let cache = PreviewCache::new(Duration::from_secs(60));
        cache.insert_at(
            "https://old",
            preview("old"),
            Instant::now() - Duration::from_secs(120),
        );
        assert_eq!(cache.get("https://old"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn cleanup_keeps_fresh_entries() {
        let cache = PreviewCache::new(Duration::from_secs(60));
        cache.insert("https://fresh", preview("fresh"));
        cache.insert_at(
            "https://stale",
            preview("stale"),
            Instant::now() - Duration::from_secs(120),
        );
        cache.cleanup();
        assert_eq!(cache.len(), 1);
        assert!(cache.get("https://fresh").is_some());
    }

    #[test]
    fn full_cache_evicts_the_oldest_entry() {
        let cache = PreviewCache::with_max_entries(Duration::from_secs(3600), 2);
        let now = Instant::now();
        cache.insert_at("https://first", preview("1"), now - Duration::from_secs(30));
        cache.insert_at("https://second", preview("2"), now - Duration::from_secs(20));
        cache.insert("https://third", preview("3"));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("https://first"), None);
        assert!(cache.get("https://second").is_some());
        assert!(cache.get("https://third").is_some());
    }

    #[test]
    fn distinct_urls_cannot_grow_the_cache_past_its_limit() {
        let cache = PreviewCache::with_max_entries(Duration::from_secs(3600), 64);
        for i in 0..1_000 {
            cache.insert(&format!("https://flood.example/?q={i}"), preview("x"));
        }
        assert_eq!(cache.len(), 64);
        assert!(cache.get("https://flood.example/?q=999").is_some());
    }

    #[test]
    fn refreshing_an_existing_url_does_not_evict() {
        let cache = PreviewCache::with_max_entries(Duration::from_secs(3600), 2);
        cache.insert("https://a", preview("A"));
        cache.insert("https://b", preview("B"));
        cache.insert("https://a", preview("A2"));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("https://a"), Some(preview("A2")));
        assert!(cache.get("https://b").is_some());
    }

    #[test]
    fn lookup_of_fresh_entry_keeps_it() {
        let cache = PreviewCache::new(Duration::from_secs(60));
        cache.insert("https://a", preview("fresh"));
        assert_eq!(cache.get("https://a"), Some(preview("fresh")));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = PreviewCache::new(Duration::from_secs(60));
        cache.insert("https://a", preview("A"));
        cache.clear();
        assert!(cache.is_empty());
    }
}
