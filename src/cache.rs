//! Route name lookup caching
//!
//! `find` and `reverse` resolve colon-separated names by walking the tree
//! level by level. The result is memoised here with LRU eviction; any change
//! to the tree clears the cache.

use crate::route::NodeId;
use crate::trace_log;
use lru::LruCache;
use std::num::NonZeroUsize;

/// Cache performance statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub invalidations: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Name to node cache with LRU eviction
///
/// Default capacity: 1000 entries.
#[derive(Debug)]
pub struct RouteCache {
    names: LruCache<String, NodeId>,
    stats: CacheStats,
}

impl RouteCache {
    const DEFAULT_CAPACITY: usize = 1000;

    pub fn new() -> Self {
        Self::with_capacity(Self::DEFAULT_CAPACITY)
    }

    /// Create a cache holding up to `capacity` names (at least one)
    pub fn with_capacity(capacity: usize) -> Self {
        let cap = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            names: LruCache::new(cap),
            stats: CacheStats::default(),
        }
    }

    pub fn clear(&mut self) {
        if self.names.is_empty() {
            return;
        }
        trace_log!("Clearing route name cache");
        self.names.clear();
        self.stats.invalidations += 1;
    }

    pub fn get(&mut self, name: &str) -> Option<NodeId> {
        if let Some(id) = self.names.get(name) {
            self.stats.hits += 1;
            trace_log!("Name cache hit for '{}'", name);
            Some(*id)
        } else {
            self.stats.misses += 1;
            trace_log!("Name cache miss for '{}'", name);
            None
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, id: NodeId) {
        self.names.put(name.into(), id);
    }

    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = CacheStats::default();
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl Default for RouteCache {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for RouteCache {
    fn clone(&self) -> Self {
        Self {
            names: LruCache::new(self.names.cap()),
            stats: self.stats.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MuxConfig;
    use crate::handler::Body;
    use crate::route::RouteTree;
    use http::{Method, Request, Response};

    fn node_ids(count: usize) -> Vec<NodeId> {
        let mut tree = RouteTree::new();
        (0..count)
            .map(|i| {
                tree.attach_child(
                    None,
                    Method::GET,
                    &format!("/n{}", i),
                    |_req: Request<Body>| Response::new(Body::new()),
                    &MuxConfig::default(),
                )
                .unwrap()
            })
            .collect()
    }

    #[test]
    fn test_cache_creation() {
        let cache = RouteCache::new();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().hits, 0);
    }

    #[test]
    fn test_cache_miss() {
        let mut cache = RouteCache::new();
        assert!(cache.get("users").is_none());
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn test_cache_hit() {
        let ids = node_ids(1);
        let mut cache = RouteCache::new();
        cache.insert("users:detail", ids[0]);

        assert_eq!(cache.get("users:detail"), Some(ids[0]));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn test_cache_clear() {
        let ids = node_ids(1);
        let mut cache = RouteCache::new();
        cache.insert("users", ids[0]);
        assert_eq!(cache.len(), 1);

        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.stats().invalidations, 1);

        // Clearing an empty cache is not an invalidation
        cache.clear();
        assert_eq!(cache.stats().invalidations, 1);
    }

    #[test]
    fn test_lru_eviction() {
        let ids = node_ids(3);
        let mut cache = RouteCache::with_capacity(2);
        cache.insert("a", ids[0]);
        cache.insert("b", ids[1]);
        cache.get("a");
        cache.insert("c", ids[2]);

        assert_eq!(cache.get("a"), Some(ids[0]));
        assert!(cache.get("b").is_none());
        assert_eq!(cache.get("c"), Some(ids[2]));
    }

    #[test]
    fn test_hit_rate_calculation() {
        let ids = node_ids(2);
        let mut cache = RouteCache::new();
        cache.get("a");
        cache.get("b");
        cache.get("c");

        cache.insert("a", ids[0]);
        cache.insert("b", ids[1]);

        cache.get("a");
        cache.get("b");

        assert_eq!(cache.stats().hits, 2);
        assert_eq!(cache.stats().misses, 3);
        assert!((cache.stats().hit_rate() - 0.4).abs() < 0.001);
    }

    #[test]
    fn test_clone_starts_empty() {
        let ids = node_ids(1);
        let mut cache = RouteCache::with_capacity(5);
        cache.insert("a", ids[0]);
        cache.get("a");

        let cloned = cache.clone();
        assert!(cloned.is_empty());
        assert_eq!(cloned.stats().hits, 1);
    }
}
