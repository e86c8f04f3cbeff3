//! Q-matrix row cache
//!
//! The SVR dual works on a 2n x 2n matrix Q whose rows are derived from the
//! precomputed kernel. Rows are built on demand and kept in an LRU cache whose
//! capacity is derived from a memory budget, the same role `cache_size` plays
//! in libsvm.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Arc;

/// Minimum number of rows kept; each solver step touches two rows
const MIN_ROWS: usize = 2;

/// LRU cache of Q-matrix rows keyed by dual variable index
pub struct RowCache {
    cache: LruCache<usize, Arc<[f64]>>,
    hits: u64,
    misses: u64,
}

impl RowCache {
    /// Create a cache holding at most `capacity` rows
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(MIN_ROWS)).unwrap_or(NonZeroUsize::MIN);
        Self {
            cache: LruCache::new(capacity),
            hits: 0,
            misses: 0,
        }
    }

    /// Create a cache sized from a budget in megabytes for rows of `row_len` values
    pub fn with_memory_limit(megabytes: usize, row_len: usize) -> Self {
        let bytes = megabytes.saturating_mul(1024 * 1024);
        let row_bytes = row_len.max(1) * std::mem::size_of::<f64>();
        Self::new(bytes / row_bytes)
    }

    /// Get row `i`, building it with `build` on a miss
    pub fn get_or_insert_with<F>(&mut self, i: usize, build: F) -> Arc<[f64]>
    where
        F: FnOnce() -> Vec<f64>,
    {
        if let Some(row) = self.cache.get(&i) {
            self.hits += 1;
            return Arc::clone(row);
        }

        self.misses += 1;
        let row: Arc<[f64]> = build().into();
        self.cache.put(i, Arc::clone(&row));
        row
    }

    /// Get cache hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits,
            misses: self.misses,
            capacity: self.cache.cap().get(),
            size: self.cache.len(),
        }
    }
}

/// Cache statistics
#[derive(Debug, Clone)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub capacity: usize,
    pub size: usize,
}
