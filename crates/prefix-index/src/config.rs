//! Configuration for an on-disk index.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default cap on the entry count of a cache-resident bucket.
pub const DEFAULT_MAX_CACHED_ENTRIES_PER_BUCKET: usize = 1000;

/// Default cap on the number of cache-resident buckets.
pub const DEFAULT_MAX_CACHED_BUCKETS: usize = 300;

/// Configuration for one index instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Root directory of the index tree.
    pub base_dir: PathBuf,

    /// Remove any pre-existing tree under `base_dir` when opening.
    pub wipe_existing: bool,

    /// A bucket stays cache-resident during a bulk session only while its
    /// entry count is below this limit.
    pub max_cached_entries_per_bucket: usize,

    /// Reaching this many cache-resident buckets flushes the whole cache.
    pub max_cached_buckets: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("./index"),
            wipe_existing: false,
            max_cached_entries_per_bucket: DEFAULT_MAX_CACHED_ENTRIES_PER_BUCKET,
            max_cached_buckets: DEFAULT_MAX_CACHED_BUCKETS,
        }
    }
}

impl IndexConfig {
    /// Create a configuration rooted at `base_dir`.
    pub fn new<P: AsRef<Path>>(base_dir: P) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            ..Default::default()
        }
    }

    /// Wipe any pre-existing tree when opening.
    #[must_use]
    pub const fn with_wipe_existing(mut self, wipe: bool) -> Self {
        self.wipe_existing = wipe;
        self
    }

    /// Override the bulk cache bounds.
    #[must_use]
    pub const fn with_cache_limits(mut self, entries_per_bucket: usize, buckets: usize) -> Self {
        self.max_cached_entries_per_bucket = entries_per_bucket;
        self.max_cached_buckets = buckets;
        self
    }
}
