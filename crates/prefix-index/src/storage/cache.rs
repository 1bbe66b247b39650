//! Bounded write-back cache for bulk insert sessions.
//!
//! The cache holds whole buckets, not individual entries. A bucket is
//! admitted only while its entry count stays below the per-bucket limit;
//! reaching the global bucket limit signals the storage engine to flush
//! everything, so the cache never holds partial state across that boundary.

use std::collections::{BTreeSet, HashMap};

use crate::bucket::BucketId;

pub(crate) struct BulkCache<T> {
    buckets: HashMap<BucketId, BTreeSet<T>>,
    max_entries_per_bucket: usize,
    max_buckets: usize,
}

impl<T> BulkCache<T> {
    pub(crate) fn new(max_entries_per_bucket: usize, max_buckets: usize) -> Self {
        Self {
            buckets: HashMap::new(),
            max_entries_per_bucket,
            max_buckets,
        }
    }

    /// Whether a bucket of `entry_count` entries may be cache-resident.
    pub(crate) fn admits(&self, entry_count: usize) -> bool {
        entry_count < self.max_entries_per_bucket
    }

    /// Whether the global bucket limit has been reached.
    pub(crate) fn at_capacity(&self) -> bool {
        self.buckets.len() >= self.max_buckets
    }

    pub(crate) fn get(&self, id: &BucketId) -> Option<&BTreeSet<T>> {
        self.buckets.get(id)
    }

    pub(crate) fn insert(&mut self, id: BucketId, entries: BTreeSet<T>) {
        self.buckets.insert(id, entries);
    }

    pub(crate) fn remove(&mut self, id: &BucketId) {
        self.buckets.remove(id);
    }

    /// Hand over every cached bucket, leaving the cache empty.
    pub(crate) fn take_all(&mut self) -> HashMap<BucketId, BTreeSet<T>> {
        std::mem::take(&mut self.buckets)
    }

    pub(crate) fn bucket_ids(&self) -> impl Iterator<Item = &BucketId> {
        self.buckets.keys()
    }

    pub(crate) fn len(&self) -> usize {
        self.buckets.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub(crate) fn clear(&mut self) {
        self.buckets.clear();
    }
}
