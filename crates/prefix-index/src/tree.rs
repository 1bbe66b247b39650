//! Query and insert façade over the storage engine.

use tracing::trace;

use crate::bucket::BucketId;
use crate::config::IndexConfig;
use crate::entry::IndexEntry;
use crate::error::Result;
use crate::normalize::normalize_key;
use crate::storage::FsStorage;

/// A prefix-sharded index over entries of type `T`.
///
/// Wraps the storage engine with key derivation on insert and the ordered,
/// resumable prefix walk on query. Mutations take `&mut self`; concurrent
/// use requires an external lock (single-writer discipline).
pub struct IndexTree<T> {
    storage: FsStorage<T>,
}

impl<T: IndexEntry> IndexTree<T> {
    /// Open an index rooted at the configured directory.
    pub fn open(config: IndexConfig) -> Result<Self> {
        Ok(Self {
            storage: FsStorage::open(config)?,
        })
    }

    /// Insert one entry into its home bucket.
    pub fn insert(&mut self, entry: T) -> Result<()> {
        let id = BucketId::for_key(entry.key());
        self.storage.add(&id, entry)
    }

    /// Ordered, resumable prefix query.
    ///
    /// Returns up to `limit` entries whose keys start with the normalized
    /// `filter`, in global key order. `resume_after` carries the key of the
    /// last entry of the previous page: `None` starts at the first match,
    /// `Some(key)` resumes exclusively after the first entry bearing that
    /// key. An empty result signals the end of the matches.
    ///
    /// The filter is normalized internally; passing an already-normalized
    /// filter is equivalent since normalization is idempotent.
    pub fn filter_forward(
        &self,
        filter: &str,
        resume_after: Option<&str>,
        limit: usize,
    ) -> Result<Vec<T>> {
        let filter = normalize_key(filter);
        let resume = resume_after.unwrap_or_default();
        trace!("filter_forward filter='{filter}' resume='{resume}' limit={limit}");

        let mut matches = Vec::new();
        if limit == 0 {
            return Ok(matches);
        }

        let mut reading = false;
        'walk: for bucket in self.storage.enumerate(&BucketId::for_key(&filter))? {
            let entries: Vec<T> = self.storage.read_all(&bucket)?.into_iter().collect();
            let mut position = 0;
            if !reading {
                if resume.is_empty() {
                    // First page: start inclusively at the first match.
                    let Some(first) = entries.iter().position(|e| e.key().starts_with(&filter))
                    else {
                        continue;
                    };
                    position = first;
                } else {
                    // Resume exclusively after the cursor key; if this
                    // bucket does not contain it, rescan the next one.
                    let Some(found) = entries.iter().position(|e| e.key() == resume) else {
                        continue;
                    };
                    position = found + 1;
                }
                reading = true;
            }
            for entry in entries.into_iter().skip(position) {
                // In a globally sorted walk the first non-matching key ends
                // the query, not just the bucket.
                if !entry.key().starts_with(&filter) {
                    break 'walk;
                }
                matches.push(entry);
                if matches.len() == limit {
                    break 'walk;
                }
            }
        }
        Ok(matches)
    }

    /// Start a bulk insert session. Fails if one is already active.
    pub fn begin_bulk(&mut self) -> Result<()> {
        self.storage.begin_bulk()
    }

    /// Finish a bulk insert session, flushing the write-back cache.
    pub fn end_bulk(&mut self) -> Result<()> {
        self.storage.end_bulk()
    }

    /// Delete the entire index. Idempotent; also ends any bulk session.
    pub fn delete(&mut self) -> Result<()> {
        self.storage.delete()
    }
}
