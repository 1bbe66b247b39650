//! Filesystem-backed storage engine.
//!
//! Each bucket is a directory holding two artifacts, both rewritten in full
//! on every write:
//!
//! - [`ENTRIES_FILE_NAME`] — the bucket's sorted entry set as a JSON array;
//! - [`COUNT_FILE_NAME`] — `{"count": N}`, kept equal to the entry count so
//!   callers learn bucket sizes without scanning entries.
//!
//! Windowed reads stream the entry array element by element instead of
//! materializing the whole bucket; skipped and trailing elements are consumed
//! as [`IgnoredAny`].

use std::collections::BTreeSet;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use serde::de::{IgnoredAny, SeqAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::bucket::BucketId;
use crate::config::IndexConfig;
use crate::entry::IndexEntry;
use crate::error::{Error, Result};
use crate::storage::cache::BulkCache;

/// File holding a bucket's full entry array.
pub const ENTRIES_FILE_NAME: &str = "entries.json";

/// File holding a bucket's entry count.
pub const COUNT_FILE_NAME: &str = "count.json";

/// The persisted count artifact.
#[derive(Serialize, Deserialize)]
struct BucketCount {
    count: usize,
}

/// Filesystem-backed bucket storage.
///
/// All mutating operations take `&mut self`; the engine is single-writer by
/// construction and callers share it across threads behind a lock of their
/// own choosing.
pub struct FsStorage<T> {
    base_dir: PathBuf,
    cache: BulkCache<T>,
    bulk_active: bool,
}

impl<T: IndexEntry> FsStorage<T> {
    /// Open (and if configured, wipe) the index root.
    pub fn open(config: IndexConfig) -> Result<Self> {
        if config.wipe_existing && config.base_dir.exists() {
            fs::remove_dir_all(&config.base_dir)?;
        }
        fs::create_dir_all(&config.base_dir)?;
        debug!("opened index storage at {}", config.base_dir.display());
        Ok(Self {
            cache: BulkCache::new(
                config.max_cached_entries_per_bucket,
                config.max_cached_buckets,
            ),
            base_dir: config.base_dir,
            bulk_active: false,
        })
    }

    /// Root directory of this index.
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    /// Number of entries in a bucket, without touching the entry artifact.
    ///
    /// Cache-resident buckets answer from memory; otherwise the persisted
    /// count is read. A bucket that has never been written counts 0.
    pub fn count(&self, id: &BucketId) -> Result<usize> {
        if let Some(entries) = self.cache.get(id) {
            return Ok(entries.len());
        }
        let path = self.bucket_dir(id).join(COUNT_FILE_NAME);
        if !path.exists() {
            return Ok(0);
        }
        let file = File::open(&path)?;
        let BucketCount { count } = serde_json::from_reader(BufReader::new(file))?;
        Ok(count)
    }

    /// Read up to `limit` entries starting at ordinal `start` within the
    /// bucket's sorted order.
    ///
    /// Cache-resident buckets are sliced in memory. On-disk buckets are
    /// streamed: exactly `start` elements are skipped, then up to `limit`
    /// decoded. A bucket that does not exist reads as empty.
    pub fn read(&self, id: &BucketId, start: usize, limit: usize) -> Result<BTreeSet<T>> {
        if let Some(entries) = self.cache.get(id) {
            return Ok(entries.iter().skip(start).take(limit).cloned().collect());
        }
        let path = self.bucket_dir(id).join(ENTRIES_FILE_NAME);
        if !path.exists() {
            return Ok(BTreeSet::new());
        }
        let file = File::open(&path)?;
        let mut deserializer = serde_json::Deserializer::from_reader(BufReader::new(file));
        let entries = deserializer.deserialize_seq(WindowVisitor {
            skip: start,
            take: limit,
            marker: PhantomData,
        })?;
        Ok(entries)
    }

    /// Read a bucket's entire entry set.
    pub fn read_all(&self, id: &BucketId) -> Result<BTreeSet<T>> {
        self.read(id, 0, usize::MAX)
    }

    /// Insert one entry into its bucket.
    ///
    /// Reads the current set, inserts (a no-op when an equal entry is
    /// already present) and writes the set back under the bulk cache policy.
    pub fn add(&mut self, id: &BucketId, entry: T) -> Result<()> {
        let mut entries = self.read_all(id)?;
        entries.insert(entry);
        self.store(id, entries)
    }

    /// Every bucket at or beneath `start` currently holding at least one
    /// entry, in depth-first pre-order with children sorted by id.
    ///
    /// The order equals lexicographic order of the bucket prefixes, which is
    /// consistent with entry key order across buckets. During a bulk session
    /// cache-resident buckets are included even when nothing has been
    /// flushed for them yet.
    pub fn enumerate(&self, start: &BucketId) -> Result<Vec<BucketId>> {
        let mut candidates = BTreeSet::new();
        let start_dir = self.bucket_dir(start);
        if start_dir.is_dir() {
            for dent in WalkDir::new(&start_dir) {
                let dent = dent?;
                if !dent.file_type().is_dir() {
                    continue;
                }
                let Ok(rel) = dent.path().strip_prefix(&self.base_dir) else {
                    continue;
                };
                if let Some(id) = BucketId::from_rel_path(rel) {
                    candidates.insert(id);
                }
            }
        }
        for id in self.cache.bucket_ids() {
            if id.is_within(start) {
                candidates.insert(id.clone());
            }
        }
        let mut populated = Vec::new();
        for id in candidates {
            if self.count(&id)? > 0 {
                populated.push(id);
            }
        }
        trace!("enumerated {} populated buckets under '{start}'", populated.len());
        Ok(populated)
    }

    /// Remove every artifact under the index root. Idempotent.
    ///
    /// Also discards the bulk cache and ends any active session, so nothing
    /// can resurrect deleted buckets and a new session can start cleanly.
    pub fn delete(&mut self) -> Result<()> {
        self.cache.clear();
        self.bulk_active = false;
        if self.base_dir.exists() {
            fs::remove_dir_all(&self.base_dir)?;
        }
        debug!("deleted index at {}", self.base_dir.display());
        Ok(())
    }

    /// Start a bulk insert session, enabling the write-back cache.
    pub fn begin_bulk(&mut self) -> Result<()> {
        if self.bulk_active {
            return Err(Error::BulkSessionActive);
        }
        self.bulk_active = true;
        debug!("bulk insert session started");
        Ok(())
    }

    /// Finish a bulk insert session, flushing and discarding the cache.
    ///
    /// A no-op when no session is active.
    pub fn end_bulk(&mut self) -> Result<()> {
        self.flush_cache()?;
        self.bulk_active = false;
        debug!("bulk insert session finished");
        Ok(())
    }

    fn bucket_dir(&self, id: &BucketId) -> PathBuf {
        self.base_dir.join(id.rel_path())
    }

    /// Write back a bucket's set, caching it when the policy allows.
    ///
    /// Cache-resident is only possible during a bulk session and only while
    /// the set stays below the per-bucket limit; anything else is written
    /// through and dropped from the cache. Filling the cache to the global
    /// bucket limit flushes all of it.
    fn store(&mut self, id: &BucketId, entries: BTreeSet<T>) -> Result<()> {
        if self.bulk_active && self.cache.admits(entries.len()) {
            self.cache.insert(id.clone(), entries);
            if self.cache.at_capacity() {
                self.flush_cache()?;
            }
            return Ok(());
        }
        self.write_bucket(id, &entries)?;
        self.cache.remove(id);
        Ok(())
    }

    fn flush_cache(&mut self) -> Result<()> {
        if self.cache.is_empty() {
            return Ok(());
        }
        debug!("flushing {} cached buckets", self.cache.len());
        for (id, entries) in self.cache.take_all() {
            self.write_bucket(&id, &entries)?;
        }
        Ok(())
    }

    /// Persist both artifacts, count before entries.
    fn write_bucket(&self, id: &BucketId, entries: &BTreeSet<T>) -> Result<()> {
        let dir = self.bucket_dir(id);
        fs::create_dir_all(&dir)?;

        let count = File::create(dir.join(COUNT_FILE_NAME))?;
        let mut writer = BufWriter::new(count);
        serde_json::to_writer(
            &mut writer,
            &BucketCount {
                count: entries.len(),
            },
        )?;
        writer.flush()?;

        let file = File::create(dir.join(ENTRIES_FILE_NAME))?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, entries)?;
        writer.flush()?;

        trace!("wrote bucket '{id}' ({} entries)", entries.len());
        Ok(())
    }
}

/// Streams a window out of a bucket's JSON entry array.
struct WindowVisitor<T> {
    skip: usize,
    take: usize,
    marker: PhantomData<T>,
}

impl<'de, T: IndexEntry> Visitor<'de> for WindowVisitor<T> {
    type Value = BTreeSet<T>;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("an array of index entries")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<Self::Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut entries = BTreeSet::new();
        for _ in 0..self.skip {
            if seq.next_element::<IgnoredAny>()?.is_none() {
                return Ok(entries);
            }
        }
        while entries.len() < self.take {
            match seq.next_element::<T>()? {
                Some(entry) => {
                    entries.insert(entry);
                }
                None => return Ok(entries),
            }
        }
        // Consume the remainder so the deserializer sees a closed array.
        while seq.next_element::<IgnoredAny>()?.is_some() {}
        Ok(entries)
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;
    use crate::entry::Place;
    use tempfile::TempDir;

    fn open_storage(dir: &TempDir) -> FsStorage<Place> {
        FsStorage::open(IndexConfig::new(dir.path().join("index")))
            .expect("storage should open")
    }

    #[test]
    fn test_bucket_dir_mirrors_rel_path() {
        let dir = TempDir::new().expect("tempdir");
        let storage = open_storage(&dir);
        let id = BucketId::for_key("ams");
        assert_eq!(
            storage.bucket_dir(&id),
            dir.path().join("index").join("a").join("m").join("s")
        );
        assert_eq!(storage.bucket_dir(&BucketId::root()), storage.base_dir());
    }

    #[test]
    fn test_missing_bucket_reads_empty_without_side_effects() {
        let dir = TempDir::new().expect("tempdir");
        let storage = open_storage(&dir);
        let id = BucketId::for_key("zzz");
        assert_eq!(storage.count(&id).expect("count"), 0);
        assert!(storage.read_all(&id).expect("read").is_empty());
        assert!(!storage.bucket_dir(&id).exists());
    }

    #[test]
    fn test_window_visitor_drains_partial_reads() {
        let dir = TempDir::new().expect("tempdir");
        let mut storage = open_storage(&dir);
        let id = BucketId::for_key("dok");
        for i in 0..5 {
            storage
                .add(&id, Place::new(i, format!("Dokkum{i}"), "NL"))
                .expect("add");
        }
        let window = storage.read(&id, 1, 2).expect("windowed read");
        let ids: Vec<i64> = window.iter().map(|p| p.id).collect();
        assert_eq!(ids, [1, 2]);
    }
}
