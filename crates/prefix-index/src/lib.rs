//! Disk-backed, prefix-sharded index for autocomplete search
//!
//! Entries are sharded into nested bucket directories by the first characters
//! of their normalized key, at most [`MAX_DEPTH`] levels deep. Each bucket
//! directory holds two JSON artifacts:
//!
//! ```text
//! <base>/a/m/s/entries.json    sorted JSON array of entries
//! <base>/a/m/s/count.json      {"count": N}
//! ```
//!
//! [`IndexTree`] is the main entry point: it derives bucket placement on
//! insert and answers ordered, resumable prefix queries through
//! [`filter_forward`](IndexTree::filter_forward). [`BulkLoader`] streams a
//! JSON array source into the index under a bulk session, during which
//! bucket writes are batched through a bounded write-back cache.
//!
//! # Example
//!
//! ```rust,ignore
//! use prefix_index::{IndexConfig, IndexEntry, IndexTree, Place};
//!
//! let mut tree: IndexTree<Place> = IndexTree::open(IndexConfig::new("./index"))?;
//! tree.insert(Place::new(707_860, "Hurzuf", "UA"))?;
//!
//! // First page, then resume after the key of the last hit.
//! let page = tree.filter_forward("hur", None, 20)?;
//! let next = tree.filter_forward("hur", page.last().map(|p| p.key()), 20)?;
//! ```

#![warn(missing_docs)]

use std::path::PathBuf;

pub mod bucket;
pub mod bulk;
pub mod config;
pub mod entry;
pub mod error;
pub mod normalize;
pub mod storage;
pub mod tree;

pub use bucket::{BucketId, MAX_DEPTH};
pub use bulk::{BulkLoader, BulkOutcome, CancelToken};
pub use config::IndexConfig;
pub use entry::{Coord, IndexEntry, Place};
pub use error::{Error, Result};
pub use normalize::normalize_key;
pub use storage::FsStorage;
pub use tree::IndexTree;

/// Get the default index directory under the platform cache location
///
/// Returns a path like:
/// - Linux: `~/.cache/prefix-index`
/// - macOS: `~/Library/Caches/prefix-index`
/// - Windows: `C:\Users\{user}\AppData\Local\prefix-index`
pub fn default_index_dir() -> Result<PathBuf> {
    dirs::cache_dir()
        .ok_or(Error::CacheDirectoryNotFound)
        .map(|dir| dir.join("prefix-index"))
}
