//! Bucket identifiers.
//!
//! A bucket is addressed by the leading characters of a normalized key, one
//! directory segment per character, capped at [`MAX_DEPTH`]. Keys shorter
//! than the cap live in a correspondingly shallower bucket; every entry whose
//! key shares the same capped prefix lands in the same bucket.

use std::fmt;
use std::path::{Component, Path, PathBuf};

/// Maximum number of key characters used to address a bucket.
pub const MAX_DEPTH: usize = 3;

/// Identifier of one storage bucket.
///
/// Wraps the bucket's key prefix. Ordering is the byte order of the UTF-8
/// prefix, which equals code-point order, so sorting bucket ids yields the
/// depth-first pre-order of the on-disk tree and stays consistent with entry
/// key order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BucketId {
    prefix: String,
}

impl BucketId {
    /// Resolve the bucket for a normalized key or filter prefix.
    ///
    /// Takes the first `min(MAX_DEPTH, len)` characters. An empty input
    /// resolves to the index root.
    pub fn for_key(key: &str) -> Self {
        Self {
            prefix: key.chars().take(MAX_DEPTH).collect(),
        }
    }

    /// The index root (empty prefix).
    pub fn root() -> Self {
        Self {
            prefix: String::new(),
        }
    }

    /// The key prefix this bucket covers.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Number of path segments, 0 for the root.
    pub fn depth(&self) -> usize {
        self.prefix.chars().count()
    }

    /// Whether this is the index root.
    pub fn is_root(&self) -> bool {
        self.prefix.is_empty()
    }

    /// Whether this bucket equals `ancestor` or lies beneath it.
    pub fn is_within(&self, ancestor: &Self) -> bool {
        self.prefix.starts_with(&ancestor.prefix)
    }

    /// Relative directory path below the index root, one segment per
    /// character. The root maps to the empty path.
    pub fn rel_path(&self) -> PathBuf {
        let mut path = PathBuf::new();
        for c in self.prefix.chars() {
            path.push(c.to_string());
        }
        path
    }

    /// Parse a bucket id back from a relative directory path.
    ///
    /// Returns `None` if any component is not a single character or the
    /// depth exceeds [`MAX_DEPTH`] — such paths were not created by the
    /// index and are skipped during enumeration.
    pub fn from_rel_path(rel: &Path) -> Option<Self> {
        let mut prefix = String::new();
        let mut depth = 0;
        for component in rel.components() {
            let Component::Normal(name) = component else {
                return None;
            };
            let mut chars = name.to_str()?.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            prefix.push(c);
            depth += 1;
            if depth > MAX_DEPTH {
                return None;
            }
        }
        Some(Self { prefix })
    }
}

impl fmt::Display for BucketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.prefix.chars().enumerate() {
            if i > 0 {
                f.write_str("/")?;
            }
            write!(f, "{c}")?;
        }
        Ok(())
    }
}
