//! Streaming bulk loader for JSON array sources.
//!
//! Reads entries one at a time from a [`std::io::Read`] source holding a JSON
//! array, inserting each into the index under an active bulk session so the
//! write-back cache absorbs the churn. The load is all-or-nothing: a parse
//! error, a storage error, or a cancellation discards the entire index.

use std::fmt;
use std::io::Read;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserializer as _;
use serde::de::{self, SeqAccess, Visitor};
use tracing::{info, warn};

use crate::entry::IndexEntry;
use crate::error::{Error, Result};
use crate::tree::IndexTree;

/// Shared cancellation flag for an in-flight bulk load.
///
/// Clones observe the same flag, so a token handed out before the load can
/// stop it from another thread or from within the progress callback.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    flag: Arc<AtomicBool>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. The loader stops before reading the next entry.
    pub fn cancel(&self) {
        self.flag.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }
}

/// How a bulk load ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BulkOutcome {
    /// The whole source was read and flushed to disk.
    Completed {
        /// Number of entries inserted.
        inserted: u64,
    },
    /// The token was triggered; the partially built index was discarded.
    Cancelled,
}

/// Drives a bulk load of one JSON array into an index.
pub struct BulkLoader<'a, T> {
    tree: &'a mut IndexTree<T>,
    token: CancelToken,
}

impl<'a, T: IndexEntry> BulkLoader<'a, T> {
    /// Create a loader with a fresh cancellation token.
    pub fn new(tree: &'a mut IndexTree<T>) -> Self {
        Self::with_token(tree, CancelToken::new())
    }

    /// Create a loader observing an existing token.
    pub fn with_token(tree: &'a mut IndexTree<T>, token: CancelToken) -> Self {
        Self { tree, token }
    }

    /// A handle to this loader's cancellation token.
    pub fn token(&self) -> CancelToken {
        self.token.clone()
    }

    /// Stream the JSON array in `source` into the index.
    ///
    /// `progress` is called once per entry, before it is inserted, with a
    /// 1-based ordinal. On success the session is flushed and
    /// [`BulkOutcome::Completed`] reports the total. On cancellation the
    /// index is deleted and [`BulkOutcome::Cancelled`] is returned; any
    /// parse or storage error likewise deletes the index before propagating.
    ///
    /// Fails with [`Error::BulkSessionActive`] (leaving existing data
    /// untouched) if another bulk session is already running.
    pub fn run<R, F>(self, source: R, progress: F) -> Result<BulkOutcome>
    where
        R: Read,
        F: FnMut(u64, &T),
    {
        let Self { tree, token } = self;
        tree.begin_bulk()?;

        let mut session = LoadSession {
            tree,
            token,
            progress,
            inserted: 0,
            interrupt: None,
        };
        let mut deserializer = serde_json::Deserializer::from_reader(source);
        let parsed = deserializer.deserialize_seq(&mut session);

        let LoadSession {
            tree,
            inserted,
            interrupt,
            ..
        } = session;
        match parsed {
            Ok(()) => {
                if let Err(e) = tree.end_bulk() {
                    discard_index(tree);
                    return Err(e);
                }
                info!("bulk load complete: {inserted} entries");
                Ok(BulkOutcome::Completed { inserted })
            }
            Err(parse_error) => {
                discard_index(tree);
                match interrupt {
                    Some(Interrupt::Cancelled) => {
                        info!("bulk load cancelled after {inserted} entries");
                        Ok(BulkOutcome::Cancelled)
                    }
                    Some(Interrupt::Storage(e)) => Err(e),
                    None => Err(Error::Json(parse_error)),
                }
            }
        }
    }
}

/// Why the visitor bailed out of the sequence early.
enum Interrupt {
    Cancelled,
    Storage(Error),
}

/// Sequence visitor that inserts elements as they are parsed.
///
/// Deserializer errors cannot carry our own error types through, so the
/// visitor stashes the real cause in `interrupt` and surfaces a sentinel
/// error to stop the parse; `run` maps it back afterwards.
struct LoadSession<'a, T, F> {
    tree: &'a mut IndexTree<T>,
    token: CancelToken,
    progress: F,
    inserted: u64,
    interrupt: Option<Interrupt>,
}

impl<'de, T, F> Visitor<'de> for &mut LoadSession<'_, T, F>
where
    T: IndexEntry,
    F: FnMut(u64, &T),
{
    type Value = ();

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a JSON array of index entries")
    }

    fn visit_seq<A>(self, mut seq: A) -> std::result::Result<(), A::Error>
    where
        A: SeqAccess<'de>,
    {
        loop {
            if self.token.is_cancelled() {
                self.interrupt = Some(Interrupt::Cancelled);
                return Err(de::Error::custom("bulk load cancelled"));
            }
            let Some(entry) = seq.next_element::<T>()? else {
                return Ok(());
            };
            self.inserted += 1;
            (self.progress)(self.inserted, &entry);
            if let Err(e) = self.tree.insert(entry) {
                self.interrupt = Some(Interrupt::Storage(e));
                return Err(de::Error::custom("bulk load aborted by storage error"));
            }
        }
    }
}

/// Best-effort removal of a partially built index.
fn discard_index<T: IndexEntry>(tree: &mut IndexTree<T>) {
    if let Err(e) = tree.delete() {
        warn!("failed to discard partially built index: {e}");
    }
}

#[cfg(test)]
#[allow(clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_starts_clear() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
    }

    #[test]
    fn test_token_clones_share_the_flag() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }
}
