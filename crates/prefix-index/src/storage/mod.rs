//! Storage engine: per-bucket artifacts, bulk write-back cache, enumeration.

mod cache;
mod fs;

pub use fs::{COUNT_FILE_NAME, ENTRIES_FILE_NAME, FsStorage};
