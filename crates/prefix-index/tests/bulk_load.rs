#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]
//! Integration tests for the streaming bulk loader
//!
//! Feeds JSON array sources through [`BulkLoader`] and checks the
//! all-or-nothing contract: a completed load is queryable, while parse
//! errors and cancellations leave no index behind.

use std::path::Path;

use prefix_index::{BulkLoader, BulkOutcome, Error, IndexConfig, IndexTree, Place};

const CITIES: &str = r#"[
    {"_id":707860,"name":"Hurzuf","country":"UA","coord":{"lon":34.283333,"lat":44.549999}},
    {"_id":2759794,"name":"Amsterdam","country":"NL","coord":{"lon":4.88969,"lat":52.374031}},
    {"_id":2747373,"name":"Den Haag","country":"NL","coord":{"lon":4.29861,"lat":52.080277}},
    {"_id":2759661,"name":"Amstelveen","country":"NL","coord":{"lon":4.856383,"lat":52.301208}},
    {"_id":703448,"name":"Kyiv","country":"UA","coord":{"lon":30.516667,"lat":50.433334}}
]"#;

fn open_tree(dir: &Path) -> IndexTree<Place> {
    IndexTree::open(IndexConfig::new(dir.join("index"))).expect("failed to open index")
}

#[test]
fn test_bulk_load_end_to_end() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut tree = open_tree(dir.path());

    let mut ordinals = Vec::new();
    let outcome = BulkLoader::new(&mut tree)
        .run(CITIES.as_bytes(), |ordinal, _place: &Place| {
            ordinals.push(ordinal);
        })
        .expect("bulk load failed");

    assert_eq!(outcome, BulkOutcome::Completed { inserted: 5 });
    assert_eq!(ordinals, [1, 2, 3, 4, 5]);

    let hits = tree.filter_forward("ams", None, 10).expect("query failed");
    let names: Vec<&str> = hits.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Amstelveen", "Amsterdam"]);

    // The session flushed to disk on completion.
    assert!(dir.path().join("index/h/u/r/entries.json").is_file());
    assert!(dir.path().join("index/k/y/i/count.json").is_file());
}

#[test]
fn test_malformed_source_discards_the_index() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut tree = open_tree(dir.path());

    let broken = r#"[{"_id":1,"name":"Ede","country":"NL"},{"_id":2,"name":"#;
    let result = BulkLoader::new(&mut tree).run(broken.as_bytes(), |_, _: &Place| {});

    assert!(matches!(result, Err(Error::Json(_))));
    assert!(!dir.path().join("index").exists());

    // The tree stays usable for a fresh attempt.
    let outcome = BulkLoader::new(&mut tree)
        .run(CITIES.as_bytes(), |_, _: &Place| {})
        .expect("retry failed");
    assert_eq!(outcome, BulkOutcome::Completed { inserted: 5 });
}

#[test]
fn test_cancellation_discards_and_allows_retry() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut tree = open_tree(dir.path());

    let loader = BulkLoader::new(&mut tree);
    let token = loader.token();
    let outcome = loader
        .run(CITIES.as_bytes(), |ordinal, _: &Place| {
            if ordinal == 3 {
                token.cancel();
            }
        })
        .expect("cancelled load should not error");

    assert_eq!(outcome, BulkOutcome::Cancelled);
    assert!(!dir.path().join("index").exists());

    let outcome = BulkLoader::new(&mut tree)
        .run(CITIES.as_bytes(), |_, _: &Place| {})
        .expect("retry failed");
    assert_eq!(outcome, BulkOutcome::Completed { inserted: 5 });
    let hits = tree.filter_forward("kyi", None, 10).expect("query failed");
    assert_eq!(hits.len(), 1);
}

#[test]
fn test_empty_array_completes_with_nothing_inserted() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut tree = open_tree(dir.path());

    let outcome = BulkLoader::new(&mut tree)
        .run(b"[]".as_slice(), |_, _: &Place| {})
        .expect("bulk load failed");

    assert_eq!(outcome, BulkOutcome::Completed { inserted: 0 });
    assert!(dir.path().join("index").exists());
    assert!(
        tree.filter_forward("", None, 10)
            .expect("query failed")
            .is_empty()
    );
}

#[test]
fn test_duplicate_records_collapse_in_the_index() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut tree = open_tree(dir.path());

    let twice = r#"[
        {"_id":1,"name":"Gouda","country":"NL"},
        {"_id":1,"name":"Gouda","country":"NL"}
    ]"#;
    let outcome = BulkLoader::new(&mut tree)
        .run(twice.as_bytes(), |_, _: &Place| {})
        .expect("bulk load failed");

    // Both records were read, but the bucket set keeps one.
    assert_eq!(outcome, BulkOutcome::Completed { inserted: 2 });
    let hits = tree.filter_forward("gou", None, 10).expect("query failed");
    assert_eq!(hits.len(), 1);
}

#[test]
fn test_load_into_an_active_session_is_rejected() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let mut tree = open_tree(dir.path());

    tree.insert(Place::new(1, "Meppel", "NL")).expect("insert failed");
    tree.begin_bulk().expect("begin_bulk failed");

    let result = BulkLoader::new(&mut tree).run(CITIES.as_bytes(), |_, _: &Place| {});
    assert!(matches!(result, Err(Error::BulkSessionActive)));

    // Rejection must not touch existing data.
    tree.end_bulk().expect("end_bulk failed");
    let hits = tree.filter_forward("mep", None, 10).expect("query failed");
    assert_eq!(hits.len(), 1);
}
