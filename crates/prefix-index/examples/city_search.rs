//! Example demonstrating autocomplete search over a city index
//!
//! Builds an index from a small set of city records (or from a JSON file
//! passed as the first argument), then pages through the matches for a
//! query prefix.
//!
//! Usage:
//!   cargo run --example city_search -p prefix-index -- [cities.json] [query]

use std::fs::File;
use std::io::BufReader;

use prefix_index::{BulkLoader, IndexConfig, IndexEntry, IndexTree, Place};

const SAMPLE_CITIES: &str = r#"[
    {"_id":2759794,"name":"Amsterdam","country":"NL","coord":{"lon":4.88969,"lat":52.374031}},
    {"_id":2759661,"name":"Amstelveen","country":"NL","coord":{"lon":4.856383,"lat":52.301208}},
    {"_id":2745912,"name":"Utrecht","country":"NL","coord":{"lon":5.121421,"lat":52.090737}},
    {"_id":2747373,"name":"Den Haag","country":"NL","coord":{"lon":4.29861,"lat":52.080277}},
    {"_id":2743477,"name":"Zwolle","country":"NL","coord":{"lon":6.091944,"lat":52.5125}},
    {"_id":703448,"name":"Kyiv","country":"UA","coord":{"lon":30.516667,"lat":50.433334}},
    {"_id":707860,"name":"Hurzuf","country":"UA","coord":{"lon":34.283333,"lat":44.549999}},
    {"_id":698740,"name":"Odesa","country":"UA","coord":{"lon":30.732622,"lat":46.477474}}
]"#;

const PAGE_SIZE: usize = 3;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = std::env::args().skip(1);
    let (source, query) = match (args.next(), args.next()) {
        (Some(path), Some(query)) => (Some(path), query),
        (Some(query), None) => (None, query),
        _ => (None, "am".to_string()),
    };

    let dir = tempfile::tempdir()?;
    let mut tree: IndexTree<Place> = IndexTree::open(IndexConfig::new(dir.path().join("cities")))?;

    println!("=== Building city index ===\n");
    let outcome = match source {
        Some(path) => {
            println!("Loading records from {path}");
            let reader = BufReader::new(File::open(path)?);
            BulkLoader::new(&mut tree).run(reader, report_progress)?
        }
        None => {
            println!("Loading built-in sample records");
            BulkLoader::new(&mut tree).run(SAMPLE_CITIES.as_bytes(), report_progress)?
        }
    };
    println!("Load finished: {outcome:?}\n");

    println!("=== Matches for '{query}' ===\n");
    let mut cursor: Option<String> = None;
    let mut page_number = 0;
    loop {
        let page = tree.filter_forward(&query, cursor.as_deref(), PAGE_SIZE)?;
        if page.is_empty() {
            break;
        }
        page_number += 1;
        println!("Page {page_number}:");
        for place in &page {
            println!(
                "  {:<24} ({:.3}, {:.3})",
                place.label(),
                place.coord.lon,
                place.coord.lat
            );
        }
        cursor = page.last().map(|p| p.key().to_owned());
    }
    if page_number == 0 {
        println!("(no matches)");
    }

    Ok(())
}

fn report_progress(ordinal: u64, place: &Place) {
    if ordinal % 10_000 == 0 {
        println!("  ... {ordinal} records (at {})", place.label());
    }
}
