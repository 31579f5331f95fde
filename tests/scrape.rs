use std::path::PathBuf;

use scraperlang::{ScrapeError, Scraper};

fn fixture(name: &str) -> PathBuf {
	PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join(name)
}

#[test]
fn run_scrape_file() {
	let result = Scraper.run_file(&fixture("hello.scrape"));
	assert!(result.is_ok(), "{result:?}");
}

#[test]
fn run_missing_file_is_a_startup_error() {
	let result = Scraper.run_file(&fixture("no_such.scrape"));
	assert!(matches!(result, Err(ScrapeError::InternalError(_))));
}
