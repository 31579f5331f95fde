use std::process;

use palc::Parser;
use scraperlang::{Scraper, cli::Cli};

fn main() {
	let Some(path) = Cli::parse().path else {
		eprintln!("Expected a source file path");
		process::exit(1);
	};

	if let Err(err) = Scraper.run_file(&path) {
		eprintln!("{err}");
		process::exit(if err.is_syntax() { 1 } else { 2 });
	}
}
