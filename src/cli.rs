use std::path::PathBuf;

use palc::Parser;

/// CLI arguments
#[derive(Parser)]
#[command(name = "scraperlang", long_about = "Runs a ScraperLang scraping script")]
pub struct Cli {
	/// Path of the source file to execute. Diagnosed by hand when missing
	/// so the exit code stays 1.
	pub path: Option<PathBuf>,
}
