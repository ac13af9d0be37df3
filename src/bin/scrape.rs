//! One-shot scrape: print what the lifecycle page lists, then write snapshot
//! files and an RSS document for import into a feed reader.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use modelfeed::{config::Config, source::PageScraper, ModelDeprecationRecord};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(clap::Parser)]
struct Args {
	/// The path to a configuration file. You can specify as many of these as you need to.
	#[arg(short, long)]
	config_path: Vec<PathBuf>,
	/// Directory for the snapshot files. Defaults to the configured snapshot_dir.
	#[arg(short, long)]
	output_dir: Option<PathBuf>,
}

fn display(records: &[ModelDeprecationRecord]) {
	let rule = "=".repeat(80);
	println!("\n{rule}");
	println!("FOUND {} DEPRECATED FOUNDATION MODELS", records.len());
	println!("{rule}");
	for (n, record) in records.iter().enumerate() {
		println!("\n{}. Model: {}", n + 1, record.name);
		println!("   Availability: {}", record.availability_date);
		println!("   Deprecation: {}", record.deprecation_date);
		println!("   Withdrawal: {}", record.withdrawal_date);
		println!("   Alternative: {}", record.recommended_alternative);
		println!("{}", "-".repeat(60));
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info,modelfeed=debug".into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let args = Args::parse();
	let mut config = Config::load(&args.config_path).context("Invalid config")?;
	if let Some(dir) = args.output_dir {
		config.snapshot_dir = dir;
	}

	let scraper = PageScraper::new(
		config.fetcher().context("Failed to build HTTP client")?,
		config.source_url.clone(),
	);
	let records = scraper.scrape_or_empty().await;
	if records.is_empty() {
		println!("No data was scraped. The website structure might have changed or the content is not accessible.");
		return Ok(());
	}

	display(&records);

	let store = config.snapshot_store();
	if let Some(saved) = store.save(&records).context("Failed to save snapshots")? {
		println!("\nCSV: {}", saved.csv.display());
		println!("JSON: {}", saved.json.display());
		if let Some(xlsx) = saved.xlsx {
			println!("Excel: {}", xlsx.display());
		}
	}

	let rss = config
		.feed_builder()
		.build(&records)
		.context("Failed to build RSS feed")?;
	let rss_path = store.save_feed(&rss).context("Failed to write RSS feed")?;

	println!("\nScraping completed successfully! Found {} deprecated models.", records.len());
	println!("RSS feed created: {}", rss_path.display());
	println!("You can now import this XML file into any RSS reader!");
	Ok(())
}
