use async_trait::async_trait;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
	document::DocumentError,
	extract::TableExtractor,
	fetch::{FetchError, Fetcher},
	record::ModelDeprecationRecord,
};

#[derive(Debug, Error)]
pub enum ScrapeError {
	#[error("Error fetching the webpage: {0}")]
	Fetch(#[from] FetchError),
	#[error("Error parsing the webpage: {0}")]
	Parse(#[from] DocumentError),
}

/// Anything that can produce a fresh batch of records.
#[async_trait]
pub trait RecordSource: Send + Sync {
	async fn fetch_records(&self) -> Result<Vec<ModelDeprecationRecord>, ScrapeError>;
}

/// Scrapes the lifecycle page: one GET, then table extraction.
#[derive(Clone)]
pub struct PageScraper {
	fetcher: Fetcher,
	url: String,
	extractor: TableExtractor,
}

impl PageScraper {
	pub fn new(fetcher: Fetcher, url: impl Into<String>) -> Self {
		Self {
			fetcher,
			url: url.into(),
			extractor: TableExtractor::default(),
		}
	}

	/// Like [`RecordSource::fetch_records`], but any failure is logged and becomes an empty batch.
	pub async fn scrape_or_empty(&self) -> Vec<ModelDeprecationRecord> {
		match self.fetch_records().await {
			Ok(records) => records,
			Err(e) => {
				warn!(error = %e, "Scrape failed");
				Vec::new()
			}
		}
	}
}

#[async_trait]
impl RecordSource for PageScraper {
	async fn fetch_records(&self) -> Result<Vec<ModelDeprecationRecord>, ScrapeError> {
		info!(url = %self.url, "Fetching data");
		let html = self.fetcher.fetch_text(&self.url).await?;
		let records = self.extractor.try_extract(&html)?;
		info!(count = records.len(), "Scraper returned models");
		Ok(records)
	}
}
