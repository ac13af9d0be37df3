use std::sync::{
	atomic::{AtomicUsize, Ordering},
	Arc,
};

use chrono::Local;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::{
	feed::{FeedBuilder, FeedError},
	record::ModelDeprecationRecord,
	snapshot::{SnapshotError, SnapshotStore},
	source::{RecordSource, ScrapeError},
};

#[derive(Debug, Error)]
pub enum RefreshError {
	#[error(transparent)]
	Scrape(#[from] ScrapeError),
	#[error("No data found")]
	NoData,
	#[error(transparent)]
	Feed(#[from] FeedError),
	#[error(transparent)]
	Snapshot(#[from] SnapshotError),
}

/// The batch the service is currently publishing.
#[derive(Debug, Clone, Default)]
pub struct Latest {
	pub records: Vec<ModelDeprecationRecord>,
	pub rss: Option<String>,
	pub last_update: Option<String>,
}

impl Latest {
	#[must_use]
	pub fn with_alternatives(&self) -> usize {
		self.records.iter().filter(|r| r.has_alternative()).count()
	}
}

/// Shared service state. Cloning hands out another handle to the same state.
///
/// A refresh builds the new batch and its RSS document first and swaps both in
/// under one write lock. The scraping flag counts refreshes in flight. It is
/// informational and does not stop a second refresh from running.
#[derive(Clone)]
pub struct AppState {
	source: Arc<dyn RecordSource>,
	builder: Arc<FeedBuilder>,
	snapshots: Arc<SnapshotStore>,
	latest: Arc<RwLock<Latest>>,
	scraping: Arc<AtomicUsize>,
}

struct ScrapingFlag<'a>(&'a AtomicUsize);

impl<'a> ScrapingFlag<'a> {
	fn raise(in_flight: &'a AtomicUsize) -> Self {
		in_flight.fetch_add(1, Ordering::SeqCst);
		Self(in_flight)
	}
}

impl Drop for ScrapingFlag<'_> {
	fn drop(&mut self) {
		self.0.fetch_sub(1, Ordering::SeqCst);
	}
}

impl AppState {
	pub fn new(source: Arc<dyn RecordSource>, builder: FeedBuilder, snapshots: SnapshotStore) -> Self {
		Self {
			source,
			builder: Arc::new(builder),
			snapshots: Arc::new(snapshots),
			latest: Arc::new(RwLock::new(Latest::default())),
			scraping: Arc::new(AtomicUsize::new(0)),
		}
	}

	#[must_use]
	pub fn is_scraping(&self) -> bool {
		self.scraping.load(Ordering::SeqCst) > 0
	}

	pub async fn latest(&self) -> Latest {
		self.latest.read().await.clone()
	}

	pub async fn rss(&self) -> Option<String> {
		self.latest.read().await.rss.clone()
	}

	/// Scrapes a fresh batch and publishes it. On failure the previous batch stays.
	pub async fn refresh(&self) -> Result<usize, RefreshError> {
		let _flag = ScrapingFlag::raise(&self.scraping);
		info!("Running scraper");
		let records = self.source.fetch_records().await?;
		if records.is_empty() {
			warn!("No data found from scraper");
			return Err(RefreshError::NoData);
		}
		self.publish(records).await
	}

	/// Publishes the newest JSON snapshot on disk.
	pub async fn load_from_snapshot(&self) -> Result<usize, RefreshError> {
		let records = self.snapshots.load_latest()?;
		self.publish(records).await
	}

	/// One refresh, then the snapshot fallback if the scrape produced nothing.
	pub async fn initial_load(&self) -> Result<usize, RefreshError> {
		match self.refresh().await {
			Ok(count) => {
				info!(count, "Initial load successful");
				Ok(count)
			}
			Err(e) => {
				warn!(error = %e, "Initial load failed, trying existing files");
				let outcome = self.load_from_snapshot().await;
				match &outcome {
					Ok(count) => info!(count, "Loaded from existing files"),
					Err(e) => error!(error = %e, "Failed to load from files"),
				}
				outcome
			}
		}
	}

	async fn publish(&self, records: Vec<ModelDeprecationRecord>) -> Result<usize, RefreshError> {
		let rss = self.builder.build(&records)?;
		let count = records.len();
		*self.latest.write().await = Latest {
			records,
			rss: Some(rss),
			last_update: Some(Local::now().format("%Y-%m-%d %H:%M:%S").to_string()),
		};
		info!(count, "RSS content generated");
		Ok(count)
	}
}

#[cfg(test)]
pub(crate) mod testing {
	use async_trait::async_trait;
	use std::sync::Mutex;

	use crate::{
		fetch::FetchError,
		record::ModelDeprecationRecord,
		source::{RecordSource, ScrapeError},
	};

	/// Hands out queued outcomes, one per call; an empty queue means a 503.
	#[derive(Default)]
	pub(crate) struct ScriptedSource {
		outcomes: Mutex<Vec<Result<Vec<ModelDeprecationRecord>, ScrapeError>>>,
	}

	impl ScriptedSource {
		pub(crate) fn then_records(self, names: &[&str]) -> Self {
			let records = names
				.iter()
				.map(|name| ModelDeprecationRecord {
					name: (*name).to_string(),
					withdrawal_date: "15 March 2024".to_string(),
					recommended_alternative: if name.ends_with("-old") {
						crate::record::PLACEHOLDER.to_string()
					} else {
						"granite-3-8b-instruct".to_string()
					},
					..Default::default()
				})
				.collect();
			self.outcomes.lock().unwrap().insert(0, Ok(records));
			self
		}

		pub(crate) fn then_failure(self) -> Self {
			self.outcomes
				.lock()
				.unwrap()
				.insert(0, Err(ScrapeError::Fetch(FetchError::HttpStatus(503))));
			self
		}
	}

	#[async_trait]
	impl RecordSource for ScriptedSource {
		async fn fetch_records(&self) -> Result<Vec<ModelDeprecationRecord>, ScrapeError> {
			self.outcomes
				.lock()
				.unwrap()
				.pop()
				.unwrap_or(Err(ScrapeError::Fetch(FetchError::HttpStatus(503))))
		}
	}
}
