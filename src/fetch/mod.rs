use std::{path::PathBuf, time::Duration};

use http_cache_reqwest::{CACacheManager, Cache, CacheMode, HttpCache, HttpCacheOptions};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_USER_AGENT: &str = "curl/8.5.0 (x86_64-pc-linux-gnu)";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum FetchError {
	#[error("could not build HTTP client: {0}")]
	Client(#[from] reqwest::Error),
	#[error("request failed: {0}")]
	Request(#[from] reqwest_middleware::Error),
	#[error("unexpected status code: {0}")]
	HttpStatus(u16),
	#[error("could not read response body: {0}")]
	Body(reqwest::Error),
}

/// Outbound HTTP for the lifecycle page. Every request carries the configured
/// User-Agent and is bounded by a fixed timeout.
#[derive(Clone)]
pub struct Fetcher {
	client: ClientWithMiddleware,
}

impl Fetcher {
	/// Builds a fetcher. With a cache directory, responses are stored on disk and
	/// revalidated with the server on every request.
	pub fn new(
		user_agent: &str,
		timeout: Duration,
		cache_dir: Option<PathBuf>,
	) -> Result<Self, FetchError> {
		let client = Client::builder()
			.user_agent(user_agent)
			.timeout(timeout)
			.build()?;
		let mut builder = ClientBuilder::new(client);
		if let Some(path) = cache_dir {
			debug!(path = %path.display(), "Using on-disk HTTP cache");
			builder = builder.with(Cache(HttpCache {
				mode: CacheMode::NoCache,
				manager: CACacheManager { path },
				options: HttpCacheOptions::default(),
			}));
		}
		Ok(Self {
			client: builder.build(),
		})
	}

	pub async fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
		debug!(url, "Fetching page");
		let response = self.client.get(url).send().await?;
		let status = response.status();
		if !status.is_success() {
			return Err(FetchError::HttpStatus(status.as_u16()));
		}
		response.text().await.map_err(FetchError::Body)
	}
}

impl Default for Fetcher {
	fn default() -> Self {
		let client = Client::builder()
			.user_agent(DEFAULT_USER_AGENT)
			.timeout(DEFAULT_TIMEOUT)
			.build()
			.unwrap_or_default();
		Self {
			client: ClientBuilder::new(client).build(),
		}
	}
}
