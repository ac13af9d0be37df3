use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
	feed::{FeedBuilder, FeedMeta, DEFAULT_SOURCE_URL},
	fetch::{FetchError, Fetcher, DEFAULT_USER_AGENT},
	snapshot::{SnapshotStore, DEFAULT_PREFIX},
};

/// Settings shared by the server and the batch tool.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Config {
	/// The lifecycle page to scrape.
	pub source_url: String,
	pub user_agent: String,
	pub fetch_timeout_secs: u64,
	/// Enables the on-disk HTTP cache when set.
	pub http_cache_dir: Option<PathBuf>,
	pub host: String,
	pub port: u16,
	pub snapshot_dir: PathBuf,
	pub snapshot_prefix: String,
	pub feed: FeedMeta,
}

impl Default for Config {
	fn default() -> Self {
		Self {
			source_url: DEFAULT_SOURCE_URL.to_string(),
			user_agent: DEFAULT_USER_AGENT.to_string(),
			fetch_timeout_secs: 30,
			http_cache_dir: None,
			host: "0.0.0.0".to_string(),
			port: 5000,
			snapshot_dir: PathBuf::from("."),
			snapshot_prefix: DEFAULT_PREFIX.to_string(),
			feed: FeedMeta::default(),
		}
	}
}

impl Config {
	pub fn fetcher(&self) -> Result<Fetcher, FetchError> {
		Fetcher::new(
			&self.user_agent,
			Duration::from_secs(self.fetch_timeout_secs),
			self.http_cache_dir.clone(),
		)
	}

	#[must_use]
	pub fn snapshot_store(&self) -> SnapshotStore {
		SnapshotStore::new(self.snapshot_dir.clone(), self.snapshot_prefix.clone())
	}

	#[must_use]
	pub fn feed_builder(&self) -> FeedBuilder {
		FeedBuilder::new(self.feed.clone())
	}

	#[must_use]
	pub fn bind_addr(&self) -> String {
		format!("{}:{}", self.host, self.port)
	}
}

#[cfg(feature = "server")]
mod layered {
	use std::path::PathBuf;

	use figment::{
		providers::{Env, Format, Serialized, Toml},
		Figment, Profile,
	};

	use super::Config;

	impl Config {
		/// Defaults, then `$XDG_CONFIG_HOME/modelfeed.toml`, then each file in
		/// `config_paths`, then `MODELFEED_*` variables, then `PORT`.
		pub fn figment(config_paths: &[PathBuf]) -> Figment {
			let mut config = Figment::new().merge(Serialized::from(Config::default(), Profile::Default));
			if let Ok(xdg) = xdg::BaseDirectories::new() {
				if let Some(location) = xdg.find_config_file("modelfeed.toml") {
					config = config.merge(Toml::file(location));
				}
			}
			for location in config_paths {
				config = config.merge(Toml::file(location));
			}
			config
				.merge(Env::prefixed("MODELFEED_").split("__"))
				.merge(Env::raw().only(&["PORT"]))
		}

		pub fn load(config_paths: &[PathBuf]) -> Result<Self, figment::Error> {
			Self::figment(config_paths).extract()
		}
	}
}
