use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use modelfeed::{config::Config, server, source::PageScraper, state::AppState};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(clap::Parser)]
struct Args {
	/// The path to a configuration file. You can specify as many of these as you need to.
	#[arg(short, long)]
	config_path: Vec<PathBuf>,
	/// Port to listen on. Overrides the config file and the PORT variable.
	#[arg(short, long)]
	port: Option<u16>,
	/// Start with an empty feed instead of scraping at startup.
	#[arg(long)]
	skip_initial_load: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| "info,modelfeed=debug,tower_http=debug".into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	let args = Args::parse();
	let mut config = Config::load(&args.config_path).context("Invalid config")?;
	if let Some(port) = args.port {
		config.port = port;
	}

	let fetcher = config.fetcher().context("Failed to build HTTP client")?;
	let source = PageScraper::new(fetcher, config.source_url.clone());
	let state = AppState::new(Arc::new(source), config.feed_builder(), config.snapshot_store());

	if !args.skip_initial_load {
		tracing::info!("Loading initial data");
		if let Err(e) = state.initial_load().await {
			tracing::warn!(error = %e, "Starting without a feed");
		}
	}

	let app = server::router(state, config.feed.title.clone());
	let addr = config.bind_addr();
	let listener = tokio::net::TcpListener::bind(&addr)
		.await
		.with_context(|| format!("Failed to bind to {addr}"))?;
	tracing::info!("RSS feed available at http://localhost:{}/feed.xml", config.port);
	tracing::info!("Web interface available at http://localhost:{}", config.port);

	axum::serve(listener, app).await.context("Server error")?;
	Ok(())
}
