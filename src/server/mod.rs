//! HTTP surface: the dashboard, the feed itself and a small JSON API.

use axum::{
	extract::State,
	http::{header, HeaderMap, StatusCode},
	response::{Html, IntoResponse, Response},
	routing::{get, post},
	Json, Router,
};
use serde::Serialize;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::{record::ModelDeprecationRecord, state::AppState};

pub mod dashboard;

pub const RSS_CONTENT_TYPE: &str = "application/rss+xml; charset=utf-8";
const NO_FEED: &str = "No RSS feed available. Please update the feed first.";

#[derive(Clone)]
struct ServerState {
	app: AppState,
	title: String,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
	pub success: bool,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub models_count: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
	pub is_scraping: bool,
	pub last_update: Option<String>,
	pub models_count: usize,
}

#[derive(Debug, Serialize)]
pub struct DataResponse {
	pub last_update: Option<String>,
	pub models_count: usize,
	pub data: Vec<ModelDeprecationRecord>,
}

/// Builds the router. `title` heads the dashboard.
pub fn router(app: AppState, title: impl Into<String>) -> Router {
	Router::new()
		.route("/", get(index))
		.route("/feed.xml", get(feed))
		.route("/api/update", post(update))
		.route("/api/status", get(status))
		.route("/api/data", get(data))
		.layer(TraceLayer::new_for_http())
		.with_state(ServerState {
			app,
			title: title.into(),
		})
}

async fn index(State(state): State<ServerState>, headers: HeaderMap) -> Response {
	let host = headers
		.get(header::HOST)
		.and_then(|value| value.to_str().ok())
		.unwrap_or("localhost");
	let feed_url = format!("http://{host}/feed.xml");
	let latest = state.app.latest().await;
	match dashboard::render(&state.title, &latest, &feed_url) {
		Ok(page) => Html(page).into_response(),
		Err(e) => {
			error!(error = %e, "Failed to render dashboard");
			(StatusCode::INTERNAL_SERVER_ERROR, "Failed to render dashboard").into_response()
		}
	}
}

async fn feed(State(state): State<ServerState>) -> Response {
	match state.app.rss().await {
		Some(rss) => ([(header::CONTENT_TYPE, RSS_CONTENT_TYPE)], rss).into_response(),
		None => (StatusCode::NOT_FOUND, NO_FEED).into_response(),
	}
}

async fn update(State(state): State<ServerState>) -> Json<UpdateResponse> {
	Json(match state.app.refresh().await {
		Ok(count) => UpdateResponse {
			success: true,
			models_count: Some(count),
			message: Some(format!("Feed updated successfully with {count} models")),
			error: None,
		},
		Err(e) => {
			error!(error = %e, "Update failed");
			UpdateResponse {
				success: false,
				models_count: None,
				message: None,
				error: Some(e.to_string()),
			}
		}
	})
}

async fn status(State(state): State<ServerState>) -> Json<StatusResponse> {
	let latest = state.app.latest().await;
	Json(StatusResponse {
		is_scraping: state.app.is_scraping(),
		last_update: latest.last_update,
		models_count: latest.records.len(),
	})
}

async fn data(State(state): State<ServerState>) -> Json<DataResponse> {
	let latest = state.app.latest().await;
	Json(DataResponse {
		last_update: latest.last_update,
		models_count: latest.records.len(),
		data: latest.records,
	})
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use axum::{body::Body, http::Request};
	use serde_json::Value;
	use tower::ServiceExt;

	use super::*;
	use crate::{feed::FeedBuilder, snapshot::SnapshotStore, state::testing::ScriptedSource};

	fn app(source: ScriptedSource) -> Router {
		let state = AppState::new(Arc::new(source), FeedBuilder::default(), SnapshotStore::default());
		router(state, "Deprecated models")
	}

	async fn send(app: &Router, method: &str, uri: &str) -> Response {
		app.clone()
			.oneshot(Request::builder().method(method).uri(uri).body(Body::empty()).unwrap())
			.await
			.unwrap()
	}

	async fn body_text(response: Response) -> String {
		let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
		String::from_utf8(bytes.to_vec()).unwrap()
	}

	async fn body_json(response: Response) -> Value {
		serde_json::from_str(&body_text(response).await).unwrap()
	}

	#[tokio::test]
	async fn feed_is_missing_until_first_update() {
		let app = app(ScriptedSource::default().then_records(&["a", "b"]));

		let response = send(&app, "GET", "/feed.xml").await;
		assert_eq!(response.status(), StatusCode::NOT_FOUND);
		assert_eq!(body_text(response).await, NO_FEED);

		let response = send(&app, "POST", "/api/update").await;
		assert_eq!(response.status(), StatusCode::OK);
		let update = body_json(response).await;
		assert_eq!(update["success"], true);
		assert_eq!(update["models_count"], 2);
		assert!(update.get("error").is_none());

		let response = send(&app, "GET", "/feed.xml").await;
		assert_eq!(response.status(), StatusCode::OK);
		let content_type = response.headers()[header::CONTENT_TYPE].to_str().unwrap().to_string();
		assert!(content_type.starts_with("application/rss+xml"));
		let channel = rss::Channel::read_from(body_text(response).await.as_bytes()).unwrap();
		assert_eq!(channel.items().len(), 2);
	}

	#[tokio::test]
	async fn failed_update_reports_reason() {
		let app = app(ScriptedSource::default().then_records(&[]).then_failure());

		let update = body_json(send(&app, "POST", "/api/update").await).await;
		assert_eq!(update["success"], false);
		assert_eq!(update["error"], "No data found");
		assert!(update.get("models_count").is_none());

		let update = body_json(send(&app, "POST", "/api/update").await).await;
		assert_eq!(update["success"], false);
		assert_eq!(update["error"], "Error fetching the webpage: unexpected status code: 503");

		assert_eq!(send(&app, "GET", "/feed.xml").await.status(), StatusCode::NOT_FOUND);
	}

	#[tokio::test]
	async fn status_and_data_follow_updates() {
		let app = app(ScriptedSource::default().then_records(&["a", "b-old", "c"]));

		let status = body_json(send(&app, "GET", "/api/status").await).await;
		assert_eq!(status["is_scraping"], false);
		assert_eq!(status["last_update"], Value::Null);
		assert_eq!(status["models_count"], 0);

		send(&app, "POST", "/api/update").await;

		let status = body_json(send(&app, "GET", "/api/status").await).await;
		assert_eq!(status["models_count"], 3);
		assert!(status["last_update"].is_string());

		let data = body_json(send(&app, "GET", "/api/data").await).await;
		assert_eq!(data["models_count"], 3);
		assert_eq!(data["data"][1]["foundation_model_name"], "b-old");
	}

	#[tokio::test]
	async fn dashboard_uses_request_host() {
		let app = app(ScriptedSource::default().then_records(&["a", "b-old"]));
		send(&app, "POST", "/api/update").await;

		let response = app
			.clone()
			.oneshot(
				Request::builder()
					.uri("/")
					.header(header::HOST, "feeds.example.com:8080")
					.body(Body::empty())
					.unwrap(),
			)
			.await
			.unwrap();
		assert_eq!(response.status(), StatusCode::OK);
		let html = body_text(response).await;
		assert!(html.contains("http://feeds.example.com:8080/feed.xml"));
		assert!(html.contains("<h1>Deprecated models</h1>"));
		assert!(html.contains("<div class=\"stat-number\">1</div><div class=\"stat-label\">With Alternatives</div>"));
	}

	#[tokio::test]
	async fn update_route_rejects_get() {
		let app = app(ScriptedSource::default());
		assert_eq!(
			send(&app, "GET", "/api/update").await.status(),
			StatusCode::METHOD_NOT_ALLOWED
		);
	}
}
