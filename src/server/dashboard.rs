use handlebars::{Handlebars, RenderError};
use lazy_static::lazy_static;
use serde_json::json;

use crate::state::Latest;

const PREVIEW_LEN: usize = 5;
const TEMPLATE_NAME: &str = "dashboard";

lazy_static! {
	static ref DASHBOARD: Handlebars<'static> = {
		let mut handlebars = Handlebars::new();
		handlebars.set_strict_mode(true);
		handlebars
			.register_template_string(TEMPLATE_NAME, TEMPLATE)
			.expect("Bad dashboard template");
		handlebars
	};
}

const TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8">
<meta name="viewport" content="width=device-width, initial-scale=1.0">
<title>{{title}}</title>
<style>
body { font-family: Arial, sans-serif; max-width: 1200px; margin: 0 auto; padding: 20px; background-color: #f5f5f5; }
.container { background: white; padding: 30px; border-radius: 10px; box-shadow: 0 2px 10px rgba(0,0,0,0.1); }
h1 { color: #2c3e50; text-align: center; margin-bottom: 30px; }
.status { padding: 15px; border-radius: 5px; margin: 20px 0; font-weight: bold; }
.status.success { background-color: #d4edda; color: #155724; border: 1px solid #c3e6cb; }
.status.error { background-color: #f8d7da; color: #721c24; border: 1px solid #f5c6cb; }
.status.info { background-color: #d1ecf1; color: #0c5460; border: 1px solid #bee5eb; }
.button { background-color: #007bff; color: white; padding: 12px 24px; border: none; border-radius: 5px; cursor: pointer; font-size: 16px; margin: 10px 5px; text-decoration: none; display: inline-block; }
.button:hover { background-color: #0056b3; }
.button:disabled { background-color: #6c757d; cursor: not-allowed; }
.button.secondary { background-color: #6c757d; }
.feed-info { background-color: #e9ecef; padding: 20px; border-radius: 5px; margin: 20px 0; }
.feed-url { background-color: #f8f9fa; padding: 10px; border-radius: 3px; font-family: monospace; word-break: break-all; border: 1px solid #dee2e6; }
.stats { display: grid; grid-template-columns: repeat(auto-fit, minmax(200px, 1fr)); gap: 20px; margin: 20px 0; }
.stat-card { background: white; padding: 20px; border-radius: 5px; text-align: center; box-shadow: 0 2px 5px rgba(0,0,0,0.1); }
.stat-number { font-size: 2em; font-weight: bold; color: #007bff; }
.stat-label { color: #6c757d; margin-top: 5px; }
.loading { display: none; text-align: center; margin: 20px 0; }
.model { border-bottom: 1px solid #eee; padding: 10px 0; }
</style>
</head>
<body>
<div class="container">
<h1>{{title}}</h1>
<div id="status" class="status info">{{#if last_update}}Last updated: {{last_update}}{{else}}No data available. Click "Update Feed" to start.{{/if}}</div>
<div class="stats">
<div class="stat-card"><div class="stat-number">{{models_count}}</div><div class="stat-label">Models Found</div></div>
<div class="stat-card"><div class="stat-number">{{with_alternatives}}</div><div class="stat-label">With Alternatives</div></div>
<div class="stat-card"><div class="stat-number">{{without_alternatives}}</div><div class="stat-label">Without Alternatives</div></div>
</div>
<div class="feed-info">
<h3>RSS Feed URL</h3>
<p>Use this URL in your RSS reader:</p>
<div class="feed-url">{{feed_url}}</div>
</div>
<div style="text-align: center;">
<button id="updateBtn" class="button" onclick="updateFeed()">Update Feed</button>
<a href="/feed.xml" class="button secondary" target="_blank">View RSS XML</a>
<a href="/api/data" class="button secondary" target="_blank">View JSON Data</a>
</div>
<div id="loading" class="loading"><p>Updating feed... This may take a few moments.</p></div>
{{#if preview}}
<div style="margin-top: 30px;"><h3>Latest Models (First {{preview_len}})</h3>
{{#each preview}}
<div class="model"><strong>{{foundation_model_name}}</strong><br><small>Available: {{availability_date}} | Deprecated: {{deprecation_date}} | Withdrawal: {{withdrawal_date}}<br>Alternative: {{recommended_alternative}}</small></div>
{{/each}}
</div>
{{/if}}
</div>
<script>
function updateFeed() {
	const btn = document.getElementById('updateBtn');
	const loading = document.getElementById('loading');
	const status = document.getElementById('status');
	btn.disabled = true;
	loading.style.display = 'block';
	status.className = 'status info';
	status.textContent = 'Updating feed...';
	fetch('/api/update', { method: 'POST' })
		.then(response => response.json())
		.then(data => {
			if (data.success) {
				status.className = 'status success';
				status.textContent = `Feed updated successfully! Found ${data.models_count} models.`;
				setTimeout(() => location.reload(), 2000);
			} else {
				status.className = 'status error';
				status.textContent = 'Error updating feed: ' + data.error;
			}
		})
		.catch(error => {
			status.className = 'status error';
			status.textContent = 'Error updating feed: ' + error.message;
		})
		.finally(() => {
			btn.disabled = false;
			loading.style.display = 'none';
		});
}
setInterval(() => {
	fetch('/api/status')
		.then(response => response.json())
		.then(data => {
			if (data.is_scraping) {
				document.getElementById('status').textContent = 'Currently scraping...';
			}
		});
}, 30000);
</script>
</body>
</html>
"#;

/// Renders the status page for the current batch. Every value is HTML-escaped.
pub fn render(title: &str, latest: &Latest, feed_url: &str) -> Result<String, RenderError> {
	let count = latest.records.len();
	let with_alternatives = latest.with_alternatives();
	let preview = &latest.records[..count.min(PREVIEW_LEN)];
	DASHBOARD.render(
		TEMPLATE_NAME,
		&json!({
			"title": title,
			"last_update": latest.last_update,
			"models_count": count,
			"with_alternatives": with_alternatives,
			"without_alternatives": count - with_alternatives,
			"feed_url": feed_url,
			"preview_len": PREVIEW_LEN,
			"preview": preview,
		}),
	)
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::record::ModelDeprecationRecord;

	fn latest(names: &[&str]) -> Latest {
		Latest {
			records: names
				.iter()
				.map(|name| ModelDeprecationRecord {
					name: (*name).to_string(),
					..Default::default()
				})
				.collect(),
			rss: None,
			last_update: Some("2024-06-01 12:30:00".to_string()),
		}
	}

	#[test]
	fn empty_state_prompts_for_update() {
		let html = render("Feed", &Latest::default(), "http://localhost:5000/feed.xml").unwrap();
		assert!(html.contains("No data available."));
		assert!(!html.contains("Latest Models"));
		assert!(html.contains("http://localhost:5000/feed.xml"));
	}

	#[test]
	fn preview_is_limited_and_escaped() {
		let html = render("Feed", &latest(&["a", "b", "c", "d", "e", "<f>"]), "u").unwrap();
		assert!(html.contains("Last updated: 2024-06-01 12:30:00"));
		assert!(html.contains("<strong>e</strong>"));
		assert!(!html.contains("&lt;f&gt;"));
		assert!(!html.contains("{{"));
	}

	#[test]
	fn markup_in_records_is_escaped() {
		let html = render("Feed", &latest(&["<script>x</script>"]), "u").unwrap();
		assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
	}

	#[test]
	fn inserted_values_are_not_expanded_again() {
		let html = render(
			"Retired {{models_count}} models",
			&latest(&["{{feed_url}}"]),
			"http://{{title}}/feed.xml",
		)
		.unwrap();
		assert!(html.contains("<h1>Retired {{models_count}} models</h1>"));
		assert!(html.contains("<div class=\"feed-url\">http://{{title}}/feed.xml</div>"));
		assert!(html.contains("<strong>{{feed_url}}</strong>"));
	}

	#[test]
	fn template_registers() {
		assert!(DASHBOARD.has_template(TEMPLATE_NAME));
	}
}
